use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use serde_json::json;

use dokploy_client::{
    Application, ClientConfig, Compose, DokployClient, Error, NewApplication, NewCompose, Port,
};

fn client_for(server: &MockServer) -> DokployClient {
    DokployClient::new(ClientConfig::new(server.url(""), "test-key")).unwrap()
}

#[tokio::test]
async fn application_create_configures_custom_git_source_in_phase_two() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/application.create")
                .body_matches(r#""name":"api""#)
                .body_matches(r#""environmentId":"env-1""#);
            then.status(200).json_body(json!({
                "application": { "applicationId": "app-1", "name": "api" }
            }));
        })
        .await;
    let update = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/application.update")
                .body_matches(r#""applicationId":"app-1""#)
                .body_matches(r#""sourceType":"git""#)
                .body_matches(r#""customGitUrl":"git@git\.example\.com:me/api\.git""#);
            then.status(200).json_body(json!({
                "applicationId": "app-1",
                "name": "api",
                "sourceType": "git",
                "customGitUrl": "git@git.example.com:me/api.git"
            }));
        })
        .await;

    let req = NewApplication {
        app: Application {
            name: "api".into(),
            environment_id: "env-1".into(),
            branch: "main".into(),
            build_type: "nixpacks".into(),
            custom_git_url: "git@git.example.com:me/api.git".into(),
            ..Default::default()
        },
        ..Default::default()
    };
    let provisioned = client_for(&server).create_application(&req).await.unwrap();

    assert_eq!(provisioned.entity.id, "app-1");
    assert_eq!(provisioned.entity.source_type, "git");
    assert!(provisioned.warnings.is_empty());
    create.assert_async().await;
    update.assert_async().await;
}

#[tokio::test]
async fn phase_two_failure_carries_the_created_id() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/application.create");
            then.status(200).json_body(json!({
                "application": { "applicationId": "app-9", "name": "api" }
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/application.update");
            then.status(500).body("internal error");
        })
        .await;

    let req = NewApplication {
        app: Application {
            name: "api".into(),
            environment_id: "env-1".into(),
            ..Default::default()
        },
        ..Default::default()
    };
    let err = client_for(&server)
        .create_application(&req)
        .await
        .unwrap_err();

    match err {
        Error::PartialProvisioning { kind, id, .. } => {
            assert_eq!(kind, "application");
            assert_eq!(id, "app-9");
        }
        other => panic!("expected partial provisioning error, got: {other}"),
    }
}

#[tokio::test]
async fn auto_deploy_is_deferred_until_ports_exist() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/application.create");
            then.status(200).json_body(json!({
                "application": { "applicationId": "app-1", "name": "api" }
            }));
        })
        .await;
    let update_disabled = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/application.update")
                .body_matches(r#""autoDeploy":false"#);
            then.status(200).json_body(json!({
                "applicationId": "app-1", "name": "api", "autoDeploy": false
            }));
        })
        .await;
    let port_create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/port.create")
                .body_matches(r#""applicationId":"app-1""#)
                .body_matches(r#""publishedPort":80"#)
                .body_matches(r#""protocol":"tcp""#);
            then.status(200).json_body(json!({
                "portId": "p-1", "applicationId": "app-1",
                "publishedPort": 80, "targetPort": 3000
            }));
        })
        .await;
    let update_enabled = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/application.update")
                .body_matches(r#""autoDeploy":true"#);
            then.status(200).json_body(json!({
                "applicationId": "app-1", "name": "api", "autoDeploy": true
            }));
        })
        .await;

    let req = NewApplication {
        app: Application {
            name: "api".into(),
            environment_id: "env-1".into(),
            auto_deploy: true,
            ..Default::default()
        },
        ports: vec![Port {
            published_port: 80,
            target_port: 3000,
            ..Default::default()
        }],
        ..Default::default()
    };
    let provisioned = client_for(&server).create_application(&req).await.unwrap();

    assert!(provisioned.entity.auto_deploy);
    assert!(provisioned.warnings.is_empty());
    update_disabled.assert_async().await;
    update_enabled.assert_async().await;
    port_create.assert_async().await;
}

#[tokio::test]
async fn port_failure_downgrades_to_a_warning() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/application.create");
            then.status(200).json_body(json!({
                "application": { "applicationId": "app-1", "name": "api" }
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/application.update");
            then.status(200)
                .json_body(json!({ "applicationId": "app-1", "name": "api" }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/port.create");
            then.status(500).body("port conflict");
        })
        .await;

    let req = NewApplication {
        app: Application {
            name: "api".into(),
            environment_id: "env-1".into(),
            ..Default::default()
        },
        ports: vec![Port {
            published_port: 80,
            target_port: 3000,
            ..Default::default()
        }],
        ..Default::default()
    };
    let provisioned = client_for(&server).create_application(&req).await.unwrap();

    assert_eq!(provisioned.entity.id, "app-1");
    assert_eq!(provisioned.warnings.len(), 1);
    assert!(provisioned.warnings[0].contains("ports[0]"));
}

#[tokio::test]
async fn ack_only_create_is_resolved_through_the_parent_project() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/application.create");
            then.status(200).body("true");
        })
        .await;
    let project = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/project.one")
                .query_param("projectId", "proj-1");
            then.status(200).json_body(json!({
                "project": {
                    "projectId": "proj-1",
                    "environments": [{
                        "environmentId": "env-1",
                        "applications": [
                            { "applicationId": "app-7", "name": "api" }
                        ]
                    }]
                }
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/application.update")
                .body_matches(r#""applicationId":"app-7""#);
            then.status(200)
                .json_body(json!({ "applicationId": "app-7", "name": "api" }));
        })
        .await;

    let req = NewApplication {
        app: Application {
            name: "api".into(),
            project_id: "proj-1".into(),
            environment_id: "env-1".into(),
            ..Default::default()
        },
        ..Default::default()
    };
    let provisioned = client_for(&server).create_application(&req).await.unwrap();

    assert_eq!(provisioned.entity.id, "app-7");
    project.assert_async().await;
}

#[tokio::test]
async fn compose_create_defaults_to_raw_source_for_inline_files() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/compose.create")
                .body_matches(r#""composeType":"docker-compose""#)
                .body_matches(r#""appName":"stack""#)
                .body_matches(r#""composeFile":"#);
            then.status(200).json_body(json!({
                "compose": { "composeId": "comp-1", "name": "stack" }
            }));
        })
        .await;
    let update = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/compose.update")
                .body_matches(r#""composeId":"comp-1""#)
                .body_matches(r#""sourceType":"raw""#);
            then.status(200).json_body(json!({
                "composeId": "comp-1", "name": "stack", "sourceType": "raw"
            }));
        })
        .await;

    let req = NewCompose {
        compose: Compose {
            name: "stack".into(),
            environment_id: "env-1".into(),
            compose_file: "services: {}".into(),
            ..Default::default()
        },
        ..Default::default()
    };
    let provisioned = client_for(&server).create_compose(&req).await.unwrap();

    assert_eq!(provisioned.entity.id, "comp-1");
    assert_eq!(provisioned.entity.source_type, "raw");
    create.assert_async().await;
    update.assert_async().await;
}

#[tokio::test]
async fn compose_deploy_on_create_fires_without_auto_deploy() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/compose.create");
            then.status(200).json_body(json!({
                "compose": { "composeId": "comp-1", "name": "stack" }
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/compose.update");
            then.status(200).json_body(json!({
                "composeId": "comp-1", "name": "stack", "autoDeploy": false
            }));
        })
        .await;
    let deploy = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/compose.deploy")
                .body_matches(r#""composeId":"comp-1""#);
            then.status(200).body("true");
        })
        .await;

    let req = NewCompose {
        compose: Compose {
            name: "stack".into(),
            environment_id: "env-1".into(),
            ..Default::default()
        },
        deploy_on_create: true,
    };
    let provisioned = client_for(&server).create_compose(&req).await.unwrap();

    assert!(provisioned.warnings.is_empty());
    deploy.assert_async().await;
}
