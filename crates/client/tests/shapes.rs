use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use serde_json::json;

use dokploy_client::{ClientConfig, DokployClient, SshKey};

fn client_for(server: &MockServer) -> DokployClient {
    DokployClient::new(ClientConfig::new(server.url(""), "test-key")).unwrap()
}

#[tokio::test]
async fn wrapped_and_bare_project_responses_resolve_identically() {
    let wrapped_server = MockServer::start_async().await;
    wrapped_server
        .mock_async(|when, then| {
            when.method(GET).path("/project.one");
            then.status(200).json_body(json!({
                "project": { "projectId": "proj-1", "name": "blog" }
            }));
        })
        .await;

    let bare_server = MockServer::start_async().await;
    bare_server
        .mock_async(|when, then| {
            when.method(GET).path("/project.one");
            then.status(200)
                .json_body(json!({ "projectId": "proj-1", "name": "blog" }));
        })
        .await;

    let wrapped = client_for(&wrapped_server)
        .get_project("proj-1")
        .await
        .unwrap();
    let bare = client_for(&bare_server).get_project("proj-1").await.unwrap();

    assert_eq!(wrapped, bare);
    assert_eq!(wrapped.id, "proj-1");
}

#[tokio::test]
async fn ack_only_update_refetches_the_project() {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/project.update")
                .body_matches(r#""projectId":"proj-1""#)
                .body_matches(r#""name":"renamed""#);
            then.status(200).body("true");
        })
        .await;
    let refetch = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/project.one")
                .query_param("projectId", "proj-1");
            then.status(200).json_body(json!({
                "project": { "projectId": "proj-1", "name": "renamed" }
            }));
        })
        .await;

    let project = client_for(&server)
        .update_project("proj-1", "renamed", "")
        .await
        .unwrap();

    assert_eq!(project.name, "renamed");
    update.assert_async().await;
    refetch.assert_async().await;
}

#[tokio::test]
async fn ssh_key_create_resolves_ack_through_the_key_list() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/user.get");
            then.status(200).json_body(json!({
                "user": { "userId": "u-1", "organizationId": "org-1" }
            }));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/sshKey.create")
                .body_matches(r#""organizationId":"org-1""#)
                .body_matches(r#""name":"deploy-key""#);
            then.status(200).body("true");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/sshKey.all");
            then.status(200).json_body(json!({
                "sshKeys": [
                    { "sshKeyId": "key-1", "name": "other-key" },
                    { "sshKeyId": "key-2", "name": "deploy-key" }
                ]
            }));
        })
        .await;

    let key = SshKey {
        name: "deploy-key".into(),
        public_key: "ssh-ed25519 AAAA".into(),
        ..Default::default()
    };
    let created = client_for(&server).create_ssh_key(&key).await.unwrap();

    assert_eq!(created.id, "key-2");
    create.assert_async().await;
}

#[tokio::test]
async fn generated_domains_arrive_wrapped_or_as_a_bare_string() {
    let wrapped_server = MockServer::start_async().await;
    wrapped_server
        .mock_async(|when, then| {
            when.method(POST).path("/domain.generateDomain");
            then.status(200)
                .json_body(json!({ "domain": "api.traefik.me" }));
        })
        .await;

    let bare_server = MockServer::start_async().await;
    bare_server
        .mock_async(|when, then| {
            when.method(POST).path("/domain.generateDomain");
            then.status(200).body("\"api.traefik.me\"");
        })
        .await;

    let wrapped = client_for(&wrapped_server)
        .generate_domain("api")
        .await
        .unwrap();
    let bare = client_for(&bare_server).generate_domain("api").await.unwrap();

    assert_eq!(wrapped, "api.traefik.me");
    assert_eq!(bare, "api.traefik.me");
}
