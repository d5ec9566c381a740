use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use serde_json::json;

use dokploy_client::{ClientConfig, DokployClient, VolumeBackup};

fn client_for(server: &MockServer) -> DokployClient {
    DokployClient::new(ClientConfig::new(server.url(""), "test-key")).unwrap()
}

fn nightly_backup() -> VolumeBackup {
    VolumeBackup {
        name: "nightly".into(),
        compose_id: "comp-1".into(),
        app_name: "ghost-1".into(),
        service_name: "ghost".into(),
        volume_name: "data".into(),
        destination_id: "dest-1".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn create_prefixes_the_volume_name_on_the_wire() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/volumeBackups.create")
                .body_matches(r#""volumeName":"ghost-1_data""#)
                .body_matches(r#""serviceType":"compose""#)
                .body_matches(r#""keepLatestCount":14"#)
                .body_matches(r#""turnOff":false"#);
            then.status(200).json_body(json!({
                "volumeBackup": {
                    "volumeBackupId": "vb-1",
                    "name": "nightly",
                    "appName": "ghost-1",
                    "volumeName": "ghost-1_data"
                }
            }));
        })
        .await;

    let created = client_for(&server)
        .create_volume_backup(&nightly_backup())
        .await
        .unwrap();

    assert_eq!(created.id, "vb-1");
    assert_eq!(created.volume_name, "ghost-1_data");
    assert_eq!(created.logical_volume_name(), "data");
    create.assert_async().await;
}

#[tokio::test]
async fn already_prefixed_volume_names_are_not_doubled() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/volumeBackups.create")
                .body_matches(r#""volumeName":"ghost-1_data""#);
            then.status(200).json_body(json!({
                "volumeBackup": { "volumeBackupId": "vb-1", "name": "nightly" }
            }));
        })
        .await;

    let mut backup = nightly_backup();
    backup.volume_name = "ghost-1_data".into();
    client_for(&server)
        .create_volume_backup(&backup)
        .await
        .unwrap();
    create.assert_async().await;
}

#[tokio::test]
async fn missing_app_name_is_resolved_from_the_compose_stack() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/compose.one")
                .query_param("composeId", "comp-1");
            then.status(200).json_body(json!({
                "composeId": "comp-1", "name": "ghost", "appName": "ghost-1"
            }));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/volumeBackups.create")
                .body_matches(r#""appName":"ghost-1""#)
                .body_matches(r#""volumeName":"ghost-1_data""#);
            then.status(200).json_body(json!({
                "volumeBackup": { "volumeBackupId": "vb-1", "name": "nightly" }
            }));
        })
        .await;

    let mut backup = nightly_backup();
    backup.app_name = String::new();
    client_for(&server)
        .create_volume_backup(&backup)
        .await
        .unwrap();
    create.assert_async().await;
}

#[tokio::test]
async fn disabled_backups_send_the_inverted_flag() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/volumeBackups.create")
                .body_matches(r#""enabled":false"#)
                .body_matches(r#""turnOff":true"#);
            then.status(200).json_body(json!({
                "volumeBackup": { "volumeBackupId": "vb-1", "name": "nightly" }
            }));
        })
        .await;

    let mut backup = nightly_backup();
    backup.enabled = Some(false);
    client_for(&server)
        .create_volume_backup(&backup)
        .await
        .unwrap();
    create.assert_async().await;
}

#[tokio::test]
async fn reads_fold_turn_off_into_the_enabled_state() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/volumeBackups.one")
                .query_param("volumeBackupId", "vb-1");
            then.status(200).json_body(json!({
                "volumeBackupId": "vb-1",
                "name": "nightly",
                "enabled": true,
                "turnOff": true
            }));
        })
        .await;

    let backup = client_for(&server).get_volume_backup("vb-1").await.unwrap();
    assert!(!backup.is_enabled(), "turnOff wins over enabled");
}

#[tokio::test]
async fn delete_uses_the_delete_endpoint() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/volumeBackups.delete")
                .body_matches(r#""volumeBackupId":"vb-1""#);
            then.status(200).body("true");
        })
        .await;

    client_for(&server).delete_volume_backup("vb-1").await.unwrap();
    delete.assert_async().await;
}
