use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use serde_json::json;

use dokploy_client::{BackupDestination, ClientConfig, DokployClient, Error};

fn client_for(server: &MockServer) -> DokployClient {
    DokployClient::new(ClientConfig::new(server.url(""), "test-key")).unwrap()
}

#[tokio::test]
async fn create_sends_canonical_names_and_accepts_legacy_ones_back() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/destination.create")
                .body_matches(r#""provider":"s3""#)
                .body_matches(r#""accessKey":"AKIA123""#)
                .body_matches(r#""secretKey":"shh""#);
            // Legacy field names on the way back.
            then.status(200).json_body(json!({
                "destinationId": "dest-1",
                "name": "offsite",
                "type": "s3",
                "accessKeyId": "AKIA123",
                "secretAccessKey": "shh",
                "bucket": "backups"
            }));
        })
        .await;

    let destination = BackupDestination {
        name: "offsite".into(),
        bucket: "backups".into(),
        access_key: "AKIA123".into(),
        secret_key: "shh".into(),
        ..Default::default()
    };
    let created = client_for(&server)
        .create_backup_destination(&destination)
        .await
        .unwrap();

    assert_eq!(created.id, "dest-1");
    assert_eq!(created.provider, "s3");
    assert_eq!(created.access_key, "AKIA123");
    assert_eq!(created.secret_key, "shh");
    create.assert_async().await;
}

#[tokio::test]
async fn ack_only_create_resolves_through_the_destination_list() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/destination.create");
            then.status(200).body("true");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/destination.all");
            then.status(200).json_body(json!([
                { "destinationId": "dest-1", "name": "other" },
                { "destinationId": "dest-2", "name": "offsite" }
            ]));
        })
        .await;

    let destination = BackupDestination {
        name: "offsite".into(),
        ..Default::default()
    };
    let created = client_for(&server)
        .create_backup_destination(&destination)
        .await
        .unwrap();

    assert_eq!(created.id, "dest-2");
}

#[tokio::test]
async fn find_by_name_matches_exactly() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/destination.all");
            then.status(200).json_body(json!({
                "destinations": [
                    { "destinationId": "dest-1", "name": "Prod" },
                    { "destinationId": "dest-2", "name": "prod" }
                ]
            }));
        })
        .await;

    let client = client_for(&server);
    let found = client.find_backup_destination_by_name("prod").await.unwrap();
    assert_eq!(found.id, "dest-2", "name match is case-sensitive");

    let err = client
        .find_backup_destination_by_name("staging")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFoundAfterCreate { .. }));
}

#[tokio::test]
async fn update_addresses_the_destination_id() {
    let server = MockServer::start_async().await;
    let update = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/destination.update")
                .body_matches(r#""destinationId":"dest-1""#)
                .body_matches(r#""bucket":"backups-v2""#);
            then.status(200).json_body(json!({
                "destinationId": "dest-1", "name": "offsite", "bucket": "backups-v2"
            }));
        })
        .await;

    let destination = BackupDestination {
        id: "dest-1".into(),
        name: "offsite".into(),
        bucket: "backups-v2".into(),
        ..Default::default()
    };
    let updated = client_for(&server)
        .update_backup_destination(&destination)
        .await
        .unwrap();

    assert_eq!(updated.bucket, "backups-v2");
    update.assert_async().await;
}
