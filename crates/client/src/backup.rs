//! Backup destination operations.
//!
//! Destination payloads are the worst offender for wire-name drift: platform
//! versions disagree on `accessKey` vs `accessKeyId`, `secretKey` vs
//! `secretAccessKey`, and `provider` vs `type`. All inbound synonyms are
//! accepted and folded into the canonical fields; outbound payloads only use
//! the canonical names.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::http::DokployClient;
use crate::shape::{self, Identified, Parsed};

/// An S3-compatible backup destination.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BackupDestination {
    /// Remote identifier.
    #[serde(rename = "destinationId")]
    pub id: String,
    /// Display name, unique per organization.
    pub name: String,
    /// Destination type; defaults to `s3` when left empty.
    pub provider: String,
    /// Bucket name.
    pub bucket: String,
    /// Bucket region.
    pub region: String,
    /// S3 endpoint hostname or URL.
    pub endpoint: String,
    /// Access key id (canonical wire name `accessKey`).
    pub access_key: String,
    /// Secret key (canonical wire name `secretKey`).
    pub secret_key: String,

    // Inbound-only synonym fields, folded into the canonical ones by
    // `normalized`.
    #[serde(rename = "type", skip_serializing)]
    pub kind: String,
    #[serde(skip_serializing)]
    pub access_key_id: String,
    #[serde(skip_serializing)]
    pub secret_access_key: String,
}

impl BackupDestination {
    /// Collapses whichever synonym the platform answered with into the
    /// canonical field. Canonical values win when both are present.
    fn normalized(mut self) -> Self {
        if self.provider.trim().is_empty() {
            self.provider = std::mem::take(&mut self.kind);
        }
        if self.access_key.trim().is_empty() {
            self.access_key = std::mem::take(&mut self.access_key_id);
        }
        if self.secret_key.trim().is_empty() {
            self.secret_key = std::mem::take(&mut self.secret_access_key);
        }
        self.kind.clear();
        self.access_key_id.clear();
        self.secret_access_key.clear();
        self
    }
}

impl Identified for BackupDestination {
    fn primary_id(&self) -> &str {
        &self.id
    }
}

fn destination_payload(destination: &BackupDestination) -> serde_json::Value {
    let provider = if destination.provider.trim().is_empty() {
        "s3"
    } else {
        destination.provider.trim()
    };
    json!({
        "name": destination.name,
        "provider": provider,
        "bucket": destination.bucket,
        "region": destination.region,
        "endpoint": destination.endpoint,
        "accessKey": destination.access_key,
        "secretKey": destination.secret_key,
    })
}

impl DokployClient {
    /// Creates a backup destination. `destination.id` is ignored; an
    /// ack-only answer is resolved by listing destinations and matching the
    /// exact name.
    pub async fn create_backup_destination(
        &self,
        destination: &BackupDestination,
    ) -> Result<BackupDestination> {
        let payload = destination_payload(destination);
        let raw = self.post("destination.create", &payload).await?;
        if raw.trim().is_empty() {
            return self.find_backup_destination_by_name(&destination.name).await;
        }
        match shape::parse_entity::<BackupDestination>(&raw, "destination")? {
            Parsed::Entity(created) => Ok(created.normalized()),
            Parsed::Ack => self.find_backup_destination_by_name(&destination.name).await,
        }
    }

    /// Fetches a backup destination.
    pub async fn get_backup_destination(&self, id: &str) -> Result<BackupDestination> {
        let raw = self
            .get(&format!("destination.one?destinationId={id}"))
            .await?;
        let destination: BackupDestination =
            shape::require_entity(shape::parse_entity(&raw, "destination")?, "destination")?;
        Ok(destination.normalized())
    }

    /// Lists all backup destinations.
    pub async fn list_backup_destinations(&self) -> Result<Vec<BackupDestination>> {
        let raw = self.get("destination.all").await?;
        let list: Vec<BackupDestination> = shape::parse_list(&raw, "destinations")?;
        Ok(list.into_iter().map(BackupDestination::normalized).collect())
    }

    /// List-and-match resolution by exact name.
    pub async fn find_backup_destination_by_name(&self, name: &str) -> Result<BackupDestination> {
        let destinations = self.list_backup_destinations().await?;
        destinations
            .into_iter()
            .find(|destination| destination.name == name)
            .ok_or_else(|| Error::NotFoundAfterCreate {
                kind: "backup destination",
                name: name.to_string(),
            })
    }

    /// Updates a backup destination.
    pub async fn update_backup_destination(
        &self,
        destination: &BackupDestination,
    ) -> Result<BackupDestination> {
        let mut payload = destination_payload(destination);
        payload["destinationId"] = json!(destination.id);
        let raw = self.post("destination.update", &payload).await?;
        match shape::parse_entity::<BackupDestination>(&raw, "destination")? {
            Parsed::Entity(updated) => Ok(updated.normalized()),
            Parsed::Ack => self.get_backup_destination(&destination.id).await,
        }
    }

    /// Deletes a backup destination.
    pub async fn delete_backup_destination(&self, id: &str) -> Result<()> {
        self.post("destination.remove", &json!({ "destinationId": id }))
            .await?;
        Ok(())
    }
}
