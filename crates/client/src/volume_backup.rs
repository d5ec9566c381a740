//! Scheduled volume backups for compose services.
//!
//! Dokploy names compose volumes `<appName>_<volumeName>` on the wire. The
//! client always submits the prefixed form (without double-prefixing input
//! that already carries it) and [`VolumeBackup::logical_volume_name`] strips
//! the prefix back off for comparison against desired state. The enabled
//! state is doubly encoded: some platform calls use `enabled`, others an
//! inverted `turnOff` flag.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::http::DokployClient;
use crate::shape::{self, Identified, Parsed};

pub(crate) const DEFAULT_CRON: &str = "0 3 * * *";
pub(crate) const DEFAULT_KEEP_LATEST: i64 = 14;

/// A scheduled backup of one compose service volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct VolumeBackup {
    /// Remote identifier.
    #[serde(rename = "volumeBackupId")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning compose stack.
    pub compose_id: String,
    /// Compose app name; the wire volume name is derived from it.
    pub app_name: String,
    /// Compose service owning the volume.
    pub service_name: String,
    /// Wire volume name, `<appName>_<volumeName>`.
    pub volume_name: String,
    /// Backup destination.
    pub destination_id: String,
    /// Schedule; defaults to `0 3 * * *` when left empty.
    pub cron_expression: String,
    /// Artifact name prefix.
    pub prefix: String,
    /// Most recent backups kept; defaults to 14 when unset.
    pub keep_latest_count: Option<i64>,
    /// Enabled flag, as some platform versions report it.
    pub enabled: Option<bool>,
    /// Inverted enabled flag, as other platform versions report it. Takes
    /// priority over `enabled` when set.
    pub turn_off: Option<bool>,
}

impl VolumeBackup {
    /// Effective enabled state across both wire encodings.
    pub fn is_enabled(&self) -> bool {
        if self.turn_off == Some(true) {
            return false;
        }
        self.enabled.unwrap_or(true)
    }

    /// Volume name without the `<appName>_` prefix.
    pub fn logical_volume_name(&self) -> &str {
        strip_volume_prefix(&self.app_name, &self.volume_name)
    }
}

impl Identified for VolumeBackup {
    fn primary_id(&self) -> &str {
        &self.id
    }
}

/// Wire form of a compose volume name. Input already carrying the prefix is
/// returned unchanged.
pub(crate) fn prefixed_volume_name(app_name: &str, volume_name: &str) -> String {
    let app_name = app_name.trim();
    let volume_name = volume_name.trim();
    if app_name.is_empty() || volume_name.is_empty() {
        return volume_name.to_string();
    }
    let prefix = format!("{app_name}_");
    if volume_name.starts_with(&prefix) {
        volume_name.to_string()
    } else {
        format!("{prefix}{volume_name}")
    }
}

/// Logical form of a compose volume name.
pub(crate) fn strip_volume_prefix<'a>(app_name: &str, volume_name: &'a str) -> &'a str {
    let app_name = app_name.trim();
    let volume_name = volume_name.trim();
    if app_name.is_empty() || volume_name.is_empty() {
        return volume_name;
    }
    volume_name
        .strip_prefix(&format!("{app_name}_"))
        .unwrap_or(volume_name)
}

fn backup_payload(backup: &VolumeBackup) -> serde_json::Value {
    let cron = if backup.cron_expression.trim().is_empty() {
        DEFAULT_CRON
    } else {
        backup.cron_expression.trim()
    };
    let enabled = backup.is_enabled();
    json!({
        "name": backup.name,
        "serviceType": "compose",
        "composeId": backup.compose_id,
        "appName": backup.app_name,
        "serviceName": backup.service_name,
        "volumeName": prefixed_volume_name(&backup.app_name, &backup.volume_name),
        "destinationId": backup.destination_id,
        "cronExpression": cron,
        "prefix": backup.prefix,
        "keepLatestCount": backup.keep_latest_count.unwrap_or(DEFAULT_KEEP_LATEST),
        "enabled": enabled,
        "turnOff": !enabled,
    })
}

impl DokployClient {
    /// Schedules a volume backup. `backup.id` is ignored. When the app name
    /// is empty it is resolved from the owning compose stack first.
    pub async fn create_volume_backup(&self, backup: &VolumeBackup) -> Result<VolumeBackup> {
        let mut backup = backup.clone();
        if backup.app_name.trim().is_empty() {
            backup.app_name = self.resolve_compose_app_name(&backup.compose_id).await?;
        }
        let payload = backup_payload(&backup);
        let raw = self.post("volumeBackups.create", &payload).await?;
        match shape::parse_entity::<VolumeBackup>(&raw, "volumeBackup")? {
            Parsed::Entity(created) => Ok(created),
            Parsed::Ack => Err(Error::NotFoundAfterCreate {
                kind: "volume backup",
                name: backup.name.clone(),
            }),
        }
    }

    async fn resolve_compose_app_name(&self, compose_id: &str) -> Result<String> {
        let compose = self.get_compose(compose_id).await?;
        if !compose.app_name.trim().is_empty() {
            Ok(compose.app_name.trim().to_string())
        } else {
            Ok(compose.name.trim().to_string())
        }
    }

    /// Fetches a volume backup.
    pub async fn get_volume_backup(&self, id: &str) -> Result<VolumeBackup> {
        let raw = self
            .get(&format!("volumeBackups.one?volumeBackupId={id}"))
            .await?;
        shape::require_entity(shape::parse_entity(&raw, "volumeBackup")?, "volumeBackup")
    }

    /// Updates a volume backup's schedule and target.
    pub async fn update_volume_backup(&self, backup: &VolumeBackup) -> Result<VolumeBackup> {
        let mut backup = backup.clone();
        if backup.app_name.trim().is_empty() {
            backup.app_name = self.resolve_compose_app_name(&backup.compose_id).await?;
        }
        let mut payload = backup_payload(&backup);
        payload["volumeBackupId"] = json!(backup.id);
        let raw = self.post("volumeBackups.update", &payload).await?;
        match shape::parse_entity::<VolumeBackup>(&raw, "volumeBackup")? {
            Parsed::Entity(updated) => Ok(updated),
            Parsed::Ack => self.get_volume_backup(&backup.id).await,
        }
    }

    /// Deletes a volume backup.
    pub async fn delete_volume_backup(&self, id: &str) -> Result<()> {
        self.post("volumeBackups.delete", &json!({ "volumeBackupId": id }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_name_is_prefixed_once() {
        assert_eq!(prefixed_volume_name("ghost-1", "data"), "ghost-1_data");
        assert_eq!(prefixed_volume_name("ghost-1", "ghost-1_data"), "ghost-1_data");
        assert_eq!(prefixed_volume_name("", "data"), "data");
    }

    #[test]
    fn logical_name_strips_prefix() {
        assert_eq!(strip_volume_prefix("ghost-1", "ghost-1_data"), "data");
        assert_eq!(strip_volume_prefix("ghost-1", "data"), "data");
        assert_eq!(strip_volume_prefix("", "ghost-1_data"), "ghost-1_data");
    }

    #[test]
    fn turn_off_wins_over_enabled() {
        let backup = VolumeBackup {
            enabled: Some(true),
            turn_off: Some(true),
            ..Default::default()
        };
        assert!(!backup.is_enabled());

        let backup = VolumeBackup {
            enabled: Some(false),
            turn_off: Some(false),
            ..Default::default()
        };
        assert!(!backup.is_enabled());

        assert!(VolumeBackup::default().is_enabled());
    }

    #[test]
    fn payload_defaults_and_inverted_flag() {
        let backup = VolumeBackup {
            name: "nightly".into(),
            compose_id: "comp-1".into(),
            app_name: "ghost-1".into(),
            service_name: "ghost".into(),
            volume_name: "data".into(),
            destination_id: "dest-1".into(),
            ..Default::default()
        };
        let payload = backup_payload(&backup);
        assert_eq!(payload["cronExpression"], "0 3 * * *");
        assert_eq!(payload["keepLatestCount"], 14);
        assert_eq!(payload["enabled"], true);
        assert_eq!(payload["turnOff"], false);
        assert_eq!(payload["volumeName"], "ghost-1_data");
        assert_eq!(payload["serviceType"], "compose");
    }
}
