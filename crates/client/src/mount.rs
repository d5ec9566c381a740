//! Volume and bind mounts.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::http::DokployClient;
use crate::shape::{self, Identified};

/// The service a mount is attached to. Exactly one owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOwner {
    /// Mounted into an application.
    Application(String),
    /// Mounted into a compose stack.
    Compose(String),
}

/// A mount attached to an application or compose stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Mount {
    /// Remote identifier.
    #[serde(rename = "mountId")]
    pub id: String,
    /// Owning application, when application-owned.
    pub application_id: String,
    /// Owning compose stack, when compose-owned.
    pub compose_id: String,
    /// `volume`, `bind`, or `file`; defaults to `volume` when left empty.
    pub mount_type: String,
    /// Path inside the container.
    pub mount_path: String,
    /// Named volume backing the mount.
    pub volume_name: String,
}

impl Identified for Mount {
    fn primary_id(&self) -> &str {
        &self.id
    }
}

pub(crate) fn default_mount_type(mount_type: &str) -> &str {
    let mount_type = mount_type.trim();
    if mount_type.is_empty() {
        "volume"
    } else {
        mount_type
    }
}

impl DokployClient {
    /// Creates a mount for the given owner. Owner fields on `mount` are
    /// ignored; `owner` is authoritative.
    pub async fn create_mount(&self, owner: &MountOwner, mount: &Mount) -> Result<Mount> {
        let mut payload = json!({
            "type": default_mount_type(&mount.mount_type),
            "mountPath": mount.mount_path,
            "volumeName": mount.volume_name,
        });
        match owner {
            MountOwner::Application(id) => {
                payload["serviceType"] = json!("application");
                payload["applicationId"] = json!(id);
            }
            MountOwner::Compose(id) => {
                payload["serviceType"] = json!("compose");
                payload["composeId"] = json!(id);
            }
        }
        let raw = self.post("mount.create", &payload).await?;
        shape::require_entity(shape::parse_entity(&raw, "mount")?, "mount")
    }

    /// Fetches a mount.
    pub async fn get_mount(&self, id: &str) -> Result<Mount> {
        let raw = self.get(&format!("mount.one?mountId={id}")).await?;
        shape::require_entity(shape::parse_entity(&raw, "mount")?, "mount")
    }

    /// Deletes a mount.
    pub async fn delete_mount(&self, id: &str) -> Result<()> {
        let payload = json!({ "mountId": id });
        self.post("mount.remove", &payload).await?;
        Ok(())
    }
}
