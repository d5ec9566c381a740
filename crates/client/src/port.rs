//! Application port bindings.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::http::DokployClient;
use crate::shape::{self, Identified};

/// A published port on an application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Port {
    /// Remote identifier.
    #[serde(rename = "portId")]
    pub id: String,
    /// Owning application.
    pub application_id: String,
    /// Host-side port.
    pub published_port: i64,
    /// Container-side port.
    pub target_port: i64,
    /// `tcp` or `udp`; defaults to `tcp` when left empty.
    pub protocol: String,
    /// Swarm publish mode; defaults to `ingress` when left empty.
    pub publish_mode: String,
}

impl Identified for Port {
    fn primary_id(&self) -> &str {
        &self.id
    }
}

pub(crate) fn default_protocol(protocol: &str) -> &str {
    let protocol = protocol.trim();
    if protocol.is_empty() {
        "tcp"
    } else {
        protocol
    }
}

pub(crate) fn default_publish_mode(mode: &str) -> &str {
    let mode = mode.trim();
    if mode.is_empty() {
        "ingress"
    } else {
        mode
    }
}

impl DokployClient {
    /// Creates a port binding. `port.id` is ignored; empty protocol and
    /// publish mode fall back to `tcp`/`ingress`.
    pub async fn create_port(&self, port: &Port) -> Result<Port> {
        let payload = json!({
            "applicationId": port.application_id,
            "publishedPort": port.published_port,
            "targetPort": port.target_port,
            "protocol": default_protocol(&port.protocol),
            "publishMode": default_publish_mode(&port.publish_mode),
        });
        let raw = self.post("port.create", &payload).await?;
        shape::require_entity(shape::parse_entity(&raw, "port")?, "port")
    }

    /// Fetches a port binding.
    pub async fn get_port(&self, id: &str) -> Result<Port> {
        let raw = self.get(&format!("port.one?portId={id}")).await?;
        shape::require_entity(shape::parse_entity(&raw, "port")?, "port")
    }

    /// Updates a port binding.
    pub async fn update_port(&self, port: &Port) -> Result<Port> {
        let payload = json!({
            "portId": port.id,
            "publishedPort": port.published_port,
            "targetPort": port.target_port,
            "protocol": default_protocol(&port.protocol),
            "publishMode": default_publish_mode(&port.publish_mode),
        });
        let raw = self.post("port.update", &payload).await?;
        shape::require_entity(shape::parse_entity(&raw, "port")?, "port")
    }

    /// Deletes a port binding.
    pub async fn delete_port(&self, id: &str) -> Result<()> {
        let payload = json!({ "portId": id });
        self.post("port.remove", &payload).await?;
        Ok(())
    }
}
