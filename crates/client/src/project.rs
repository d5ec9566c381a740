//! Project operations.
//!
//! Projects are the top-level grouping; environments (and through them, the
//! per-engine database lists) ride along on every `project.one` response,
//! which is also how nested entities are recovered after ack-only creates.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::environment::Environment;
use crate::error::Result;
use crate::http::DokployClient;
use crate::shape::{self, Identified};

/// A Dokploy project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    /// Remote identifier.
    #[serde(rename = "projectId")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Project-level environment blob (mutated only via the merge loop).
    pub env: String,
    /// Child environments, each carrying its nested service lists.
    pub environments: Vec<Environment>,
}

impl Identified for Project {
    fn primary_id(&self) -> &str {
        &self.id
    }
}

impl DokployClient {
    /// Creates a project.
    pub async fn create_project(&self, name: &str, description: &str) -> Result<Project> {
        let payload = json!({ "name": name, "description": description });
        let raw = self.post("project.create", &payload).await?;
        shape::require_entity(shape::parse_entity(&raw, "project")?, "project")
    }

    /// Fetches a project with its environments.
    pub async fn get_project(&self, id: &str) -> Result<Project> {
        let raw = self.get(&format!("project.one?projectId={id}")).await?;
        shape::require_entity(shape::parse_entity(&raw, "project")?, "project")
    }

    /// Updates name and description. The env blob is updated separately
    /// through [`DokployClient::merge_env`].
    pub async fn update_project(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<Project> {
        let payload = json!({ "projectId": id, "name": name, "description": description });
        let raw = self.post("project.update", &payload).await?;
        match shape::parse_entity(&raw, "project")? {
            shape::Parsed::Entity(project) => Ok(project),
            // Some platform versions ack the update without a payload.
            shape::Parsed::Ack => self.get_project(id).await,
        }
    }

    /// Deletes a project and everything nested under it.
    pub async fn delete_project(&self, id: &str) -> Result<()> {
        let payload = json!({ "projectId": id });
        self.post("project.remove", &payload).await?;
        Ok(())
    }
}
