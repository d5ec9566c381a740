//! Environment operations.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::application::Application;
use crate::compose::Compose;
use crate::database::{Database, DatabaseEngine};
use crate::error::{Error, Result};
use crate::http::DokployClient;
use crate::shape::{self, Identified};

/// An environment inside a project. Databases live in one typed list per
/// engine; applications and compose stacks are included so ack-only creates
/// can be recovered through the parent project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Environment {
    /// Remote identifier.
    #[serde(rename = "environmentId")]
    pub id: String,
    /// Display name. Dokploy treats some names (`production`) as reserved.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Owning project.
    pub project_id: String,
    /// Postgres instances in this environment.
    pub postgres: Vec<Database>,
    /// MySQL instances.
    pub mysql: Vec<Database>,
    /// MariaDB instances.
    pub mariadb: Vec<Database>,
    /// MongoDB instances.
    pub mongo: Vec<Database>,
    /// Redis instances.
    pub redis: Vec<Database>,
    /// Applications in this environment.
    pub applications: Vec<Application>,
    /// Compose stacks in this environment.
    pub compose: Vec<Compose>,
}

impl Environment {
    /// The database list for one engine family.
    pub fn databases(&self, engine: DatabaseEngine) -> &[Database] {
        match engine {
            DatabaseEngine::Postgres => &self.postgres,
            DatabaseEngine::Mysql => &self.mysql,
            DatabaseEngine::Mariadb => &self.mariadb,
            DatabaseEngine::Mongo => &self.mongo,
            DatabaseEngine::Redis => &self.redis,
        }
    }
}

impl Identified for Environment {
    fn primary_id(&self) -> &str {
        &self.id
    }
}

impl DokployClient {
    /// Creates an environment in a project.
    ///
    /// Dokploy rejects creation for reserved or duplicate names while still
    /// exposing that environment on the project, so a create failure falls
    /// back to a case-insensitive lookup in the parent before surfacing the
    /// original error.
    pub async fn create_environment(
        &self,
        project_id: &str,
        name: &str,
        description: &str,
    ) -> Result<Environment> {
        let payload = json!({
            "projectId": project_id,
            "name": name,
            "description": description,
        });
        match self.post("environment.create", &payload).await {
            Ok(raw) => match shape::parse_entity(&raw, "environment")? {
                shape::Parsed::Entity(env) => Ok(env),
                shape::Parsed::Ack => self
                    .find_environment_by_name(project_id, name)
                    .await?
                    .ok_or_else(|| Error::NotFoundAfterCreate {
                        kind: "environment",
                        name: name.to_string(),
                    }),
            },
            Err(create_err) => {
                warn!(%create_err, name, "environment create rejected, trying recovery by name");
                match self.find_environment_by_name(project_id, name).await {
                    Ok(Some(existing)) => Ok(existing),
                    _ => Err(create_err),
                }
            }
        }
    }

    /// Case-insensitive name lookup inside a project, used for reserved-name
    /// recovery and ack-only resolution.
    pub async fn find_environment_by_name(
        &self,
        project_id: &str,
        name: &str,
    ) -> Result<Option<Environment>> {
        let project = self.get_project(project_id).await?;
        Ok(project
            .environments
            .into_iter()
            .find(|env| env.name.eq_ignore_ascii_case(name)))
    }

    /// Updates an environment's name and description.
    pub async fn update_environment(&self, env: &Environment) -> Result<Environment> {
        let payload = json!({
            "environmentId": env.id,
            "name": env.name,
            "description": env.description,
            "projectId": env.project_id,
        });
        let raw = self.post("environment.update", &payload).await?;
        shape::require_entity(shape::parse_entity(&raw, "environment")?, "environment")
    }

    /// Deletes an environment.
    pub async fn delete_environment(&self, id: &str) -> Result<()> {
        let payload = json!({ "environmentId": id });
        self.post("environment.remove", &payload).await?;
        Ok(())
    }
}
