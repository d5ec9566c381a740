//! Compose stack operations.
//!
//! Creation follows the same two-phase pattern as applications: the create
//! endpoint accepts only a minimal field set, so the git or raw-file source
//! configuration lands in a follow-up update.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::application::Provisioned;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::http::DokployClient;
use crate::shape::{self, Identified, Parsed};

/// A docker-compose stack.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Compose {
    /// Remote identifier.
    #[serde(rename = "composeId")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// App name Dokploy derives container and volume names from.
    pub app_name: String,
    /// Owning project.
    pub project_id: String,
    /// Owning environment.
    pub environment_id: String,
    /// Inline compose file content, for `raw` sources.
    pub compose_file: String,
    /// Path to the compose file inside a git checkout.
    pub compose_path: String,
    /// Source kind: `github`, `git`, or `raw`. Defaulted when empty.
    pub source_type: String,
    /// Custom git remote URL.
    pub custom_git_url: String,
    /// Custom git branch.
    pub custom_git_branch: String,
    /// SSH key used for the custom git remote.
    #[serde(rename = "customGitSSHKeyId")]
    pub custom_git_ssh_key_id: String,
    /// Whether pushes trigger deployments.
    pub auto_deploy: bool,
    /// Environment blob (mutated only via the merge loop).
    pub env: String,
    /// Attached domains.
    pub domains: Vec<Domain>,
}

impl Identified for Compose {
    fn primary_id(&self) -> &str {
        &self.id
    }
}

/// Creation request.
#[derive(Debug, Clone, Default)]
pub struct NewCompose {
    /// Desired configuration; `compose.id` is ignored.
    pub compose: Compose,
    /// Trigger a deployment after provisioning, unless auto-deploy already
    /// implies one.
    pub deploy_on_create: bool,
}

/// Phase-2 / update payload. The source type default depends on which source
/// fields are populated: a custom git URL means `git`, an inline compose file
/// means `raw`, otherwise `github`.
fn configure_payload(id: &str, compose: &Compose) -> Value {
    let source_type = if compose.source_type.is_empty() {
        if !compose.custom_git_url.is_empty() {
            "git"
        } else if !compose.compose_file.is_empty() {
            "raw"
        } else {
            "github"
        }
    } else {
        &compose.source_type
    };

    let mut payload = json!({
        "composeId": id,
        "name": compose.name,
        "sourceType": source_type,
        "autoDeploy": compose.auto_deploy,
    });
    for (key, value) in [
        ("customGitUrl", &compose.custom_git_url),
        ("customGitBranch", &compose.custom_git_branch),
        ("customGitSSHKeyId", &compose.custom_git_ssh_key_id),
        ("composePath", &compose.compose_path),
        ("composeFile", &compose.compose_file),
        ("environmentId", &compose.environment_id),
    ] {
        if !value.is_empty() {
            payload[key] = json!(value);
        }
    }
    payload
}

impl DokployClient {
    /// Creates and configures a compose stack.
    ///
    /// A phase-2 failure returns [`Error::PartialProvisioning`] carrying the
    /// phase-1 identifier; the stack is never rolled back automatically.
    pub async fn create_compose(&self, req: &NewCompose) -> Result<Provisioned<Compose>> {
        let compose = &req.compose;

        let mut payload = json!({
            "environmentId": compose.environment_id,
            "name": compose.name,
            "composeType": "docker-compose",
            "appName": compose.name,
        });
        if !compose.compose_file.is_empty() {
            payload["composeFile"] = json!(compose.compose_file);
        }
        let raw = self.post("compose.create", &payload).await?;
        let created = match shape::parse_entity::<Compose>(&raw, "compose")? {
            Parsed::Entity(created) => created,
            Parsed::Ack => self.resolve_created_compose(compose).await?,
        };

        let configure = configure_payload(&created.id, compose);
        let entity = match self.post("compose.update", &configure).await {
            Ok(raw) if raw.trim() == "true" => self.get_compose(&created.id).await?,
            Ok(raw) => match shape::parse_entity::<Compose>(&raw, "compose") {
                Ok(Parsed::Entity(updated)) => updated,
                _ => created,
            },
            Err(err) => {
                return Err(Error::PartialProvisioning {
                    kind: "compose",
                    id: created.id,
                    source: Box::new(err),
                })
            }
        };

        let mut warnings = Vec::new();
        if req.deploy_on_create && !entity.auto_deploy {
            if let Err(err) = self.deploy_compose(&entity.id).await {
                warn!(%err, compose = %entity.id, "deploy-on-create trigger failed");
                warnings.push(format!(
                    "compose {} created but deployment failed to trigger: {err}",
                    entity.id
                ));
            }
        }

        Ok(Provisioned { entity, warnings })
    }

    /// Ack-only phase-1 recovery through the parent project.
    async fn resolve_created_compose(&self, compose: &Compose) -> Result<Compose> {
        if compose.project_id.is_empty() {
            return Err(Error::NotFoundAfterCreate {
                kind: "compose",
                name: compose.name.clone(),
            });
        }
        let project = self.get_project(&compose.project_id).await?;
        project
            .environments
            .iter()
            .filter(|env| compose.environment_id.is_empty() || env.id == compose.environment_id)
            .flat_map(|env| env.compose.iter())
            .find(|candidate| candidate.name == compose.name)
            .cloned()
            .ok_or_else(|| Error::NotFoundAfterCreate {
                kind: "compose",
                name: compose.name.clone(),
            })
    }

    /// Fetches a compose stack.
    pub async fn get_compose(&self, id: &str) -> Result<Compose> {
        let raw = self.get(&format!("compose.one?composeId={id}")).await?;
        shape::require_entity(shape::parse_entity(&raw, "compose")?, "compose")
    }

    /// Updates a compose stack's configuration.
    pub async fn update_compose(&self, compose: &Compose) -> Result<Compose> {
        let payload = configure_payload(&compose.id, compose);
        let raw = self.post("compose.update", &payload).await?;
        match shape::parse_entity(&raw, "compose")? {
            Parsed::Entity(updated) => Ok(updated),
            Parsed::Ack => self.get_compose(&compose.id).await,
        }
    }

    /// Deletes a compose stack: best-effort stop, then `compose.delete` with
    /// the volume flag, then the legacy `compose.remove`. If both delete
    /// calls fail the returned error aggregates both failures.
    pub async fn delete_compose(&self, id: &str, delete_volumes: bool) -> Result<()> {
        if let Err(err) = self.stop_compose(id).await {
            warn!(%err, id, "best-effort compose stop failed");
        }

        let payload = json!({ "composeId": id, "deleteVolumes": delete_volumes });
        let primary = match self.post("compose.delete", &payload).await {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };

        // Older platform versions only expose compose.remove, which cannot
        // carry the volume flag.
        let fallback_payload = json!({ "composeId": id });
        match self.post("compose.remove", &fallback_payload).await {
            Ok(_) => Ok(()),
            Err(fallback) => Err(Error::DeleteChain {
                primary: Box::new(primary),
                fallback: Box::new(fallback),
            }),
        }
    }

    /// Triggers a deployment.
    pub async fn deploy_compose(&self, id: &str) -> Result<()> {
        self.post("compose.deploy", &json!({ "composeId": id }))
            .await?;
        Ok(())
    }

    /// Stops the running stack.
    pub async fn stop_compose(&self, id: &str) -> Result<()> {
        self.post("compose.stop", &json!({ "composeId": id }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_type_default_order() {
        let git = Compose {
            custom_git_url: "git@git.example.com:me/stack.git".into(),
            compose_file: "services: {}".into(),
            ..Default::default()
        };
        assert_eq!(configure_payload("c1", &git)["sourceType"], "git");

        let raw = Compose {
            compose_file: "services: {}".into(),
            ..Default::default()
        };
        assert_eq!(configure_payload("c1", &raw)["sourceType"], "raw");

        assert_eq!(
            configure_payload("c1", &Compose::default())["sourceType"],
            "github"
        );

        let explicit = Compose {
            source_type: "raw".into(),
            custom_git_url: "git@git.example.com:me/stack.git".into(),
            ..Default::default()
        };
        assert_eq!(configure_payload("c1", &explicit)["sourceType"], "raw");
    }

    #[test]
    fn empty_source_fields_are_omitted() {
        let payload = configure_payload("c1", &Compose::default());
        assert!(payload.get("customGitUrl").is_none());
        assert!(payload.get("composeFile").is_none());
        assert!(payload.get("composePath").is_none());
    }
}
