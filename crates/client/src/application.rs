//! Application operations.
//!
//! Dokploy's `application.create` only accepts a minimal field subset, so
//! creation is two-phase: minimal create, then a full-configuration update.
//! Requested ports, mounts, and the GitHub provider linkage are applied as
//! auxiliary calls after phase 2; their failures downgrade to warnings
//! because the application itself is already durable.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::http::DokployClient;
use crate::mount::{Mount, MountOwner};
use crate::port::Port;
use crate::shape::{self, Identified, Parsed};

/// A deployable application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Application {
    /// Remote identifier.
    #[serde(rename = "applicationId")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Owning project.
    pub project_id: String,
    /// Owning environment.
    pub environment_id: String,
    /// Source repository URL (platform-native hosting).
    #[serde(rename = "repository")]
    pub repository_url: String,
    /// Branch to build.
    pub branch: String,
    /// Build strategy (`nixpacks`, `dockerfile`, ...).
    pub build_type: String,
    /// Dockerfile path for `dockerfile` builds.
    #[serde(rename = "dockerfile")]
    pub dockerfile_path: String,
    /// Docker build context path.
    pub docker_context_path: String,
    /// Multi-stage build target.
    pub docker_build_stage: String,
    /// Environment blob (mutated only via the merge loop).
    pub env: String,
    /// Attached domains.
    pub domains: Vec<Domain>,
    /// Attached mounts.
    pub mounts: Vec<Mount>,
    /// Whether pushes trigger deployments.
    pub auto_deploy: bool,
    /// Source kind: `github`, `git`, `docker`, ... Defaulted when empty.
    pub source_type: String,
    /// Custom git remote URL.
    pub custom_git_url: String,
    /// Custom git branch.
    pub custom_git_branch: String,
    /// SSH key used for the custom git remote.
    #[serde(rename = "customGitSSHKeyId")]
    pub custom_git_ssh_key_id: String,
    /// Build path inside the custom git checkout.
    pub custom_git_build_path: String,
    /// HTTP auth user for the custom git remote.
    pub username: String,
    /// HTTP auth password for the custom git remote.
    pub password: String,
    /// GitHub-integration repository name.
    pub github_repository: String,
    /// GitHub-integration repository owner.
    #[serde(rename = "owner")]
    pub github_owner: String,
    /// GitHub-integration branch.
    pub github_branch: String,
    /// GitHub-integration build path.
    #[serde(rename = "buildPath")]
    pub github_build_path: String,
    /// Identifier of the linked GitHub app installation.
    pub github_id: String,
    /// Paths that gate webhook-triggered deploys.
    #[serde(rename = "watchPaths")]
    pub github_watch_paths: Vec<String>,
    /// Whether submodules are fetched.
    pub enable_submodules: bool,
    /// Webhook trigger kind (`push`, `tag`).
    pub trigger_type: String,
    /// Preview deployments toggle; each preview field is independently
    /// optional and omitted from payloads when unset.
    pub is_preview_deployments_active: Option<bool>,
    /// Wildcard domain used for preview deployments.
    pub preview_wildcard: String,
    /// Preview container port.
    pub preview_port: Option<i64>,
    /// Preview path prefix.
    pub preview_path: String,
    /// TLS for preview domains.
    pub preview_https: Option<bool>,
    /// Preview certificate mode.
    pub preview_certificate_type: String,
    /// Custom certificate resolver for previews.
    pub preview_custom_cert_resolver: String,
    /// Maximum number of simultaneous previews.
    pub preview_limit: Option<i64>,
    /// Restrict previews to collaborators.
    pub preview_require_collaborator_permissions: Option<bool>,
    /// Preview env blob.
    pub preview_env: String,
    /// Preview build args blob.
    pub preview_build_args: String,
    /// Extra labels stamped on preview containers.
    pub preview_labels: Vec<String>,
}

impl Identified for Application {
    fn primary_id(&self) -> &str {
        &self.id
    }
}

/// Creation request: the desired application plus sub-resources provisioned
/// right after it.
#[derive(Debug, Clone, Default)]
pub struct NewApplication {
    /// Desired configuration; `app.id` is ignored.
    pub app: Application,
    /// Ports to create once the application exists (`application_id` is
    /// filled in automatically).
    pub ports: Vec<Port>,
    /// Mounts to create once the application exists.
    pub mounts: Vec<Mount>,
    /// Trigger a deployment after provisioning completes.
    pub deploy_on_create: bool,
}

/// A successfully provisioned entity plus non-fatal warnings from auxiliary
/// configuration steps. Warnings never imply the entity is missing.
#[derive(Debug, Clone)]
pub struct Provisioned<T> {
    /// The provisioned entity.
    pub entity: T,
    /// Human-readable descriptions of auxiliary steps that failed.
    pub warnings: Vec<String>,
}

fn insert_if_present(payload: &mut Value, key: &str, value: &str) {
    if !value.is_empty() {
        payload[key] = json!(value);
    }
}

/// Phase-2 / update payload. Empty optional fields are omitted entirely so
/// the platform's defaults are not overwritten with empty strings.
fn configure_payload(id: &str, app: &Application, auto_deploy: bool) -> Value {
    let source_type = if app.source_type.is_empty() {
        if app.custom_git_url.is_empty() {
            "github"
        } else {
            "git"
        }
    } else {
        &app.source_type
    };

    let mut payload = json!({
        "applicationId": id,
        "name": app.name,
        "branch": app.branch,
        "buildType": app.build_type,
        "sourceType": source_type,
        "autoDeploy": auto_deploy,
    });

    insert_if_present(&mut payload, "repository", &app.repository_url);
    insert_if_present(&mut payload, "dockerfile", &app.dockerfile_path);
    insert_if_present(&mut payload, "dockerContextPath", &app.docker_context_path);
    insert_if_present(&mut payload, "dockerBuildStage", &app.docker_build_stage);
    insert_if_present(&mut payload, "customGitUrl", &app.custom_git_url);
    insert_if_present(&mut payload, "customGitBranch", &app.custom_git_branch);
    insert_if_present(&mut payload, "customGitSSHKeyId", &app.custom_git_ssh_key_id);
    insert_if_present(&mut payload, "customGitBuildPath", &app.custom_git_build_path);
    insert_if_present(&mut payload, "username", &app.username);
    insert_if_present(&mut payload, "password", &app.password);
    insert_if_present(&mut payload, "environmentId", &app.environment_id);

    if let Some(active) = app.is_preview_deployments_active {
        payload["isPreviewDeploymentsActive"] = json!(active);
    }
    insert_if_present(&mut payload, "previewWildcard", &app.preview_wildcard);
    if let Some(port) = app.preview_port {
        payload["previewPort"] = json!(port);
    }
    insert_if_present(&mut payload, "previewPath", &app.preview_path);
    if let Some(https) = app.preview_https {
        payload["previewHttps"] = json!(https);
    }
    insert_if_present(
        &mut payload,
        "previewCertificateType",
        &app.preview_certificate_type,
    );
    insert_if_present(
        &mut payload,
        "previewCustomCertResolver",
        &app.preview_custom_cert_resolver,
    );
    if let Some(limit) = app.preview_limit {
        payload["previewLimit"] = json!(limit);
    }
    if let Some(require) = app.preview_require_collaborator_permissions {
        payload["previewRequireCollaboratorPermissions"] = json!(require);
    }
    insert_if_present(&mut payload, "previewEnv", &app.preview_env);
    insert_if_present(&mut payload, "previewBuildArgs", &app.preview_build_args);
    if !app.preview_labels.is_empty() {
        payload["previewLabels"] = json!(app.preview_labels);
    }

    payload
}

impl DokployClient {
    /// Creates and fully configures an application.
    ///
    /// Phase 1 submits only name and environment; phase 2 applies the full
    /// configuration. A phase-2 failure returns
    /// [`Error::PartialProvisioning`] carrying the phase-1 identifier; the
    /// created application is never rolled back automatically. When ports or
    /// mounts are requested together with `auto_deploy`, the application is
    /// created with auto-deploy disabled and it is enabled by a follow-up
    /// update once the sub-resources exist.
    pub async fn create_application(
        &self,
        req: &NewApplication,
    ) -> Result<Provisioned<Application>> {
        let app = &req.app;
        let has_subresources = !req.ports.is_empty() || !req.mounts.is_empty();
        let defer_auto_deploy = has_subresources && app.auto_deploy;

        // Phase 1: minimal create.
        let payload = json!({ "name": app.name, "environmentId": app.environment_id });
        let raw = self.post("application.create", &payload).await?;
        let created = match shape::parse_entity::<Application>(&raw, "application")? {
            Parsed::Entity(created) => created,
            Parsed::Ack => self.resolve_created_application(app).await?,
        };

        // Phase 2: full configuration.
        let auto_deploy = app.auto_deploy && !defer_auto_deploy;
        let configure = configure_payload(&created.id, app, auto_deploy);
        let mut entity = match self.post("application.update", &configure).await {
            Ok(raw) if raw.trim() == "true" => self.get_application(&created.id).await?,
            Ok(raw) => match shape::parse_entity::<Application>(&raw, "application") {
                Ok(Parsed::Entity(updated)) => updated,
                _ => created,
            },
            Err(err) => {
                return Err(Error::PartialProvisioning {
                    kind: "application",
                    id: created.id,
                    source: Box::new(err),
                })
            }
        };

        let mut warnings = Vec::new();

        for (i, port) in req.ports.iter().enumerate() {
            let mut port = port.clone();
            port.application_id = entity.id.clone();
            if let Err(err) = self.create_port(&port).await {
                warn!(%err, application = %entity.id, "port creation failed");
                warnings.push(format!(
                    "failed creating ports[{i}] for application {}: {err}",
                    entity.id
                ));
            }
        }
        for (i, mount) in req.mounts.iter().enumerate() {
            let owner = MountOwner::Application(entity.id.clone());
            if let Err(err) = self.create_mount(&owner, mount).await {
                warn!(%err, application = %entity.id, "mount creation failed");
                warnings.push(format!(
                    "failed creating mounts[{i}] for application {}: {err}",
                    entity.id
                ));
            }
        }

        if !app.github_id.is_empty() {
            if let Err(err) = self.save_github_provider(&entity.id, app).await {
                warn!(%err, application = %entity.id, "GitHub provider setup failed");
                warnings.push(format!(
                    "application {} created but GitHub provider configuration failed: {err}",
                    entity.id
                ));
            }
        }

        if defer_auto_deploy {
            let mut enabled = app.clone();
            enabled.id = entity.id.clone();
            enabled.auto_deploy = true;
            match self.update_application(&enabled).await {
                Ok(updated) => entity = updated,
                Err(err) => {
                    warn!(%err, application = %entity.id, "enabling auto-deploy failed");
                    warnings.push(format!(
                        "application {} and sub-resources created, but enabling auto-deploy failed: {err}",
                        entity.id
                    ));
                }
            }
        }

        // A deferred auto-deploy that was just enabled already implies a
        // deployment; avoid triggering a duplicate.
        let implies_deploy = has_subresources && entity.auto_deploy;
        if req.deploy_on_create && !implies_deploy {
            if let Err(err) = self.deploy_application(&entity.id).await {
                warn!(%err, application = %entity.id, "deploy-on-create trigger failed");
                warnings.push(format!(
                    "application {} created but deployment failed to trigger: {err}",
                    entity.id
                ));
            }
        }

        Ok(Provisioned { entity, warnings })
    }

    /// Ack-only phase-1 recovery: scan the owning environment's application
    /// list by name through the parent project.
    async fn resolve_created_application(&self, app: &Application) -> Result<Application> {
        if app.project_id.is_empty() {
            return Err(Error::NotFoundAfterCreate {
                kind: "application",
                name: app.name.clone(),
            });
        }
        let project = self.get_project(&app.project_id).await?;
        project
            .environments
            .iter()
            .filter(|env| app.environment_id.is_empty() || env.id == app.environment_id)
            .flat_map(|env| env.applications.iter())
            .find(|candidate| candidate.name == app.name)
            .cloned()
            .ok_or_else(|| Error::NotFoundAfterCreate {
                kind: "application",
                name: app.name.clone(),
            })
    }

    /// Fetches an application.
    pub async fn get_application(&self, id: &str) -> Result<Application> {
        let raw = self
            .get(&format!("application.one?applicationId={id}"))
            .await?;
        shape::require_entity(shape::parse_entity(&raw, "application")?, "application")
    }

    /// Updates an application's configuration. Empty optional fields are
    /// omitted from the payload.
    pub async fn update_application(&self, app: &Application) -> Result<Application> {
        let payload = configure_payload(&app.id, app, app.auto_deploy);
        let raw = self.post("application.update", &payload).await?;
        match shape::parse_entity(&raw, "application")? {
            Parsed::Entity(updated) => Ok(updated),
            Parsed::Ack => self.get_application(&app.id).await,
        }
    }

    /// Deletes an application: best-effort stop, then the current delete
    /// endpoint, then the legacy remove endpoint. If both delete calls fail
    /// the returned error aggregates both failures.
    pub async fn delete_application(&self, id: &str) -> Result<()> {
        if let Err(err) = self.stop_application(id).await {
            warn!(%err, id, "best-effort application stop failed");
        }

        let payload = json!({ "applicationId": id });
        let primary = match self.post("application.delete", &payload).await {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };

        // Older platform versions only expose application.remove.
        match self.post("application.remove", &payload).await {
            Ok(_) => Ok(()),
            Err(fallback) => Err(Error::DeleteChain {
                primary: Box::new(primary),
                fallback: Box::new(fallback),
            }),
        }
    }

    /// Triggers a deployment.
    pub async fn deploy_application(&self, id: &str) -> Result<()> {
        self.post("application.deploy", &json!({ "applicationId": id }))
            .await?;
        Ok(())
    }

    /// Stops the running application.
    pub async fn stop_application(&self, id: &str) -> Result<()> {
        self.post("application.stop", &json!({ "applicationId": id }))
            .await?;
        Ok(())
    }

    /// Attaches or refreshes the GitHub provider linkage.
    pub async fn save_github_provider(&self, id: &str, app: &Application) -> Result<()> {
        let mut payload = json!({
            "applicationId": id,
            "enableSubmodules": app.enable_submodules,
            "githubId": app.github_id,
        });
        insert_if_present(&mut payload, "repository", &app.github_repository);
        insert_if_present(&mut payload, "branch", &app.github_branch);
        insert_if_present(&mut payload, "owner", &app.github_owner);
        insert_if_present(&mut payload, "buildPath", &app.github_build_path);
        payload["triggerType"] = if app.trigger_type.is_empty() {
            json!("push")
        } else {
            json!(app.trigger_type)
        };
        if !app.github_watch_paths.is_empty() {
            payload["watchPaths"] = json!(app.github_watch_paths);
        }
        self.post("application.saveGithubProvider", &payload).await?;
        Ok(())
    }
}
