//! Environment-variable blobs and the optimistic merge loop.
//!
//! Dokploy stores an owner's environment variables as one opaque multi-line
//! `KEY=VALUE` text with no per-key endpoint and no version token. Correct
//! concurrent mutation therefore relies on the client-side
//! read-modify-write-verify loop in [`DokployClient::merge_env`], which is the
//! sole mutator for blob-backed state.

use serde_json::json;
use tracing::warn;

use crate::error::{Error, Result};
use crate::http::DokployClient;

/// Ordered `KEY=VALUE` mapping with a defined parse/serialize pair.
///
/// Insertion order is preserved across a parse/serialize round trip so the
/// merge loop never manufactures a conflict by reordering its own writes.
/// Callers must not rely on any particular key order surviving the remote
/// side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvBlob {
    entries: Vec<(String, String)>,
}

impl EnvBlob {
    /// Parses blob text. Blank lines and `#` comments are ignored; each
    /// remaining line splits on the first `=`.
    pub fn parse(raw: &str) -> Self {
        let mut entries = Vec::new();
        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                push_or_replace(&mut entries, key.to_string(), value.to_string());
            }
        }
        Self { entries }
    }

    /// Serializes back to one `KEY=VALUE` per line.
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets `key` in place, preserving its position when it already exists.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        push_or_replace(&mut self.entries, key.into(), value.into());
    }

    /// Removes `key`, returning the previous value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries remain.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn push_or_replace(entries: &mut Vec<(String, String)>, key: String, value: String) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

/// The entity whose blob is being addressed. Each owner kind uses a different
/// fetch and save endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvOwner {
    /// An application's `env` blob.
    Application(String),
    /// A compose stack's `env` blob.
    Compose(String),
    /// A project-level `env` blob shared by the project's services.
    Project(String),
}

impl EnvOwner {
    /// The owner's identifier.
    pub fn id(&self) -> &str {
        match self {
            EnvOwner::Application(id) | EnvOwner::Compose(id) | EnvOwner::Project(id) => id,
        }
    }
}

/// One `KEY=VALUE` line projected out of an owner's blob. Not a remote
/// entity: its id is synthesized as `<ownerId>_<key>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVariable {
    /// Synthesized identifier, `<ownerId>_<key>`.
    pub id: String,
    /// Identifier of the owning application, compose, or project.
    pub owner_id: String,
    /// Variable name.
    pub key: String,
    /// Variable value.
    pub value: String,
}

/// Splits a synthesized variable id into `(owner_id, key)`.
pub fn split_variable_id(id: &str) -> Result<(&str, &str)> {
    id.split_once('_')
        .filter(|(owner, key)| !owner.is_empty() && !key.is_empty())
        .ok_or_else(|| Error::InvalidVariableId(id.to_string()))
}

impl DokployClient {
    /// Applies `transform` to the owner's environment blob under the bounded
    /// optimistic retry loop.
    ///
    /// Each attempt fetches the current blob, transforms it, and short-circuits
    /// without a write when the result is byte-identical. Otherwise it writes,
    /// re-fetches, and treats any mismatch as a concurrent writer: back off
    /// linearly, retry from a fresh read. After `retry.max_attempts` cycles
    /// the last observed failure is returned.
    pub async fn merge_env<F>(
        &self,
        owner: &EnvOwner,
        create_env_file: Option<bool>,
        mut transform: F,
    ) -> Result<()>
    where
        F: FnMut(&mut EnvBlob),
    {
        let retry = self.cfg.retry;
        let mut last: Option<String> = None;

        for attempt in 1..=retry.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(retry.backoff_base * (attempt - 1)).await;
            }

            let original = self.fetch_env(owner).await?;
            let mut blob = EnvBlob::parse(&original);
            transform(&mut blob);
            let updated = blob.serialize();

            if updated == original {
                return Ok(());
            }

            if let Err(err) = self.save_env(owner, &updated, create_env_file).await {
                warn!(owner = owner.id(), attempt, %err, "environment write failed");
                last = Some(err.to_string());
                continue;
            }

            match self.fetch_env(owner).await {
                Ok(observed) if observed == updated => return Ok(()),
                Ok(_) => {
                    warn!(owner = owner.id(), attempt, "environment update conflict");
                    last = Some("environment update conflict".to_string());
                }
                Err(err) => {
                    last = Some(format!("failed to verify environment update: {err}"));
                }
            }
        }

        Err(Error::ConflictExhausted {
            attempts: retry.max_attempts,
            last: last.unwrap_or_else(|| "no write issued".to_string()),
        })
    }

    /// Sets one variable in the owner's blob and returns its projection.
    pub async fn set_variable(
        &self,
        owner: &EnvOwner,
        key: &str,
        value: &str,
        create_env_file: Option<bool>,
    ) -> Result<EnvVariable> {
        self.merge_env(owner, create_env_file, |blob| blob.set(key, value))
            .await?;
        Ok(EnvVariable {
            id: format!("{}_{}", owner.id(), key),
            owner_id: owner.id().to_string(),
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    /// All variables currently in the owner's blob.
    pub async fn variables(&self, owner: &EnvOwner) -> Result<Vec<EnvVariable>> {
        let raw = self.fetch_env(owner).await?;
        let blob = EnvBlob::parse(&raw);
        Ok(blob
            .iter()
            .map(|(key, value)| EnvVariable {
                id: format!("{}_{}", owner.id(), key),
                owner_id: owner.id().to_string(),
                key: key.to_string(),
                value: value.to_string(),
            })
            .collect())
    }

    /// Deletes the variable addressed by a synthesized `<ownerId>_<key>` id.
    /// The id's owner part must match `owner`.
    pub async fn delete_variable(
        &self,
        owner: &EnvOwner,
        variable_id: &str,
        create_env_file: Option<bool>,
    ) -> Result<()> {
        let (owner_id, key) = split_variable_id(variable_id)?;
        if owner_id != owner.id() {
            return Err(Error::InvalidVariableId(variable_id.to_string()));
        }
        let key = key.to_string();
        self.merge_env(owner, create_env_file, |blob| {
            blob.remove(&key);
        })
        .await
    }

    async fn fetch_env(&self, owner: &EnvOwner) -> Result<String> {
        match owner {
            EnvOwner::Application(id) => Ok(self.get_application(id).await?.env),
            EnvOwner::Compose(id) => Ok(self.get_compose(id).await?.env),
            EnvOwner::Project(id) => Ok(self.get_project(id).await?.env),
        }
    }

    async fn save_env(
        &self,
        owner: &EnvOwner,
        env: &str,
        create_env_file: Option<bool>,
    ) -> Result<()> {
        let (endpoint, mut payload) = match owner {
            EnvOwner::Application(id) => (
                "application.saveEnvironment",
                json!({ "applicationId": id, "env": env }),
            ),
            EnvOwner::Compose(id) => (
                "compose.saveEnvironment",
                json!({ "composeId": id, "env": env }),
            ),
            EnvOwner::Project(id) => ("project.update", json!({ "projectId": id, "env": env })),
        };
        if let Some(create) = create_env_file {
            if !matches!(owner, EnvOwner::Project(_)) {
                payload["createEnvFile"] = json!(create);
            }
        }
        self.post(endpoint, &payload).await?;
        Ok(())
    }
}
