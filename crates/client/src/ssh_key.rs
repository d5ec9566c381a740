//! SSH key operations.
//!
//! `sshKey.create` requires the caller's organization identifier, which is
//! resolved from `user.get` first. Creation often answers with an empty body
//! or `true`, so the created key is recovered by listing keys and matching
//! the exact name.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::http::DokployClient;
use crate::shape::{self, Identified, Parsed};

/// The authenticated platform user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    /// Remote identifier.
    #[serde(rename = "userId")]
    pub id: String,
    /// Login email.
    pub email: String,
    /// Organization the API key belongs to.
    pub organization_id: String,
}

impl Identified for User {
    fn primary_id(&self) -> &str {
        &self.id
    }
}

/// An SSH key registered for custom git sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SshKey {
    /// Remote identifier.
    #[serde(rename = "sshKeyId")]
    pub id: String,
    /// Display name, unique per organization.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// PEM private key. Write-only on most platform versions; reads may
    /// return it empty.
    pub private_key: String,
    /// Public key material.
    pub public_key: String,
}

impl Identified for SshKey {
    fn primary_id(&self) -> &str {
        &self.id
    }
}

impl DokployClient {
    /// Fetches the authenticated user.
    pub async fn get_user(&self) -> Result<User> {
        let raw = self.get("user.get").await?;
        shape::require_entity(shape::parse_entity(&raw, "user")?, "user")
    }

    /// Registers an SSH key. `key.id` is ignored; the organization is
    /// resolved from the authenticated user first.
    pub async fn create_ssh_key(&self, key: &SshKey) -> Result<SshKey> {
        let user = self.get_user().await?;
        let payload = json!({
            "name": key.name,
            "description": key.description,
            "privateKey": key.private_key,
            "publicKey": key.public_key,
            "organizationId": user.organization_id,
        });
        let raw = self.post("sshKey.create", &payload).await?;

        // Empty bodies and `true` both mean the key exists but was not
        // echoed back.
        if raw.trim().is_empty() {
            return self.find_ssh_key_by_name(&key.name).await;
        }
        match shape::parse_entity::<SshKey>(&raw, "sshKey")? {
            Parsed::Entity(created) => Ok(created),
            Parsed::Ack => self.find_ssh_key_by_name(&key.name).await,
        }
    }

    /// Lists all SSH keys visible to the API key.
    pub async fn list_ssh_keys(&self) -> Result<Vec<SshKey>> {
        let raw = self.get("sshKey.all").await?;
        shape::parse_list(&raw, "sshKeys")
    }

    /// List-and-match resolution by exact name.
    async fn find_ssh_key_by_name(&self, name: &str) -> Result<SshKey> {
        let keys = self.list_ssh_keys().await?;
        keys.into_iter()
            .find(|key| key.name == name)
            .ok_or_else(|| Error::NotFoundAfterCreate {
                kind: "ssh key",
                name: name.to_string(),
            })
    }

    /// Fetches an SSH key.
    pub async fn get_ssh_key(&self, id: &str) -> Result<SshKey> {
        let raw = self.get(&format!("sshKey.one?sshKeyId={id}")).await?;
        shape::require_entity(shape::parse_entity(&raw, "sshKey")?, "sshKey")
    }

    /// Deletes an SSH key.
    pub async fn delete_ssh_key(&self, id: &str) -> Result<()> {
        self.post("sshKey.remove", &json!({ "sshKeyId": id }))
            .await?;
        Ok(())
    }
}
