//! Domain operations.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::Result;
use crate::http::DokployClient;
use crate::shape::{self, Identified};

/// The entity a domain routes to. Exactly one owner, enforced at
/// construction; the optional service name only applies to multi-service
/// compose stacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainOwner {
    /// Routes to an application.
    Application(String),
    /// Routes to one service of a compose stack.
    Compose {
        /// Compose identifier.
        id: String,
        /// Target service, for stacks with more than one.
        service_name: Option<String>,
    },
}

/// An HTTP(S) domain attached to an application or compose service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Domain {
    /// Remote identifier.
    #[serde(rename = "domainId")]
    pub id: String,
    /// Owning application, when application-owned.
    pub application_id: String,
    /// Owning compose stack, when compose-owned.
    pub compose_id: String,
    /// Compose service the domain routes to.
    pub service_name: String,
    /// Hostname.
    pub host: String,
    /// Path prefix.
    pub path: String,
    /// Container port traffic is forwarded to.
    pub port: i64,
    /// Whether TLS is terminated for this domain.
    pub https: bool,
    /// Certificate provisioning mode (`letsencrypt`, `none`, ...).
    pub certificate_type: String,
}

impl Domain {
    /// The owner reference, when the wire payload named one.
    pub fn owner(&self) -> Option<DomainOwner> {
        if !self.application_id.is_empty() {
            Some(DomainOwner::Application(self.application_id.clone()))
        } else if !self.compose_id.is_empty() {
            Some(DomainOwner::Compose {
                id: self.compose_id.clone(),
                service_name: (!self.service_name.is_empty()).then(|| self.service_name.clone()),
            })
        } else {
            None
        }
    }
}

impl Identified for Domain {
    fn primary_id(&self) -> &str {
        &self.id
    }
}

impl DokployClient {
    /// Creates a domain for the given owner. The owner fields on `domain`
    /// are ignored; `owner` is authoritative.
    pub async fn create_domain(&self, owner: &DomainOwner, domain: &Domain) -> Result<Domain> {
        let mut payload = json!({
            "host": domain.host,
            "path": domain.path,
            "port": domain.port,
            "https": domain.https,
            "certificateType": domain.certificate_type,
        });
        match owner {
            DomainOwner::Application(id) => payload["applicationId"] = json!(id),
            DomainOwner::Compose { id, service_name } => {
                payload["composeId"] = json!(id);
                if let Some(service) = service_name {
                    payload["serviceName"] = json!(service);
                }
            }
        }
        let raw = self.post("domain.create", &payload).await?;
        shape::require_entity(shape::parse_entity(&raw, "domain")?, "domain")
    }

    /// Domains currently attached to an application.
    pub async fn domains_by_application(&self, application_id: &str) -> Result<Vec<Domain>> {
        Ok(self.get_application(application_id).await?.domains)
    }

    /// Domains currently attached to a compose stack.
    pub async fn domains_by_compose(&self, compose_id: &str) -> Result<Vec<Domain>> {
        Ok(self.get_compose(compose_id).await?.domains)
    }

    /// Updates a domain's routing settings.
    pub async fn update_domain(&self, domain: &Domain) -> Result<Domain> {
        let payload = json!({
            "domainId": domain.id,
            "host": domain.host,
            "path": domain.path,
            "port": domain.port,
            "https": domain.https,
            "certificateType": domain.certificate_type,
            "serviceName": domain.service_name,
        });
        let raw = self.post("domain.update", &payload).await?;
        shape::require_entity(shape::parse_entity(&raw, "domain")?, "domain")
    }

    /// Deletes a domain.
    pub async fn delete_domain(&self, id: &str) -> Result<()> {
        let payload = json!({ "domainId": id });
        self.post("domain.remove", &payload).await?;
        Ok(())
    }

    /// Asks the platform to generate a `traefik.me`-style host for an app.
    pub async fn generate_domain(&self, app_name: &str) -> Result<String> {
        let payload = json!({ "appName": app_name });
        let raw = self.post("domain.generateDomain", &payload).await?;

        #[derive(Deserialize, Default)]
        #[serde(default)]
        struct Wrapper {
            domain: String,
        }
        if let Ok(wrapper) = serde_json::from_str::<Wrapper>(&raw) {
            if !wrapper.domain.is_empty() {
                return Ok(wrapper.domain);
            }
        }
        // Older versions return the bare (quoted) string.
        Ok(raw.trim().trim_matches('"').to_string())
    }
}
