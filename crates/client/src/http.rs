//! HTTP transport: one request in, raw body or structured failure out.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

const API_KEY_HEADER: &str = "x-api-key";

/// Client for a single Dokploy instance.
///
/// Cheap to clone; clones share the underlying connection pool. All public
/// entity operations live in the per-resource modules as `impl` blocks on
/// this type.
#[derive(Debug, Clone)]
pub struct DokployClient {
    pub(crate) cfg: ClientConfig,
    http: reqwest::Client,
}

impl DokployClient {
    /// Builds a client with the configured per-request timeout.
    pub fn new(cfg: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .default_headers(headers)
            .build()
            .map_err(Error::Init)?;
        Ok(Self { cfg, http })
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.cfg.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Issues a `GET` request. Query parameters are part of the endpoint
    /// string (Dokploy endpoints look like `application.one?applicationId=x`).
    pub(crate) async fn get(&self, endpoint: &str) -> Result<String> {
        debug!(endpoint, "dokploy GET");
        let res = self
            .http
            .get(self.url(endpoint))
            .header(API_KEY_HEADER, &self.cfg.api_key)
            .send()
            .await
            .map_err(|source| Error::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;
        Self::read_body(endpoint, res).await
    }

    /// Issues a `POST` request with a JSON body.
    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<String> {
        debug!(endpoint, "dokploy POST");
        let res = self
            .http
            .post(self.url(endpoint))
            .header(API_KEY_HEADER, &self.cfg.api_key)
            .json(body)
            .send()
            .await
            .map_err(|source| Error::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;
        Self::read_body(endpoint, res).await
    }

    async fn read_body(endpoint: &str, res: reqwest::Response) -> Result<String> {
        let status = res.status();
        let body = res.text().await.map_err(|source| Error::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;
        if status.as_u16() >= 400 {
            return Err(Error::Api {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }
        Ok(body)
    }
}
