//! Error types shared across all client operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenience alias used by every public operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the Dokploy client.
///
/// Every variant keeps enough context (endpoint, entity kind, already-created
/// identifier) for an operator to inspect or repair remote state by hand.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Init(#[source] reqwest::Error),

    /// Network-level failure (connect, timeout, broken transfer).
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        /// Endpoint the request was headed for.
        endpoint: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-2xx status.
    #[error("API error from {endpoint}: {status} - {body}")]
    Api {
        /// Endpoint that produced the response.
        endpoint: String,
        /// HTTP status code.
        status: StatusCode,
        /// Raw response body, useful for operator diagnostics.
        body: String,
    },

    /// None of the known response shapes matched.
    #[error("failed to parse '{wrapper_key}' response: {detail}")]
    Parse {
        /// Wrapper key that was attempted first.
        wrapper_key: &'static str,
        /// What went wrong.
        detail: String,
    },

    /// The create call acknowledged success but the entity could not be
    /// resolved by name afterwards. The remote side effect already happened.
    #[error("{kind} created but not found by name: {name}")]
    NotFoundAfterCreate {
        /// Entity kind, e.g. `"ssh key"`.
        kind: &'static str,
        /// Name supplied at creation time.
        name: String,
    },

    /// The optimistic environment merge loop ran out of attempts.
    #[error("environment update conflict persisted after {attempts} attempts: {last}")]
    ConflictExhausted {
        /// Number of read-modify-write cycles attempted.
        attempts: u32,
        /// Last observed failure (conflict or transport).
        last: String,
    },

    /// An engine-type tag outside the supported set.
    #[error("unsupported database type: {0}")]
    UnsupportedType(String),

    /// Phase 1 of a two-phase create succeeded but configuration failed.
    /// Carries the phase-1 identifier so callers can repair without
    /// re-creating the entity.
    #[error("created {kind} {id} but failed to update config: {source}")]
    PartialProvisioning {
        /// Entity kind, e.g. `"application"`.
        kind: &'static str,
        /// Identifier returned by the phase-1 create.
        id: String,
        /// The phase-2 failure.
        #[source]
        source: Box<Error>,
    },

    /// Every call in a delete fallback chain failed.
    #[error("{primary}; fallback failed: {fallback}")]
    DeleteChain {
        /// Failure from the current delete endpoint.
        primary: Box<Error>,
        /// Failure from the legacy remove endpoint.
        fallback: Box<Error>,
    },

    /// A synthesized `<ownerId>_<key>` variable id that does not split.
    #[error("invalid variable id format: {0}")]
    InvalidVariableId(String),
}

impl Error {
    /// True when the remote answered 404 for the addressed entity. Declarative
    /// front-ends use this to drop state instead of failing the refresh.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Api {
                status: StatusCode::NOT_FOUND,
                ..
            }
        )
    }
}
