//! Async client for the Dokploy orchestration platform's HTTP API.
//!
//! The platform's API is uneven across versions: the same logical operation
//! may answer with a keyed wrapper object, a bare entity, or a literal
//! `true`; creation endpoints accept only minimal field sets so full
//! configuration takes a second call; environment variables travel as one
//! newline-separated blob per owner; and delete endpoints were renamed
//! between versions. This crate absorbs those irregularities so callers see
//! plain typed CRUD:
//!
//! ```no_run
//! use dokploy_client::{ClientConfig, DokployClient};
//!
//! # async fn run() -> dokploy_client::Result<()> {
//! let client = DokployClient::new(ClientConfig::new(
//!     "https://dokploy.example.com",
//!     "api-key",
//! ))?;
//! let project = client.create_project("blog", "personal blog").await?;
//! println!("created {}", project.id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod application;
mod backup;
mod compose;
mod config;
mod database;
mod domain;
mod env;
mod environment;
mod error;
mod http;
mod mount;
mod port;
mod project;
mod shape;
mod ssh_key;
mod volume_backup;

pub use application::{Application, NewApplication, Provisioned};
pub use backup::BackupDestination;
pub use compose::{Compose, NewCompose};
pub use config::{ClientConfig, RetryPolicy};
pub use database::{Database, DatabaseEngine, NewDatabase};
pub use domain::{Domain, DomainOwner};
pub use env::{EnvBlob, EnvOwner, EnvVariable};
pub use environment::Environment;
pub use error::{Error, Result};
pub use http::DokployClient;
pub use mount::{Mount, MountOwner};
pub use port::Port;
pub use project::Project;
pub use ssh_key::{SshKey, User};
pub use volume_backup::VolumeBackup;
