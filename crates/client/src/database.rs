//! Database operations, dispatched by engine type.
//!
//! Dokploy exposes one parallel API family per engine
//! (`postgres.create`, `mysql.create`, ...) and each family names its
//! identifier differently (`postgresId`, `mysqlId`, ...) next to a generic
//! `databaseId` that may or may not be present. Everything funnels through
//! [`DatabaseEngine`] so the dispatch and the identifier priority order live
//! in one place.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::http::DokployClient;

/// Supported database engine families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    /// PostgreSQL.
    Postgres,
    /// MySQL.
    Mysql,
    /// MariaDB.
    Mariadb,
    /// MongoDB.
    Mongo,
    /// Redis.
    Redis,
}

impl DatabaseEngine {
    /// All supported engines, in dispatch order.
    pub const ALL: [DatabaseEngine; 5] = [
        DatabaseEngine::Postgres,
        DatabaseEngine::Mysql,
        DatabaseEngine::Mariadb,
        DatabaseEngine::Mongo,
        DatabaseEngine::Redis,
    ];

    /// Canonical lowercase tag (also the endpoint resource name).
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgres => "postgres",
            DatabaseEngine::Mysql => "mysql",
            DatabaseEngine::Mariadb => "mariadb",
            DatabaseEngine::Mongo => "mongo",
            DatabaseEngine::Redis => "redis",
        }
    }

    /// Wire name of this family's identifier field.
    pub fn id_field(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgres => "postgresId",
            DatabaseEngine::Mysql => "mysqlId",
            DatabaseEngine::Mariadb => "mariadbId",
            DatabaseEngine::Mongo => "mongoId",
            DatabaseEngine::Redis => "redisId",
        }
    }

    /// Default database user submitted on create.
    fn default_user(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgres => "postgres",
            DatabaseEngine::Mysql | DatabaseEngine::Mariadb => "root",
            DatabaseEngine::Mongo => "mongo",
            DatabaseEngine::Redis => "default",
        }
    }

    fn create_endpoint(&self) -> String {
        format!("{}.create", self.as_str())
    }

    fn one_endpoint(&self, id: &str) -> String {
        format!("{}.one?{}={}", self.as_str(), self.id_field(), id)
    }

    fn remove_endpoint(&self) -> String {
        format!("{}.remove", self.as_str())
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseEngine {
    type Err = Error;

    /// Fails fast on unknown tags, before any network call is issued.
    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "postgres" => Ok(DatabaseEngine::Postgres),
            "mysql" => Ok(DatabaseEngine::Mysql),
            "mariadb" => Ok(DatabaseEngine::Mariadb),
            "mongo" => Ok(DatabaseEngine::Mongo),
            "redis" => Ok(DatabaseEngine::Redis),
            other => Err(Error::UnsupportedType(other.to_string())),
        }
    }
}

/// A managed database instance. Never updated after creation; only
/// create/read/delete are supported.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Database {
    /// Canonical identifier, normalized from whichever wire field was set.
    #[serde(rename = "databaseId")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// App name Dokploy derives container names from.
    pub app_name: String,
    /// Canonical engine tag; stamped on responses that omit it.
    #[serde(rename = "type")]
    pub engine: String,
    /// Owning project.
    pub project_id: String,
    /// Owning environment.
    pub environment_id: String,
    /// Engine version.
    pub version: String,
    /// Docker image reference.
    pub docker_image: String,
    /// Host-published port, when exposed.
    pub external_port: Option<i64>,
    /// Container-internal port.
    pub internal_port: Option<i64>,
    /// Root/database password.
    pub password: String,
    /// Family-specific identifier fields; at most one is populated.
    pub postgres_id: String,
    /// See `postgres_id`.
    pub mysql_id: String,
    /// See `postgres_id`.
    pub mariadb_id: String,
    /// See `postgres_id`.
    pub mongo_id: String,
    /// See `postgres_id`.
    pub redis_id: String,
}

impl Database {
    fn family_id(&self, engine: DatabaseEngine) -> &str {
        match engine {
            DatabaseEngine::Postgres => &self.postgres_id,
            DatabaseEngine::Mysql => &self.mysql_id,
            DatabaseEngine::Mariadb => &self.mariadb_id,
            DatabaseEngine::Mongo => &self.mongo_id,
            DatabaseEngine::Redis => &self.redis_id,
        }
    }

    /// Resolves the canonical identifier (engine-specific field first, then
    /// the generic field) and stamps the canonical engine tag.
    fn normalized(mut self, engine: DatabaseEngine) -> Self {
        let family = self.family_id(engine);
        if !family.is_empty() {
            self.id = family.to_string();
        }
        self.engine = engine.as_str().to_string();
        self
    }

    fn has_any_id(&self) -> bool {
        !self.id.is_empty()
            || DatabaseEngine::ALL
                .iter()
                .any(|engine| !self.family_id(*engine).is_empty())
    }
}

/// Parameters for creating a database.
#[derive(Debug, Clone)]
pub struct NewDatabase {
    /// Project used to recover the identifier after an ack-only create.
    pub project_id: String,
    /// Environment the database is created in.
    pub environment_id: String,
    /// Name (also used as app name and database name).
    pub name: String,
    /// Engine family.
    pub engine: DatabaseEngine,
    /// Initial password.
    pub password: String,
    /// Docker image reference; empty lets the platform pick.
    pub docker_image: String,
}

impl DokployClient {
    /// Creates a database through the engine's endpoint family.
    ///
    /// Some platform versions answer `true` instead of the entity; in that
    /// case the identifier is recovered by re-fetching the parent project and
    /// scanning the environment's engine-specific list by name.
    pub async fn create_database(&self, req: &NewDatabase) -> Result<Database> {
        let engine = req.engine;
        let payload = json!({
            "environmentId": req.environment_id,
            "name": req.name,
            "appName": req.name,
            "databaseName": req.name,
            "databasePassword": req.password,
            "dockerImage": req.docker_image,
            "databaseUser": engine.default_user(),
        });

        let raw = self.post(&engine.create_endpoint(), &payload).await?;

        if let Ok(db) = serde_json::from_str::<Database>(&raw) {
            if !db.family_id(engine).is_empty() || !db.id.is_empty() {
                return Ok(db.normalized(engine));
            }
        }

        if raw.trim() == "true" {
            return self.resolve_created_database(req).await;
        }

        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) {
            if let Some(inner) = value.get("database") {
                if let Ok(db) = serde_json::from_value::<Database>(inner.clone()) {
                    if db.has_any_id() {
                        return Ok(db.normalized(engine));
                    }
                }
            }
        }

        Err(Error::Parse {
            wrapper_key: "database",
            detail: format!("unrecognized {engine} create response"),
        })
    }

    /// Re-fetch-by-context resolution after an ack-only create: scan the
    /// owning environment's engine list for a matching name or app name.
    async fn resolve_created_database(&self, req: &NewDatabase) -> Result<Database> {
        let project = self.get_project(&req.project_id).await?;
        let env = project
            .environments
            .iter()
            .find(|env| env.id == req.environment_id);

        if let Some(env) = env {
            let found = env
                .databases(req.engine)
                .iter()
                .find(|db| db.name == req.name || db.app_name == req.name);
            if let Some(db) = found {
                let db = db.clone().normalized(req.engine);
                if db.id.is_empty() {
                    return Err(Error::NotFoundAfterCreate {
                        kind: "database",
                        name: req.name.clone(),
                    });
                }
                return Ok(db);
            }
        }

        Err(Error::NotFoundAfterCreate {
            kind: "database",
            name: req.name.clone(),
        })
    }

    /// Fetches a database through the engine's endpoint family.
    pub async fn get_database(&self, id: &str, engine: DatabaseEngine) -> Result<Database> {
        let raw = self.get(&engine.one_endpoint(id)).await?;

        if let Ok(db) = serde_json::from_str::<Database>(&raw) {
            if db.has_any_id() {
                return Ok(db.normalized(engine));
            }
        }

        // Keyed wrapper: {"postgres": {...}} or a generic {"database": {...}}.
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|err| Error::Parse {
                wrapper_key: "database",
                detail: err.to_string(),
            })?;
        let inner = value
            .get(engine.as_str())
            .or_else(|| value.get("database"))
            .ok_or_else(|| Error::Parse {
                wrapper_key: "database",
                detail: format!("no '{engine}' or 'database' key in response"),
            })?;
        let db: Database = serde_json::from_value(inner.clone()).map_err(|err| Error::Parse {
            wrapper_key: "database",
            detail: err.to_string(),
        })?;
        Ok(db.normalized(engine))
    }

    /// Deletes a database. The engine tag is required: the identifier alone
    /// cannot select the endpoint family.
    pub async fn delete_database(&self, id: &str, engine: DatabaseEngine) -> Result<()> {
        let payload = json!({ engine.id_field(): id });
        self.post(&engine.remove_endpoint(), &payload).await?;
        Ok(())
    }
}
