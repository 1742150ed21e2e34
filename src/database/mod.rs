use std::sync::Arc;

use serde::Deserialize;
use snafu::{Location, ResultExt, Snafu};
use surrealdb::opt::auth;
use surrealdb::Surreal;

use crate::model::{Clock, ValidationErrors};

/// The statistic store primitives and their SurrealDB implementation.
pub mod query;

pub use query::{latest_per_group, Filter, GroupKey, StatisticStore};

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

pub const TABLE: &str = "posts_statistics";

const SETUP: &str = include_str!("../../schema.surrealql");

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    #[snafu(display("cannot connect to the database `{url}` at {location}: {source}"))]
    Connect {
        url: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("cannot sign in to the database at {location}: {source}"))]
    Signin {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("cannot select namespace `{namespace}` and database `{database}` at {location}: {source}"))]
    Namespace {
        namespace: String,
        database: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to define the schema at {location}: {source}"))]
    Schema {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to query the database at {location}: {source}"))]
    Query {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to deserialize the database response at {location}: {source}"))]
    Deserialize {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to parse the database response at {location}: response is empty"))]
    EmptyQuery {
        #[snafu(implicit)]
        location: Location,
    },
    /// The record was rejected before reaching the database.
    #[snafu(display("invalid statistic: {source}"))]
    Invalid {
        source: ValidationErrors,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(rename = "surreal_url", default = "default_url")]
    pub url: String,
    #[serde(rename = "surreal_ns", default = "default_namespace")]
    pub namespace: String,
    #[serde(rename = "surreal_db", default = "default_database")]
    pub database: String,
    #[serde(rename = "surreal_user", default)]
    pub username: Option<String>,
    #[serde(rename = "surreal_pass", default)]
    pub password: Option<String>,
}

fn default_url() -> String {
    "mem://".to_string()
}

fn default_namespace() -> String {
    "social".to_string()
}

fn default_database() -> String {
    "posts".to_string()
}

impl DatabaseConfig {
    /// A fresh in-memory database.
    pub fn memory() -> Self {
        Self {
            url: default_url(),
            namespace: default_namespace(),
            database: default_database(),
            username: None,
            password: None,
        }
    }

    fn credentials(&self) -> Option<auth::Database<'_>> {
        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            return None;
        };

        Some(auth::Database {
            namespace: &self.namespace,
            database: &self.database,
            username: username.as_str(),
            password: password.as_str(),
        })
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::memory()
    }
}

/// Handle to the statistic store.
///
/// Cloning is cheap, every clone shares the same connection and clock.
#[derive(Debug, Clone)]
pub struct Database {
    database: Surreal<surrealdb::engine::any::Any>,
    clock: Arc<dyn Clock>,
}

impl Database {
    /// Connects to the database described by `config` and defines the schema.
    ///
    /// `config.url` picks the engine, `mem://` or `http://localhost:8000` for instance.
    #[tracing::instrument(skip_all, fields(url = %config.url))]
    pub async fn connect(config: &DatabaseConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let database = surrealdb::engine::any::connect(config.url.as_str())
            .await
            .context(ConnectSnafu {
                url: config.url.as_str(),
            })?;

        if let Some(credentials) = config.credentials() {
            database.signin(credentials).await.context(SigninSnafu)?;
        }

        database
            .use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await
            .context(NamespaceSnafu {
                namespace: config.namespace.as_str(),
                database: config.database.as_str(),
            })?;

        database
            .query(SETUP)
            .await
            .context(SchemaSnafu)?
            .check()
            .context(SchemaSnafu)?;

        tracing::info!("connected to the statistic store");

        Ok(Self { database, clock })
    }

    /// An in-memory store driven by `clock`.
    pub async fn memory(clock: Arc<dyn Clock>) -> Result<Self> {
        Self::connect(&DatabaseConfig::memory(), clock).await
    }
}
