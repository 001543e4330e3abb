//! Named connections.
//!
//! The registry is an ordinary value owned by the application: build it at
//! startup, hand out [`Db`] handles from it, drop it at shutdown.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::db::Db;
use crate::dialect::{self, Dialect};
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;

/// Name of the connection used when none is given.
pub const DEFAULT_CONNECTION: &str = "default";

/// An executor with its dialect and logging preference.
#[derive(Clone)]
pub struct Connection {
    executor: Arc<dyn Executor>,
    dialect: Arc<dyn Dialect>,
    show_sql: bool,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("dialect", &self.dialect.name())
            .field("show_sql", &self.show_sql)
            .finish()
    }
}

impl Connection {
    pub fn new(executor: Arc<dyn Executor>, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            executor,
            dialect,
            show_sql: false,
        }
    }

    /// Dialect chosen by driver name (`mysql`, `postgres`, `sqlite3`, ...).
    pub fn for_driver(executor: Arc<dyn Executor>, driver: &str) -> Self {
        Self::new(executor, dialect::lookup(driver))
    }

    pub fn show_sql(mut self, on: bool) -> Self {
        self.show_sql = on;
        self
    }
}

#[derive(Debug)]
pub struct Registry {
    connections: HashMap<String, Connection>,
    default: String,
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    connections: Vec<(String, Connection)>,
    default: Option<String>,
}

impl RegistryBuilder {
    pub fn add(mut self, name: impl Into<String>, connection: Connection) -> Self {
        self.connections.push((name.into(), connection));
        self
    }

    /// Override the default connection. Otherwise `"default"` is used when
    /// registered, else the first connection added.
    pub fn default_connection(mut self, name: impl Into<String>) -> Self {
        self.default = Some(name.into());
        self
    }

    pub fn build(self) -> OrmResult<Arc<Registry>> {
        let first = self
            .connections
            .first()
            .map(|(name, _)| name.clone())
            .ok_or_else(|| OrmError::config("registry has no connections"))?;

        let mut connections = HashMap::with_capacity(self.connections.len());
        for (name, conn) in self.connections {
            if connections.insert(name.clone(), conn).is_some() {
                return Err(OrmError::config(format!(
                    "connection `{name}` registered twice"
                )));
            }
        }

        let default = match self.default {
            Some(name) => name,
            None if connections.contains_key(DEFAULT_CONNECTION) => DEFAULT_CONNECTION.to_string(),
            None => first,
        };
        if !connections.contains_key(&default) {
            return Err(OrmError::config(format!(
                "default connection `{default}` is not registered"
            )));
        }

        Ok(Arc::new(Registry {
            connections,
            default,
        }))
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    /// Handle for a named connection. Unknown names are a configuration
    /// error.
    pub fn use_db(self: &Arc<Self>, name: &str) -> OrmResult<Db> {
        let conn = self
            .connections
            .get(name)
            .ok_or_else(|| OrmError::config(format!("unknown connection `{name}`")))?;
        Ok(Db::from_parts(conn.executor.clone(), conn.dialect.clone())
            .show_sql(conn.show_sql)
            .with_registry(Arc::clone(self)))
    }

    /// Handle for the default connection.
    pub fn db(self: &Arc<Self>) -> OrmResult<Db> {
        self.use_db(&self.default)
    }
}

#[cfg(feature = "postgres")]
impl Registry {
    /// Open one tokio-postgres connection per enabled entry.
    ///
    /// Only the `postgres` driver can be opened here; register executors
    /// for other drivers with [`Registry::builder`].
    pub async fn connect(
        configs: &HashMap<String, crate::config::Config>,
    ) -> OrmResult<Arc<Registry>> {
        let mut names: Vec<&String> = configs.keys().collect();
        names.sort();

        let mut builder = Registry::builder();
        for name in names {
            let cfg = &configs[name];
            if !cfg.enable {
                continue;
            }
            match cfg.driver.as_str() {
                "postgres" | "postgresql" => {
                    let executor = crate::postgres::PgExecutor::connect(&cfg.dsn).await?;
                    tracing::info!(target: "relorm", connection = %name, "connected");
                    let conn = Connection::new(Arc::new(executor), Arc::new(dialect::Postgres))
                        .show_sql(cfg.show_sql);
                    builder = builder.add(name.clone(), conn);
                }
                other => {
                    return Err(OrmError::config(format!(
                        "connection `{name}`: driver `{other}` cannot be opened by relorm, register an executor instead"
                    )));
                }
            }
        }
        builder.build()
    }
}
