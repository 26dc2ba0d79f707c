//! Layered configuration: `Serialized` defaults → TOML file → `DEMENTIA_`-
//! prefixed environment variables, lowest to highest precedence.

mod validate;

use std::path::Path;

use dementia_domain::error::{Error, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

pub use validate::validate;

/// Transport the server listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Stdio,
    Http,
}

impl Default for Transport {
    fn default() -> Self {
        Self::Stdio
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    pub statement_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/dementia".to_string(),
            min_connections: 2,
            max_connections: 10,
            statement_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions idle longer than this are treated as "packaged" by
    /// `get_last_handover` and swept by the background cleanup task.
    pub idle_cutoff_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_cutoff_secs: 7200,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub transport: Transport,
    pub http_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            http_addr: "127.0.0.1:8791".to_string(),
        }
    }
}

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub embedding: EmbeddingConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration: defaults, overridden by `path` (if given and it
    /// exists), overridden by `DEMENTIA_`-prefixed environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if let Some(path) = path {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        } else if Path::new("dementia.toml").exists() {
            figment = figment.merge(Toml::file("dementia.toml"));
        }

        figment = figment.merge(Env::prefixed("DEMENTIA_").split("__"));

        let config: AppConfig = figment
            .extract()
            .map_err(|err| Error::validation(format!("invalid configuration: {err}")))?;

        validate(&config)?;
        Ok(config)
    }

    pub fn idle_cutoff(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session.idle_cutoff_secs)
    }
}
