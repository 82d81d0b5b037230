//! Layered configuration for crudbridge.
//!
//! Built-in defaults, then a TOML file, then `CRUDBRIDGE_*` environment
//! variables, merged with `figment`. The result translates into a
//! [`TransportConfig`] and a ready [`DataProvider`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crudbridge_api::{FetchClient, HttpClient, TlsMode, TransportConfig};
use crudbridge_core::{CoreError, DataProvider};

const ENV_PREFIX: &str = "CRUDBRIDGE_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("provider setup failed: {0}")]
    Provider(#[from] CoreError),

    #[error("transport setup failed: {0}")]
    Transport(#[from] crudbridge_api::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Base URL of the CRUD backend; resource names are appended to it.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub transport: TransportSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            transport: TransportSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TransportSettings {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept invalid TLS certificates. Takes precedence over `ca_cert`.
    #[serde(default)]
    pub insecure: bool,

    /// Path to an extra PEM CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub user_agent: Option<String>,

    /// Headers sent with every request (gateway keys and the like).
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
            user_agent: None,
            headers: BTreeMap::new(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:3000".into()
}
fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Check the values figment cannot: URL scheme, timeout, header syntax.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.api_url)
            .map_err(|e| ConfigError::validation("api_url", format!("{e}: {}", self.api_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::validation(
                "api_url",
                format!("expected http or https scheme, got '{}'", url.scheme()),
            ));
        }

        if self.transport.timeout == 0 {
            return Err(ConfigError::validation(
                "transport.timeout",
                "must be greater than zero",
            ));
        }

        self.to_transport_config().header_map()?;
        Ok(())
    }

    /// Translate the `[transport]` table into the HTTP layer's config.
    pub fn to_transport_config(&self) -> TransportConfig {
        let settings = &self.transport;

        let tls = if settings.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = settings.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        let mut transport = TransportConfig {
            tls,
            timeout: Duration::from_secs(settings.timeout),
            ..TransportConfig::default()
        };
        if let Some(ref agent) = settings.user_agent {
            transport.user_agent.clone_from(agent);
        }
        for (name, value) in &settings.headers {
            transport = transport.with_header(name, value);
        }
        transport
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "crudbridge", "crudbridge").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("crudbridge");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// The merged provider stack for a given file: defaults, TOML, env.
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load and validate config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load and validate config from an explicit file. A missing file is
/// not an error; defaults and environment still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    config.validate()?;
    debug!(path = %path.display(), api_url = %config.api_url, "loaded config");
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "saved config");
    Ok(())
}

// ── Provider construction ───────────────────────────────────────────

/// Build a `DataProvider` backed by a `FetchClient` from this config.
pub fn build_provider(cfg: &Config) -> Result<DataProvider, ConfigError> {
    cfg.validate()?;
    let client = FetchClient::new(&cfg.to_transport_config())?;
    let http: Arc<dyn HttpClient> = Arc::new(client);
    Ok(DataProvider::with_client(&cfg.api_url, http)?)
}
