//! Client configuration.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. TOML file (`--config`, else `<config_dir>/ragchat/config.toml`)
//! 3. `RAGCHAT_*` environment variables
//! 4. Command-line flags (applied by the caller via [`ChatConfig::override_with`])

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::chat::{RagClient, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};

const ENV_PREFIX: &str = "RAGCHAT_";
const CONFIG_DIR: &str = "ragchat";
const CONFIG_FILE: &str = "config.toml";

/// Settings shared by every surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// URL questions are posted to.
    pub endpoint: String,

    /// Upper bound on one outbound call.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Metadata filter sent with every question (e.g. `company = "Google"`).
    pub filter: Map<String, Value>,

    /// Print the sources behind each answer.
    pub show_sources: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            filter: Map::new(),
            show_sources: false,
        }
    }
}

impl ChatConfig {
    /// Load configuration from defaults, a TOML file and the environment.
    ///
    /// An explicit `path` must exist; the default location may be absent.
    /// Values are not validated here: command-line overrides still apply on
    /// top, so call [`ChatConfig::validate`] once they have.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => {
                if !p.is_file() {
                    bail!("Config file not found: {}", p.display());
                }
                Some(p.to_path_buf())
            }
            None => Self::default_path(),
        };

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = &file {
            figment = figment.merge(Toml::file(file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["filter"]));

        figment.extract().context("Failed to load configuration")
    }

    /// `<config_dir>/ragchat/config.toml`, when the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Apply command-line overrides on top of the loaded values.
    #[must_use]
    pub fn override_with(mut self, endpoint: Option<String>, timeout_secs: Option<u64>) -> Self {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        if let Some(secs) = timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }

    /// Reject values that would make every call fail.
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            bail!("Endpoint must be an http(s) URL, got '{}'", self.endpoint);
        }
        if self.timeout.is_zero() {
            bail!("Timeout must be greater than zero");
        }
        Ok(())
    }

    /// Build the HTTP client these settings describe.
    pub fn client(&self) -> Result<RagClient> {
        self.validate()?;
        let client = RagClient::new(self.endpoint.trim(), self.timeout)
            .context("Failed to build HTTP client")?
            .with_filter(self.filter.clone());
        Ok(client)
    }
}
