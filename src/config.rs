use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub airtable: AirtableSettings,
    #[serde(default)]
    pub relay: RelaySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8888 }

#[derive(Clone, Deserialize)]
pub struct AirtableSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub base_id: String,
}

impl Default for AirtableSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: String::new(),
            base_id: String::new(),
        }
    }
}

// Keeps the access token out of logs.
impl fmt::Debug for AirtableSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AirtableSettings")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("base_id", &self.base_id)
            .finish()
    }
}

fn default_api_url() -> String { "https://api.airtable.com/v0".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct RelaySettings {
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            route_prefix: default_route_prefix(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_route_prefix() -> String { "/.netlify/functions/airtable".to_string() }
fn default_max_body_bytes() -> usize { DEFAULT_MAX_BODY_BYTES }

/// Largest inbound body the relay will read (256 KiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 256 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

/// Everything the relay needs to address the upstream API.
///
/// Built once at startup and shared read-only with every request.
#[derive(Clone)]
pub struct RelayConfig {
    pub api_url: String,
    pub base_id: String,
    pub token: String,
    pub route_prefix: String,
    pub max_body_bytes: usize,
}

impl RelayConfig {
    pub fn new(
        api_url: impl Into<String>,
        base_id: impl Into<String>,
        token: impl Into<String>,
        route_prefix: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            base_id: base_id.into(),
            token: token.into(),
            route_prefix: route_prefix.into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// `<api_url>/<base_id>`, the root every upstream path hangs off.
    pub fn base_url(&self) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), self.base_id)
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_url", &self.api_url)
            .field("base_id", &self.base_id)
            .field("token", &"<redacted>")
            .field("route_prefix", &self.route_prefix)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with RELAY__)
    /// 5. AIRTABLE_TOKEN / AIRTABLE_BASE_ID
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., RELAY__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("RELAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_airtable_env(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("RELAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_airtable_env(settings)?;

        settings.try_deserialize()
    }

    /// Validate the upstream section and hand out the relay's view of it
    pub fn relay_config(&self) -> Result<RelayConfig, ConfigError> {
        if self.airtable.token.trim().is_empty() {
            return Err(ConfigError::Message(
                "airtable.token is not set (AIRTABLE_TOKEN)".to_string(),
            ));
        }
        if self.airtable.base_id.trim().is_empty() {
            return Err(ConfigError::Message(
                "airtable.base_id is not set (AIRTABLE_BASE_ID)".to_string(),
            ));
        }
        if !self.relay.route_prefix.starts_with('/') {
            return Err(ConfigError::Message(format!(
                "relay.route_prefix must start with '/': {}",
                self.relay.route_prefix
            )));
        }

        Ok(RelayConfig::new(
            self.airtable.api_url.clone(),
            self.airtable.base_id.clone(),
            self.airtable.token.clone(),
            self.relay.route_prefix.trim_end_matches('/').to_string(),
        )
        .with_max_body_bytes(self.relay.max_body_bytes))
    }
}

/// Honour the deployment-style AIRTABLE_TOKEN and AIRTABLE_BASE_ID variables
fn apply_airtable_env(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(token) = env::var("AIRTABLE_TOKEN") {
        builder = builder.set_override("airtable.token", token)?;
    }
    if let Ok(base_id) = env::var("AIRTABLE_BASE_ID") {
        builder = builder.set_override("airtable.base_id", base_id)?;
    }

    builder.build()
}
