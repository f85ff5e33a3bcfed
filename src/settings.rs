use crate::session::credential::{CredentialFormat, DEFAULT_ID_LENGTH, DEFAULT_SECRET_LENGTH};
use crate::session::manager::{AuthConfig, DEFAULT_COOKIE_NAME};
use crate::session::policy::SessionPolicy;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KeywardSettings {
    pub application: ApplicationSettings,
    pub session: SessionSettings,
    pub oidc: OidcSettings,
    pub health: HealthSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub id_length: usize,
    pub secret_length: usize,
    /// Lifetime granted when a session's expiry is extended
    pub session_duration_hours: u64,
    /// Minimum age of `last_used` before it is rewritten
    pub refresh_interval_minutes: u64,
    /// Remaining lifetime below which the expiry is extended
    pub expiry_low_water_minutes: u64,
    /// Deadline for each store call and token exchange
    pub auth_timeout_ms: u64,
    /// JSON file with session records loaded into the in-memory store at startup
    pub store_seed_path: Option<String>,
}

/// Upstream identity provider used to refresh OIDC-backed sessions
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OidcSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_endpoint: Option<String>,
    pub discovery_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    /// Public URL of this deployment, probed at `<access_url>/healthz`
    pub access_url: Option<String>,
    pub relay_nodes: Vec<RelayNodeSettings>,
    pub probe_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayNodeSettings {
    pub region: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `env_logger` filter directives, e.g. `info` or `keyward=debug,actix_web=info`
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            id_length: DEFAULT_ID_LENGTH,
            secret_length: DEFAULT_SECRET_LENGTH,
            session_duration_hours: 24,
            refresh_interval_minutes: 60,
            expiry_low_water_minutes: 23 * 60,
            auth_timeout_ms: 10_000,
            store_seed_path: None,
        }
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            access_url: None,
            relay_nodes: Vec::new(),
            probe_timeout_ms: 5_000,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingSettings {
    /// Install the global logger filtered by `level`
    ///
    /// # Errors
    ///
    /// Returns an error if a logger is already installed
    pub fn init_logger(&self) -> anyhow::Result<()> {
        env_logger::Builder::new()
            .parse_filters(&self.level)
            .try_init()
            .context("Failed to initialize logger")
    }
}

impl SessionSettings {
    /// Convert to the runtime configuration of the authentication pipeline
    ///
    /// # Errors
    ///
    /// Returns an error if a duration does not fit into a signed time delta
    pub fn auth_config(&self) -> anyhow::Result<AuthConfig> {
        let policy = SessionPolicy {
            refresh_interval: minutes(self.refresh_interval_minutes, "refresh_interval_minutes")?,
            expiry_low_water: minutes(self.expiry_low_water_minutes, "expiry_low_water_minutes")?,
            session_duration: i64::try_from(self.session_duration_hours)
                .ok()
                .and_then(chrono::Duration::try_hours)
                .ok_or_else(|| anyhow!("session_duration_hours is out of range"))?,
        };

        Ok(AuthConfig {
            cookie_name: self.cookie_name.clone(),
            credential_format: CredentialFormat {
                id_length: self.id_length,
                secret_length: self.secret_length,
            },
            policy,
            timeout: std::time::Duration::from_millis(self.auth_timeout_ms),
        })
    }
}

fn minutes(value: u64, field: &str) -> anyhow::Result<chrono::Duration> {
    i64::try_from(value)
        .ok()
        .and_then(chrono::Duration::try_minutes)
        .ok_or_else(|| anyhow!("{field} is out of range"))
}

impl KeywardSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read or parsed
    /// - Logger initialization fails
    pub fn load() -> anyhow::Result<Self> {
        Self::load_env_file();

        let mut settings = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);
        settings.logging.init_logger()?;
        log::info!("✓ Logging with filter {}", settings.logging.level);

        Ok(settings)
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `KEYWARD_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file cannot be read or parsed
    pub fn load_base_settings() -> anyhow::Result<Self> {
        let mut settings = Self::default();

        let default_config_path = Path::new("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_toml_file(default_config_path)?;
            log::info!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var("KEYWARD_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_toml_file(&secrets_path)?;
                log::info!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                log::info!(
                    "ℹ KEYWARD_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a single TOML settings file; missing sections take their defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid settings TOML
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let toml_content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        basic_toml::from_str(&toml_content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_oidc_env_overrides(&mut settings.oidc);
        Self::apply_health_env_overrides(&mut settings.health);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(cookie_name) = std::env::var("SESSION_COOKIE_NAME") {
            if !cookie_name.is_empty() {
                session_settings.cookie_name = cookie_name;
            }
        }
        Self::apply_numeric_env_override(
            "SESSION_DURATION_HOURS",
            &mut session_settings.session_duration_hours,
        );
        Self::apply_numeric_env_override(
            "SESSION_REFRESH_MINUTES",
            &mut session_settings.refresh_interval_minutes,
        );
        Self::apply_numeric_env_override(
            "SESSION_EXPIRY_LOW_WATER_MINUTES",
            &mut session_settings.expiry_low_water_minutes,
        );
        Self::apply_numeric_env_override("AUTH_TIMEOUT_MS", &mut session_settings.auth_timeout_ms);
    }

    /// Apply environment overrides for the upstream identity provider
    pub fn apply_oidc_env_overrides(oidc_settings: &mut OidcSettings) {
        Self::apply_optional_env_override("OIDC_CLIENT_ID", &mut oidc_settings.client_id);
        Self::apply_optional_env_override("OIDC_CLIENT_SECRET", &mut oidc_settings.client_secret);
        Self::apply_optional_env_override(
            "OIDC_TOKEN_ENDPOINT",
            &mut oidc_settings.token_endpoint,
        );
    }

    fn apply_health_env_overrides(health_settings: &mut HealthSettings) {
        Self::apply_optional_env_override("ACCESS_URL", &mut health_settings.access_url);
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Helper function to apply numeric environment variable overrides
    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            match value_str.parse::<u64>() {
                Ok(value) => *target = value,
                Err(_) => log::warn!("Ignoring {env_var}={value_str}: not a number"),
            }
        }
    }

    fn apply_optional_env_override(env_var: &str, target: &mut Option<String>) {
        if let Ok(value) = std::env::var(env_var) {
            if !value.is_empty() {
                *target = Some(value);
            }
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for line in contents.lines() {
                if line.trim_start().starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    std::env::set_var(key.trim(), value.trim());
                }
            }
        }
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
