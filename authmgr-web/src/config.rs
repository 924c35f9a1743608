/// Auth Manager - Configuration management.
///
/// Loads configuration from TOML files with multi-environment support.
/// Configuration is loaded from the workspace root `config/` directory.
///
/// Loading order:
/// 1. config/default.toml - default values
/// 2. config/{environment}.toml - environment-specific values
/// 3. config/local.toml - local overrides (not versioned, skipped in testing)
/// 4. AUTHMGR_SECRET_KEY environment variable
///
/// Configuration directory lookup order:
/// 1. AUTHMGR_CONFIG_DIR environment variable (if set)
/// 2. Workspace root config/ directory (development)
/// 3. /usr/local/etc/authmgr/ (production)
use config::{Config as ConfigBuilder, ConfigError, File};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Generate a Debug implementation that redacts sensitive fields.
///
/// ```rust
/// use authmgr_web::debug_redacted_struct;
/// use secrecy::SecretString;
///
/// struct Credentials {
///     password: SecretString,
/// }
///
/// debug_redacted_struct!(Credentials, redact: [password]);
///
/// let creds = Credentials { password: SecretString::from("hunter2") };
/// let debug_str = format!("{:?}", creds);
/// assert!(debug_str.contains("[REDACTED]"));
/// assert!(!debug_str.contains("hunter2"));
/// ```
#[macro_export]
macro_rules! debug_redacted_struct {
    (
        $name:ident,
        redact: [$($redact:ident),*],
        show: [$($show:ident),*]
    ) => {
        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    $(.field(stringify!($redact), &"[REDACTED]"))*
                    $(.field(stringify!($show), &self.$show))*
                    .finish()
            }
        }
    };
    (
        $name:ident,
        redact: [$($redact:ident),*]
    ) => {
        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    $(.field(stringify!($redact), &"[REDACTED]"))*
                    .finish()
            }
        }
    };
}

/// Application environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            "testing" | "test" => Self::Testing,
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Testing => "testing",
            Self::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Application configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    pub environment: Environment,
    pub secret_key: secrecy::SecretString,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

debug_redacted_struct!(
    Config,
    redact: [secret_key],
    show: [environment, server, storage, database, security, logging]
);

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

/// Which backend holds groups and permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local store, lost on restart.
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

/// Database configuration.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: secrecy::SecretString,
    pub max_connections: u32,
}

debug_redacted_struct!(
    DatabaseConfig,
    redact: [url],
    show: [max_connections]
);

/// Security configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Where unauthenticated requests are sent.
    pub login_url: String,
    /// Lifetime of sessions minted by `issue_session`.
    pub session_lifetime_minutes: i64,
    /// Set the `Secure` attribute on cookies. Disable only for plain-HTTP development.
    pub secure_cookies: bool,
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines for log shipping.
    Json,
    #[default]
    Text,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    pub level: String,
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from TOML files.
    ///
    /// The environment comes from `AUTHMGR_ENVIRONMENT` (defaults to development).
    pub fn load() -> Result<Self, AppError> {
        let config_path = Self::find_config_dir()?;
        let environment = std::env::var("AUTHMGR_ENVIRONMENT")
            .map(|e| Environment::parse(&e))
            .unwrap_or(Environment::Development);
        Self::load_with_environment(config_path, environment)
    }

    /// Find the configuration directory.
    fn find_config_dir() -> Result<PathBuf, AppError> {
        if let Ok(path) = std::env::var("AUTHMGR_CONFIG_DIR") {
            let config_path = PathBuf::from(&path);
            if config_path.exists() {
                return Ok(config_path);
            }
            return Err(AppError::Config(format!(
                "AUTHMGR_CONFIG_DIR points to non-existent directory: {}",
                path
            )));
        }

        // CARGO_MANIFEST_DIR is authmgr-web/, the config lives one level up
        let workspace_config = Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .map(|p| p.join("config"));
        if let Some(ref config_path) = workspace_config
            && config_path.exists()
        {
            return Ok(config_path.clone());
        }

        let system_config = Path::new("/usr/local/etc/authmgr");
        if system_config.exists() {
            return Ok(system_config.to_path_buf());
        }

        Err(AppError::Config(
            "Configuration directory not found. Searched:\n\
             - AUTHMGR_CONFIG_DIR environment variable\n\
             - Workspace root config/ directory\n\
             - /usr/local/etc/authmgr/"
                .to_string(),
        ))
    }

    /// Load configuration with a specific environment.
    pub fn load_with_environment<P: AsRef<Path>>(
        config_path: P,
        environment: Environment,
    ) -> Result<Self, AppError> {
        let config_path = config_path.as_ref();

        let mut builder = ConfigBuilder::builder();

        let default_path = config_path.join("default.toml");
        if !default_path.exists() {
            return Err(AppError::Config(format!(
                "Configuration file not found: {}",
                default_path.display()
            )));
        }
        builder = builder.add_source(File::from(default_path));

        let env_path = config_path.join(format!("{}.toml", environment.as_str()));
        if env_path.exists() {
            builder = builder.add_source(File::from(env_path));
        }

        // local.toml must not leak into test runs
        if environment != Environment::Testing {
            let local_path = config_path.join("local.toml");
            if local_path.exists() {
                builder = builder.add_source(File::from(local_path));
            }
        }

        if let Ok(secret) = std::env::var("AUTHMGR_SECRET_KEY") {
            builder = builder
                .set_override("secret_key", secret)
                .map_err(|e| AppError::Config(format!("Failed to set secret_key: {}", e)))?;
        }

        let settings = builder.build().map_err(Self::config_error)?;
        let mut config: Config = settings.try_deserialize().map_err(Self::config_error)?;
        config.environment = environment;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a base TOML string plus an overlay.
    pub fn from_toml_with_overlay(base_toml: &str, overlay_toml: &str) -> Result<Self, AppError> {
        let settings = ConfigBuilder::builder()
            .add_source(File::from_str(base_toml, config::FileFormat::Toml))
            .add_source(File::from_str(overlay_toml, config::FileFormat::Toml))
            .build()
            .map_err(Self::config_error)?;

        let config: Config = settings.try_deserialize().map_err(Self::config_error)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.secret_key.expose_secret().is_empty() {
            return Err(AppError::Config(
                "secret_key is required. Set it in config/{environment}.toml, config/local.toml, \
                 or via AUTHMGR_SECRET_KEY environment variable."
                    .to_string(),
            ));
        }
        if !self.security.login_url.starts_with('/') {
            return Err(AppError::Config(format!(
                "security.login_url must be a local path, got {}",
                self.security.login_url
            )));
        }
        if self.environment.is_production() && !self.security.secure_cookies {
            return Err(AppError::Config(
                "security.secure_cookies cannot be disabled in production".to_string(),
            ));
        }
        Ok(())
    }

    /// Secret used to sign CSRF tokens, flash messages and sessions.
    pub fn signing_key(&self) -> &[u8] {
        self.secret_key.expose_secret().as_bytes()
    }

    fn config_error(e: ConfigError) -> AppError {
        AppError::Config(format!("Configuration error: {}", e))
    }
}
