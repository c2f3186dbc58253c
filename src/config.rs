//! Environment-based configuration module
//!
//! Configuration can be set via:
//! 1. Environment variables (highest priority)
//! 2. .env file
//! 3. Default values (lowest priority)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::{env, fs};

/// Application environment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Get environment from APP_ENV variable or default to Development
    pub fn from_env() -> Self {
        match env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()).as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }

    pub fn is_development(&self) -> bool {
        *self == Environment::Development
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Environment mode
    pub environment: Environment,

    /// Application name
    pub app_name: String,

    /// Application version
    pub version: String,

    /// Remote backend coordinates
    pub api: ApiConfig,

    /// Feature flags
    pub features: FeatureConfig,

    /// Inventory thresholds
    pub inventory: InventoryConfig,

    /// Local cache configuration
    pub storage: StorageConfig,

    /// Notification feed configuration
    pub notifications: NotificationConfig,

    /// Security configuration
    pub security: SecurityConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Remote backend coordinates. Read once at startup; the active mode does not
/// change during a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the hosted data service
    pub base_url: String,

    /// Access key sent as `apikey` + bearer token
    pub api_key: Option<String>,

    /// HTTP client timeout in seconds
    pub timeout_secs: u64,

    /// Retry budget advertised to embedders (the synchronizer itself never retries)
    pub retry_attempts: u32,
}

/// Feature flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// When true all reads/writes target the remote backend; otherwise the
    /// on-device cache is the system of record
    pub use_backend: bool,

    pub enable_notifications: bool,
    pub enable_activity_logs: bool,
    pub enable_user_management: bool,
    pub enable_reports: bool,

    /// Emit low-stock notifications after checkout
    pub enable_low_stock_alerts: bool,
}

/// Inventory thresholds. The literals 10 and 3 are defaults; this section is
/// canonical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Stock at or below this flags a product for restock
    pub low_stock_threshold: i64,

    /// Display-only critical threshold; never drives notification logic
    pub critical_stock_threshold: i64,
}

/// Local cache configuration (SQLite key-value store)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file name (relative to app data dir)
    pub path: String,

    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,

    /// Keys of the per-collection mirrors plus the session record
    pub keys: StorageKeys,
}

/// Cache keys, one per entity collection plus the logged-in session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageKeys {
    pub user: String,
    pub products: String,
    pub users: String,
    pub transactions: String,
    pub activity_logs: String,
    pub notifications: String,
}

/// Notification feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Maximum retained notifications; older entries are pruned
    pub max_notifications: usize,
}

/// Security configuration. The attempt-counting fields are configuration
/// surface for embedders; the plaintext credential check does not enforce
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Session timeout in minutes
    pub session_timeout_mins: u64,

    /// Maximum login attempts before lockout
    pub max_login_attempts: u32,

    /// Lockout duration in minutes
    pub lockout_duration_mins: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,

    pub log_to_file: bool,
    pub log_to_stdout: bool,

    /// Use JSON format (true for production)
    pub json_format: bool,

    pub max_file_size_mb: u64,
    pub max_log_files: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let env_mode = Environment::from_env();

        Self {
            environment: env_mode,
            app_name: env::var("APP_NAME").unwrap_or_else(|_| "ByMonday".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),

            api: ApiConfig {
                base_url: env::var("API_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                api_key: env::var("API_KEY").ok(),
                timeout_secs: env::var("API_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                retry_attempts: 3,
            },

            features: FeatureConfig {
                use_backend: env::var("USE_BACKEND").map(|s| s == "true").unwrap_or(false),
                enable_notifications: true,
                enable_activity_logs: true,
                enable_user_management: true,
                enable_reports: true,
                enable_low_stock_alerts: true,
            },

            inventory: InventoryConfig {
                low_stock_threshold: env::var("LOW_STOCK_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                critical_stock_threshold: env::var("CRITICAL_STOCK_THRESHOLD")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
            },

            storage: StorageConfig {
                path: env::var("DB_PATH").unwrap_or_else(|_| "bymonday.db".to_string()),
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DB_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
                connect_timeout_secs: 30,
                idle_timeout_secs: 600,
                keys: StorageKeys {
                    user: "user".to_string(),
                    products: "products".to_string(),
                    users: "users".to_string(),
                    transactions: "transactions".to_string(),
                    activity_logs: "activityLogs".to_string(),
                    notifications: "notifications".to_string(),
                },
            },

            notifications: NotificationConfig {
                max_notifications: env::var("MAX_NOTIFICATIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(50),
            },

            security: SecurityConfig {
                session_timeout_mins: env::var("SESSION_TIMEOUT_MINS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1440), // 24 hours
                max_login_attempts: 5,
                lockout_duration_mins: 15,
            },

            logging: LoggingConfig {
                level: env::var("RUST_LOG").unwrap_or_else(|_| {
                    if env_mode.is_production() { "warn".to_string() } else { "debug".to_string() }
                }),
                log_to_file: true,
                log_to_stdout: env::var("LOG_TO_STDOUT")
                    .map(|s| s == "true")
                    .unwrap_or(true),
                json_format: env_mode.is_production(),
                max_file_size_mb: 10,
                max_log_files: 5,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> Self {
        Self::default()
    }

    /// Load configuration from a .env file (if exists)
    pub fn load_from_file(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        let content = fs::read_to_string(path).ok()?;

        // Simple .env parser (key=value format)
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"').trim_matches('\'');

                // Set environment variable (will be picked up by load())
                env::set_var(key, value);
            }
        }

        Some(Self::default())
    }

    /// Get the log directory path
    pub fn get_log_dir(&self, app_data_dir: &Path) -> PathBuf {
        app_data_dir.join("logs")
    }

    /// Get the local cache database path
    pub fn get_database_path(&self, app_data_dir: &Path) -> PathBuf {
        app_data_dir.join(&self.storage.path)
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }

    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }

    /// Validate configuration for production
    pub fn validate(&self) -> Result<(), String> {
        if self.features.use_backend && self.api.api_key.is_none() {
            return Err(
                "API_KEY must be set when USE_BACKEND=true. \
                 Set it via environment variable."
                    .to_string(),
            );
        }

        if self.is_production() && self.features.use_backend && self.api.base_url.contains("localhost") {
            eprintln!("⚠️  WARNING: Using localhost backend in production!");
        }

        Ok(())
    }
}

/// Global configuration instance
static GLOBAL_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Initialize the global configuration
pub fn init_config() -> &'static AppConfig {
    GLOBAL_CONFIG.get_or_init(AppConfig::load)
}

/// Get the global configuration
pub fn get_config() -> &'static AppConfig {
    GLOBAL_CONFIG.get().expect("Configuration not initialized. Call init_config() first.")
}

/// Get the current environment
pub fn get_environment() -> Environment {
    Environment::from_env()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let config = AppConfig::default();
        assert_eq!(config.inventory.low_stock_threshold, 10);
        assert_eq!(config.inventory.critical_stock_threshold, 3);
        assert_eq!(config.notifications.max_notifications, 50);
    }

    #[test]
    fn validate_rejects_backend_mode_without_key() {
        let mut config = AppConfig::default();
        config.features.use_backend = true;
        config.api.api_key = None;
        assert!(config.validate().is_err());

        config.api.api_key = Some("anon-key".to_string());
        assert!(config.validate().is_ok());
    }
}
