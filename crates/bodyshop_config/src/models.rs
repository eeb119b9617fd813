// --- File: crates/bodyshop_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

// --- Database Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String, // e.g. sqlite://data/bookings.db, overridable via BODYSHOP__DATABASE__URL
    #[serde(default)]
    pub max_connections: Option<u32>,
}

// --- Business Profile ---
// The slice of the site configuration the booking core needs.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BusinessConfig {
    pub name: String,
    /// Shown to customers whenever the assistant falls back to "please call us".
    pub phone: String,
    pub address: String,
    /// Display string only, e.g. "Mon-Fri 9:00 AM - 5:00 PM".
    pub hours_display: String,
    /// IANA zone the business hours are anchored to.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_time_zone() -> String {
    "America/New_York".to_string()
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            name: "Auto Body Shop".to_string(),
            phone: "(555) 555-0100".to_string(),
            address: "123 Main Street".to_string(),
            hours_display: "Monday - Friday, 9:00 AM - 5:00 PM".to_string(),
            time_zone: default_time_zone(),
        }
    }
}

// --- Google Calendar Config ---
// Secrets are usually "secret_from_env" markers resolved at load time:
// GCAL_CLIENT_SECRET, GCAL_REFRESH_TOKEN
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GcalConfig {
    pub calendar_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Optional pre-issued access token; refreshed on first expiry.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_api_base() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

// --- Logging Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_gcal: bool,
    #[serde(default)]
    pub use_database: bool,
    #[serde(default)]
    pub use_chat: bool,

    #[serde(default)]
    pub business: BusinessConfig,
    #[serde(default)]
    pub logging: LoggingConfig,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub gcal: Option<GcalConfig>,
}
