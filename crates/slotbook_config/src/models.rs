// --- File: crates/slotbook_config/src/models.rs ---

use serde::{Deserialize, Serialize};

/// Fixed step between candidate slot starts.
pub const DEFAULT_SLOT_STEP_MINUTES: i64 = 30;
pub const DEFAULT_TIME_ZONE: &str = "Europe/Prague";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// --- Backend Config ---
// Holds the booking backend endpoint. The API key is a "secret_from_env" marker
// in the config files and is resolved from BACKEND_API_KEY.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackendConfig {
    pub base_url: String, // Mandatory
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    /// Header carrying the device identity token (correlation only, not auth).
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_key_header() -> String {
    "X-API-KEY".to_string()
}

fn default_identity_header() -> String {
    "Fingerprint".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// What the session does after the backend accepted a booking.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SuccessPolicy {
    /// Leave the booking view for a confirmation page.
    Redirect { url: String },
    /// Stay on the booking view with a cleared selection.
    ResetInPlace,
}

impl Default for SuccessPolicy {
    fn default() -> Self {
        SuccessPolicy::Redirect {
            url: "/uspesnarezervace".to_string(),
        }
    }
}

/// What the session does when the backend throttles this device.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RateLimitPolicy {
    /// Send the user to a dedicated blocked page.
    Redirect { url: String },
    /// Keep the user on the page and show the cooldown message inline.
    Inline,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        RateLimitPolicy::Redirect {
            url: "/blocked".to_string(),
        }
    }
}

/// How concurrent window fetches are reconciled.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WindowOrdering {
    /// Whatever response completes last is applied.
    #[default]
    CompletionOrder,
    /// Responses older than the newest applied request are dropped.
    RequestOrder,
}

// --- Booking Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// IANA name of the business time zone, e.g. "Europe/Prague".
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default = "default_slot_step_minutes")]
    pub slot_step_minutes: i64,
    /// Remote service catalog. Takes precedence over `catalog_path`.
    #[serde(default)]
    pub catalog_url: Option<String>,
    #[serde(default)]
    pub catalog_path: Option<String>,
    #[serde(default)]
    pub on_success: SuccessPolicy,
    #[serde(default)]
    pub on_rate_limited: RateLimitPolicy,
    #[serde(default)]
    pub window_ordering: WindowOrdering,
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

fn default_slot_step_minutes() -> i64 {
    DEFAULT_SLOT_STEP_MINUTES
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            slot_step_minutes: default_slot_step_minutes(),
            catalog_url: None,
            catalog_path: None,
            on_success: SuccessPolicy::default(),
            on_rate_limited: RateLimitPolicy::default(),
            window_ordering: WindowOrdering::default(),
        }
    }
}

// --- Identity Config ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct IdentityConfig {
    /// File holding the cached device token. In-memory only when unset.
    pub store_path: Option<String>,
}

// --- Logging Config ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    pub level: Option<String>, // "info" when unset
    /// Directory for daily rolling log files, stdout only when unset.
    pub directory: Option<String>,
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Backend config is mandatory
    pub backend: BackendConfig,

    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}
