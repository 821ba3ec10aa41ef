// --- File: crates/slotbook_config/src/lib.rs ---
use config::{Config, ConfigError, Environment, File, FileFormat};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};
pub mod models;
pub use models::*;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "SLOTBOOK";

/// Marker value replaced by the environment variable named after its JSON path.
pub const SECRET_MARKER: &str = "secret_from_env";

/// Loads the layered configuration.
///
/// Sources, later ones winning:
/// 1. `config/default.{toml,yaml,json}`
/// 2. `config/{RUN_ENV}.{toml,yaml,json}` (`RUN_ENV` defaults to "debug")
/// 3. environment variables `SLOTBOOK__SECTION__KEY`
///
/// The directory can be moved with `SLOTBOOK_CONFIG_DIR`. Secrets marked with
/// `"secret_from_env"` are resolved afterwards.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
    let config_dir = env::var("SLOTBOOK_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);
    debug!(
        "loading config from {} and {}",
        default_path.display(),
        env_path.display()
    );

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Parses a configuration document held in memory.
pub fn parse_config(source: &str, format: FileFormat) -> Result<AppConfig, ConfigError> {
    let raw_config: AppConfig = Config::builder()
        .add_source(File::from_str(source, format))
        .build()?
        .try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Recursively replaces all "secret_from_env" string values with environment variable values
fn inject_env_secrets(value: &mut Value) {
    fn walk(path: Vec<String>, obj: &mut Value) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    walk(new_path, v);
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let env_key = path.join("_").to_uppercase();
                if let Ok(env_val) = env::var(&env_key) {
                    *obj = Value::String(env_val);
                } else {
                    warn!("env var {} not found for secret_from_env", env_key);
                    *obj = Value::Null;
                }
            }
            _ => {}
        }
    }

    walk(vec![], value);
}

/// Applies environment overrides based on "secret_from_env" markers in serialized config
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("config not serializable: {err}")))?;
    inject_env_secrets(&mut json);
    serde_json::from_value(json)
        .map_err(|err| ConfigError::Message(format!("config not deserializable: {err}")))
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// `DOTENV_OVERRIDE` names the file; ".env" otherwise. Loading happens once per
/// process, a missing file is not an error.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path = env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[backend]
base_url = "https://booking.example.com"
"#;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = parse_config(MINIMAL, FileFormat::Toml).unwrap();

        assert_eq!(config.backend.api_key_header, "X-API-KEY");
        assert_eq!(config.backend.identity_header, "Fingerprint");
        assert_eq!(config.backend.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.booking.time_zone, "Europe/Prague");
        assert_eq!(config.booking.slot_step_minutes, 30);
        assert_eq!(config.booking.window_ordering, WindowOrdering::CompletionOrder);
        assert_eq!(
            config.booking.on_rate_limited,
            RateLimitPolicy::Redirect {
                url: "/blocked".to_string()
            }
        );
        assert!(config.identity.store_path.is_none());
    }

    #[test]
    fn test_policies_are_parsed() {
        let source = r#"
[backend]
base_url = "https://booking.example.com"

[booking]
window_ordering = "request_order"

[booking.on_success]
action = "reset_in_place"

[booking.on_rate_limited]
action = "inline"
"#;
        let config = parse_config(source, FileFormat::Toml).unwrap();

        assert_eq!(config.booking.on_success, SuccessPolicy::ResetInPlace);
        assert_eq!(config.booking.on_rate_limited, RateLimitPolicy::Inline);
        assert_eq!(config.booking.window_ordering, WindowOrdering::RequestOrder);
    }

    #[test]
    fn test_secret_marker_resolved_from_env() {
        env::set_var("BACKEND_API_KEY", "key-from-env");
        let source = r#"
[backend]
base_url = "https://booking.example.com"
api_key = "secret_from_env"
"#;
        let config = parse_config(source, FileFormat::Toml).unwrap();
        env::remove_var("BACKEND_API_KEY");

        assert_eq!(config.backend.api_key.as_deref(), Some("key-from-env"));
    }

    #[test]
    fn test_missing_backend_is_an_error() {
        let result = parse_config("[booking]\ntime_zone = \"UTC\"\n", FileFormat::Toml);
        assert!(result.is_err());
    }
}
