use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are applied after parsing and before validation.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use catalog_sync::config::load_config;
///
/// let config = load_config(Path::new("catalog.toml")).unwrap();
/// println!("Delay: {}ms", config.timing.delay_ms);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;

    Ok(config)
}

/// Builds a configuration from defaults and environment overrides only
pub fn default_config() -> Result<Config, ConfigError> {
    let mut config = Config::default();
    apply_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Applies environment-style key/value overrides to a configuration
///
/// Recognised keys: `SCRAPE_DELAY_MS`, `HEADLESS`, `USER_AGENT`, `DATABASE_PATH`.
/// The lookup is injected so tests do not have to touch the process environment.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup("SCRAPE_DELAY_MS") {
        config.timing.delay_ms = raw.trim().parse().map_err(|_| {
            ConfigError::Validation(format!("SCRAPE_DELAY_MS must be an integer, got '{}'", raw))
        })?;
    }

    if let Some(raw) = lookup("HEADLESS") {
        // Anything other than "true" shows the browser window
        config.browser.headless = raw.trim().eq_ignore_ascii_case("true");
    }

    if let Some(agent) = lookup("USER_AGENT") {
        config.browser.user_agent = agent;
    }

    if let Some(path) = lookup("DATABASE_PATH") {
        config.database.path = path;
    }

    Ok(())
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Stored with each run so runs made under different settings can be told apart.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Keys `apply_overrides` recognises, in the order they are folded into the hash
const OVERRIDE_KEYS: [&str; 4] = ["SCRAPE_DELAY_MS", "HEADLESS", "USER_AGENT", "DATABASE_PATH"];

/// Combines a base hash with the overrides present in `lookup`
///
/// Returns `base` unchanged when no override is set.
pub fn fold_overrides_into_hash<F>(base: String, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let applied: Vec<(&str, String)> = OVERRIDE_KEYS
        .iter()
        .filter_map(|key| lookup(key).map(|value| (*key, value)))
        .collect();
    if applied.is_empty() {
        return base;
    }

    let mut hasher = Sha256::new();
    hasher.update(base.as_bytes());
    for (key, value) in applied {
        hasher.update(format!("\n{}={}", key, value).as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
///
/// The hash covers the file content and any environment overrides applied on
/// top of it. Without a path or overrides the hash is `"defaults"`.
pub fn load_config_with_hash(path: Option<&Path>) -> Result<(Config, String), ConfigError> {
    load_with_hash(path, |key| std::env::var(key).ok())
}

fn load_with_hash<F>(path: Option<&Path>, lookup: F) -> Result<(Config, String), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (mut config, base) = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            (toml::from_str(&content)?, compute_config_hash(path)?)
        }
        None => (Config::default(), "defaults".to_string()),
    };

    apply_overrides(&mut config, &lookup)?;
    validate(&config)?;

    Ok((config, fold_overrides_into_hash(base, &lookup)))
}
