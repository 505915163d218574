use crate::domain::value_objects::{Formula, Units};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Storage
    pub db_path: String,

    // Provider settings
    pub provider_url: String,
    pub provider_timeout_secs: u64,
    pub user_agent: String,
    /// Answer from the built-in table instead of the network
    pub offline: bool,

    // Distance defaults
    pub units: Units,
    pub formula: Formula,

    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "geocodes.db".to_string(),
            provider_url: "https://nominatim.openstreetmap.org".to_string(),
            provider_timeout_secs: 10,
            user_agent: default_user_agent(),
            offline: false,
            units: Units::Miles,
            formula: Formula::Haversine,
            debug: false,
        }
    }
}

fn default_user_agent() -> String {
    concat!("geocodable/", env!("CARGO_PKG_VERSION")).to_string()
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Build a config from `lookup`, which maps a variable name to its value.
pub fn load_config_from<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let db_path = lookup("GEOCODABLE_DB_PATH")
        .unwrap_or_else(|| "geocodes.db".to_string());

    let provider_url = lookup("GEOCODABLE_PROVIDER_URL")
        .unwrap_or_else(|| "https://nominatim.openstreetmap.org".to_string());

    let provider_timeout_secs = lookup("GEOCODABLE_PROVIDER_TIMEOUT_SECS")
        .unwrap_or_else(|| "10".to_string())
        .parse()
        .unwrap_or(10);

    let user_agent = lookup("GEOCODABLE_USER_AGENT")
        .unwrap_or_else(default_user_agent);

    let offline = lookup("GEOCODABLE_OFFLINE")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false);

    // Unknown names fall back to miles / haversine
    let units = lookup("GEOCODABLE_UNITS")
        .map(|v| Units::from_str(&v))
        .unwrap_or_default();

    let formula = lookup("GEOCODABLE_FORMULA")
        .map(|v| Formula::from_str(&v))
        .unwrap_or_default();

    let debug = lookup("DEBUG").is_some();

    let cfg = Config {
        db_path,
        provider_url,
        provider_timeout_secs,
        user_agent,
        offline,
        units,
        formula,
        debug,
    };
    cfg.validate()?;

    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.provider_timeout_secs == 0 {
            anyhow::bail!("GEOCODABLE_PROVIDER_TIMEOUT_SECS must be greater than zero");
        }
        if self.provider_url.trim().is_empty() {
            anyhow::bail!("GEOCODABLE_PROVIDER_URL must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.db_path, "geocodes.db");
        assert_eq!(cfg.provider_url, "https://nominatim.openstreetmap.org");
        assert_eq!(cfg.provider_timeout_secs, 10);
        assert!(cfg.user_agent.starts_with("geocodable/"));
        assert_eq!(cfg.units, Units::Miles);
        assert_eq!(cfg.formula, Formula::Haversine);
        assert!(!cfg.offline);
    }

    fn load_with(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_config_from(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_load_config_without_variables() {
        let cfg = load_with(&[]).unwrap();
        assert_eq!(cfg.db_path, "geocodes.db");
        assert_eq!(cfg.provider_timeout_secs, 10);
        assert!(!cfg.offline);
        assert!(!cfg.debug);
    }

    #[test]
    fn test_load_config_with_custom_db_path() {
        let cfg = load_with(&[("GEOCODABLE_DB_PATH", "/tmp/test-geocodes.db")]).unwrap();
        assert_eq!(cfg.db_path, "/tmp/test-geocodes.db");
    }

    #[test]
    fn test_load_config_with_provider_settings() {
        let cfg = load_with(&[
            ("GEOCODABLE_PROVIDER_URL", "http://localhost:8088"),
            ("GEOCODABLE_USER_AGENT", "tests/1.0"),
        ])
        .unwrap();
        assert_eq!(cfg.provider_url, "http://localhost:8088");
        assert_eq!(cfg.user_agent, "tests/1.0");
    }

    #[test]
    fn test_load_config_with_units_and_formula() {
        let cfg = load_with(&[("GEOCODABLE_UNITS", "km"), ("GEOCODABLE_FORMULA", "vincenty")])
            .unwrap();
        assert_eq!(cfg.units, Units::Kilometers);
        assert_eq!(cfg.formula, Formula::Vincenty);
    }

    #[test]
    fn test_load_config_with_offline() {
        assert!(load_with(&[("GEOCODABLE_OFFLINE", "TRUE")]).unwrap().offline);
        assert!(load_with(&[("GEOCODABLE_OFFLINE", "1")]).unwrap().offline);
        assert!(!load_with(&[("GEOCODABLE_OFFLINE", "no")]).unwrap().offline);
    }

    #[test]
    fn test_load_config_timeout() {
        let cfg = load_with(&[("GEOCODABLE_PROVIDER_TIMEOUT_SECS", "abc")]).unwrap();
        assert_eq!(cfg.provider_timeout_secs, 10);

        let cfg = load_with(&[("GEOCODABLE_PROVIDER_TIMEOUT_SECS", "3")]).unwrap();
        assert_eq!(cfg.provider_timeout_secs, 3);

        assert!(load_with(&[("GEOCODABLE_PROVIDER_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let cfg = Config {
            provider_timeout_secs: 0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_config_with_debug() {
        assert!(load_with(&[("DEBUG", "1")]).unwrap().debug);
    }
}
