//! Runtime configuration.
//!
//! Built-in defaults, then an optional JSON file, then `SUBNET_*` environment
//! variables (a `.env` file is loaded by `main` before this runs).

use crate::processing::{DhcpOptions, SummaryOptions};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub summary: SummaryOptions,
    pub dhcp: DhcpOptions,
    /// log4rs YAML file read at startup.
    pub log_config: String,
    /// Colored terminal output.
    pub color: bool,
    /// Most rows printed by the `split` and `table` commands.
    pub split_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            summary: SummaryOptions::default(),
            dhcp: DhcpOptions::default(),
            log_config: "log4rs.yml".to_string(),
            color: true,
            split_limit: 256,
        }
    }
}

impl Config {
    /// Parse a JSON document; missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Config, Box<dyn Error>> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let config: Config = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|e| format!("Error parsing config: path={} error={}", e.path(), e))?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Config, Box<dyn Error>> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading config file {}: {e}", path.display()))?;
        log::info!("Reading config file: {}", path.display());
        Config::from_json_str(&json)
    }

    /// Defaults, overlaid with `path` when given, overlaid with the environment.
    pub fn load(path: Option<&Path>) -> Result<Config, Box<dyn Error>> {
        let mut config = match path {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from `SUBNET_*` variables looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let summary = &mut self.summary;
        env_override(&lookup, "SUBNET_MAX_SUMMARIES", &mut summary.max_summaries);
        env_override(&lookup, "SUBNET_ALLOW_OVERLAPPING", &mut summary.allow_overlapping);
        env_override(
            &lookup,
            "SUBNET_CONSERVATIVE_WIDEN_BITS",
            &mut summary.heuristics.conservative_widen_bits,
        );
        env_override(
            &lookup,
            "SUBNET_CONSERVATIVE_CAP",
            &mut summary.heuristics.conservative_cap,
        );
        env_override(&lookup, "SUBNET_CLASS_BASED", &mut summary.heuristics.class_based);

        let dhcp = &mut self.dhcp;
        env_override(&lookup, "SUBNET_DHCP_RESERVED_LOW", &mut dhcp.reserved_low);
        env_override(&lookup, "SUBNET_DHCP_RESERVED_HIGH", &mut dhcp.reserved_high);
        env_override(&lookup, "SUBNET_DHCP_DNS_SERVER", &mut dhcp.dns_server);
        env_override(&lookup, "SUBNET_DHCP_POOL_NAME", &mut dhcp.pool_name);

        env_override(&lookup, "SUBNET_LOG_CONFIG", &mut self.log_config);
        env_override(&lookup, "SUBNET_COLOR", &mut self.color);
        env_override(&lookup, "SUBNET_SPLIT_LIMIT", &mut self.split_limit);
    }
}

fn env_override<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(value) = lookup(key) else {
        return;
    };
    match value.trim().parse::<T>() {
        Ok(parsed) => {
            log::debug!("config {key}={value}");
            *slot = parsed;
        }
        Err(_) => log::warn!("Ignoring {key}={value:?}, not a valid value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.summary.max_summaries, 3);
        assert_eq!(config.dhcp.reserved_low, 10);
        assert_eq!(config.log_config, "log4rs.yml");
        assert!(config.color);
    }

    #[test]
    fn test_from_json_partial() {
        let config = Config::from_json_str(
            r#"{"summary": {"max_summaries": 1, "heuristics": {"class_based": false}},
                "dhcp": {"dns_server": "1.1.1.1"}}"#,
        )
        .unwrap();
        assert_eq!(config.summary.max_summaries, 1);
        assert!(!config.summary.heuristics.class_based);
        assert_eq!(config.summary.heuristics.conservative_cap, 24);
        assert_eq!(config.dhcp.dns_server, "1.1.1.1");
        assert_eq!(config.dhcp.pool_name, "MYPOOL");
        assert_eq!(config.split_limit, 256);
    }

    #[test]
    fn test_from_json_reports_path() {
        let err = Config::from_json_str(r#"{"summary": {"max_summaries": "three"}}"#).unwrap_err();
        assert!(err.to_string().contains("summary.max_summaries"), "{err}");
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = Config::from_json_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }

    #[test]
    fn test_apply_env() {
        let mut config = Config::default();
        config.apply_env(lookup(&[
            ("SUBNET_MAX_SUMMARIES", "2"),
            ("SUBNET_ALLOW_OVERLAPPING", "false"),
            ("SUBNET_DHCP_POOL_NAME", "LAB"),
            ("SUBNET_COLOR", "false"),
        ]));
        assert_eq!(config.summary.max_summaries, 2);
        assert!(!config.summary.allow_overlapping);
        assert_eq!(config.dhcp.pool_name, "LAB");
        assert!(!config.color);
    }

    #[test]
    fn test_apply_env_ignores_bad_values() {
        let mut config = Config::default();
        config.apply_env(lookup(&[
            ("SUBNET_MAX_SUMMARIES", "lots"),
            ("SUBNET_DHCP_RESERVED_LOW", "-1"),
        ]));
        assert_eq!(config, Config::default());
    }
}
