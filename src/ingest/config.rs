// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PATH: &str = "SURGE_CONFIG_PATH";
const ENV_TICKETMASTER_KEY: &str = "TICKETMASTER_API_KEY";

fn default_ticketmaster_url() -> String {
    "https://app.ticketmaster.com/discovery/v2/events.json".to_string()
}
fn default_holiday_url() -> String {
    "https://date.nager.at/api/v3".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_radius_km() -> u32 {
    30
}

/// Runtime configuration for upstream providers and lookup tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SurgeConfig {
    #[serde(default = "default_ticketmaster_url")]
    pub ticketmaster_url: String,
    /// Literal key, or "ENV" to read `TICKETMASTER_API_KEY`.
    #[serde(default)]
    pub ticketmaster_api_key: String,
    #[serde(default = "default_holiday_url")]
    pub holiday_api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_radius_km")]
    pub default_radius_km: u32,
    #[serde(default)]
    pub seasonality_path: Option<PathBuf>,
    #[serde(default)]
    pub baseline_path: Option<PathBuf>,
    #[serde(default)]
    pub weights_path: Option<PathBuf>,
}

impl Default for SurgeConfig {
    fn default() -> Self {
        Self {
            ticketmaster_url: default_ticketmaster_url(),
            ticketmaster_api_key: String::new(),
            holiday_api_url: default_holiday_url(),
            fetch_timeout_secs: default_timeout_secs(),
            default_radius_km: default_radius_km(),
            seasonality_path: None,
            baseline_path: None,
            weights_path: None,
        }
    }
}

impl SurgeConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<SurgeConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading surge config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())?;
    resolve_api_key(cfg)
}

/// Load config using env var + fallbacks:
/// 1) $SURGE_CONFIG_PATH
/// 2) config/surge.toml
/// 3) config/surge.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<SurgeConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("SURGE_CONFIG_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/surge.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/surge.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    resolve_api_key(SurgeConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<SurgeConfig> {
    if hint_ext == "toml" {
        return toml::from_str(s).context("parsing surge config toml");
    }
    if hint_ext == "json" {
        return serde_json::from_str(s).context("parsing surge config json");
    }
    // Unknown extension: sniff JSON first, then TOML.
    if let Ok(v) = serde_json::from_str(s) {
        return Ok(v);
    }
    toml::from_str(s).map_err(|_| anyhow!("unsupported surge config format"))
}

/// "ENV" (any case) pulls the key from the environment; an unset variable
/// leaves the key empty so the event provider can skip its call.
fn resolve_api_key(mut cfg: SurgeConfig) -> Result<SurgeConfig> {
    if cfg.ticketmaster_api_key.trim().eq_ignore_ascii_case("env")
        || cfg.ticketmaster_api_key.trim().is_empty()
    {
        cfg.ticketmaster_api_key = std::env::var(ENV_TICKETMASTER_KEY).unwrap_or_default();
    }
    if cfg.fetch_timeout_secs == 0 {
        cfg.fetch_timeout_secs = default_timeout_secs();
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn toml_and_json_formats_work() {
        let toml = r#"
            holiday_api_url = "http://localhost:9/api"
            fetch_timeout_secs = 3
            default_radius_km = 15
        "#;
        let cfg = parse_config(toml, "toml").unwrap();
        assert_eq!(cfg.holiday_api_url, "http://localhost:9/api");
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.default_radius_km, 15);
        assert_eq!(cfg.ticketmaster_url, default_ticketmaster_url());

        let json = r#"{"ticketmaster_api_key": "abc", "seasonality_path": "s.json"}"#;
        let cfg = parse_config(json, "").unwrap();
        assert_eq!(cfg.ticketmaster_api_key, "abc");
        assert_eq!(cfg.seasonality_path, Some(PathBuf::from("s.json")));
        assert_eq!(cfg.default_radius_km, 30);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        // Isolate CWD so a real config/ in the repo does not interfere
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_PATH);
        env::set_var(ENV_TICKETMASTER_KEY, "from-env");

        // No files → defaults, key resolved from env
        let c = load_config_default().unwrap();
        assert_eq!(c.default_radius_km, 30);
        assert_eq!(c.ticketmaster_api_key, "from-env");

        // Fallback file is picked up
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(
            tmp.path().join("config/surge.toml"),
            "default_radius_km = 12\nticketmaster_api_key = \"ENV\"\n",
        )
        .unwrap();
        let c = load_config_default().unwrap();
        assert_eq!(c.default_radius_km, 12);
        assert_eq!(c.ticketmaster_api_key, "from-env");

        // Env path wins
        let p_json = tmp.path().join("override.json");
        fs::write(&p_json, r#"{"default_radius_km": 44, "ticketmaster_api_key": "k"}"#).unwrap();
        env::set_var(ENV_PATH, p_json.display().to_string());
        let c = load_config_default().unwrap();
        assert_eq!(c.default_radius_km, 44);
        assert_eq!(c.ticketmaster_api_key, "k");

        // Dangling env path is an error
        env::set_var(ENV_PATH, tmp.path().join("nope.toml").display().to_string());
        assert!(load_config_default().is_err());

        env::remove_var(ENV_PATH);
        env::remove_var(ENV_TICKETMASTER_KEY);
        env::set_current_dir(&old).unwrap();
    }
}
