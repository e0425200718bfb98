use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RoadwatchError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub http_addr: String,
    /// Shared secret for the sensor ingestion endpoint (`Authorization: API-Key ...`).
    pub api_key: Option<String>,
    /// Staff credential for mutating resource endpoints (`Authorization: Bearer ...`).
    pub admin_token: Option<String>,
    pub import_chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let data_home = env::var("XDG_DATA_HOME").ok();

        let data_root = data_home
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(home).join(".local/share"));

        Self {
            db_path: data_root.join("roadwatch/roadwatch.duckdb"),
            http_addr: "127.0.0.1:8430".to_string(),
            api_key: None,
            admin_token: None,
            import_chunk_size: 1000,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut cfg = Self::default();
        let config_path = config_file_path();
        if let Some(file_overrides) = load_file_overrides(&config_path)? {
            apply_overrides(&mut cfg, file_overrides, "config file")?;
        }
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        let env_overrides = load_env_overrides()?;
        apply_overrides(&mut cfg, env_overrides, "environment")?;
        Ok(cfg)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverrides {
    db_path: Option<PathBuf>,
    http_addr: Option<String>,
    api_key: Option<String>,
    admin_token: Option<String>,
    import_chunk_size: Option<usize>,
}

fn config_file_path() -> PathBuf {
    if let Ok(path) = env::var("ROADWATCH_CONFIG") {
        return PathBuf::from(path);
    }

    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let config_home = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(home).join(".config"));
    config_home.join("roadwatch/config.toml")
}

fn load_file_overrides(path: &PathBuf) -> Result<Option<ConfigOverrides>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| RoadwatchError::Config(format!("failed reading {}: {e}", path.display())))?;
    let parsed: ConfigOverrides = toml::from_str(&raw)
        .map_err(|e| RoadwatchError::Config(format!("failed parsing {}: {e}", path.display())))?;
    Ok(Some(parsed))
}

fn load_env_overrides() -> Result<ConfigOverrides> {
    let import_chunk_size = match env::var("ROADWATCH_IMPORT_CHUNK_SIZE") {
        Ok(v) => Some(v.parse::<usize>().map_err(|e| {
            RoadwatchError::Config(format!("bad ROADWATCH_IMPORT_CHUNK_SIZE in environment: {e}"))
        })?),
        Err(_) => None,
    };

    Ok(ConfigOverrides {
        db_path: env::var("ROADWATCH_DB_PATH").ok().map(PathBuf::from),
        http_addr: env::var("ROADWATCH_HTTP_ADDR").ok(),
        api_key: env::var("ROADWATCH_API_KEY").ok(),
        admin_token: env::var("ROADWATCH_ADMIN_TOKEN").ok(),
        import_chunk_size,
    })
}

fn apply_overrides(cfg: &mut Config, overrides: ConfigOverrides, source: &str) -> Result<()> {
    if let Some(v) = overrides.db_path {
        cfg.db_path = v;
    }
    if let Some(v) = overrides.http_addr {
        cfg.http_addr = v;
    }
    if let Some(v) = overrides.api_key {
        cfg.api_key = Some(v);
    }
    if let Some(v) = overrides.admin_token {
        cfg.admin_token = Some(v);
    }
    if let Some(v) = overrides.import_chunk_size {
        if v == 0 {
            return Err(RoadwatchError::Config(format!(
                "import_chunk_size in {source} must be positive"
            )));
        }
        cfg.import_chunk_size = v;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_expected_addr() {
        let cfg = Config::default();
        assert_eq!(cfg.http_addr, "127.0.0.1:8430");
        assert_eq!(cfg.import_chunk_size, 1000);
        assert!(cfg.api_key.is_none());
        assert!(cfg.admin_token.is_none());
    }

    #[test]
    fn apply_file_overrides_updates_credentials() {
        let mut cfg = Config::default();
        let file = ConfigOverrides {
            api_key: Some("sensor-secret".to_string()),
            admin_token: Some("staff-secret".to_string()),
            http_addr: Some("0.0.0.0:9000".to_string()),
            ..ConfigOverrides::default()
        };

        apply_overrides(&mut cfg, file, "config file").unwrap();

        assert_eq!(cfg.api_key.as_deref(), Some("sensor-secret"));
        assert_eq!(cfg.admin_token.as_deref(), Some("staff-secret"));
        assert_eq!(cfg.http_addr, "0.0.0.0:9000");
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let mut cfg = Config::default();
        let file = ConfigOverrides {
            import_chunk_size: Some(0),
            ..ConfigOverrides::default()
        };
        assert!(apply_overrides(&mut cfg, file, "config file").is_err());
    }
}
