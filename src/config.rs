use crate::alias::AliasRegistry;
use crate::hash::DedupWindow;
use crate::store::UserId;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Currency given to users the first time they are seen.
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// User the CLI acts as when `--user` is not passed.
    #[serde(default = "default_user")]
    pub default_user: UserId,

    /// Width of the duplicate-detection window, in seconds.
    ///
    /// Two identical commands whose timestamps fall in the same window are
    /// treated as one submission.
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u32,

    /// Tracing filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_currency() -> String {
    "NZD".to_string()
}

fn default_user() -> UserId {
    1
}

fn default_dedup_window_secs() -> u32 {
    DedupWindow::ONE_SECOND.secs()
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
            default_user: default_user(),
            dedup_window_secs: default_dedup_window_secs(),
            log_filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    pub fn dedup_window(&self) -> DedupWindow {
        DedupWindow::from_secs(self.dedup_window_secs)
    }

    fn validate(&mut self, registry: &AliasRegistry) -> Result<()> {
        let Some(currency) = registry.resolve_currency(&self.default_currency) else {
            bail!(
                "Unsupported default_currency {:?} in config",
                self.default_currency
            );
        };
        self.default_currency = currency.code.to_string();
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

pub fn app_paths(override_home: Option<PathBuf>) -> Result<AppPaths> {
    if let Some(home) = override_home {
        return Ok(AppPaths {
            config_dir: home.join("config"),
            data_dir: home.join("data"),
        });
    }

    let proj = ProjectDirs::from("com", "tally", "tally")
        .context("Failed to resolve platform directories")?;

    Ok(AppPaths {
        config_dir: proj.config_dir().to_path_buf(),
        data_dir: proj.data_dir().to_path_buf(),
    })
}

pub fn load_or_init_config(
    paths: &AppPaths,
    registry: &AliasRegistry,
) -> Result<(AppConfig, PathBuf)> {
    fs::create_dir_all(&paths.config_dir)
        .with_context(|| format!("Failed to create config dir {}", paths.config_dir.display()))?;

    let cfg_path = paths.config_dir.join("config.json");
    if !cfg_path.exists() {
        let cfg = AppConfig::default();
        write_config(&cfg_path, &cfg)?;
        return Ok((cfg, cfg_path));
    }

    let raw = fs::read_to_string(&cfg_path)
        .with_context(|| format!("Failed to read {}", cfg_path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", cfg_path.display()))?;
    let mut cfg: AppConfig = serde_json::from_value(value.clone())
        .with_context(|| format!("Failed to parse {}", cfg_path.display()))?;
    cfg.validate(registry)
        .with_context(|| format!("Invalid config {}", cfg_path.display()))?;

    // Fill in fields added since the file was written.
    if serde_json::to_value(&cfg)? != value {
        write_config(&cfg_path, &cfg)?;
    }

    Ok((cfg, cfg_path))
}

pub fn write_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(home: &tempfile::TempDir) -> AppPaths {
        app_paths(Some(home.path().to_path_buf())).unwrap()
    }

    #[test]
    fn first_run_writes_defaults() {
        let home = tempfile::tempdir().unwrap();
        let (cfg, cfg_path) = load_or_init_config(&paths(&home), &AliasRegistry::standard()).unwrap();
        assert!(cfg_path.exists());
        assert_eq!(cfg.default_currency, "NZD");
        assert_eq!(cfg.dedup_window(), DedupWindow::ONE_SECOND);
    }

    #[test]
    fn missing_fields_are_filled_and_currency_normalised() {
        let home = tempfile::tempdir().unwrap();
        let paths = paths(&home);
        fs::create_dir_all(&paths.config_dir).unwrap();
        let cfg_path = paths.config_dir.join("config.json");
        fs::write(&cfg_path, r#"{"default_currency": "usd"}"#).unwrap();

        let (cfg, _) = load_or_init_config(&paths, &AliasRegistry::standard()).unwrap();
        assert_eq!(cfg.default_currency, "USD");
        assert_eq!(cfg.default_user, 1);

        let rewritten = fs::read_to_string(&cfg_path).unwrap();
        assert!(rewritten.contains("dedup_window_secs"));
    }

    #[test]
    fn unsupported_currency_is_rejected() {
        let home = tempfile::tempdir().unwrap();
        let paths = paths(&home);
        fs::create_dir_all(&paths.config_dir).unwrap();
        fs::write(
            paths.config_dir.join("config.json"),
            r#"{"default_currency": "XYZ"}"#,
        )
        .unwrap();

        assert!(load_or_init_config(&paths, &AliasRegistry::standard()).is_err());
    }
}
