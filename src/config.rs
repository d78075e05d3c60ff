use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub site: SiteConfig,
  /// Override for the directory holding the catalog and cache
  /// databases (default: the platform data directory)
  pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the remote catalog service
  #[serde(default = "default_api_url")]
  pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
  /// Base URL the interception cache resolves request keys against
  #[serde(default = "default_site_url")]
  pub url: String,
}

fn default_api_url() -> String {
  "http://localhost:1337".to_string()
}

fn default_site_url() -> String {
  "http://localhost:8000/".to_string()
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: default_api_url(),
    }
  }
}

impl Default for SiteConfig {
  fn default() -> Self {
    Self {
      url: default_site_url(),
    }
  }
}

impl Config {
  /// Load configuration.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./restorevs.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/restorevs/config.yaml
  ///
  /// Without a config file, built-in defaults apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("restorevs.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("restorevs").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Catalog database path when `data_dir` is overridden.
  pub fn catalog_db_path(&self) -> Option<PathBuf> {
    self.data_dir.as_ref().map(|d| d.join("catalog.db"))
  }

  /// Response-cache database path when `data_dir` is overridden.
  pub fn cache_db_path(&self) -> Option<PathBuf> {
    self.data_dir.as_ref().map(|d| d.join("cache.db"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_apply_without_config() {
    let config = Config::default();
    assert_eq!(config.api.url, "http://localhost:1337");
    assert_eq!(config.site.url, "http://localhost:8000/");
    assert!(config.catalog_db_path().is_none());
  }

  #[test]
  fn test_parse_partial_config() {
    let config: Config = serde_yaml::from_str(
      "api:\n  url: http://example.com:9000\ndata_dir: /tmp/restorevs\n",
    )
    .unwrap();

    assert_eq!(config.api.url, "http://example.com:9000");
    // Unspecified sections keep their defaults
    assert_eq!(config.site.url, "http://localhost:8000/");
    assert_eq!(
      config.cache_db_path().unwrap(),
      PathBuf::from("/tmp/restorevs/cache.db")
    );
  }
}
