//! Application configuration.
//!
//! Read from `plotgate.toml` in the working directory when it exists. Every
//! field has a default, so a partial file (or none at all) is fine.

use std::{
  collections::BTreeMap,
  net::SocketAddr,
  path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "plotgate.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Address the web interface listens on.
  pub bind:         SocketAddr,
  /// Directory scanned for `.csv` files. Created on startup if missing.
  pub data_dir:     PathBuf,
  /// Rows shown in the data preview.
  pub preview_rows: usize,
  /// Username to password. Compared verbatim.
  pub credentials:  BTreeMap<String, String>,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      bind:         SocketAddr::from(([127, 0, 0, 1], 8501)),
      data_dir:     PathBuf::from("data"),
      preview_rows: 5,
      credentials:  BTreeMap::from([
        ("admin".to_string(), "password123".to_string()),
        ("user".to_string(), "pass456".to_string()),
      ]),
    }
  }
}

impl Config {
  pub fn load() -> anyhow::Result<Self> { Self::load_from(Path::new(CONFIG_FILE)) }

  pub fn load_from(path: &Path) -> anyhow::Result<Self> {
    if !path.exists() {
      return Ok(Self::default());
    }

    let contents =
      std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Self::parse(&contents).with_context(|| format!("parsing {}", path.display()))
  }

  pub fn parse(contents: &str) -> anyhow::Result<Self> {
    let config: Config = toml::from_str(contents)?;
    if config.credentials.is_empty() {
      anyhow::bail!("at least one credential must be configured");
    }
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_include_builtin_users() {
    let config = Config::default();
    assert_eq!(config.credentials.get("admin").map(String::as_str), Some("password123"));
    assert_eq!(config.credentials.get("user").map(String::as_str), Some("pass456"));
    assert_eq!(config.preview_rows, 5);
  }

  #[test]
  fn partial_file_keeps_defaults() {
    let config = Config::parse("data_dir = \"/srv/csv\"\n").unwrap();
    assert_eq!(config.data_dir, PathBuf::from("/srv/csv"));
    assert_eq!(config.bind, Config::default().bind);
  }

  #[test]
  fn credentials_replace_the_defaults() {
    let config = Config::parse("[credentials]\nalice = \"s3cret\"\n").unwrap();
    assert_eq!(config.credentials.len(), 1);
    assert!(config.credentials.contains_key("alice"));
  }

  #[test]
  fn empty_credentials_are_rejected() {
    assert!(Config::parse("[credentials]\n").is_err());
  }

  #[test]
  fn missing_file_is_default() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.data_dir, PathBuf::from("data"));
  }
}
