//! Command-line configuration (`config.toml`).
//!
//! ```toml
//! log_level = "info"
//! store = "/path/to/workbook.json"
//!
//! [sheet]
//! max_rows = 200
//! columns = 26
//! ```

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use gridsheet_core::Config;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: Option<String>,
    pub store: Option<PathBuf>,
    pub sheet: Config,
}

/// Load `path`, or the user's config file if no path is given.
///
/// A missing user config file means defaults; a missing explicit file is an
/// error.
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let explicit = path.is_some();
    let Some(path) = path.map(Path::to_path_buf).or_else(user_config_path) else {
        return Ok(AppConfig::default());
    };

    if !path.exists() {
        if explicit {
            bail!("Config file not found: {}", path.display());
        }
        return Ok(AppConfig::default());
    }

    let meta = fs::metadata(&path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        bail!(
            "Refusing to read {}: file too large ({} bytes, max {})",
            path.display(),
            meta.len(),
            MAX_CONFIG_FILE_BYTES
        );
    }
    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridsheet")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

/// Where the workbook lives when neither `--store` nor the config names a file.
pub fn default_store_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridsheet")?;
    let mut path = proj.data_dir().to_path_buf();
    path.push("workbook.json");
    Some(path)
}
