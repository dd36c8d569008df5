use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use std::io::prelude::*;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.ron";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// Token marking a gap in alignment rows.
    pub gap_token: char,
    /// Trace samples per base call when building a trace from plain base
    /// calls.
    pub samples_per_base: usize,
}

impl std::default::Default for MapConfig {
    fn default() -> Self {
        Self {
            gap_token: '-',
            samples_per_base: 12,
        }
    }
}

impl MapConfig {
    pub fn gap_byte(&self) -> anyhow::Result<u8> {
        if !self.gap_token.is_ascii() {
            anyhow::bail!("Gap token `{}` is not an ASCII character", self.gap_token);
        }
        Ok(self.gap_token as u8)
    }
}

pub fn app_dir() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "", "PherogramMap")
}

pub fn parse_map_config(source: &str) -> anyhow::Result<MapConfig> {
    let cfg = ron::de::from_str(source)?;
    Ok(cfg)
}

fn config_path() -> anyhow::Result<PathBuf> {
    let app_dirs = app_dir().ok_or(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        "Could not find application config directory",
    ))?;

    let mut cfg_path = app_dirs.config_dir().to_path_buf();
    cfg_path.push(CONFIG_FILE_NAME);
    Ok(cfg_path)
}

pub fn load_map_config() -> anyhow::Result<MapConfig> {
    load_map_config_from(config_path()?)
}

pub fn load_map_config_from(cfg_path: impl AsRef<Path>) -> anyhow::Result<MapConfig> {
    let mut file = std::fs::File::open(cfg_path.as_ref())?;
    let mut cfg_buf = String::new();
    let len = file.read_to_string(&mut cfg_buf)?;

    parse_map_config(&cfg_buf[..len])
}

/// Writes the config to the platform config directory, returning the path
/// of the written file.
pub fn save_map_config(config: &MapConfig) -> anyhow::Result<PathBuf> {
    let cfg_path = config_path()?;
    save_map_config_to(config, &cfg_path)?;
    Ok(cfg_path)
}

pub fn save_map_config_to(config: &MapConfig, cfg_path: impl AsRef<Path>) -> anyhow::Result<()> {
    let cfg_path = cfg_path.as_ref();

    if let Some(dir) = cfg_path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
        if !dir.is_dir() {
            anyhow::bail!(
                "A file exists at the config directory path `{dir:?}` but it is not a directory"
            );
        }
    }

    let mut file = std::fs::File::create(cfg_path)?;
    ron::ser::to_writer_pretty(&mut file, config, ron::ser::PrettyConfig::new())?;

    log::info!("Saved configuration to {cfg_path:?}");

    Ok(())
}
