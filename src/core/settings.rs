// src/core/settings.rs

use crate::core::paths::{self, PathError};
use crate::models::Settings;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Failed to parse settings.toml: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize settings to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Loads `settings.toml` from the config directory, writing the defaults on first run.
pub fn load_settings() -> Result<Settings, SettingsError> {
    let settings_path = paths::get_settings_path()?;
    load_settings_from(&settings_path)
}

pub fn load_settings_from(settings_path: &Path) -> Result<Settings, SettingsError> {
    if !settings_path.exists() {
        let default_settings = Settings::default();
        let toml_string = toml::to_string_pretty(&default_settings)?;
        fs::write(settings_path, toml_string)?;
        log::debug!("Wrote default settings to '{}'", settings_path.display());
        return Ok(default_settings);
    }
    let content = fs::read_to_string(settings_path)?;
    Ok(toml::from_str(&content)?)
}

/// The environment registry directory with `~` and variables expanded.
pub fn environments_dir(settings: &Settings) -> Result<PathBuf, SettingsError> {
    Ok(paths::expand_path_template(&settings.environments_dir)?)
}
