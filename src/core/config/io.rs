use crate::core::config::data::{path_display, Settings};
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Errors that can occur when loading settings from disk.
#[derive(Debug)]
pub enum SettingsError {
    /// Failed to read the settings file from disk.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The settings file is not valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// No settings directory could be determined for this platform.
    NoHome,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read settings at {}: {}",
                    path_display(path),
                    source
                )
            }
            SettingsError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse settings at {}: {}",
                    path_display(path),
                    source
                )
            }
            SettingsError::NoHome => {
                write!(f, "Could not determine a settings directory for this platform")
            }
        }
    }
}

impl StdError for SettingsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SettingsError::Read { source, .. } => Some(source),
            SettingsError::Parse { source, .. } => Some(source),
            SettingsError::NoHome => None,
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing file is not an error; it loads
    /// as the defaults, which is what a fresh install sees.
    pub fn load_from_path(path: &Path) -> Result<Settings, SettingsError> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write settings to `path` atomically: the new contents are staged in a
    /// temp file in the same directory and renamed over the old file, so a
    /// crash mid-save never leaves a half-written settings file behind.
    pub fn save_to_path(&self, path: &Path) -> Result<(), Box<dyn StdError>> {
        let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };

        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(path)
            .map_err(|err| -> Box<dyn StdError> { Box::new(err) })?;
        Ok(())
    }

    /// Where settings live on this platform.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let proj_dirs = ProjectDirs::from("", "", "confab").ok_or(SettingsError::NoHome)?;
        Ok(proj_dirs.config_dir().join("settings.toml"))
    }
}
