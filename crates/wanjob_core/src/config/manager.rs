//! Config manager for loading and saving settings.
//!
//! Key features:
//! - Atomic writes (write to temp file, then rename)
//! - Validation on load (unknown sections and missing keys trigger a rewrite)
//! - Default location under the platform config directory

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;
use toml_edit::DocumentMut;
use tracing::{debug, info};

use super::settings::{ConfigSection, Settings};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// What `load_or_create` did to the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// File read as-is.
    Loaded,
    /// File had unknown sections or missing keys and was rewritten.
    Rewritten,
    /// No file existed; defaults were written.
    Created,
}

/// Manages application configuration.
#[derive(Debug)]
pub struct ConfigManager {
    /// Path to the config file.
    config_path: PathBuf,
    /// Current settings loaded in memory.
    settings: Settings,
    /// Run `Settings::validate` on every load.
    validate_on_load: bool,
}

impl ConfigManager {
    /// Create a new config manager with the given config file path.
    ///
    /// Does not load the config - call `load()` or `load_or_create()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
            validate_on_load: true,
        }
    }

    /// Skip validation while loading.
    ///
    /// For callers that layer their own overrides on top of the file and
    /// validate the merged result with `Settings::validate`.
    pub fn defer_validation(mut self) -> Self {
        self.validate_on_load = false;
        self
    }

    /// Platform default location, e.g. `~/.config/wanjob/settings.toml`.
    ///
    /// Falls back to `settings.toml` in the working directory when no home
    /// directory can be determined.
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("", "", "wanjob")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from("settings.toml"))
    }

    /// Get the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get a reference to the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a mutable reference to the current settings.
    ///
    /// Note: Changes made here are only in memory until `save()` is called.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Consume the manager and return the settings.
    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Load config from file.
    ///
    /// Returns error if file doesn't exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = self.parse_and_validate(&content)?;
        debug!("Loaded config from {}", self.config_path.display());
        Ok(())
    }

    /// Load config from file, creating with defaults if it doesn't exist.
    ///
    /// Also validates and cleans up the config, saving if changes were made.
    pub fn load_or_create(&mut self) -> ConfigResult<LoadStatus> {
        if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            let (settings, was_modified) = self.parse_validate_and_clean(&content)?;
            self.settings = settings;

            if was_modified {
                info!(
                    "Config {} had unknown or missing keys, rewriting",
                    self.config_path.display()
                );
                self.save()?;
                return Ok(LoadStatus::Rewritten);
            }
            Ok(LoadStatus::Loaded)
        } else {
            info!("Creating default config at {}", self.config_path.display());
            self.settings = Settings::default();
            self.save()?;
            Ok(LoadStatus::Created)
        }
    }

    /// Parse and validate config content.
    fn parse_and_validate(&self, content: &str) -> ConfigResult<Settings> {
        let settings: Settings = toml::from_str(content)?;
        if self.validate_on_load {
            settings.validate().map_err(ConfigError::Invalid)?;
        }
        Ok(settings)
    }

    /// Parse, validate, and clean up config content.
    ///
    /// Returns the settings and whether any modifications were made.
    fn parse_validate_and_clean(&self, content: &str) -> ConfigResult<(Settings, bool)> {
        let doc: DocumentMut = content.parse()?;

        // Parse into settings (this applies defaults for missing fields)
        let settings = self.parse_and_validate(content)?;

        let has_unknown = doc
            .iter()
            .any(|(key, _)| !ConfigSection::ALL.iter().any(|s| s.table_name() == key));

        // Missing keys show up as a difference after re-serializing with defaults
        let regenerated = self.render(&settings)?;
        let was_modified = has_unknown || strip_comments(content) != strip_comments(&regenerated);

        Ok((settings, was_modified))
    }

    /// Save the entire config atomically.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.render(&self.settings)?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Render settings as TOML with a comment above each section.
    fn render(&self, settings: &Settings) -> ConfigResult<String> {
        let mut output = String::new();
        output.push_str("# wanjob configuration\n");
        output.push_str("# Every value can also be overridden on the command line or via WANJOB_* variables.\n\n");

        for (i, section) in ConfigSection::ALL.iter().enumerate() {
            let body = match section {
                ConfigSection::Endpoint => toml::to_string_pretty(&settings.endpoint)?,
                ConfigSection::Job => toml::to_string_pretty(&settings.job)?,
                ConfigSection::Retry => toml::to_string_pretty(&settings.retry)?,
                ConfigSection::Timing => toml::to_string_pretty(&settings.timing)?,
                ConfigSection::Output => toml::to_string_pretty(&settings.output)?,
                ConfigSection::Logging => toml::to_string_pretty(&settings.logging)?,
            };

            if i > 0 {
                output.push('\n');
            }
            output.push_str(&format!("# {}\n", section.comment()));
            output.push_str(&format!("[{}]\n", section.table_name()));
            for line in body.lines() {
                output.push_str(line);
                output.push('\n');
            }
        }

        Ok(output)
    }

    /// Write content to config file atomically.
    ///
    /// Writes to a temp file first, then renames.
    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.config_path.with_extension("toml.tmp");

        let written = fs::File::create(&temp_path).and_then(|mut file| {
            file.write_all(content.as_bytes())?;
            file.sync_all()
        });
        let result = written.and_then(|()| fs::rename(&temp_path, &self.config_path));
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        result
    }
}

/// Drop comments and blank lines so hand edits to comments don't force a rewrite.
fn strip_comments(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}
