//! Configuration management for wanjob.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use wanjob_core::config::ConfigManager;
//!
//! let mut config = ConfigManager::new(ConfigManager::default_path());
//! config.load_or_create().unwrap();
//!
//! println!("Submitting to: {}", config.settings().endpoint.submit_url);
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult, LoadStatus};
pub use settings::{
    ConfigSection, EndpointSettings, JobSettings, LoggingSettings, OutputSettings, RetrySettings,
    Settings, TimingSettings,
};
