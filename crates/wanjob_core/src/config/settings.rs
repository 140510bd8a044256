//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Every field has a serde default so a partial file is always valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Remote API endpoint settings.
    #[serde(default)]
    pub endpoint: EndpointSettings,

    /// The job submitted on every attempt.
    #[serde(default)]
    pub job: JobSettings,

    /// Retry policy.
    #[serde(default)]
    pub retry: RetrySettings,

    /// Heartbeat and deadline timers.
    #[serde(default)]
    pub timing: TimingSettings,

    /// Where the result is written.
    #[serde(default)]
    pub output: OutputSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Check values that serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.submit_url.trim().is_empty() {
            return Err("endpoint.submit_url must not be empty".to_string());
        }
        if self.job.image_url.trim().is_empty() || self.job.video_url.trim().is_empty() {
            return Err("job.image_url and job.video_url must not be empty".to_string());
        }
        if self.retry.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }
        if self.timing.heartbeat_secs == 0 {
            return Err("timing.heartbeat_secs must be greater than 0".to_string());
        }
        if self.timing.deadline_secs == 0 {
            return Err("timing.deadline_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Remote endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSettings {
    /// Submission URL. The event stream lives at `<submit_url>/<event_id>`.
    #[serde(default = "default_submit_url")]
    pub submit_url: String,

    /// TCP connect timeout for both requests.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Total timeout for the submission request.
    #[serde(default = "default_submit_timeout_secs")]
    pub submit_timeout_secs: u64,
}

fn default_submit_url() -> String {
    "https://wan-ai-wan2-2-animate.hf.space/gradio_api/call/predict".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_submit_timeout_secs() -> u64 {
    120
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            submit_url: default_submit_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            submit_timeout_secs: default_submit_timeout_secs(),
        }
    }
}

impl EndpointSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }
}

/// Job inputs: two source assets and two model-selection tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSettings {
    /// Source image asset URL.
    #[serde(default = "default_image_url")]
    pub image_url: String,

    /// Source video asset URL.
    #[serde(default = "default_video_url")]
    pub video_url: String,

    /// Model variant token.
    #[serde(default = "default_model")]
    pub model: String,

    /// Quality tier token.
    #[serde(default = "default_tier")]
    pub tier: String,
}

fn default_image_url() -> String {
    "https://raw.githubusercontent.com/Pa1mekala37/rawCont/main/pari.jpeg".to_string()
}

fn default_video_url() -> String {
    "https://raw.githubusercontent.com/Pa1mekala37/rawCont/main/Video-995.mp4".to_string()
}

fn default_model() -> String {
    "wan2.2-animate-move".to_string()
}

fn default_tier() -> String {
    "wan-pro".to_string()
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            image_url: default_image_url(),
            video_url: default_video_url(),
            model: default_model(),
            tier: default_tier(),
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total number of attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed wait between a failed attempt and the next one.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
}

fn default_max_attempts() -> u32 {
    10
}

fn default_backoff_secs() -> u64 {
    15
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_secs: default_backoff_secs(),
        }
    }
}

impl RetrySettings {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }
}

/// Liveness timers for the streaming phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingSettings {
    /// Period of the "still waiting" log line.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,

    /// Hard limit on how long one attempt may wait for its result.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

fn default_heartbeat_secs() -> u64 {
    60
}

fn default_deadline_secs() -> u64 {
    2 * 60 * 60
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            heartbeat_secs: default_heartbeat_secs(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

impl TimingSettings {
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

/// Output location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// File that receives the raw text of the successful event record.
    #[serde(default = "default_result_path")]
    pub result_path: PathBuf,
}

fn default_result_path() -> PathBuf {
    PathBuf::from("result.txt")
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            result_path: default_result_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Level used when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Optional file that mirrors the console log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            log_file: None,
        }
    }
}

/// Configuration sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Endpoint,
    Job,
    Retry,
    Timing,
    Output,
    Logging,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 6] = [
        ConfigSection::Endpoint,
        ConfigSection::Job,
        ConfigSection::Retry,
        ConfigSection::Timing,
        ConfigSection::Output,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Endpoint => "endpoint",
            ConfigSection::Job => "job",
            ConfigSection::Retry => "retry",
            ConfigSection::Timing => "timing",
            ConfigSection::Output => "output",
            ConfigSection::Logging => "logging",
        }
    }

    /// Comment written above the table.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Endpoint => "Remote inference API",
            ConfigSection::Job => "Job inputs sent on every attempt",
            ConfigSection::Retry => "Attempts and the wait between them",
            ConfigSection::Timing => "Heartbeat period and hard deadline (seconds)",
            ConfigSection::Output => "Result file",
            ConfigSection::Logging => "Logging (RUST_LOG overrides level)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[endpoint]"));
        assert!(toml.contains("[retry]"));
        assert!(toml.contains("submit_url"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let minimal = "[retry]\nmax_attempts = 3";
        let parsed: Settings = toml::from_str(minimal).unwrap();
        assert_eq!(parsed.retry.max_attempts, 3);
        assert_eq!(parsed.retry.backoff_secs, 15);
        assert_eq!(parsed.job.model, "wan2.2-animate-move");
        assert_eq!(parsed.output.result_path, PathBuf::from("result.txt"));
    }

    #[test]
    fn log_level_reads_lowercase() {
        let parsed: Settings = toml::from_str("[logging]\nlevel = \"debug\"").unwrap();
        assert_eq!(parsed.logging.level, LogLevel::Debug);

        // Same spellings as the command line accepts
        let parsed: Settings = toml::from_str("[logging]\nlevel = \"warning\"").unwrap();
        assert_eq!(parsed.logging.level, LogLevel::Warn);
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.retry.max_attempts = 0;
        assert!(settings.validate().unwrap_err().contains("max_attempts"));
    }

    #[test]
    fn validate_rejects_zero_timers() {
        let mut settings = Settings::default();
        settings.timing.deadline_secs = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.timing.heartbeat_secs = 0;
        assert!(settings.validate().is_err());
    }
}
