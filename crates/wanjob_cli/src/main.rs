//! wanjob - submit an animation job and save its streamed result.
//!
//! Exit status: 0 on success, 1 when every attempt failed, 2 for startup or
//! configuration errors, 124 when the deadline was hit, 130 on Ctrl-C.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Args, Parser};
use tracing::{debug, error, info, warn};

use wanjob_core::client::HttpJobApi;
use wanjob_core::config::{ConfigManager, LoadStatus, Settings};
use wanjob_core::logging::{init_tracing, LogLevel};
use wanjob_core::orchestrator::JobRunner;

const STARTUP_FAILURE: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "wanjob", version, about = "Submit an animation job and wait for its result")]
struct Cli {
    /// Settings file (created with defaults if missing)
    #[arg(long, env = "WANJOB_CONFIG")]
    config: Option<PathBuf>,

    /// Write the effective settings to the config file and exit
    #[arg(long)]
    write_config: bool,

    #[command(flatten)]
    overrides: Overrides,
}

/// Per-field overrides applied on top of the settings file.
#[derive(Debug, Default, Args)]
struct Overrides {
    #[arg(long, env = "WANJOB_SUBMIT_URL")]
    submit_url: Option<String>,
    #[arg(long, env = "WANJOB_IMAGE_URL")]
    image_url: Option<String>,
    #[arg(long, env = "WANJOB_VIDEO_URL")]
    video_url: Option<String>,
    #[arg(long, env = "WANJOB_MODEL")]
    model: Option<String>,
    #[arg(long, env = "WANJOB_TIER")]
    tier: Option<String>,
    #[arg(long, env = "WANJOB_MAX_ATTEMPTS")]
    max_attempts: Option<u32>,
    #[arg(long, env = "WANJOB_BACKOFF_SECS")]
    backoff_secs: Option<u64>,
    #[arg(long, env = "WANJOB_HEARTBEAT_SECS")]
    heartbeat_secs: Option<u64>,
    #[arg(long, env = "WANJOB_DEADLINE_SECS")]
    deadline_secs: Option<u64>,
    /// Where the winning event record is written
    #[arg(long, env = "WANJOB_OUTPUT")]
    output: Option<PathBuf>,
    #[arg(long, env = "WANJOB_LOG_LEVEL")]
    log_level: Option<LogLevel>,
    #[arg(long, env = "WANJOB_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Overrides {
    fn apply(&self, settings: &mut Settings) {
        if let Some(url) = &self.submit_url {
            settings.endpoint.submit_url = url.clone();
        }
        if let Some(url) = &self.image_url {
            settings.job.image_url = url.clone();
        }
        if let Some(url) = &self.video_url {
            settings.job.video_url = url.clone();
        }
        if let Some(model) = &self.model {
            settings.job.model = model.clone();
        }
        if let Some(tier) = &self.tier {
            settings.job.tier = tier.clone();
        }
        if let Some(n) = self.max_attempts {
            settings.retry.max_attempts = n;
        }
        if let Some(secs) = self.backoff_secs {
            settings.retry.backoff_secs = secs;
        }
        if let Some(secs) = self.heartbeat_secs {
            settings.timing.heartbeat_secs = secs;
        }
        if let Some(secs) = self.deadline_secs {
            settings.timing.deadline_secs = secs;
        }
        if let Some(path) = &self.output {
            settings.output.result_path = path.clone();
        }
        if let Some(level) = self.log_level {
            settings.logging.level = level;
        }
        if let Some(path) = &self.log_file {
            settings.logging.log_file = Some(path.clone());
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("wanjob: {:#}", e);
            ExitCode::from(STARTUP_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let (config, status) = resolve_config(&cli)?;

    if cli.write_config {
        config.save()?;
        println!("Wrote {}", config.path().display());
        return Ok(ExitCode::SUCCESS);
    }

    let config_path = config.path().to_path_buf();
    let settings = config.into_settings();
    let _log_guard = init_tracing(settings.logging.level, settings.logging.log_file.as_deref())
        .context("failed to open log file")?;

    info!("wanjob {}", wanjob_core::version());
    match status {
        Some(LoadStatus::Created) => {
            info!("Created default config at {}", config_path.display())
        }
        Some(LoadStatus::Rewritten) => info!(
            "Rewrote {} (unknown sections dropped, missing keys filled in)",
            config_path.display()
        ),
        Some(LoadStatus::Loaded) => debug!("Loaded config from {}", config_path.display()),
        None => debug!("No config at {}, using defaults", config_path.display()),
    }
    info!(
        "Submitting to {} (max {} attempts, {}s backoff, {}s deadline)",
        settings.endpoint.submit_url,
        settings.retry.max_attempts,
        settings.retry.backoff_secs,
        settings.timing.deadline_secs
    );

    let api = HttpJobApi::new(&settings.endpoint).context("failed to build HTTP client")?;
    let runner = JobRunner::from_settings(api, &settings);

    let cancel = runner.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            cancel.cancel();
        }
    });

    match runner.run().await {
        Ok(summary) => {
            info!(
                "Result saved to {} after {} attempt(s) in {}s",
                summary.output_path.display(),
                summary.attempts,
                summary.elapsed.as_secs()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("{}", e);
            let code = u8::try_from(e.exit_code()).unwrap_or(1);
            Ok(ExitCode::from(code))
        }
    }
}

/// Load the settings file, apply overrides, then validate the result.
///
/// Loading runs before tracing is set up, so the load status is returned
/// for the caller to log.
fn resolve_config(cli: &Cli) -> anyhow::Result<(ConfigManager, Option<LoadStatus>)> {
    let (mut config, status) = load_config(cli)?;
    cli.overrides.apply(config.settings_mut());
    config
        .settings()
        .validate()
        .map_err(|e| anyhow!("invalid configuration: {}", e))?;
    Ok((config, status))
}

/// Read `--config`, the default location if it exists, or built-in
/// defaults. Values are not validated here.
fn load_config(cli: &Cli) -> anyhow::Result<(ConfigManager, Option<LoadStatus>)> {
    let explicit = cli.config.is_some();
    let path = cli.config.clone().unwrap_or_else(ConfigManager::default_path);
    let mut config = ConfigManager::new(&path).defer_validation();

    let status = if explicit {
        let status = config
            .load_or_create()
            .with_context(|| format!("failed to load {}", path.display()))?;
        Some(status)
    } else if path.exists() {
        config
            .load()
            .with_context(|| format!("failed to load {}", path.display()))?;
        Some(LoadStatus::Loaded)
    } else {
        None
    };

    Ok((config, status))
}
