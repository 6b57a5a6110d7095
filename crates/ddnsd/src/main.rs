// # ddnsd - DDNS Daemon
//
// Thin integration layer: load configuration, build the IP resolver, the
// Alidns provider and the notifier, then hand them to the ddns-core
// scheduler until SIGTERM/SIGINT. All reconciliation logic lives in
// ddns-core.
//
// ## Configuration
//
// Configuration is read from the first of:
//
// 1. The JSON file named by `DDNS_CONFIG_FILE`
// 2. `./config.json` in the working directory
// 3. Environment variables
//
// Keys (same names in JSON and environment):
//
// - `accessKey`, `accessKeySecret`: Alibaba Cloud AccessKey pair (required)
// - `domain`: Comma-separated list, or a JSON array in the file (required)
// - `interval`: Seconds between cycles (default 300)
// - `webHook`: Notification URL template containing `{msg}` (optional)
// - `reconcileMode`: `all` (default) or `first-domain`
// - `timeout`: Per-request timeout in seconds (default 10)
// - `endpoint`: Alidns endpoint (default alidns.cn-chengdu.aliyuncs.com)
// - `dryRun`: `true` to log writes instead of sending them
// - `logLevel`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export accessKey=LTAI...
// export accessKeySecret=...
// export domain=example.com,www.example.com
// export webHook='https://api.day.app/<key>/{msg}'
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::{DdnsConfig, EngineEvent, IpResolver, Reconciler, Scheduler};
use ddns_provider_aliyun::AliyunProvider;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Environment variable naming an explicit config file
const CONFIG_FILE_ENV: &str = "DDNS_CONFIG_FILE";

/// Config file picked up from the working directory
const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Where configuration was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfigSource {
    File(PathBuf),
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Environment => write!(f, "environment"),
        }
    }
}

/// Pick the configuration source
fn config_source(explicit: Option<String>, cwd: &Path) -> ConfigSource {
    if let Some(path) = explicit.filter(|p| !p.trim().is_empty()) {
        return ConfigSource::File(PathBuf::from(path));
    }

    let local = cwd.join(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        ConfigSource::File(local)
    } else {
        ConfigSource::Environment
    }
}

/// Load and validate configuration
fn load_config(source: &ConfigSource) -> Result<DdnsConfig> {
    let config = match source {
        ConfigSource::File(path) => DdnsConfig::from_json_file(path)?,
        ConfigSource::Environment => DdnsConfig::from_env()?,
    };

    config.validate()?;
    Ok(config)
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() -> ExitCode {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let source = config_source(env::var(CONFIG_FILE_ENV).ok(), &cwd);

    let config = match load_config(&source) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error ({}): {}", source, e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&config.log_level))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    for notice in &config.notices {
        warn!("{}", notice);
    }
    info!(
        "Configuration loaded from {}: {} domain(s), {}s interval",
        source,
        config.domains.len(),
        config.interval_secs
    );

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run_daemon(config).await {
            Ok(()) => DdnsExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                if e.downcast_ref::<ddns_core::Error>().is_some_and(|e| e.is_fatal()) {
                    DdnsExitCode::ConfigError
                } else {
                    DdnsExitCode::RuntimeError
                }
            }
        }
    });

    result.into()
}

/// Wire the components and run until a shutdown signal
async fn run_daemon(config: DdnsConfig) -> Result<()> {
    let sources = ddns_ip_http::default_sources(config.request_timeout())
        .context("Failed to build IP sources")?;
    let resolver = IpResolver::new(sources);

    let provider = AliyunProvider::from_config(&config)?;
    if provider.is_dry_run() {
        warn!("Dry-run mode: record changes are logged, not sent");
    }

    let notifier =
        ddns_notify_webhook::from_config(config.web_hook.as_deref(), config.request_timeout())?;
    if !notifier.is_enabled() {
        info!("No webHook configured, notifications disabled");
    }

    let reconciler = Reconciler::new(Arc::new(provider), notifier);
    let (scheduler, events) = Scheduler::new(resolver, reconciler, &config)?;

    for domain in &config.domains {
        info!("Managing domain: {}", domain);
    }

    tokio::spawn(log_events(events));

    scheduler.run().await?;
    info!("Shutting down daemon");
    Ok(())
}

/// Drain engine events so the channel never fills
async fn log_events(mut events: mpsc::Receiver<EngineEvent>) {
    while let Some(event) = events.recv().await {
        debug!("Engine event: {:?}", event);
    }
}
