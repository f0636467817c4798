//! Automod
//!
//! Persistent moderation service that keeps the hate-speech model loaded in
//! memory so repeated moderation requests avoid the multi-second cost of
//! reloading model weights per call.

use anyhow::{Context, Result};
use automod_classifiers::{BertHateClassifier, ContentModerator, HateSpeechClassifier};
use automod_core::{ContentRecord, ModerationResult};
use automod_service::cli::{Cli, Commands};
use automod_service::config::ServiceConfig;
use automod_service::lifecycle::{self, HealthSnapshot, ServiceState, IDLE_CHECK_INTERVAL};
use automod_service::routes::AppState;
use automod_service::server::run_server;
use clap::Parser;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { verbose } => serve(verbose).await,
        Commands::Moderate { verbose } => {
            let result = match moderate_once(verbose).await {
                Ok(result) => result,
                // Same fail-open contract as the service: the caller always
                // gets a parseable allow decision, never a hard failure.
                Err(e) => ModerationResult::fail_open(format!("moderation error: {e}")),
            };
            println!("{}", serde_json::to_string(&result)?);
            Ok(())
        }
        Commands::Status { host, port } => status(&host, port).await,
    }
}

/// Run the persistent moderation service
async fn serve(verbose: bool) -> Result<()> {
    let config = ServiceConfig::from_env().context("invalid configuration")?;
    init_tracing(&config.log_level, verbose, false);

    info!("starting persistent moderation service");
    config.log_summary();

    // Load-once: a model that cannot be acquired is the only fatal error
    // after configuration, and it aborts before the listener binds.
    let classifier = Arc::new(BertHateClassifier::new(&config.model));
    if let Err(e) = classifier.load().await {
        error!(error = %e, "failed to initialize moderation service");
        return Err(e.into());
    }

    let moderator = Arc::new(ContentModerator::new(
        classifier,
        config.confidence_threshold,
        config.max_text_length,
        config.request_timeout,
    )?);

    let lifecycle = Arc::new(ServiceState::new(config.idle_timeout));
    lifecycle.mark_model_loaded();

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    tokio::spawn(lifecycle::idle_watchdog(
        lifecycle.clone(),
        IDLE_CHECK_INTERVAL,
        shutdown_tx,
    ));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;

    run_server(
        addr,
        AppState {
            moderator,
            lifecycle,
        },
        shutdown_rx,
    )
    .await
}

/// One-shot moderation: record on stdin, result on stdout
async fn moderate_once(verbose: bool) -> Result<ModerationResult> {
    let config = ServiceConfig::from_env().context("invalid configuration")?;
    // stdout carries the result JSON; keep logs on stderr
    init_tracing(&config.log_level, verbose, true);

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read stdin")?;
    let record: ContentRecord =
        serde_json::from_str(&input).context("invalid content record")?;

    let classifier = Arc::new(BertHateClassifier::new(&config.model));
    classifier.load().await.context("failed to load model")?;

    let moderator = ContentModerator::new(
        classifier,
        config.confidence_threshold,
        config.max_text_length,
        config.request_timeout,
    )?;

    Ok(moderator.moderate(&record).await)
}

/// Probe the health endpoint of a running service
async fn status(host: &str, port: u16) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let response = client
        .get(format!("http://{host}:{port}/health"))
        .send()
        .await;

    match response {
        Ok(response) if response.status().is_success() => {
            let health: HealthSnapshot = response.json().await?;
            println!("service is running on port {port}");
            println!("  status:       {}", health.status);
            println!("  model loaded: {}", health.model_loaded);
            println!(
                "  last used:    {}",
                health
                    .last_used
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string())
            );
            println!("  uptime:       {}", health.uptime);
            Ok(())
        }
        _ => {
            println!("service is not running on port {port}");
            std::process::exit(1);
        }
    }
}

/// Initialize tracing from LOG_LEVEL / RUST_LOG
fn init_tracing(level: &str, verbose: bool, to_stderr: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("automod_service=debug,automod_classifiers=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "automod_service={level},automod_classifiers={level}"
            ))
        })
    };

    let registry = tracing_subscriber::registry().with(filter);
    if to_stderr {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
