use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};

use site_watcher::cli::Cli;
use site_watcher::config::{Config, LogFormat};
use site_watcher::notify::{Notifiers, SoundNotifier, WebhookNotifier};
use site_watcher::storage::JsonFileStore;
use site_watcher::utils::http::HttpFetcher;
use site_watcher::{cancellation, Watcher};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli
        .load_settings()
        .context("Failed to load settings")?
        .validate()
        .context("Invalid configuration")?;

    init_logging(&config)?;

    let fetcher = HttpFetcher::new(config.timeout).context("Failed to build HTTP client")?;
    let store = JsonFileStore::new(&config.state_path);

    let mut notifiers = Notifiers::new();
    if config.sound {
        notifiers.push(SoundNotifier::new());
    }
    if let Some(url) = &config.webhook_url {
        notifiers.push(WebhookNotifier::new(url.clone())?);
    }

    let state_path = config.state_path.clone();
    let mut watcher = Watcher::new(config, Box::new(fetcher), Box::new(store), notifiers)
        .await
        .with_context(|| format!("Cannot use state file {}", state_path.display()))?;

    let (handle, token) = cancellation();
    tokio::spawn(async move {
        shutdown_signal().await;
        handle.cancel();
    });

    let exit = watcher.run(token).await;
    debug!("Exit reason: {:?}", exit);

    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(config.log_directive().parse()?);

    // Logs go to stderr so stdout carries only change reports.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
