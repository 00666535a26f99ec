mod cli;


use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use sqd_indexer::config::ImporterConfig;
use sqd_indexer::{importer, metrics, server};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};


fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    init_tracing(args.json_log);

    let mut config = ImporterConfig::read(&args.config)
        .context("failed to read importer config")?;

    if let Some(progress_file) = &args.progress_file {
        config.progress_file = progress_file.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.validate().context("invalid config")?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(args, config))
}


async fn run(args: Cli, config: ImporterConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("received termination signal");
            shutdown.cancel();
        }
    });

    let metrics_server = args.prom_port.map(|port| {
        let mut registry = prometheus_client::registry::Registry::default();
        metrics::register_metrics(&mut registry);
        tokio::spawn(server::run_metrics_server(registry, port, shutdown.clone()))
    });

    let result = match args.command {
        Command::Transactions => importer::run_transactions(&config, shutdown.clone()).await,
        Command::Blocks => importer::run_blocks(&config, shutdown.clone()).await
    };

    shutdown.cancel();
    if let Some(handle) = metrics_server {
        match handle.await {
            Ok(Ok(())) => {},
            Ok(Err(err)) => error!(err =? err, "metrics server failed"),
            Err(_) => error!("metrics server panicked")
        }
    }

    let summary = result?;
    info!(
        blocks = summary.blocks,
        units = summary.units,
        checkpoints = summary.checkpoints,
        "done, {} -> {}",
        summary.start,
        summary.cursor
    );
    Ok(())
}


fn init_tracing(json: bool) {
    use std::io::IsTerminal;

    let env_filter = tracing_subscriber::EnvFilter::builder().parse_lossy(
        std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV)
            .unwrap_or("info".to_string()),
    );

    if json || !std::io::stdout().is_terminal() {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .compact()
            .init();
    }
}


async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
