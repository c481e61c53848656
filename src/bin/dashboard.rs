use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dns_dashboard::{
    actors::refresh::RefreshHandle,
    api::{ApiConfig, ApiState, spawn_api_server},
    config::Config,
};
use tokio::sync::broadcast;
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(name = "dns-dashboard")]
#[command(about = "DNS and Traefik metrics dashboard with reachability alerts", long_about = None)]
struct Args {
    /// Config file (JSON)
    #[arg(short)]
    file: Option<PathBuf>,

    /// Address to serve the dashboard on (overrides config and environment)
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("dns_dashboard", LevelFilter::DEBUG),
        ("dashboard", LevelFilter::DEBUG),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let mut config = Config::load(args.file.as_deref()).context("failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    let config = config.resolve().context("invalid configuration")?;

    let (payload_tx, _) = broadcast::channel(16);
    let refresh = RefreshHandle::spawn(&config, payload_tx)?;

    let state = ApiState::new(refresh.clone(), config.interval.as_secs());
    let addr = spawn_api_server(
        ApiConfig {
            bind_addr: config.bind,
        },
        state,
    )
    .await?;
    info!("dashboard available at http://{addr}/");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    refresh.shutdown().await?;

    Ok(())
}
