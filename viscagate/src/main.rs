use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use viscagate::{Config, Result, ViscaController};

/// VISCA camera-control gateway daemon.
#[derive(Debug, Parser)]
#[clap(verbatim_doc_comment)]
struct CliParser {
    /// Path to the gateway configuration file.
    #[clap(short, long, default_value = "viscagate.toml")]
    pub config: PathBuf,

    /// Log more (-v: debug, -vv: trace). RUST_LOG overrides.
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[tokio::main]
async fn main() -> Result {
    let opts = CliParser::parse();
    let default_level = match opts.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .compact()
        .init();

    let config = Config::load(&opts.config)?;
    let gateway = ViscaController::start(config).await?;
    info!(
        "gateway running with {} camera(s); ctrl-c to stop",
        gateway.camera_count().await?
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    gateway.shutdown().await
}
