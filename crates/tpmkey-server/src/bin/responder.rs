//! tpmkey responder binary.
//!
//! Connects to an initiator, runs one session, and exits non-zero when the
//! keys were not confirmed.
//!
//! # Usage
//!
//! ```bash
//! tpmkey-responder --connect 127.0.0.1:9400
//! ```

use std::process::ExitCode;

use clap::Parser;
use tpmkey_server::{SessionArgs, SystemEnv, TcpTransport, connect_responder};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// tpmkey responder: connects to an initiator for one session
#[derive(Parser, Debug)]
#[command(name = "tpmkey-responder")]
#[command(about = "Neural synchronization key agreement, responder side")]
#[command(version)]
struct Args {
    /// Initiator address
    #[arg(short, long, default_value = "127.0.0.1:9400")]
    connect: String,

    #[command(flatten)]
    session: SessionArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let outcome = connect_responder(
        &TcpTransport::client(),
        &args.connect,
        args.session.to_config(),
        SystemEnv::new(),
    )
    .await?;

    tracing::info!(
        "result: ok={} rounds={} synced_early={}",
        outcome.ok,
        outcome.rounds,
        outcome.synced_early
    );

    Ok(if outcome.ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
