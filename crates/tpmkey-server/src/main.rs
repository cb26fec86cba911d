//! tpmkey initiator binary.
//!
//! # Usage
//!
//! ```bash
//! # Serve sessions until interrupted
//! tpmkey-initiator --bind 0.0.0.0:9400
//!
//! # Serve a single session with a larger machine and hashed telemetry
//! tpmkey-initiator --once -k 4 -n 16 -l 4 --telemetry hash
//! ```

use clap::Parser;
use tpmkey_server::{Server, ServerRuntimeConfig, SessionArgs};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// tpmkey initiator: listens and drives key-agreement sessions
#[derive(Parser, Debug)]
#[command(name = "tpmkey-initiator")]
#[command(about = "Neural synchronization key agreement, initiator side")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:9400")]
    bind: String,

    /// Serve a single session, then exit
    #[arg(long)]
    once: bool,

    #[command(flatten)]
    session: SessionArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config =
        ServerRuntimeConfig { bind_address: args.bind, session: args.session.to_config() };
    let server = Server::bind(config).await?;

    tracing::info!("Initiator listening on {}", server.local_addr()?);

    if args.once {
        let outcome = server.serve_one().await?;
        tracing::info!(
            "result: ok={} rounds={} synced_early={}",
            outcome.ok,
            outcome.rounds,
            outcome.synced_early
        );
        return Ok(());
    }

    server.run().await?;

    Ok(())
}
