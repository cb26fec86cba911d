//! tpmkey production runtime.
//!
//! This crate wires the protocol core to real I/O:
//! - Tokio TCP for transport
//! - OS randomness for machine seeds, inputs, and nonces
//! - clap options shared by the two binaries
//!
//! ## Architecture
//!
//! ```text
//! tpmkey-server
//!   ├─ SystemEnv          (production Environment impl)
//!   ├─ TcpTransport       (tokio TCP)
//!   ├─ Server             (accept loop, one task per session)
//!   └─ SessionArgs        (CLI → SessionConfig)
//! ```
//!
//! The Initiator listens and the Responder connects. Every accepted
//! connection runs one independent session; sessions share no mutable state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cli;
mod error;
mod system_env;
mod transport;

pub use cli::SessionArgs;
pub use error::ServerError;
pub use system_env::SystemEnv;
use tokio::io::{AsyncRead, AsyncWrite};
use tpmkey_core::{
    Environment, FramedChannel, Role, Session, SessionConfig, SessionError, SessionOutcome,
    Transport,
};
pub use transport::TcpTransport;

/// Server configuration for the production runtime.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// Address to bind to (e.g., "0.0.0.0:9400")
    pub bind_address: String,
    /// Configuration handed to every session
    pub session: SessionConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self { bind_address: "0.0.0.0:9400".to_string(), session: SessionConfig::default() }
    }
}

/// Accepts connections and plays the Initiator role on each.
pub struct Server<T, E> {
    transport: T,
    env: E,
    session: SessionConfig,
}

impl Server<TcpTransport, SystemEnv> {
    /// Create and bind a TCP server.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The session configuration is invalid
    /// - Binding to the address fails
    pub async fn bind(config: ServerRuntimeConfig) -> Result<Self, ServerError> {
        config.session.validate()?;
        let transport = TcpTransport::bind(&config.bind_address).await?;
        Ok(Self::new(transport, SystemEnv::new(), config.session))
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.transport.local_addr()?)
    }
}

impl<T: Transport, E: Environment> Server<T, E> {
    /// Creates a server over an already bound transport.
    pub const fn new(transport: T, env: E, session: SessionConfig) -> Self {
        Self { transport, env, session }
    }

    /// Accepts one connection and runs its session to completion.
    pub async fn serve_one(&self) -> Result<SessionOutcome, ServerError> {
        let (send, recv, peer) = self.transport.accept().await?;
        tracing::info!("session with {} starting", peer);

        let outcome =
            run_session(Role::Initiator, self.session.clone(), self.env.clone(), recv, send)
                .await?;
        Ok(outcome)
    }

    /// Run the server, accepting connections until the transport fails.
    ///
    /// Each session runs on its own task. A failed session is logged and
    /// does not affect the others.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            match self.transport.accept().await {
                Ok((send, recv, peer)) => {
                    let config = self.session.clone();
                    let env = self.env.clone();

                    tokio::spawn(async move {
                        tracing::info!("session with {} starting", peer);
                        match run_session(Role::Initiator, config, env, recv, send).await {
                            Ok(outcome) => tracing::info!(
                                "session with {} finished: ok={} rounds={}",
                                peer,
                                outcome.ok,
                                outcome.rounds
                            ),
                            Err(e) => tracing::error!("session with {} failed: {}", peer, e),
                        }
                    });
                },
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                },
            }
        }
    }
}

/// Connects to an Initiator at `remote` and plays the Responder role.
pub async fn connect_responder<T, E>(
    transport: &T,
    remote: &str,
    config: SessionConfig,
    env: E,
) -> Result<SessionOutcome, ServerError>
where
    T: Transport,
    E: Environment,
{
    config.validate()?;
    let (send, recv) = transport.connect(remote).await?;
    tracing::info!("connected to {}", remote);

    Ok(run_session(Role::Responder, config, env, recv, send).await?)
}

/// Runs one session over a pair of stream halves.
pub async fn run_session<R, W, E>(
    role: Role,
    config: SessionConfig,
    env: E,
    recv: R,
    send: W,
) -> Result<SessionOutcome, SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    E: Environment,
{
    let session = Session::new(role, config, env)?;
    session.run(FramedChannel::new(recv, send)).await
}
