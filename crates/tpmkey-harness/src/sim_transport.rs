//! Turmoil-based Transport implementation using TCP streams.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use tokio::io::{ReadHalf, WriteHalf};
use tpmkey_core::Transport;
use turmoil::net::{TcpListener, TcpStream};

/// Simulation transport using Turmoil's deterministic TCP streams.
///
/// Must be used inside a turmoil host or client. Host names registered with
/// the simulation resolve as addresses (`"initiator:9400"`).
pub struct SimTransport {
    listener: Option<TcpListener>,
}

impl SimTransport {
    /// Binds to the specified address for accepting connections.
    ///
    /// # Errors
    ///
    /// Returns error if the address is already in use or invalid.
    pub async fn bind(address: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self { listener: Some(listener) })
    }

    /// Transport that only opens outgoing connections.
    pub const fn client() -> Self {
        Self { listener: None }
    }
}

#[async_trait]
impl Transport for SimTransport {
    type SendStream = WriteHalf<TcpStream>;
    type RecvStream = ReadHalf<TcpStream>;

    async fn accept(&self) -> io::Result<(Self::SendStream, Self::RecvStream, SocketAddr)> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is not bound"))?;
        let (stream, peer) = listener.accept().await?;

        let (recv, send) = tokio::io::split(stream);
        Ok((send, recv, peer))
    }

    async fn connect(&self, remote: &str) -> io::Result<(Self::SendStream, Self::RecvStream)> {
        let stream = TcpStream::connect(remote).await?;

        let (recv, send) = tokio::io::split(stream);
        Ok((send, recv))
    }
}
