//! Transport abstraction for network I/O.
//!
//! A session needs one reliable, ordered, bidirectional byte stream per peer.
//! The `Transport` trait hides where that stream comes from, so the same
//! session code runs over:
//!
//! - **TCP streams** (production via tokio)
//! - **Simulated TCP streams** (deterministic tests via turmoil)
//!
//! Sessions never see the transport itself, only the halves it hands out,
//! wrapped in a [`FramedChannel`](crate::channel::FramedChannel).

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

/// Abstract transport for reliable, ordered byte streams.
///
/// # Guarantees
///
/// - **Reliability**: Bytes are delivered or an error is returned
/// - **Ordering**: Bytes arrive in the order they were sent
/// - **Closure**: Dropping the send half signals end of stream to the peer
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Writing half of a connection.
    type SendStream: AsyncWrite + Unpin + Send + 'static;

    /// Reading half of a connection.
    type RecvStream: AsyncRead + Unpin + Send + 'static;

    /// Waits for an incoming connection.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the listener is closed or the network
    /// fails.
    async fn accept(&self) -> io::Result<(Self::SendStream, Self::RecvStream, SocketAddr)>;

    /// Connects to `remote` (`host:port`).
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the remote is unreachable or refuses the
    /// connection.
    async fn connect(&self, remote: &str) -> io::Result<(Self::SendStream, Self::RecvStream)>;
}
