//! TCP transport for production use.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use tokio::net::{
    TcpListener, TcpStream,
    tcp::{OwnedReadHalf, OwnedWriteHalf},
};
use tpmkey_core::Transport;

/// Tokio TCP transport.
///
/// A bound transport accepts connections. A client transport (see
/// [`TcpTransport::client`]) can only connect.
#[derive(Debug)]
pub struct TcpTransport {
    listener: Option<TcpListener>,
}

impl TcpTransport {
    /// Binds a listener on `address` (e.g. `"0.0.0.0:9400"`).
    ///
    /// # Errors
    ///
    /// Returns error if the address is invalid or already in use.
    pub async fn bind(address: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self { listener: Some(listener) })
    }

    /// Transport that only opens outgoing connections.
    pub const fn client() -> Self {
        Self { listener: None }
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener()?.local_addr()
    }

    fn listener(&self) -> io::Result<&TcpListener> {
        self.listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is not bound"))
    }
}

fn split(stream: TcpStream) -> io::Result<(OwnedWriteHalf, OwnedReadHalf)> {
    // Lockstep exchange of tiny records: don't let Nagle hold them back.
    stream.set_nodelay(true)?;
    let (recv, send) = stream.into_split();
    Ok((send, recv))
}

#[async_trait]
impl Transport for TcpTransport {
    type SendStream = OwnedWriteHalf;
    type RecvStream = OwnedReadHalf;

    async fn accept(&self) -> io::Result<(Self::SendStream, Self::RecvStream, SocketAddr)> {
        let (stream, peer) = self.listener()?.accept().await?;
        let (send, recv) = split(stream)?;
        Ok((send, recv, peer))
    }

    async fn connect(&self, remote: &str) -> io::Result<(Self::SendStream, Self::RecvStream)> {
        split(TcpStream::connect(remote).await?)
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    #[tokio::test]
    async fn bound_transport_accepts_client() {
        let server = TcpTransport::bind("127.0.0.1:0").await.expect("bind");
        let addr = server.local_addr().expect("addr").to_string();

        let client = tokio::spawn(async move {
            let (mut send, mut recv) = TcpTransport::client().connect(&addr).await.expect("connect");
            send.write_all(b"ping").await.expect("write");
            let mut buf = [0u8; 4];
            recv.read_exact(&mut buf).await.expect("read");
            buf
        });

        let (mut send, mut recv, _peer) = server.accept().await.expect("accept");
        let mut buf = [0u8; 4];
        recv.read_exact(&mut buf).await.expect("read");
        assert_eq!(&buf, b"ping");
        send.write_all(b"pong").await.expect("write");

        assert_eq!(&client.await.expect("client task"), b"pong");
    }

    #[tokio::test]
    async fn client_transport_cannot_accept() {
        let err = TcpTransport::client().accept().await.expect_err("unbound");
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }
}
