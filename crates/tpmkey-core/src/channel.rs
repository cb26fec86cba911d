//! Framed channel: one record per line over a reliable byte stream.
//!
//! `send` writes exactly one `\n`-terminated JSON record and flushes before
//! returning. `recv` suspends until a full line is buffered and decodes it.
//! The stream ending before a line is complete is `ConnectionClosed`, never a
//! partial record.

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};
use tpmkey_proto::{MAX_FRAME_LEN, Record, RecordError, decode_line, encode_line};

use crate::error::ChannelError;

/// Line-framed record channel over split read and write halves.
pub struct FramedChannel<R, W> {
    reader: BufReader<R>,
    writer: W,
    /// Reused line buffer.
    line: Vec<u8>,
    frames_sent: u64,
    frames_received: u64,
}

impl<S> FramedChannel<ReadHalf<S>, WriteHalf<S>>
where
    S: AsyncRead + AsyncWrite,
{
    /// Wraps a bidirectional stream (TCP, simulated TCP, in-memory duplex).
    pub fn from_stream(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self::new(reader, writer)
    }
}

impl<R, W> FramedChannel<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a channel from separate read and write halves.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            line: Vec::with_capacity(256),
            frames_sent: 0,
            frames_received: 0,
        }
    }

    /// Sends one record and waits until it is handed to the transport.
    pub async fn send(&mut self, record: &Record) -> Result<(), ChannelError> {
        let line = encode_line(record)?;
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        self.frames_sent += 1;
        Ok(())
    }

    /// Receives the next record.
    pub async fn recv(&mut self) -> Result<Record, ChannelError> {
        self.line.clear();

        let limit = (MAX_FRAME_LEN + 1) as u64;
        let read = (&mut self.reader).take(limit).read_until(b'\n', &mut self.line).await?;

        if read == 0 {
            return Err(ChannelError::ConnectionClosed);
        }
        if self.line.last() != Some(&b'\n') {
            if self.line.len() > MAX_FRAME_LEN {
                return Err(RecordError::FrameTooLarge { size: self.line.len(), max: MAX_FRAME_LEN }
                    .into());
            }
            // EOF in the middle of a line.
            return Err(ChannelError::ConnectionClosed);
        }

        let record = decode_line(&self.line)?;
        self.frames_received += 1;
        Ok(record)
    }

    /// Shuts down the write half, signalling end of stream to the peer.
    pub async fn shutdown(&mut self) -> Result<(), ChannelError> {
        self.writer.shutdown().await?;
        Ok(())
    }

    /// Records sent so far.
    pub const fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Records received so far, diagnostics included.
    pub const fn frames_received(&self) -> u64 {
        self.frames_received
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncWriteExt, duplex};
    use tpmkey_proto::{Spin, TauReport};

    use super::*;

    #[tokio::test]
    async fn record_crosses_duplex() {
        let (a, b) = duplex(1024);
        let mut left = FramedChannel::from_stream(a);
        let mut right = FramedChannel::from_stream(b);

        let record = Record::Tau(TauReport { tau: Spin::Minus, round: 9 });
        left.send(&record).await.expect("send");

        assert_eq!(right.recv().await.expect("recv"), record);
        assert_eq!(left.frames_sent(), 1);
        assert_eq!(right.frames_received(), 1);
    }

    #[tokio::test]
    async fn records_split_across_writes_are_reassembled() {
        let (mut raw, b) = duplex(1024);
        let mut channel = FramedChannel::from_stream(b);

        raw.write_all(b"{\"type\":\"tau\",").await.expect("write");
        raw.write_all(b"\"tau\":1,\"round\":1}\n{\"type\":\"tau\",\"tau\":-1,\"round\":2}\n")
            .await
            .expect("write");

        assert_eq!(
            channel.recv().await.expect("recv"),
            Record::Tau(TauReport { tau: Spin::Plus, round: 1 })
        );
        assert_eq!(
            channel.recv().await.expect("recv"),
            Record::Tau(TauReport { tau: Spin::Minus, round: 2 })
        );
    }

    #[tokio::test]
    async fn clean_eof_is_connection_closed() {
        let (raw, b) = duplex(64);
        let mut channel = FramedChannel::from_stream(b);
        drop(raw);

        assert!(matches!(channel.recv().await, Err(ChannelError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn eof_mid_line_is_connection_closed() {
        let (mut raw, b) = duplex(64);
        let mut channel = FramedChannel::from_stream(b);
        raw.write_all(b"{\"type\":\"ta").await.expect("write");
        drop(raw);

        assert!(matches!(channel.recv().await, Err(ChannelError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn garbage_line_is_malformed() {
        let (mut raw, b) = duplex(64);
        let mut channel = FramedChannel::from_stream(b);
        raw.write_all(b"not json\n").await.expect("write");

        assert!(matches!(
            channel.recv().await,
            Err(ChannelError::Malformed(RecordError::Decode { .. }))
        ));
    }

    #[tokio::test]
    async fn endless_line_is_rejected() {
        let (mut raw, b) = duplex(MAX_FRAME_LEN * 2);
        let mut channel = FramedChannel::from_stream(b);
        raw.write_all(&vec![b'a'; MAX_FRAME_LEN + 10]).await.expect("write");

        assert!(matches!(
            channel.recv().await,
            Err(ChannelError::Malformed(RecordError::FrameTooLarge { .. }))
        ));
    }
}
