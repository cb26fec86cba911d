//! Diagnostic frame filter.
//!
//! Either party may interleave `tele` records anywhere in the stream. They
//! never drive the protocol: the filter consumes them, compares the peer's
//! report with the local machine, logs the comparison, and hands the next
//! protocol record to the session.

use tokio::io::{AsyncRead, AsyncWrite};
use tpmkey_crypto::KEY_PREFIX_LEN;
use tpmkey_proto::{Record, Telemetry};

use crate::{
    channel::FramedChannel, config::TelemetryMode, error::ChannelError, machine::Machine,
};

/// Local view of the latest peer diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    /// Round the peer reported.
    pub round: u64,
    /// Local key prefix at the time the report arrived.
    pub local_key8: String,
    /// Peer key prefix as sent. May be anything, it is not validated.
    pub peer_key8: String,
    /// Differing weight positions, when the peer sent its weights.
    pub mismatch: Option<usize>,
}

impl DiagnosticReport {
    /// Whether the peer's key prefix equals ours.
    pub fn keys_match(&self) -> bool {
        self.local_key8.eq_ignore_ascii_case(&self.peer_key8)
    }
}

/// Skips `tele` records, keeping the latest report.
#[derive(Debug, Default)]
pub struct DiagnosticFilter {
    last: Option<DiagnosticReport>,
    consumed: u64,
}

impl DiagnosticFilter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next non-diagnostic record from `channel`.
    ///
    /// Any number of `tele` records are consumed first. A decodable `tele`
    /// with odd contents is still just skipped.
    pub async fn recv<R, W>(
        &mut self,
        channel: &mut FramedChannel<R, W>,
        machine: &Machine,
    ) -> Result<Record, ChannelError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            match channel.recv().await? {
                Record::Tele(tele) => self.observe(&tele, machine),
                record => return Ok(record),
            }
        }
    }

    /// Folds one peer report into the filter state.
    pub fn observe(&mut self, tele: &Telemetry, machine: &Machine) {
        self.consumed += 1;

        let report = DiagnosticReport {
            round: tele.round,
            local_key8: machine.key().prefix(),
            peer_key8: tele.key8.clone(),
            mismatch: tele.w.as_deref().map(|w| machine.mismatch_count(w)),
        };

        match report.mismatch {
            Some(diff) if diff > 0 => tracing::warn!(
                "peer round {}: key8 {} vs local {}, {} weights differ",
                report.round,
                report.peer_key8,
                report.local_key8,
                diff
            ),
            _ => tracing::debug!(
                "peer round {}: key8 {} vs local {} ({})",
                report.round,
                report.peer_key8,
                report.local_key8,
                if report.keys_match() { "match" } else { "differ" }
            ),
        }

        self.last = Some(report);
    }

    /// Latest report, if any `tele` was seen.
    pub const fn last(&self) -> Option<&DiagnosticReport> {
        self.last.as_ref()
    }

    /// Number of `tele` records consumed.
    pub const fn consumed(&self) -> u64 {
        self.consumed
    }
}

/// Builds the `tele` record this party sends after `round`.
pub fn snapshot(machine: &Machine, round: u64, mode: TelemetryMode) -> Telemetry {
    let key8 = machine.key().prefix();
    debug_assert_eq!(key8.len(), KEY_PREFIX_LEN);

    let w = matches!(mode, TelemetryMode::Weights).then(|| {
        machine.grid().into_iter().map(|row| row.into_iter().map(i64::from).collect()).collect()
    });

    Telemetry { round, key8, w }
}
