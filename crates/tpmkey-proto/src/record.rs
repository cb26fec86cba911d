//! Protocol record types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::Spin;

/// Size of a challenge nonce in bytes.
pub const NONCE_SIZE: usize = 16;

/// Size of an HMAC-SHA256 tag in bytes.
pub const TAG_SIZE: usize = 32;

/// Challenge nonce, hex-encoded on the wire.
pub type Nonce = [u8; NONCE_SIZE];

/// Authentication tag, hex-encoded on the wire.
pub type Tag = [u8; TAG_SIZE];

/// Row-major K×N grid.
pub type Grid<T> = Vec<Vec<T>>;

/// One protocol record.
///
/// Serialized as an internally tagged JSON object (`{"type": "...", ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    /// Public round input.
    X(RoundInput),
    /// Round output of the sender.
    Tau(TauReport),
    /// Early-sync probe.
    Probe(Challenge),
    /// Answer to [`Record::Probe`].
    ProbeResp(TagResponse),
    /// Final key-confirmation challenge.
    MacChal(Challenge),
    /// Answer to [`Record::MacChal`].
    MacResp(TagResponse),
    /// Terminal verdict from the Initiator.
    #[serde(rename = "result")]
    Outcome(SessionResult),
    /// Diagnostic progress report.
    Tele(Telemetry),
}

impl Record {
    /// Wire name of the record kind (the `type` field).
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::X(_) => "x",
            Self::Tau(_) => "tau",
            Self::Probe(_) => "probe",
            Self::ProbeResp(_) => "probe_resp",
            Self::MacChal(_) => "mac_chal",
            Self::MacResp(_) => "mac_resp",
            Self::Outcome(_) => "result",
            Self::Tele(_) => "tele",
        }
    }

    /// Whether this is an out-of-band diagnostic record.
    pub const fn is_diagnostic(&self) -> bool {
        matches!(self, Self::Tele(_))
    }
}

/// Public round input (`x`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundInput {
    /// K×N grid of ±1.
    pub x: Grid<Spin>,
    /// Round number, starting at 1.
    pub round: u64,
}

/// Round output (`tau`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TauReport {
    /// Product of the sender's row outputs.
    pub tau: Spin,
    /// Round this output belongs to.
    pub round: u64,
}

/// Nonce-carrying challenge (`probe`, `mac_chal`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Fresh random nonce.
    #[serde(with = "hex")]
    pub nonce: Nonce,
}

/// Tag-carrying answer (`probe_resp`, `mac_resp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagResponse {
    /// HMAC-SHA256 over the challenge nonce, keyed by the sender's key.
    #[serde(with = "hex")]
    pub tag: Tag,
}

/// Terminal verdict (`result`).
///
/// # Security
///
/// - **Debug Redaction**: The `Debug` impl redacts `key_hex`. The key is only
///   sent for reporting and should never end up in logs by accident.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Whether the final tags matched.
    pub ok: bool,
    /// Total rounds played.
    pub rounds: u64,
    /// The Initiator's session key, hex-encoded.
    pub key_hex: String,
}

impl std::fmt::Debug for SessionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResult")
            .field("ok", &self.ok)
            .field("rounds", &self.rounds)
            .field("key_hex", &format!("<redacted {} chars>", self.key_hex.len()))
            .finish()
    }
}

/// Diagnostic progress report (`tele`).
///
/// Decoding is lenient: every field is read on a best-effort basis, so a
/// report with missing or off-type fields still decodes and is skipped
/// instead of ending the session. A non-unsigned `round` reads as 0, a
/// non-string `key8` as empty, and `w` is dropped unless every cell is an
/// integer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Telemetry {
    /// Sender's round counter when the report was produced.
    pub round: u64,
    /// First 8 hex characters of the sender's key.
    pub key8: String,
    /// Full weight snapshot, only in verbose telemetry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<Grid<i64>>,
}

impl Telemetry {
    /// Reads a report out of an arbitrary JSON value.
    pub fn from_value(value: &Value) -> Self {
        let round = value.get("round").and_then(Value::as_u64).unwrap_or(0);
        let key8 = value.get("key8").and_then(Value::as_str).unwrap_or_default().to_owned();
        let w = value.get("w").and_then(Value::as_array).and_then(|rows| {
            rows.iter()
                .map(|row| row.as_array()?.iter().map(Value::as_i64).collect::<Option<Vec<_>>>())
                .collect::<Option<Grid<i64>>>()
        });

        Self { round, key8, w }
    }
}

impl<'de> Deserialize<'de> for Telemetry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_value(&value))
    }
}
