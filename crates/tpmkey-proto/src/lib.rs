//! Wire format for the tpmkey synchronization protocol.
//!
//! Every protocol message is a [`Record`]: a flat JSON object whose `type`
//! field names the record kind. Records travel one per line over a reliable
//! byte stream, so the encoding is UTF-8 JSON terminated by `\n`.
//!
//! # Record Kinds
//!
//! ```text
//! x          Initiator -> Responder   public round input + round number
//! tau        either                   round output (+1 / -1)
//! probe      Initiator -> Responder   nonce for an early-sync check
//! probe_resp Responder -> Initiator   HMAC tag over the probe nonce
//! mac_chal   Initiator -> Responder   nonce for the final key confirmation
//! mac_resp   Responder -> Initiator   HMAC tag over the challenge nonce
//! result     Initiator -> Responder   final verdict, round count, key
//! tele       either, any time         diagnostic progress report
//! ```
//!
//! `tele` is out-of-band: a receiver may see any number of them between any
//! two protocol records and must skip them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod errors;
mod record;
mod spin;

pub use codec::{MAX_FRAME_LEN, decode_line, encode_line};
pub use errors::RecordError;
pub use record::{
    Challenge, Grid, NONCE_SIZE, Nonce, Record, RoundInput, SessionResult, TAG_SIZE, Tag,
    TagResponse, TauReport, Telemetry,
};
pub use spin::Spin;
