//! Protocol core for tpmkey: tree parity machine key agreement.
//!
//! Two parties each hold a private tree parity machine. Every round the
//! Initiator publishes a random input, both sides compute one output bit and
//! exchange it, and both update their weights when the bits agree. Within a
//! few hundred rounds the weight grids become identical and are hashed into a
//! shared session key, which an HMAC challenge then confirms.
//!
//! # Architecture
//!
//! ```text
//! tpmkey-core
//!   ├─ Machine           (weights, compute, update, key)
//!   ├─ InputStrategy     (public round inputs)
//!   ├─ FramedChannel     (one JSON record per line)
//!   ├─ DiagnosticFilter  (skips and logs `tele` records)
//!   ├─ Session           (round protocol state machine, both roles)
//!   ├─ Environment       (randomness, injected)
//!   └─ Transport         (stream source, injected)
//! ```
//!
//! The core performs no socket I/O of its own and holds no global state:
//! production wiring lives in `tpmkey-server`, deterministic simulation in
//! `tpmkey-harness`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod channel;
pub mod config;
pub mod diagnostics;
pub mod env;
pub mod error;
pub mod input;
pub mod machine;
pub mod session;
pub mod transport;

pub use channel::FramedChannel;
pub use config::{
    DEFAULT_MAX_ROUNDS, ParseConfigError, SeedPolicy, SessionConfig, TelemetryConfig,
    TelemetryMode,
};
pub use diagnostics::{DiagnosticFilter, DiagnosticReport};
pub use env::{EntropyError, Environment};
pub use error::{ChannelError, MachineError, SessionError};
pub use input::InputStrategy;
pub use machine::{Machine, MachineParams, Output, UpdateRule};
pub use session::{Role, Session, SessionOutcome, SessionStats};
pub use transport::Transport;
