//! Session configuration.
//!
//! A session receives one immutable [`SessionConfig`] at creation. Both
//! parties must agree on the machine shape and update rule out of band; none
//! of it is negotiated on the wire.

use std::{fmt, num::NonZeroU64, str::FromStr};

use thiserror::Error;

use crate::{
    error::SessionError,
    input::InputStrategy,
    machine::{MachineParams, UpdateRule},
};

/// Default round cap.
pub const DEFAULT_MAX_ROUNDS: u64 = 3000;

/// Error parsing a configuration keyword.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseConfigError {
    /// Which setting was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// What a party reports in `tele` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TelemetryMode {
    /// No telemetry is sent.
    #[default]
    Off,
    /// Round number and key prefix.
    Hash,
    /// Key prefix plus the full weight grid. Exposes key material.
    Weights,
}

impl FromStr for TelemetryMode {
    type Err = ParseConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "hash" => Ok(Self::Hash),
            "weights" => Ok(Self::Weights),
            _ => Err(ParseConfigError { kind: "telemetry mode", value: s.to_string() }),
        }
    }
}

impl fmt::Display for TelemetryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Hash => "hash",
            Self::Weights => "weights",
        })
    }
}

impl FromStr for UpdateRule {
    type Err = ParseConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "random-walk" => Ok(Self::RandomWalk),
            "anti-hebbian" => Ok(Self::AntiHebbian),
            "frozen" => Ok(Self::Frozen),
            _ => Err(ParseConfigError { kind: "update rule", value: s.to_string() }),
        }
    }
}

impl fmt::Display for UpdateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RandomWalk => "random-walk",
            Self::AntiHebbian => "anti-hebbian",
            Self::Frozen => "frozen",
        })
    }
}

/// Telemetry emission settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// What to report.
    pub mode: TelemetryMode,
    /// Report after every round divisible by this.
    pub every: NonZeroU64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { mode: TelemetryMode::Off, every: NonZeroU64::MIN }
    }
}

impl TelemetryConfig {
    /// Whether a report is due after `round`.
    pub const fn due(&self, round: u64) -> bool {
        !matches!(self.mode, TelemetryMode::Off) && round % self.every.get() == 0
    }
}

/// Where the machine's initial weights come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    /// Fresh seed from the session's randomness provider.
    #[default]
    Random,
    /// Fixed seed, for reproducible runs.
    Fixed(u64),
}

/// Immutable per-session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Machine shape and weight bound.
    pub machine: MachineParams,
    /// Weight step on tau agreement.
    pub rule: UpdateRule,
    /// Initial weight seed.
    pub seed: SeedPolicy,
    /// Round cap. Reaching it is not an error.
    pub max_rounds: u64,
    /// Probe for early sync every this many rounds. `None` disables probing.
    pub check_every: Option<NonZeroU64>,
    /// How the Initiator draws round inputs.
    pub input: InputStrategy,
    /// Diagnostic reporting.
    pub telemetry: TelemetryConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            machine: MachineParams::default(),
            rule: UpdateRule::default(),
            seed: SeedPolicy::default(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            check_every: Some(NonZeroU64::MIN),
            input: InputStrategy::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Checks the configuration before any I/O happens.
    pub fn validate(&self) -> Result<(), SessionError> {
        self.machine.validate()?;

        if let InputStrategy::Query { field } = self.input {
            if field < 0 {
                return Err(SessionError::InvalidConfig {
                    reason: format!("query field must be non-negative (got {field})"),
                });
            }
        }

        Ok(())
    }

    /// Whether the Initiator probes after `round`.
    pub const fn probe_due(&self, round: u64) -> bool {
        match self.check_every {
            Some(every) => round % every.get() == 0,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_parameters() {
        let config = SessionConfig::default();

        assert_eq!(config.machine, MachineParams { k: 3, n: 4, l: 3 });
        assert_eq!(config.max_rounds, 3000);
        assert_eq!(config.check_every, Some(NonZeroU64::MIN));
        assert_eq!(config.telemetry.mode, TelemetryMode::Off);
        assert_eq!(config.rule, UpdateRule::RandomWalk);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_rows_is_invalid_config() {
        let config = SessionConfig {
            machine: MachineParams { k: 0, n: 4, l: 3 },
            ..SessionConfig::default()
        };
        assert!(matches!(config.validate(), Err(SessionError::InvalidConfig { .. })));
    }

    #[test]
    fn negative_query_field_is_invalid_config() {
        let config =
            SessionConfig { input: InputStrategy::Query { field: -1 }, ..SessionConfig::default() };
        assert!(matches!(config.validate(), Err(SessionError::InvalidConfig { .. })));
    }

    #[test]
    fn probe_schedule() {
        let every_third = SessionConfig {
            check_every: NonZeroU64::new(3),
            ..SessionConfig::default()
        };
        assert!(!every_third.probe_due(1));
        assert!(every_third.probe_due(3));

        let never = SessionConfig { check_every: None, ..SessionConfig::default() };
        assert!(!never.probe_due(1));
    }

    #[test]
    fn telemetry_off_is_never_due() {
        let off = TelemetryConfig::default();
        assert!(!off.due(1));

        let hash = TelemetryConfig { mode: TelemetryMode::Hash, every: NonZeroU64::MIN };
        assert!(hash.due(1));
    }

    #[test]
    fn keywords_parse_case_insensitively() {
        assert_eq!("WEIGHTS".parse::<TelemetryMode>(), Ok(TelemetryMode::Weights));
        assert_eq!("anti_hebbian".parse::<UpdateRule>(), Ok(UpdateRule::AntiHebbian));
        assert_eq!(UpdateRule::Frozen.to_string().parse::<UpdateRule>(), Ok(UpdateRule::Frozen));

        let err = "loud".parse::<TelemetryMode>().expect_err("unknown mode");
        assert_eq!(err.to_string(), "unknown telemetry mode 'loud'");
    }
}
