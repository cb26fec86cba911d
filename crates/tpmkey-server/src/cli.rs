//! Command-line session options shared by both binaries.

use std::num::NonZeroU64;

use clap::Args;
use tpmkey_core::{
    DEFAULT_MAX_ROUNDS, InputStrategy, MachineParams, SeedPolicy, SessionConfig, TelemetryConfig,
    TelemetryMode, UpdateRule,
};

/// Session parameters. Both parties must use the same K, N, L and rule.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Hidden units (rows)
    #[arg(short = 'k', long, default_value_t = 3)]
    pub k: usize,

    /// Inputs per hidden unit
    #[arg(short = 'n', long, default_value_t = 4)]
    pub n: usize,

    /// Weight bound
    #[arg(short = 'l', long, default_value_t = 3)]
    pub l: i16,

    /// Fixed machine seed (random per session when absent)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Round cap
    #[arg(long, default_value_t = DEFAULT_MAX_ROUNDS)]
    pub max_rounds: u64,

    /// Probe for early sync every N rounds (0 disables probing)
    #[arg(long, default_value_t = 1)]
    pub check_every: u64,

    /// Telemetry mode (off, hash, weights)
    #[arg(long, default_value = "off")]
    pub telemetry: TelemetryMode,

    /// Send telemetry every N rounds
    #[arg(long, default_value = "1")]
    pub telemetry_every: NonZeroU64,

    /// Weight update rule (random-walk, anti-hebbian, frozen)
    #[arg(long, default_value = "random-walk")]
    pub rule: UpdateRule,

    /// Use query inputs aimed at this local field magnitude (initiator only)
    #[arg(long)]
    pub query_field: Option<i32>,
}

impl SessionArgs {
    /// Builds the immutable session configuration.
    pub fn to_config(&self) -> SessionConfig {
        SessionConfig {
            machine: MachineParams { k: self.k, n: self.n, l: self.l },
            rule: self.rule,
            seed: self.seed.map_or(SeedPolicy::Random, SeedPolicy::Fixed),
            max_rounds: self.max_rounds,
            check_every: NonZeroU64::new(self.check_every),
            input: self
                .query_field
                .map_or(InputStrategy::Uniform, |field| InputStrategy::Query { field }),
            telemetry: TelemetryConfig { mode: self.telemetry, every: self.telemetry_every },
        }
    }
}
