//! Tree parity machine.
//!
//! A machine is K hidden units, each a binary perceptron over N inputs with
//! integer weights bounded by L. For a shared input grid `x`:
//!
//! ```text
//! h_k     = Σ_j w[k][j] · x[k][j]        local field of row k
//! sigma_k = sign(h_k)                    zero counts as +1
//! tau     = Π_k sigma_k                  the only bit sent to the peer
//! ```
//!
//! When both parties report the same `tau`, each moves the weights of the
//! rows that agreed with `tau` and clamps them back into `[-L, L]`. Two
//! machines fed the same inputs drift into an identical weight grid, which is
//! then hashed into the session key.
//!
//! # Invariants
//!
//! - Every weight stays within `[-L, L]` for the life of the machine.
//! - `compute` is pure: no state changes, same result for the same input.
//! - Weights change only through `update`, and only on tau agreement.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tpmkey_crypto::SessionKey;
use tpmkey_proto::{Grid, Spin};

use crate::error::MachineError;

/// Largest accepted weight count (K·N).
pub const MAX_WEIGHTS: usize = 4096;

/// Shape and bound of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineParams {
    /// Number of hidden units (rows), K.
    pub k: usize,
    /// Inputs per hidden unit, N.
    pub n: usize,
    /// Weight bound, L.
    pub l: i16,
}

impl Default for MachineParams {
    fn default() -> Self {
        Self { k: 3, n: 4, l: 3 }
    }
}

impl MachineParams {
    /// Checks that the parameters describe a usable machine.
    pub fn validate(&self) -> Result<(), MachineError> {
        let invalid = |reason: String| Err(MachineError::InvalidParams { reason });

        if self.k == 0 || self.n == 0 {
            return invalid(format!("K and N must be positive (K={}, N={})", self.k, self.n));
        }
        if self.l < 1 {
            return invalid(format!("L must be at least 1 (L={})", self.l));
        }
        match self.k.checked_mul(self.n) {
            Some(total) if total <= MAX_WEIGHTS => Ok(()),
            _ => invalid(format!("K*N must not exceed {MAX_WEIGHTS}")),
        }
    }

    /// Total number of weights, K·N.
    pub const fn weight_count(&self) -> usize {
        self.k * self.n
    }
}

/// How weights move when the two round outputs agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateRule {
    /// `w += x · tau`, then clamp.
    #[default]
    RandomWalk,
    /// `w -= x · tau`, then clamp. The textbook anti-Hebbian rule: agreed
    /// rows move against their output instead of with it.
    AntiHebbian,
    /// Weights never move. Two frozen machines only match if they started
    /// equal.
    Frozen,
}

impl UpdateRule {
    /// Step applied to a weight for input `x` and agreed output `tau`.
    fn step(self, x: Spin, tau: Spin) -> i16 {
        let along = if x == tau { 1 } else { -1 };
        match self {
            Self::RandomWalk => along,
            Self::AntiHebbian => -along,
            Self::Frozen => 0,
        }
    }
}

/// Result of [`Machine::compute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// Round output: product of `sigmas`.
    pub tau: Spin,
    /// Row outputs, one per hidden unit.
    pub sigmas: Vec<Spin>,
}

/// A tree parity machine with private weights.
///
/// Owned by exactly one party for one session. Never serialized in full
/// except in verbose diagnostics.
#[derive(Clone, PartialEq, Eq)]
pub struct Machine {
    params: MachineParams,
    rule: UpdateRule,
    /// Row-major, `k * n` entries.
    weights: Vec<i16>,
}

impl Machine {
    /// Creates a machine with weights drawn uniformly from `[-L, L]` by a
    /// ChaCha20 stream seeded with `seed`.
    pub fn from_seed(
        params: MachineParams,
        rule: UpdateRule,
        seed: u64,
    ) -> Result<Self, MachineError> {
        params.validate()?;

        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let weights =
            (0..params.weight_count()).map(|_| rng.gen_range(-params.l..=params.l)).collect();

        Ok(Self { params, rule, weights })
    }

    /// Creates a machine from explicit row-major weights.
    pub fn from_weights(
        params: MachineParams,
        rule: UpdateRule,
        weights: Vec<i16>,
    ) -> Result<Self, MachineError> {
        params.validate()?;

        if weights.len() != params.weight_count() {
            return Err(MachineError::InvalidParams {
                reason: format!(
                    "expected {} weights, got {}",
                    params.weight_count(),
                    weights.len()
                ),
            });
        }
        if let Some(w) = weights.iter().find(|w| !(-params.l..=params.l).contains(*w)) {
            return Err(MachineError::InvalidParams {
                reason: format!("weight {w} outside [-{0}, {0}]", params.l),
            });
        }

        Ok(Self { params, rule, weights })
    }

    /// Machine shape and bound.
    pub const fn params(&self) -> MachineParams {
        self.params
    }

    /// Configured update rule.
    pub const fn rule(&self) -> UpdateRule {
        self.rule
    }

    /// Row-major weights.
    pub fn weights(&self) -> &[i16] {
        &self.weights
    }

    /// Weights of row `k`.
    pub fn row(&self, k: usize) -> &[i16] {
        &self.weights[k * self.params.n..(k + 1) * self.params.n]
    }

    /// Weights as a K×N grid.
    pub fn grid(&self) -> Grid<i16> {
        self.weights.chunks(self.params.n).map(<[i16]>::to_vec).collect()
    }

    /// Local field of row `k` for one input row.
    pub fn local_field(&self, k: usize, input_row: &[Spin]) -> i32 {
        self.row(k).iter().zip(input_row).map(|(&w, x)| i32::from(w) * x.value()).sum()
    }

    /// Computes row outputs and the round output for `input`.
    pub fn compute(&self, input: &[Vec<Spin>]) -> Result<Output, MachineError> {
        self.check_shape(input)?;

        let sigmas: Vec<Spin> = input
            .iter()
            .enumerate()
            .map(|(k, row)| Spin::from_field(self.local_field(k, row)))
            .collect();
        let tau = sigmas.iter().fold(Spin::Plus, |acc, &s| acc * s);

        Ok(Output { tau, sigmas })
    }

    /// Applies the update rule for one round.
    ///
    /// Does nothing unless `peer_tau == output.tau`. On agreement, every row
    /// whose sigma equals tau moves by the rule and is clamped to `[-L, L]`;
    /// the other rows are left alone. Returns whether the taus agreed.
    pub fn update(
        &mut self,
        input: &[Vec<Spin>],
        output: &Output,
        peer_tau: Spin,
    ) -> Result<bool, MachineError> {
        self.check_shape(input)?;
        if output.sigmas.len() != self.params.k {
            return Err(self.dimension_error(output.sigmas.len(), 1));
        }

        if peer_tau != output.tau {
            return Ok(false);
        }

        let tau = output.tau;
        let rule = self.rule;
        let l = self.params.l;
        let n = self.params.n;

        for (k, (row, &sigma)) in input.iter().zip(&output.sigmas).enumerate() {
            if sigma != tau {
                continue;
            }
            let weights = &mut self.weights[k * n..(k + 1) * n];
            for (w, &x) in weights.iter_mut().zip(row) {
                *w = w.saturating_add(rule.step(x, tau)).clamp(-l, l);
            }
        }

        Ok(true)
    }

    /// Session key derived from the current weights.
    pub fn key(&self) -> SessionKey {
        SessionKey::derive(&self.weights)
    }

    /// Raw session key bytes.
    pub fn key_bytes(&self) -> [u8; tpmkey_crypto::KEY_SIZE] {
        *self.key().as_bytes()
    }

    /// Hex-encoded session key.
    pub fn key_hex(&self) -> String {
        self.key().to_hex()
    }

    /// Number of positions where `other` differs from the local weights.
    ///
    /// Only the overlapping region is compared, so a peer grid of another
    /// shape never fails.
    pub fn mismatch_count(&self, other: &[Vec<i64>]) -> usize {
        self.grid()
            .iter()
            .zip(other)
            .map(|(mine, theirs)| {
                mine.iter().zip(theirs).filter(|&(&a, &b)| i64::from(a) != b).count()
            })
            .sum()
    }

    /// Position-weighted checksum `Σ (k+1)(j+1)·w[k][j]`.
    ///
    /// Cheap progress indicator for logs; two machines with equal checksums
    /// are not necessarily equal.
    pub fn checksum(&self) -> i64 {
        self.weights
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let (k, j) = (i / self.params.n, i % self.params.n);
                i64::try_from((k + 1) * (j + 1)).unwrap_or(i64::MAX).saturating_mul(i64::from(w))
            })
            .sum()
    }

    fn check_shape(&self, input: &[Vec<Spin>]) -> Result<(), MachineError> {
        if input.len() != self.params.k {
            let cols = input.first().map_or(0, Vec::len);
            return Err(self.dimension_error(input.len(), cols));
        }
        if let Some(row) = input.iter().find(|row| row.len() != self.params.n) {
            return Err(self.dimension_error(input.len(), row.len()));
        }
        Ok(())
    }

    const fn dimension_error(&self, rows: usize, cols: usize) -> MachineError {
        MachineError::Dimension {
            expected_rows: self.params.k,
            expected_cols: self.params.n,
            rows,
            cols,
        }
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("params", &self.params)
            .field("rule", &self.rule)
            .field("weights", &"<redacted>")
            .finish()
    }
}
