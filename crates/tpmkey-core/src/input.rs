//! Public round input generation.
//!
//! The Initiator draws a fresh K×N grid of ±1 every round and sends it in
//! clear. Nothing about past inputs is kept.

use tpmkey_proto::{Grid, Spin};

use crate::{
    env::{EntropyError, Environment},
    machine::Machine,
};

/// Flip attempts before a query input falls back to a uniform one.
pub const QUERY_ATTEMPTS: usize = 200;

/// How the Initiator chooses round inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputStrategy {
    /// Every entry is an independent fair ±1.
    #[default]
    Uniform,
    /// Query inputs: aim one random row's local field at `|h| ≈ field` on the
    /// Initiator's own machine, falling back to uniform when the target is
    /// not reached.
    Query {
        /// Target magnitude of the local field.
        field: i32,
    },
}

impl InputStrategy {
    /// Draws one round input for `machine`'s shape.
    pub fn draw<E: Environment>(
        &self,
        env: &E,
        machine: &Machine,
    ) -> Result<Grid<Spin>, EntropyError> {
        match *self {
            Self::Uniform => uniform_input(env, machine.params().k, machine.params().n),
            Self::Query { field } => query_input(env, machine, field),
        }
    }
}

/// K×N grid of fair ±1 values, one random bit each.
pub fn uniform_input<E: Environment>(
    env: &E,
    k: usize,
    n: usize,
) -> Result<Grid<Spin>, EntropyError> {
    let mut bits = vec![0u8; (k * n).div_ceil(8)];
    env.random_bytes(&mut bits)?;

    Ok((0..k)
        .map(|row| {
            (0..n)
                .map(|col| {
                    let i = row * n + col;
                    Spin::from_bit((bits[i / 8] >> (i % 8)) & 1 == 1)
                })
                .collect()
        })
        .collect())
}

/// Uniform input nudged so one row's local field magnitude lands within 1 of
/// `field`.
pub fn query_input<E: Environment>(
    env: &E,
    machine: &Machine,
    field: i32,
) -> Result<Grid<Spin>, EntropyError> {
    let params = machine.params();
    let mut x = uniform_input(env, params.k, params.n)?;
    let target = env.random_index(params.k)?;

    for _ in 0..QUERY_ATTEMPTS {
        let h = machine.local_field(target, &x[target]);
        if (h.abs() - field).abs() <= 1 {
            return Ok(x);
        }
        let col = env.random_index(params.n)?;
        x[target][col] = x[target][col].flip();
    }

    tracing::trace!("query input missed |h|={} on row {}, using uniform input", field, target);
    uniform_input(env, params.k, params.n)
}
