//! Fuzz target for tree parity machine updates
//!
//! # Strategy
//!
//! - Shapes: small arbitrary K, N, L
//! - Inputs: arbitrary bit patterns, including wrong shapes
//! - Peer taus: arbitrary, so both agreeing and repulsive rounds occur
//!
//! # Invariants
//!
//! - Every weight stays within `[-L, L]`
//! - A repulsive round leaves the machine unchanged
//! - Wrong input shapes are rejected, never panic
//! - Rows whose output disagrees with tau are never touched

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tpmkey_core::{Machine, MachineParams, UpdateRule};
use tpmkey_proto::Spin;

#[derive(Debug, Arbitrary)]
struct Round {
    rows: u8,
    bits: Vec<bool>,
    peer_plus: bool,
}

#[derive(Debug, Arbitrary)]
struct Scenario {
    k: u8,
    n: u8,
    l: u8,
    seed: u64,
    anti_hebbian: bool,
    rounds: Vec<Round>,
}

fuzz_target!(|scenario: Scenario| {
    let params = MachineParams {
        k: usize::from(scenario.k % 6) + 1,
        n: usize::from(scenario.n % 12) + 1,
        l: i16::from(scenario.l % 8) + 1,
    };
    let rule = if scenario.anti_hebbian { UpdateRule::AntiHebbian } else { UpdateRule::RandomWalk };
    let mut machine = Machine::from_seed(params, rule, scenario.seed).expect("valid params");

    for round in scenario.rounds.iter().take(256) {
        let rows = usize::from(round.rows % 7);
        let input: Vec<Vec<Spin>> = (0..rows)
            .map(|k| {
                (0..params.n)
                    .map(|j| Spin::from_bit(round.bits.get(k * params.n + j).copied().unwrap_or(false)))
                    .collect()
            })
            .collect();

        let Ok(output) = machine.compute(&input) else {
            assert_ne!(rows, params.k, "correct shape must compute");
            continue;
        };

        let before = machine.clone();
        let peer = Spin::from_bit(round.peer_plus);
        let agreed = machine.update(&input, &output, peer).expect("shape already checked");

        assert_eq!(agreed, peer == output.tau);
        if !agreed {
            assert_eq!(machine, before);
        }
        for (k, sigma) in output.sigmas.iter().enumerate() {
            if *sigma != output.tau {
                assert_eq!(machine.row(k), before.row(k));
            }
        }
        assert!(machine.weights().iter().all(|w| (-params.l..=params.l).contains(w)));
    }
});
