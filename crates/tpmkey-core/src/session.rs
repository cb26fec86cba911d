//! Round protocol state machine.
//!
//! One state machine serves both roles. The Initiator drives: it draws the
//! public input, decides when to probe, and issues the verdict. The Responder
//! reacts to whatever the Initiator sends next.
//!
//! ```text
//! Initiator                                   Responder
//! ─────────                                   ─────────
//! NextRound ── x{round} ───────────────────▶  AwaitRecord
//!           ◀────────────────── tau{round} ── (compute, send own tau)
//!           ── tau{round} ─────────────────▶
//! (update)                                    (update)
//! Probe ────── probe{nonce} ───────────────▶  AwaitRecord
//!           ◀───────────── probe_resp{tag} ──
//!   match:    Report                          AwaitRecord
//!   no match: NextRound
//! Challenge ── mac_chal{nonce} ────────────▶  AwaitRecord
//!           ◀─────────────── mac_resp{tag} ── AwaitResult
//! Report ───── result{ok,rounds,key_hex} ──▶  Done
//! Done
//! ```
//!
//! Only the taus, the public inputs, and HMAC tags cross the wire. Weights
//! leave the process only in verbose telemetry.
//!
//! # Invariants
//!
//! - The round counter starts at 0 and grows by exactly one per round.
//! - Weights change only in the update step of a round, after both taus are
//!   known.
//! - Any record outside the expected set ends the session with an error; `tele`
//!   records are never part of that set and never reach the state machine.

use std::fmt;

use tokio::io::{AsyncRead, AsyncWrite};
use tpmkey_proto::{
    Challenge, NONCE_SIZE, Nonce, Record, RoundInput, SessionResult, Spin, TagResponse, TauReport,
};

use crate::{
    channel::FramedChannel,
    config::{SeedPolicy, SessionConfig},
    diagnostics::{DiagnosticFilter, snapshot},
    env::{EntropyError, Environment},
    error::SessionError,
    machine::Machine,
};

/// Which side of the exchange a party plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Listens, draws inputs, probes, and reports the verdict.
    Initiator,
    /// Connects and follows the Initiator's lead.
    Responder,
}

impl Role {
    /// Whether this role sends its tau before reading the peer's.
    pub const fn reports_tau_first(self) -> bool {
        matches!(self, Self::Responder)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initiator => "initiator",
            Self::Responder => "responder",
        })
    }
}

/// Counters collected over one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Rounds where both taus agreed and weights moved.
    pub agreeing_rounds: u64,
    /// Rounds where the taus differed and nothing moved.
    pub repulsive_rounds: u64,
    /// Probes sent (Initiator) or answered (Responder).
    pub probes: u64,
    /// `tele` records skipped.
    pub diagnostics_consumed: u64,
    /// Records sent, diagnostics included.
    pub frames_sent: u64,
    /// Records received, diagnostics included.
    pub frames_received: u64,
}

/// How a session ended.
///
/// # Security
///
/// - **Debug Redaction**: The `Debug` impl shows only key prefixes.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    /// Role this party played.
    pub role: Role,
    /// Whether key confirmation succeeded, as decided by the Initiator.
    pub ok: bool,
    /// Rounds played.
    pub rounds: u64,
    /// Whether a probe confirmed the key before the round cap.
    pub synced_early: bool,
    /// This party's session key, hex-encoded.
    pub key_hex: String,
    /// Key reported by the Initiator in `result`. Responder only.
    pub peer_key_hex: Option<String>,
    /// Session counters.
    pub stats: SessionStats,
}

impl fmt::Debug for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = |hex: &str| format!("{}…", hex.get(..8).unwrap_or(hex));
        f.debug_struct("SessionOutcome")
            .field("role", &self.role)
            .field("ok", &self.ok)
            .field("rounds", &self.rounds)
            .field("synced_early", &self.synced_early)
            .field("key_hex", &prefix(self.key_hex.as_str()))
            .field("peer_key_hex", &self.peer_key_hex.as_deref().map(prefix))
            .field("stats", &self.stats)
            .finish()
    }
}

#[derive(Debug)]
enum State {
    /// Initiator: play the next round or move to the final challenge.
    NextRound,
    /// Initiator: early-sync probe after a round.
    Probe,
    /// Initiator: final key confirmation at the round cap.
    Challenge,
    /// Initiator: send the verdict.
    Report { ok: bool, synced_early: bool },
    /// Responder: wait for the Initiator's next move.
    AwaitRecord { probed: bool },
    /// Responder: challenge answered, only the verdict may follow.
    AwaitResult,
    Done(SessionOutcome),
}

/// One key-agreement session.
///
/// Owns its machine and randomness provider. The channel is handed in by
/// [`Session::run`] and released when the session ends, on every path.
pub struct Session<E: Environment> {
    role: Role,
    config: SessionConfig,
    env: E,
    machine: Machine,
    round: u64,
    diagnostics: DiagnosticFilter,
    stats: SessionStats,
}

impl<E: Environment> Session<E> {
    /// Creates a session with a freshly seeded machine.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` or `Dimension` if the configuration is unusable, and
    /// `Entropy` if a random seed cannot be drawn. No I/O happens before
    /// these checks.
    pub fn new(role: Role, config: SessionConfig, env: E) -> Result<Self, SessionError> {
        config.validate()?;

        let seed = match config.seed {
            SeedPolicy::Fixed(seed) => seed,
            SeedPolicy::Random => env.random_u64()?,
        };
        let machine = Machine::from_seed(config.machine, config.rule, seed)?;

        Ok(Self {
            role,
            config,
            env,
            machine,
            round: 0,
            diagnostics: DiagnosticFilter::new(),
            stats: SessionStats::default(),
        })
    }

    /// Role of this party.
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Rounds played so far.
    pub const fn round(&self) -> u64 {
        self.round
    }

    /// Local machine.
    pub const fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Runs the session to completion over `channel`.
    ///
    /// The channel is shut down before returning, whatever the result.
    ///
    /// # Errors
    ///
    /// Any [`SessionError`]. All of them are fatal. Failing to agree on a key
    /// is not an error: it is `ok == false` in the outcome.
    pub async fn run<R, W>(
        mut self,
        mut channel: FramedChannel<R, W>,
    ) -> Result<SessionOutcome, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::debug!(
            "{} session starting: K={} N={} L={} rule={} max_rounds={}",
            self.role,
            self.config.machine.k,
            self.config.machine.n,
            self.config.machine.l,
            self.config.rule,
            self.config.max_rounds
        );

        let result = self.drive(&mut channel).await;

        if let Err(e) = channel.shutdown().await {
            tracing::trace!("{} shutdown after session: {}", self.role, e);
        }

        match result {
            Ok(mut outcome) => {
                outcome.stats.frames_sent = channel.frames_sent();
                outcome.stats.frames_received = channel.frames_received();
                tracing::info!(
                    "{} session done: ok={} rounds={} synced_early={} key={}",
                    outcome.role,
                    outcome.ok,
                    outcome.rounds,
                    outcome.synced_early,
                    self.machine.key().prefix()
                );
                Ok(outcome)
            },
            Err(e) => {
                tracing::error!("{} session failed in round {}: {}", self.role, self.round, e);
                Err(e)
            },
        }
    }

    async fn drive<R, W>(
        &mut self,
        channel: &mut FramedChannel<R, W>,
    ) -> Result<SessionOutcome, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut state = match self.role {
            Role::Initiator => State::NextRound,
            Role::Responder => State::AwaitRecord { probed: false },
        };

        loop {
            state = match state {
                State::NextRound => self.next_round(channel).await?,
                State::Probe => self.probe(channel).await?,
                State::Challenge => self.challenge(channel).await?,
                State::Report { ok, synced_early } => {
                    self.report(channel, ok, synced_early).await?
                },
                State::AwaitRecord { probed } => self.await_record(channel, probed).await?,
                State::AwaitResult => self.await_result(channel).await?,
                State::Done(outcome) => return Ok(outcome),
            };
        }
    }

    async fn next_round<R, W>(
        &mut self,
        channel: &mut FramedChannel<R, W>,
    ) -> Result<State, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        if self.round >= self.config.max_rounds {
            tracing::debug!("round cap {} reached, challenging", self.config.max_rounds);
            return Ok(State::Challenge);
        }

        self.round += 1;
        let x = self.config.input.draw(&self.env, &self.machine)?;
        channel.send(&Record::X(RoundInput { x: x.clone(), round: self.round })).await?;

        self.play_round(channel, &x).await?;

        if self.config.probe_due(self.round) { Ok(State::Probe) } else { Ok(State::NextRound) }
    }

    async fn probe<R, W>(&mut self, channel: &mut FramedChannel<R, W>) -> Result<State, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let nonce = self.fresh_nonce()?;
        channel.send(&Record::Probe(Challenge { nonce })).await?;
        self.stats.probes += 1;

        let tag = match self.recv(channel).await? {
            Record::ProbeResp(resp) => resp.tag,
            other => return Err(violation("probe_resp", &other)),
        };

        if self.machine.key().verify(&nonce, &tag)? {
            tracing::info!("probe matched after {} rounds", self.round);
            Ok(State::Report { ok: true, synced_early: true })
        } else {
            Ok(State::NextRound)
        }
    }

    async fn challenge<R, W>(
        &mut self,
        channel: &mut FramedChannel<R, W>,
    ) -> Result<State, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let nonce = self.fresh_nonce()?;
        channel.send(&Record::MacChal(Challenge { nonce })).await?;

        let tag = match self.recv(channel).await? {
            Record::MacResp(resp) => resp.tag,
            other => return Err(violation("mac_resp", &other)),
        };

        let ok = self.machine.key().verify(&nonce, &tag)?;
        if !ok {
            tracing::warn!("key confirmation failed after {} rounds", self.round);
        }
        Ok(State::Report { ok, synced_early: false })
    }

    async fn report<R, W>(
        &mut self,
        channel: &mut FramedChannel<R, W>,
        ok: bool,
        synced_early: bool,
    ) -> Result<State, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let key_hex = self.machine.key_hex();
        channel
            .send(&Record::Outcome(SessionResult { ok, rounds: self.round, key_hex: key_hex.clone() }))
            .await?;

        Ok(State::Done(SessionOutcome {
            role: self.role,
            ok,
            rounds: self.round,
            synced_early,
            key_hex,
            peer_key_hex: None,
            stats: self.finished_stats(),
        }))
    }

    async fn await_record<R, W>(
        &mut self,
        channel: &mut FramedChannel<R, W>,
        probed: bool,
    ) -> Result<State, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        match self.recv(channel).await? {
            Record::X(input) => {
                let expected = self.round + 1;
                if input.round != expected {
                    return Err(SessionError::RoundOutOfSequence { expected, actual: input.round });
                }
                self.round = expected;
                self.play_round(channel, &input.x).await?;
                Ok(State::AwaitRecord { probed: false })
            },
            Record::Probe(challenge) if !probed && self.round > 0 => {
                let tag = self.machine.key().tag(&challenge.nonce)?;
                channel.send(&Record::ProbeResp(TagResponse { tag })).await?;
                self.stats.probes += 1;
                Ok(State::AwaitRecord { probed: true })
            },
            Record::MacChal(challenge) => {
                let tag = self.machine.key().tag(&challenge.nonce)?;
                channel.send(&Record::MacResp(TagResponse { tag })).await?;
                Ok(State::AwaitResult)
            },
            Record::Outcome(result) if probed => Ok(State::Done(self.accept_result(result, true))),
            other => {
                let expected = if probed {
                    "x, mac_chal or result"
                } else if self.round > 0 {
                    "x, probe or mac_chal"
                } else {
                    "x or mac_chal"
                };
                Err(violation(expected, &other))
            },
        }
    }

    async fn await_result<R, W>(
        &mut self,
        channel: &mut FramedChannel<R, W>,
    ) -> Result<State, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        match self.recv(channel).await? {
            Record::Outcome(result) => Ok(State::Done(self.accept_result(result, false))),
            other => Err(violation("result", &other)),
        }
    }

    /// Computes, exchanges taus in role order, updates, and reports.
    async fn play_round<R, W>(
        &mut self,
        channel: &mut FramedChannel<R, W>,
        x: &[Vec<Spin>],
    ) -> Result<(), SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let output = self.machine.compute(x)?;
        let own = Record::Tau(TauReport { tau: output.tau, round: self.round });

        let peer_tau = if self.role.reports_tau_first() {
            channel.send(&own).await?;
            self.recv_tau(channel).await?
        } else {
            let peer_tau = self.recv_tau(channel).await?;
            channel.send(&own).await?;
            peer_tau
        };

        if self.machine.update(x, &output, peer_tau)? {
            self.stats.agreeing_rounds += 1;
        } else {
            self.stats.repulsive_rounds += 1;
        }

        tracing::trace!(
            "{} round {}: tau={} peer={} checksum={}",
            self.role,
            self.round,
            output.tau.value(),
            peer_tau.value(),
            self.machine.checksum()
        );

        if self.config.telemetry.due(self.round) {
            let tele = snapshot(&self.machine, self.round, self.config.telemetry.mode);
            channel.send(&Record::Tele(tele)).await?;
        }

        Ok(())
    }

    async fn recv_tau<R, W>(
        &mut self,
        channel: &mut FramedChannel<R, W>,
    ) -> Result<Spin, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        match self.recv(channel).await? {
            Record::Tau(report) if report.round == self.round => Ok(report.tau),
            Record::Tau(report) => {
                Err(SessionError::RoundOutOfSequence { expected: self.round, actual: report.round })
            },
            other => Err(violation("tau", &other)),
        }
    }

    /// Next protocol record, with diagnostics filtered out.
    async fn recv<R, W>(&mut self, channel: &mut FramedChannel<R, W>) -> Result<Record, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        Ok(self.diagnostics.recv(channel, &self.machine).await?)
    }

    fn accept_result(&self, result: SessionResult, synced_early: bool) -> SessionOutcome {
        let key_hex = self.machine.key_hex();
        if !result.key_hex.eq_ignore_ascii_case(&key_hex) {
            tracing::warn!("initiator reported a different key (ok={})", result.ok);
        }
        if result.rounds != self.round {
            tracing::warn!("initiator reported {} rounds, played {}", result.rounds, self.round);
        }

        SessionOutcome {
            role: self.role,
            ok: result.ok,
            rounds: result.rounds,
            synced_early,
            key_hex,
            peer_key_hex: Some(result.key_hex),
            stats: self.finished_stats(),
        }
    }

    fn finished_stats(&self) -> SessionStats {
        SessionStats { diagnostics_consumed: self.diagnostics.consumed(), ..self.stats }
    }

    fn fresh_nonce(&self) -> Result<Nonce, EntropyError> {
        let mut nonce = [0u8; NONCE_SIZE];
        self.env.random_bytes(&mut nonce)?;
        Ok(nonce)
    }
}

fn violation(expected: &'static str, actual: &Record) -> SessionError {
    SessionError::ProtocolViolation { expected, actual: actual.type_name() }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, duplex};

    use super::*;
    use crate::{
        env::testing::{DeadEnv, TestEnv},
        machine::UpdateRule,
    };

    fn config(seed: u64) -> SessionConfig {
        SessionConfig { seed: SeedPolicy::Fixed(seed), ..SessionConfig::default() }
    }

    async fn pair(
        initiator: SessionConfig,
        responder: SessionConfig,
    ) -> (Result<SessionOutcome, SessionError>, Result<SessionOutcome, SessionError>) {
        let (a, b) = duplex(4096);
        let init = Session::new(Role::Initiator, initiator, TestEnv::new(7)).expect("initiator");
        let resp = Session::new(Role::Responder, responder, TestEnv::new(8)).expect("responder");

        tokio::join!(init.run(FramedChannel::from_stream(a)), resp.run(FramedChannel::from_stream(b)))
    }

    #[tokio::test]
    async fn sessions_agree_on_a_key() {
        let (init, resp) = pair(config(1), config(2)).await;
        let init = init.expect("initiator outcome");
        let resp = resp.expect("responder outcome");

        assert!(init.ok);
        assert!(resp.ok);
        assert_eq!(init.key_hex, resp.key_hex);
        assert_eq!(resp.peer_key_hex.as_deref(), Some(init.key_hex.as_str()));
        assert_eq!(init.rounds, resp.rounds);
        assert!(init.synced_early);
        assert!(init.stats.agreeing_rounds > 0);
        assert_eq!(init.stats.probes, resp.stats.probes);
    }

    #[tokio::test]
    async fn zero_round_cap_goes_straight_to_challenge() {
        let capped = |seed| SessionConfig { max_rounds: 0, ..config(seed) };
        let (init, resp) = pair(capped(1), capped(1)).await;
        let init = init.expect("initiator outcome");
        let resp = resp.expect("responder outcome");

        // Same seed, same weights: the challenge succeeds without a round.
        assert_eq!(init.rounds, 0);
        assert!(init.ok);
        assert!(!init.synced_early);
        assert!(resp.ok);
        assert!(!resp.synced_early);
    }

    #[tokio::test]
    async fn frozen_machines_with_different_seeds_fail_confirmation() {
        let frozen = |seed| SessionConfig {
            rule: UpdateRule::Frozen,
            max_rounds: 4,
            check_every: None,
            ..config(seed)
        };
        let (init, resp) = pair(frozen(1), frozen(2)).await;
        let init = init.expect("initiator outcome");
        let resp = resp.expect("responder outcome");

        assert_eq!(init.rounds, 4);
        assert!(!init.ok);
        assert!(!resp.ok);
        assert_eq!(init.stats.probes, 0);
    }

    #[tokio::test]
    async fn telemetry_is_transparent_to_the_peer() {
        let plain = |seed| SessionConfig { check_every: NonZeroU64::new(5), ..config(seed) };
        let chatty = |seed| SessionConfig {
            telemetry: crate::config::TelemetryConfig {
                mode: crate::config::TelemetryMode::Weights,
                every: NonZeroU64::MIN,
            },
            ..plain(seed)
        };

        let (quiet_init, quiet_resp) = pair(plain(3), plain(4)).await;
        let (loud_init, loud_resp) = pair(chatty(3), chatty(4)).await;
        let quiet_init = quiet_init.expect("quiet initiator");
        let loud_init = loud_init.expect("loud initiator");
        let loud_resp = loud_resp.expect("loud responder");

        assert_eq!(quiet_init.rounds, loud_init.rounds);
        assert_eq!(quiet_init.key_hex, loud_init.key_hex);
        assert_eq!(quiet_resp.expect("quiet responder").key_hex, loud_resp.key_hex);
        assert_eq!(loud_init.stats.diagnostics_consumed, loud_init.rounds);
    }

    #[tokio::test]
    async fn responder_rejects_probe_before_any_round() {
        let (mut raw, b) = duplex(1024);
        let resp = Session::new(Role::Responder, config(1), TestEnv::new(1)).expect("responder");
        raw.write_all(b"{\"type\":\"probe\",\"nonce\":\"00000000000000000000000000000000\"}\n")
            .await
            .expect("write");

        let err = resp.run(FramedChannel::from_stream(b)).await.expect_err("violation");
        assert!(matches!(
            err,
            SessionError::ProtocolViolation { expected: "x or mac_chal", actual: "probe" }
        ));
    }

    #[tokio::test]
    async fn responder_rejects_skipped_round() {
        let (mut raw, b) = duplex(1024);
        let resp = Session::new(Role::Responder, config(1), TestEnv::new(1)).expect("responder");
        raw.write_all(
            b"{\"type\":\"x\",\"x\":[[1,1,1,1],[1,1,1,1],[1,1,1,1]],\"round\":2}\n",
        )
        .await
        .expect("write");

        let err = resp.run(FramedChannel::from_stream(b)).await.expect_err("out of sequence");
        assert!(matches!(err, SessionError::RoundOutOfSequence { expected: 1, actual: 2 }));
    }

    #[tokio::test]
    async fn responder_rejects_wrong_input_shape() {
        let (mut raw, b) = duplex(1024);
        let resp = Session::new(Role::Responder, config(1), TestEnv::new(1)).expect("responder");
        raw.write_all(b"{\"type\":\"x\",\"x\":[[1,1],[1,1]],\"round\":1}\n").await.expect("write");

        let err = resp.run(FramedChannel::from_stream(b)).await.expect_err("dimension");
        assert!(matches!(err, SessionError::Dimension { expected_rows: 3, rows: 2, .. }));
    }

    #[tokio::test]
    async fn initiator_sees_closed_stream() {
        let (raw, b) = duplex(1024);
        let init = Session::new(Role::Initiator, config(1), TestEnv::new(1)).expect("initiator");

        let peer = tokio::spawn(async move {
            // Read the first input, then hang up.
            let mut reader = BufReader::new(raw);
            let mut line = String::new();
            reader.read_line(&mut line).await.expect("read x");
            line
        });

        let err = init.run(FramedChannel::from_stream(b)).await.expect_err("closed");
        assert!(err.is_transport());
        assert!(peer.await.expect("peer task").starts_with("{\"type\":\"x\""));
    }

    #[test]
    fn invalid_config_is_rejected_before_io() {
        let bad = SessionConfig {
            machine: crate::machine::MachineParams { k: 3, n: 0, l: 3 },
            ..SessionConfig::default()
        };
        let err = Session::new(Role::Initiator, bad, TestEnv::new(1)).err().expect("invalid");
        assert!(matches!(err, SessionError::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn responder_skips_off_type_tele_before_challenge() {
        let (raw, b) = duplex(4096);
        let mut raw = BufReader::new(raw);
        let resp = Session::new(Role::Responder, config(1), TestEnv::new(1)).expect("responder");

        raw.get_mut()
            .write_all(
                b"{\"type\":\"tele\",\"round\":-1,\"key8\":\"abcd\"}\n\
                  {\"type\":\"tele\",\"round\":1,\"key8\":null}\n\
                  {\"type\":\"tele\",\"w\":[[1.0,2]]}\n\
                  {\"type\":\"mac_chal\",\"nonce\":\"00000000000000000000000000000000\"}\n",
            )
            .await
            .expect("write");

        let peer = async {
            let mut line = String::new();
            raw.read_line(&mut line).await.expect("read mac_resp");
            assert!(line.starts_with("{\"type\":\"mac_resp\""));

            raw.get_mut()
                .write_all(b"{\"type\":\"result\",\"ok\":true,\"rounds\":0,\"key_hex\":\"00\"}\n")
                .await
                .expect("write");
        };

        let (outcome, ()) = tokio::join!(resp.run(FramedChannel::from_stream(b)), peer);
        let outcome = outcome.expect("outcome");
        assert!(outcome.ok);
        assert_eq!(outcome.stats.diagnostics_consumed, 3);
    }

    #[test]
    fn random_seed_without_entropy_is_rejected() {
        let err = Session::new(Role::Initiator, SessionConfig::default(), DeadEnv)
            .err()
            .expect("no seed");
        assert!(matches!(err, SessionError::Entropy(_)));
    }

    #[tokio::test]
    async fn initiator_without_entropy_sends_nothing() {
        let (raw, b) = duplex(1024);
        let init = Session::new(Role::Initiator, config(1), DeadEnv).expect("fixed seed");

        let err = init.run(FramedChannel::from_stream(b)).await.expect_err("no input");
        assert!(matches!(err, SessionError::Entropy(_)));

        let mut line = String::new();
        let read = BufReader::new(raw).read_line(&mut line).await.expect("read");
        assert_eq!(read, 0);
    }

    #[test]
    fn outcome_debug_hides_keys() {
        let outcome = SessionOutcome {
            role: Role::Responder,
            ok: true,
            rounds: 1,
            synced_early: true,
            key_hex: "0123456789abcdef".to_string(),
            peer_key_hex: Some("fedcba9876543210".to_string()),
            stats: SessionStats::default(),
        };
        let debug = format!("{outcome:?}");
        assert!(!debug.contains("0123456789abcdef"));
        assert!(!debug.contains("fedcba9876543210"));
        assert!(debug.contains("01234567"));
    }
}
