//! Two-party session scenarios on a turmoil network.
//!
//! A scenario places an Initiator and a Responder on simulated hosts and runs
//! one session between them. With an interceptor installed, the Responder
//! talks to a relay host instead, which decodes every record in transit and
//! forwards whatever the interceptor returns for it: the record itself,
//! nothing, a modified copy, or extra records.
//!
//! ```text
//! responder ──▶ relay ──▶ initiator
//!           ◀──  (interceptor)  ◀──
//! ```

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::io::{AsyncRead, AsyncWrite};
use tpmkey_core::{FramedChannel, SessionConfig, SessionOutcome, Transport};
use tpmkey_proto::Record;
use tpmkey_server::{Server, ServerError, connect_responder};

use crate::{SimEnv, SimTransport};

const PORT: u16 = 9400;
const INITIATOR_HOST: &str = "initiator";
const RESPONDER_HOST: &str = "responder";
const RELAY_HOST: &str = "relay";

/// Which way a record is travelling through the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sent by the Initiator.
    ToResponder,
    /// Sent by the Responder.
    ToInitiator,
}

/// Rewrites records in transit. Returns the records to forward in place of
/// the one received.
pub type Interceptor = Arc<dyn Fn(Direction, Record) -> Vec<Record> + Send + Sync>;

/// Both sides of a finished scenario.
#[derive(Debug)]
pub struct ScenarioOutcome {
    /// Initiator result.
    pub initiator: Result<SessionOutcome, ServerError>,
    /// Responder result.
    pub responder: Result<SessionOutcome, ServerError>,
}

impl ScenarioOutcome {
    /// Stable textual summary of both results, for comparing runs.
    pub fn fingerprint(&self) -> String {
        fn side(result: &Result<SessionOutcome, ServerError>) -> String {
            match result {
                Ok(outcome) => format!(
                    "ok={} rounds={} early={} key={} stats={:?}",
                    outcome.ok, outcome.rounds, outcome.synced_early, outcome.key_hex, outcome.stats
                ),
                Err(e) => format!("error: {e}"),
            }
        }
        format!("initiator[{}] responder[{}]", side(&self.initiator), side(&self.responder))
    }
}

/// Builder for one simulated session.
#[derive(Clone)]
pub struct Scenario {
    initiator: SessionConfig,
    responder: SessionConfig,
    initiator_seed: u64,
    responder_seed: u64,
    interceptor: Option<Interceptor>,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("initiator", &self.initiator)
            .field("responder", &self.responder)
            .field("initiator_seed", &self.initiator_seed)
            .field("responder_seed", &self.responder_seed)
            .field("intercepted", &self.interceptor.is_some())
            .finish()
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    /// Default configuration on both sides, environment seeds 1 and 2.
    pub fn new() -> Self {
        Self {
            initiator: SessionConfig::default(),
            responder: SessionConfig::default(),
            initiator_seed: 1,
            responder_seed: 2,
            interceptor: None,
        }
    }

    /// Uses `config` for both parties.
    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.initiator = config.clone();
        self.responder = config;
        self
    }

    /// Initiator configuration.
    #[must_use]
    pub fn with_initiator(mut self, config: SessionConfig) -> Self {
        self.initiator = config;
        self
    }

    /// Responder configuration.
    #[must_use]
    pub fn with_responder(mut self, config: SessionConfig) -> Self {
        self.responder = config;
        self
    }

    /// Seeds of the two parties' randomness providers.
    #[must_use]
    pub const fn with_env_seeds(mut self, initiator: u64, responder: u64) -> Self {
        self.initiator_seed = initiator;
        self.responder_seed = responder;
        self
    }

    /// Routes the session through a relay that applies `interceptor`.
    #[must_use]
    pub fn intercept<F>(mut self, interceptor: F) -> Self
    where
        F: Fn(Direction, Record) -> Vec<Record> + Send + Sync + 'static,
    {
        self.interceptor = Some(Arc::new(interceptor));
        self
    }

    /// Runs the scenario to completion.
    ///
    /// Session errors are part of the outcome. Only a simulation failure is
    /// an error here.
    pub fn run(self) -> turmoil::Result<ScenarioOutcome> {
        let mut sim = turmoil::Builder::new()
            .simulation_duration(Duration::from_secs(24 * 60 * 60))
            .min_message_latency(Duration::from_millis(1))
            .max_message_latency(Duration::from_millis(1))
            .build();

        let initiator_slot = Arc::new(Mutex::new(None));
        let responder_slot = Arc::new(Mutex::new(None));

        {
            let slot = Arc::clone(&initiator_slot);
            let config = self.initiator;
            let env = SimEnv::with_seed(self.initiator_seed);
            sim.client(INITIATOR_HOST, async move {
                let transport = SimTransport::bind(&format!("0.0.0.0:{PORT}")).await?;
                let result = Server::new(transport, env, config).serve_one().await;
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
                Ok(())
            });
        }

        let remote = if let Some(interceptor) = self.interceptor {
            sim.host(RELAY_HOST, move || relay(Arc::clone(&interceptor)));
            format!("{RELAY_HOST}:{PORT}")
        } else {
            format!("{INITIATOR_HOST}:{PORT}")
        };

        {
            let slot = Arc::clone(&responder_slot);
            let config = self.responder;
            let env = SimEnv::with_seed(self.responder_seed);
            sim.client(RESPONDER_HOST, async move {
                let result = connect_responder(&SimTransport::client(), &remote, config, env).await;
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
                Ok(())
            });
        }

        sim.run()?;

        let initiator = take(&initiator_slot).ok_or("initiator did not finish")?;
        let responder = take(&responder_slot).ok_or("responder did not finish")?;
        Ok(ScenarioOutcome { initiator, responder })
    }
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Relay host: accepts the Responder, connects to the Initiator, and pumps
/// records both ways through the interceptor.
async fn relay(interceptor: Interceptor) -> turmoil::Result {
    let listener = SimTransport::bind(&format!("0.0.0.0:{PORT}")).await?;
    let (to_responder, from_responder, _peer) = listener.accept().await?;
    let (to_initiator, from_initiator) =
        SimTransport::client().connect(&format!("{INITIATOR_HOST}:{PORT}")).await?;

    tokio::join!(
        pump(Direction::ToInitiator, FramedChannel::new(from_responder, to_initiator), &interceptor),
        pump(Direction::ToResponder, FramedChannel::new(from_initiator, to_responder), &interceptor),
    );
    Ok(())
}

async fn pump<R, W>(direction: Direction, mut channel: FramedChannel<R, W>, interceptor: &Interceptor)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    'relay: loop {
        let record = match channel.recv().await {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("relay {:?} stopped: {}", direction, e);
                break;
            },
        };

        for record in interceptor(direction, record) {
            if let Err(e) = channel.send(&record).await {
                tracing::debug!("relay {:?} send failed: {}", direction, e);
                break 'relay;
            }
        }
    }

    // Pass end of stream on to the other side.
    let _ = channel.shutdown().await;
}
