//! Scenario replay through the engine worker.

use std::fmt;
use std::sync::Arc;

use admit_core::{Clock, ManualClock, RiskEvent};
use admit_engine::{
    spawn_risk_engine, EngineSnapshot, PaperHost, RiskEngine, RiskEngineHandle, RiskSettings,
};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::scenario::{ScenarioAction, ScenarioStep};

/// What happened to one scenario step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Request passed every active rule. Orders carry the host's id.
    Approved {
        #[serde(skip_serializing_if = "Option::is_none")]
        orderid: Option<String>,
    },
    Denied { reason: String },
    /// Event delivered to subscribed rules.
    Applied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub at_ms: u64,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vt_symbol: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Decision {
    pub fn is_denied(&self) -> bool {
        matches!(self.outcome, Outcome::Denied { .. })
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.at_ms, self.action)?;
        if let Some(vt_symbol) = &self.vt_symbol {
            write!(f, " {}", vt_symbol)?;
        }
        match &self.outcome {
            Outcome::Approved { orderid: Some(id) } => write!(f, " -> approved ({})", id),
            Outcome::Approved { orderid: None } => write!(f, " -> approved"),
            Outcome::Denied { reason } => write!(f, " -> denied: {}", reason),
            Outcome::Applied => write!(f, " -> applied"),
        }
    }
}

/// Drives a `RiskEngine` worker over a `PaperHost` with scenario time.
///
/// Must be created inside a tokio runtime.
pub struct Replayer {
    handle: RiskEngineHandle,
    join: JoinHandle<()>,
    clock: Arc<ManualClock>,
    host: Arc<PaperHost>,
    timer_interval_ms: u64,
    next_timer_ms: Option<u64>,
}

impl Replayer {
    pub fn new(config: &AppConfig, settings: &RiskSettings, start_ms: u64) -> AppResult<Self> {
        config.validate()?;

        let host = Arc::new(PaperHost::new());
        for contract in &config.contracts {
            host.add_contract(contract.clone())?;
        }
        let clock = Arc::new(ManualClock::new(start_ms));

        let mut engine = RiskEngine::new(host.clone(), clock.clone());
        engine.apply_settings(settings);
        let (handle, join) = spawn_risk_engine(engine, config.queue_capacity);

        let next_timer_ms = config
            .synthesize_timer
            .then(|| start_ms.saturating_add(config.timer_interval_ms));

        info!(
            contracts = config.contracts.len(),
            start_ms,
            synthesize_timer = config.synthesize_timer,
            "Replayer ready"
        );

        Ok(Self {
            handle,
            join,
            clock,
            host,
            timer_interval_ms: config.timer_interval_ms,
            next_timer_ms,
        })
    }

    pub fn handle(&self) -> &RiskEngineHandle {
        &self.handle
    }

    pub fn host(&self) -> &Arc<PaperHost> {
        &self.host
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Replay steps in order, collecting one decision per step.
    pub async fn run(&mut self, steps: &[ScenarioStep]) -> AppResult<Vec<Decision>> {
        let mut decisions = Vec::with_capacity(steps.len());
        for step in steps {
            decisions.push(self.step(step).await?);
        }
        Ok(decisions)
    }

    pub async fn step(&mut self, step: &ScenarioStep) -> AppResult<Decision> {
        self.advance_to(step.at_ms).await?;

        let outcome = match &step.action {
            ScenarioAction::Order(req) => {
                let logged = self.host.logs().len();
                match self.handle.send_order(req.clone()).await? {
                    Some(orderid) => Outcome::Approved {
                        orderid: Some(orderid),
                    },
                    None => Outcome::Denied {
                        reason: self.denial_reason(logged),
                    },
                }
            }
            ScenarioAction::Cancel(req) => {
                let logged = self.host.logs().len();
                if self.handle.cancel_order(req.clone()).await? {
                    Outcome::Approved { orderid: None }
                } else {
                    Outcome::Denied {
                        reason: self.denial_reason(logged),
                    }
                }
            }
            action => {
                // The host's working-order book follows gateway updates
                if let ScenarioAction::OrderUpdate(order) = action {
                    self.host.apply_order(order);
                }
                if let Some(event) = action.to_event() {
                    self.deliver(event).await?;
                }
                Outcome::Applied
            }
        };

        let decision = Decision {
            at_ms: step.at_ms,
            action: step.action.name(),
            vt_symbol: step.action.vt_symbol(),
            outcome,
        };
        debug!(decision = %decision, "Step replayed");
        Ok(decision)
    }

    /// Final parameters and state, then stop the worker.
    pub async fn finish(self) -> AppResult<(EngineSnapshot, RiskSettings)> {
        let snapshot = self.handle.snapshot().await?;
        let settings = self.handle.settings().await?;
        self.handle.shutdown().await;
        if let Err(e) = self.join.await {
            warn!(error = %e, "Risk engine worker ended abnormally");
        }
        Ok((snapshot, settings))
    }

    // Synthesized timer events fire at their own instants before the clock
    // reaches the step.
    async fn advance_to(&mut self, at_ms: u64) -> AppResult<()> {
        while let Some(due) = self.next_timer_ms.filter(|&due| due <= at_ms) {
            self.clock.set_ms(due);
            self.deliver(RiskEvent::Timer).await?;
            self.next_timer_ms = Some(due.saturating_add(self.timer_interval_ms));
        }
        self.clock.set_ms(at_ms);
        Ok(())
    }

    // Events are fire-and-forget on the worker queue; wait for them so the
    // clock never moves ahead of an unprocessed event.
    async fn deliver(&self, event: RiskEvent) -> AppResult<()> {
        self.handle.event(event).await?;
        self.handle.flush().await?;
        Ok(())
    }

    fn denial_reason(&self, logged_before: usize) -> String {
        self.host
            .logs()
            .into_iter()
            .skip(logged_before)
            .last()
            .unwrap_or_else(|| "denied".to_string())
    }
}
