//! Engine worker task.
//!
//! The engine is moved into one tokio task and driven by messages on a
//! single queue, so requests, events and parameter updates are applied in
//! arrival order without any lock. Callers talk to it through a cloneable
//! `RiskEngineHandle`.

use std::sync::Arc;
use std::time::Duration;

use admit_core::{CancelRequest, OrderRequest, Request, RiskEvent};
use admit_rules::{ParamMap, Rejection};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::engine::RiskEngine;
use crate::error::{EngineError, EngineResult};
use crate::registry::EngineSnapshot;
use crate::settings::RiskSettings;

/// Messages processed by the engine task.
#[derive(Debug)]
pub enum EngineMsg {
    /// Check and forward an order.
    SendOrder {
        req: OrderRequest,
        reply: oneshot::Sender<Option<String>>,
    },

    /// Check and forward a cancel.
    CancelOrder {
        req: CancelRequest,
        reply: oneshot::Sender<bool>,
    },

    /// Check only; nothing is forwarded.
    Evaluate {
        req: Request,
        reply: oneshot::Sender<Result<(), Rejection>>,
    },

    Event(RiskEvent),

    UpdateParameters {
        rule: String,
        params: ParamMap,
        reply: oneshot::Sender<EngineResult<()>>,
    },

    Snapshot {
        reply: oneshot::Sender<EngineSnapshot>,
    },

    /// Current parameters in persisted form.
    Settings {
        reply: oneshot::Sender<RiskSettings>,
    },

    /// Answered once every earlier message has been handled.
    Flush {
        reply: oneshot::Sender<()>,
    },

    /// Graceful shutdown.
    Shutdown,
}

struct RiskEngineTask {
    rx: mpsc::Receiver<EngineMsg>,
    engine: RiskEngine,
}

impl RiskEngineTask {
    async fn run(mut self) {
        self.engine.start();
        debug!("RiskEngineTask started");

        while let Some(msg) = self.rx.recv().await {
            if matches!(msg, EngineMsg::Shutdown) {
                debug!("RiskEngineTask shutting down");
                break;
            }
            self.handle_message(msg);
        }

        debug!("RiskEngineTask terminated");
    }

    // A dropped reply receiver means the caller gave up waiting; the request
    // has still been applied.
    fn handle_message(&mut self, msg: EngineMsg) {
        match msg {
            EngineMsg::SendOrder { req, reply } => {
                let _ = reply.send(self.engine.send_order(&req));
            }
            EngineMsg::CancelOrder { req, reply } => {
                let _ = reply.send(self.engine.cancel_order(&req));
            }
            EngineMsg::Evaluate { req, reply } => {
                let _ = reply.send(self.engine.evaluate(&req));
            }
            EngineMsg::Event(event) => self.engine.process_event(&event),
            EngineMsg::UpdateParameters {
                rule,
                params,
                reply,
            } => {
                let _ = reply.send(self.engine.update_rule_parameters(&rule, &params));
            }
            EngineMsg::Snapshot { reply } => {
                let _ = reply.send(self.engine.snapshot());
            }
            EngineMsg::Settings { reply } => {
                let _ = reply.send(self.engine.settings());
            }
            EngineMsg::Flush { reply } => {
                let _ = reply.send(());
            }
            EngineMsg::Shutdown => {}
        }
    }
}

/// Handle to a running engine task.
#[derive(Debug, Clone)]
pub struct RiskEngineHandle {
    tx: mpsc::Sender<EngineMsg>,
}

impl RiskEngineHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineMsg,
    ) -> EngineResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| EngineError::WorkerClosed)?;
        rx.await.map_err(|_| EngineError::WorkerClosed)
    }

    /// Check an order and forward it if allowed. `Ok(None)` means denied.
    pub async fn send_order(&self, req: OrderRequest) -> EngineResult<Option<String>> {
        self.request(|reply| EngineMsg::SendOrder { req, reply })
            .await
    }

    /// Check a cancel and forward it if allowed.
    pub async fn cancel_order(&self, req: CancelRequest) -> EngineResult<bool> {
        self.request(|reply| EngineMsg::CancelOrder { req, reply })
            .await
    }

    /// Evaluate a request without forwarding it.
    pub async fn evaluate(&self, req: Request) -> EngineResult<Result<(), Rejection>> {
        self.request(|reply| EngineMsg::Evaluate { req, reply })
            .await
    }

    /// Queue an event, waiting for capacity.
    pub async fn event(&self, event: RiskEvent) -> EngineResult<()> {
        self.tx
            .send(EngineMsg::Event(event))
            .await
            .map_err(|_| EngineError::WorkerClosed)
    }

    /// Queue an event without waiting.
    ///
    /// Returns `Err` if the queue is full or the worker is gone.
    pub fn try_event(
        &self,
        event: RiskEvent,
    ) -> Result<(), mpsc::error::TrySendError<EngineMsg>> {
        self.tx.try_send(EngineMsg::Event(event))
    }

    pub async fn update_parameters(&self, rule: &str, params: ParamMap) -> EngineResult<()> {
        let rule = rule.to_string();
        self.request(|reply| EngineMsg::UpdateParameters {
            rule,
            params,
            reply,
        })
        .await?
    }

    pub async fn snapshot(&self) -> EngineResult<EngineSnapshot> {
        self.request(|reply| EngineMsg::Snapshot { reply }).await
    }

    pub async fn settings(&self) -> EngineResult<RiskSettings> {
        self.request(|reply| EngineMsg::Settings { reply }).await
    }

    /// Wait until every message queued before this call has been handled.
    pub async fn flush(&self) -> EngineResult<()> {
        self.request(|reply| EngineMsg::Flush { reply }).await
    }

    /// Ask the worker to stop after the messages already queued.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(EngineMsg::Shutdown).await;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the engine task.
///
/// Rule start hooks run inside the task before the first message.
pub fn spawn_risk_engine(engine: RiskEngine, capacity: usize) -> (RiskEngineHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity);
    let task = RiskEngineTask { rx, engine };
    let join_handle = tokio::spawn(task.run());
    (RiskEngineHandle { tx }, join_handle)
}

/// Feed `Timer` events to the engine every `period`.
///
/// The first event fires one period after the call. Missed ticks are
/// skipped, not replayed. Stops when the worker goes away.
pub fn spawn_timer(handle: RiskEngineHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if handle.event(RiskEvent::Timer).await.is_err() {
                warn!("Risk engine worker closed, timer stopped");
                break;
            }
        }
    })
}

/// Engine behind one coarse lock, for hosts that call from several threads
/// without an async runtime.
pub type SharedRiskEngine = Arc<Mutex<RiskEngine>>;

/// Start the engine and wrap it for shared synchronous use.
pub fn share_risk_engine(mut engine: RiskEngine) -> SharedRiskEngine {
    engine.start();
    Arc::new(Mutex::new(engine))
}
