//! JSON-lines replay scenarios.
//!
//! One step per line: an `at_ms` timestamp plus exactly one action key.
//!
//! ```text
//! {"at_ms": 1705276800000, "order": {"symbol": "IF2401", ...}}
//! {"at_ms": 1705276800100, "order_update": {"orderid": "1", ...}}
//! {"at_ms": 1705276801000, "timer": true}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::io::BufRead;
use std::path::Path;

use admit_core::{CancelRequest, OrderData, OrderRequest, RiskEvent, TickData, TradeData};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioAction {
    /// Check and forward an order.
    Order(OrderRequest),
    /// Check and forward a cancel.
    Cancel(CancelRequest),
    /// Order status update from the gateway.
    OrderUpdate(OrderData),
    Trade(TradeData),
    Tick(TickData),
    Timer,
}

impl ScenarioAction {
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioAction::Order(_) => "order",
            ScenarioAction::Cancel(_) => "cancel",
            ScenarioAction::OrderUpdate(_) => "order_update",
            ScenarioAction::Trade(_) => "trade",
            ScenarioAction::Tick(_) => "tick",
            ScenarioAction::Timer => "timer",
        }
    }

    /// Instrument the step refers to. Timers have none.
    pub fn vt_symbol(&self) -> Option<String> {
        match self {
            ScenarioAction::Order(req) => Some(req.vt_symbol()),
            ScenarioAction::Cancel(req) => Some(req.vt_symbol()),
            ScenarioAction::OrderUpdate(order) => Some(order.vt_symbol()),
            ScenarioAction::Trade(trade) => Some(trade.vt_symbol()),
            ScenarioAction::Tick(tick) => Some(tick.vt_symbol()),
            ScenarioAction::Timer => None,
        }
    }

    /// The engine event for this step, if it is an event rather than a request.
    pub fn to_event(&self) -> Option<RiskEvent> {
        match self {
            ScenarioAction::Order(_) | ScenarioAction::Cancel(_) => None,
            ScenarioAction::OrderUpdate(order) => Some(RiskEvent::Order(order.clone())),
            ScenarioAction::Trade(trade) => Some(RiskEvent::Trade(trade.clone())),
            ScenarioAction::Tick(tick) => Some(RiskEvent::Tick(tick.clone())),
            ScenarioAction::Timer => Some(RiskEvent::Timer),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioStep {
    pub at_ms: u64,
    pub action: ScenarioAction,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    at_ms: u64,
    #[serde(default)]
    order: Option<OrderRequest>,
    #[serde(default)]
    cancel: Option<CancelRequest>,
    #[serde(default)]
    order_update: Option<OrderData>,
    #[serde(default)]
    trade: Option<TradeData>,
    #[serde(default)]
    tick: Option<TickData>,
    #[serde(default)]
    timer: bool,
}

impl RawStep {
    fn into_step(self) -> Result<ScenarioStep, String> {
        let mut actions = Vec::with_capacity(1);
        if let Some(req) = self.order {
            actions.push(ScenarioAction::Order(req));
        }
        if let Some(req) = self.cancel {
            actions.push(ScenarioAction::Cancel(req));
        }
        if let Some(order) = self.order_update {
            actions.push(ScenarioAction::OrderUpdate(order));
        }
        if let Some(trade) = self.trade {
            actions.push(ScenarioAction::Trade(trade));
        }
        if let Some(tick) = self.tick {
            actions.push(ScenarioAction::Tick(tick));
        }
        if self.timer {
            actions.push(ScenarioAction::Timer);
        }

        match actions.len() {
            1 => Ok(ScenarioStep {
                at_ms: self.at_ms,
                action: actions.remove(0),
            }),
            0 => Err("no action".to_string()),
            n => Err(format!("{} actions in one step", n)),
        }
    }
}

/// Parse a scenario. Steps must not go back in time.
pub fn parse_scenario(reader: impl BufRead) -> AppResult<Vec<ScenarioStep>> {
    let mut steps: Vec<ScenarioStep> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let raw: RawStep = serde_json::from_str(trimmed).map_err(|e| AppError::Scenario {
            line: line_no,
            message: e.to_string(),
        })?;
        let step = raw.into_step().map_err(|message| AppError::Scenario {
            line: line_no,
            message,
        })?;

        if let Some(prev) = steps.last() {
            if step.at_ms < prev.at_ms {
                return Err(AppError::Scenario {
                    line: line_no,
                    message: format!("at_ms {} is before previous step {}", step.at_ms, prev.at_ms),
                });
            }
        }
        steps.push(step);
    }

    Ok(steps)
}

pub fn read_scenario(path: impl AsRef<Path>) -> AppResult<Vec<ScenarioStep>> {
    let file = std::fs::File::open(path)?;
    parse_scenario(std::io::BufReader::new(file))
}
