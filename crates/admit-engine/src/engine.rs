//! Rule pipeline and interceptor.
//!
//! `RiskEngine` owns the rules in registration order and sits between the
//! caller and the host gateway. A request runs through every active rule
//! until the first denial; a denied request never reaches the host.

use std::sync::Arc;
use std::time::Instant;

use admit_core::{CancelRequest, Clock, OrderRequest, Request, RiskEvent};
use admit_rules::{
    builtin_rules, ParamMap, ParamValue, Rejection, RiskRule, RuleContext, RuleError, TradingHost,
};
use admit_telemetry::Metrics;
use tracing::{debug, error, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::registry::{EngineSnapshot, RuleSnapshot};
use crate::router::EventRouter;
use crate::settings::{RiskSettings, ACTIVE_KEY};

/// A registered rule and its participation flag.
struct RuleSlot {
    rule: Box<dyn RiskRule>,
    active: bool,
}

pub struct RiskEngine {
    slots: Vec<RuleSlot>,
    router: EventRouter,
    host: Arc<dyn TradingHost>,
    clock: Arc<dyn Clock>,
    started: bool,
}

impl RiskEngine {
    /// Engine with every built-in rule at default parameters.
    pub fn new(host: Arc<dyn TradingHost>, clock: Arc<dyn Clock>) -> Self {
        Self::with_rules(host, clock, builtin_rules())
    }

    /// Engine over an explicit rule list. Evaluation follows list order.
    pub fn with_rules(
        host: Arc<dyn TradingHost>,
        clock: Arc<dyn Clock>,
        rules: Vec<Box<dyn RiskRule>>,
    ) -> Self {
        let router = EventRouter::build(rules.iter().map(|r| (r.name(), r.subscriptions())));
        let slots: Vec<RuleSlot> = rules
            .into_iter()
            .map(|rule| RuleSlot { rule, active: true })
            .collect();
        debug!(rules = slots.len(), "Risk engine created");

        Self {
            slots,
            router,
            host,
            clock,
            started: false,
        }
    }

    /// Apply persisted settings.
    ///
    /// Settings that fail validation are logged and skipped; the rule keeps
    /// its current parameters. Unknown rule names are ignored with a warning.
    pub fn apply_settings(&mut self, settings: &RiskSettings) {
        for (name, params) in settings.iter() {
            match self.update_rule_parameters(name, params) {
                Ok(()) => {}
                Err(EngineError::UnknownRule(_)) => {
                    warn!(rule = %name, "Settings for unknown rule ignored");
                }
                Err(e) => {
                    error!(rule = %name, error = %e, "Invalid rule settings, keeping defaults");
                }
            }
        }
    }

    /// Run each rule's start hook. Idempotent.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        let ctx = RuleContext::new(&*self.host, &*self.clock);
        for slot in &mut self.slots {
            slot.rule.on_start(&ctx);
        }
        self.started = true;
        info!(
            rules = self.slots.len(),
            active = self.slots.iter().filter(|s| s.active).count(),
            "Risk engine started"
        );
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Evaluate an order against all active rules.
    pub fn check_order(&mut self, req: &OrderRequest) -> Result<(), Rejection> {
        let started = Instant::now();
        let ctx = RuleContext::new(&*self.host, &*self.clock);
        let result = self
            .slots
            .iter_mut()
            .filter(|slot| slot.active)
            .try_for_each(|slot| slot.rule.check_order(req, &ctx));
        self.finish("order", &req.vt_symbol(), started, result)
    }

    /// Evaluate a cancel against all active rules.
    pub fn check_cancel(&mut self, req: &CancelRequest) -> Result<(), Rejection> {
        let started = Instant::now();
        let ctx = RuleContext::new(&*self.host, &*self.clock);
        let result = self
            .slots
            .iter_mut()
            .filter(|slot| slot.active)
            .try_for_each(|slot| slot.rule.check_cancel(req, &ctx));
        self.finish("cancel", &req.vt_symbol(), started, result)
    }

    pub fn evaluate(&mut self, req: &Request) -> Result<(), Rejection> {
        match req {
            Request::Order(req) => self.check_order(req),
            Request::Cancel(req) => self.check_cancel(req),
        }
    }

    fn finish(
        &self,
        kind: &str,
        vt_symbol: &str,
        started: Instant,
        result: Result<(), Rejection>,
    ) -> Result<(), Rejection> {
        Metrics::check_latency(kind, started.elapsed().as_secs_f64() * 1_000_000.0);
        match &result {
            Ok(()) => Metrics::request_approved(kind),
            Err(rejection) => {
                Metrics::request_denied(kind, &rejection.rule);
                warn!(
                    rule = %rejection.rule,
                    reason = %rejection.reason,
                    kind,
                    vt_symbol,
                    "Request denied"
                );
                self.host
                    .write_log(&format!("{} denied: {}", kind, rejection));
            }
        }
        result
    }

    /// Check an order and forward it to the host only if every active rule
    /// allows it. Returns the host's order id, or `None` when denied.
    pub fn send_order(&mut self, req: &OrderRequest) -> Option<String> {
        self.check_order(req).ok()?;
        Some(self.host.send_order(req))
    }

    /// Check a cancel and forward it only if allowed. Returns whether the
    /// cancel was forwarded.
    pub fn cancel_order(&mut self, req: &CancelRequest) -> bool {
        if self.check_cancel(req).is_err() {
            return false;
        }
        self.host.cancel_order(req);
        true
    }

    /// Deliver an event to the rules subscribed to its kind.
    pub fn process_event(&mut self, event: &RiskEvent) {
        let kind = event.kind();
        Metrics::event_routed(kind.as_str());

        let ctx = RuleContext::new(&*self.host, &*self.clock);
        for &index in self.router.targets(kind) {
            let Some(slot) = self.slots.get_mut(index) else {
                continue;
            };
            match event {
                RiskEvent::Tick(tick) => slot.rule.on_tick(tick, &ctx),
                RiskEvent::Order(order) => slot.rule.on_order(order, &ctx),
                RiskEvent::Trade(trade) => slot.rule.on_trade(trade, &ctx),
                RiskEvent::Timer => slot.rule.on_timer(&ctx),
            }
        }
    }

    /// Update one rule's parameters, including the `active` flag.
    ///
    /// All-or-nothing: on any error neither the parameters nor the flag
    /// change.
    pub fn update_rule_parameters(&mut self, name: &str, params: &ParamMap) -> EngineResult<()> {
        let slot = self.slot_mut(name)?;

        let mut params = params.clone();
        let active = match params.remove(ACTIVE_KEY) {
            None => None,
            Some(ParamValue::Bool(active)) => Some(active),
            Some(other) => {
                return Err(EngineError::Rule(RuleError::InvalidType {
                    rule: name.to_string(),
                    message: format!("{} must be a bool, got {}", ACTIVE_KEY, other),
                }))
            }
        };

        if !params.is_empty() {
            slot.rule.update_parameters(&params)?;
        }
        if let Some(active) = active {
            slot.active = active;
        }

        info!(rule = name, params = ?params, active = slot.active, "Rule parameters updated");
        Ok(())
    }

    pub fn set_rule_active(&mut self, name: &str, active: bool) -> EngineResult<()> {
        let slot = self.slot_mut(name)?;
        slot.active = active;
        info!(rule = name, active, "Rule activation changed");
        Ok(())
    }

    pub fn is_rule_active(&self, name: &str) -> Option<bool> {
        self.slots
            .iter()
            .find(|s| s.rule.name() == name)
            .map(|s| s.active)
    }

    /// Rule names in registration order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|s| s.rule.name()).collect()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            rules: self
                .slots
                .iter()
                .map(|s| RuleSnapshot {
                    name: s.rule.name().to_string(),
                    active: s.active,
                    parameters: s.rule.parameters(),
                    variables: s.rule.variables(),
                })
                .collect(),
        }
    }

    /// Current parameters of every rule in persisted form.
    pub fn settings(&self) -> RiskSettings {
        let mut settings = RiskSettings::new();
        for slot in &self.slots {
            let mut params = slot.rule.parameters();
            params.insert(ACTIVE_KEY.to_string(), ParamValue::Bool(slot.active));
            settings.set(slot.rule.name(), params);
        }
        settings
    }

    fn slot_mut(&mut self, name: &str) -> EngineResult<&mut RuleSlot> {
        self.slots
            .iter_mut()
            .find(|s| s.rule.name() == name)
            .ok_or_else(|| EngineError::UnknownRule(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PaperHost;
    use admit_core::{Direction, Exchange, ManualClock, Price, Volume};
    use admit_rules::builtin::{OrderSizeConfig, OrderSizeRule, RollingWindowRule};
    use rust_decimal_macros::dec;

    fn order(volume: rust_decimal::Decimal) -> OrderRequest {
        OrderRequest::limit(
            "IF2401",
            Exchange::new("CFFEX"),
            Direction::Long,
            Price::new(dec!(4000)),
            Volume::new(volume),
        )
    }

    fn engine_with(rules: Vec<Box<dyn RiskRule>>) -> (RiskEngine, Arc<PaperHost>) {
        let host = Arc::new(PaperHost::new());
        let clock = Arc::new(ManualClock::new(1_000_000));
        let engine = RiskEngine::with_rules(host.clone(), clock, rules);
        (engine, host)
    }

    #[test]
    fn test_short_circuit_leaves_later_rule_untouched() {
        let (mut engine, host) = engine_with(vec![
            Box::new(OrderSizeRule::new(OrderSizeConfig {
                order_size_limit: 5,
            })),
            Box::new(RollingWindowRule::default()),
        ]);

        assert!(engine.send_order(&order(dec!(10))).is_none());
        let snap = engine.snapshot();
        assert_eq!(
            snap.rule("rolling_window").unwrap().variables["order_count"],
            ParamValue::Int(0)
        );
        assert!(host.sent_orders().is_empty());
        assert_eq!(host.logs().len(), 1);
        assert!(host.logs()[0].contains("[order_size]"));
    }

    #[test]
    fn test_inactive_rule_skipped() {
        let (mut engine, host) = engine_with(vec![Box::new(OrderSizeRule::new(OrderSizeConfig {
            order_size_limit: 5,
        }))]);

        engine.set_rule_active("order_size", false).unwrap();
        assert!(engine.send_order(&order(dec!(10))).is_some());
        assert_eq!(host.sent_orders().len(), 1);
    }

    #[test]
    fn test_update_rejects_non_bool_active() {
        let (mut engine, _host) = engine_with(vec![Box::new(OrderSizeRule::default())]);

        let mut params = ParamMap::new();
        params.insert("order_size_limit".to_string(), ParamValue::Int(1));
        params.insert(ACTIVE_KEY.to_string(), ParamValue::Int(0));

        assert!(engine.update_rule_parameters("order_size", &params).is_err());
        let snap = engine.snapshot();
        let rule = snap.rule("order_size").unwrap();
        assert!(rule.active);
        assert_eq!(rule.parameters["order_size_limit"], ParamValue::Int(100));
    }

    #[test]
    fn test_failed_update_keeps_active_flag() {
        let (mut engine, _host) = engine_with(vec![Box::new(OrderSizeRule::default())]);

        let mut params = ParamMap::new();
        params.insert("bogus".to_string(), ParamValue::Int(1));
        params.insert(ACTIVE_KEY.to_string(), ParamValue::Bool(false));

        assert!(matches!(
            engine.update_rule_parameters("order_size", &params),
            Err(EngineError::Rule(RuleError::UnknownParameter { .. }))
        ));
        assert_eq!(engine.is_rule_active("order_size"), Some(true));
    }

    #[test]
    fn test_unknown_rule() {
        let (mut engine, _host) = engine_with(vec![]);
        assert!(matches!(
            engine.set_rule_active("nope", false),
            Err(EngineError::UnknownRule(_))
        ));
    }

    #[test]
    fn test_settings_export_includes_active() {
        let (mut engine, _host) = engine_with(vec![Box::new(OrderSizeRule::default())]);
        engine.set_rule_active("order_size", false).unwrap();

        let settings = engine.settings();
        let params = settings.get("order_size").unwrap();
        assert_eq!(params[ACTIVE_KEY], ParamValue::Bool(false));
        assert_eq!(params["order_size_limit"], ParamValue::Int(100));
    }
}
