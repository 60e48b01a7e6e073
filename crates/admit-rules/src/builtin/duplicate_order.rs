//! Repeated identical order detection.

use admit_core::{Direction, Exchange, Offset, OrderRequest, OrderType, Price, Subscriptions, Volume};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RuleResult;
use crate::params::{
    ensure_positive_seconds, merge_config, to_param_map, window_ms, ParamMap, ParamValue,
};
use crate::rule::{Rejection, RiskRule, RuleContext};
use crate::window::KeyedWindows;

pub const NAME: &str = "duplicate_order";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DuplicateOrderConfig {
    /// Identical orders allowed within the window.
    #[serde(default = "default_max_duplicate_orders")]
    pub max_duplicate_orders: u32,
    /// Window length in seconds.
    #[serde(default = "default_duplicate_window")]
    pub duplicate_window: f64,
}

fn default_max_duplicate_orders() -> u32 {
    3
}

fn default_duplicate_window() -> f64 {
    1.0
}

impl Default for DuplicateOrderConfig {
    fn default() -> Self {
        Self {
            max_duplicate_orders: default_max_duplicate_orders(),
            duplicate_window: default_duplicate_window(),
        }
    }
}

impl DuplicateOrderConfig {
    pub fn validate(&self) -> RuleResult<()> {
        ensure_positive_seconds(NAME, "duplicate_window", self.duplicate_window)
    }
}

/// Order identity for duplicate detection. The free-text reference is left
/// out on purpose: two orders differing only in tag are the same order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderFingerprint {
    symbol: String,
    exchange: Exchange,
    order_type: OrderType,
    direction: Direction,
    offset: Offset,
    price: Price,
    volume: Volume,
}

impl OrderFingerprint {
    pub fn of(req: &OrderRequest) -> Self {
        Self {
            symbol: req.symbol.clone(),
            exchange: req.exchange.clone(),
            order_type: req.order_type,
            direction: req.direction,
            offset: req.offset,
            // Normalized so 4000 and 4000.0 collide
            price: Price::new(req.price.inner().normalize()),
            volume: Volume::new(req.volume.inner().normalize()),
        }
    }
}

#[derive(Debug, Default)]
pub struct DuplicateOrderRule {
    config: DuplicateOrderConfig,
    records: KeyedWindows<OrderFingerprint>,
}

impl DuplicateOrderRule {
    pub fn new(config: DuplicateOrderConfig) -> Self {
        Self {
            config,
            records: KeyedWindows::new(),
        }
    }

    pub fn tracked_fingerprints(&self) -> usize {
        self.records.len()
    }
}

impl RiskRule for DuplicateOrderRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn subscriptions(&self) -> Subscriptions {
        Subscriptions::TIMER
    }

    fn parameters(&self) -> ParamMap {
        to_param_map(&self.config)
    }

    fn variables(&self) -> ParamMap {
        let mut vars = ParamMap::new();
        vars.insert(
            "tracked_fingerprints".to_string(),
            ParamValue::from(self.records.len()),
        );
        vars
    }

    fn update_parameters(&mut self, updates: &ParamMap) -> RuleResult<()> {
        let config = merge_config(NAME, &self.config, updates)?;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    // Every attempt is recorded, denied ones included.
    fn check_order(&mut self, req: &OrderRequest, ctx: &RuleContext<'_>) -> Result<(), Rejection> {
        let limit = self.config.max_duplicate_orders as usize;
        let count = self.records.record_and_count(
            OrderFingerprint::of(req),
            ctx.now_ms(),
            window_ms(self.config.duplicate_window),
        );
        if count > limit {
            return Err(Rejection::new(
                NAME,
                format!(
                    "duplicate order {} {} {} {}@{} seen {} times, limit {} within {}s",
                    req.vt_symbol(),
                    req.order_type,
                    req.direction,
                    req.volume,
                    req.price,
                    count,
                    limit,
                    self.config.duplicate_window
                ),
            ));
        }
        Ok(())
    }

    fn on_timer(&mut self, ctx: &RuleContext<'_>) {
        let removed = self
            .records
            .purge_expired(ctx.now_ms(), window_ms(self.config.duplicate_window));
        if removed > 0 {
            debug!(rule = NAME, removed, "Purged expired order fingerprints");
        }
    }
}
