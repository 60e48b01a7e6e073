//! Daily caps on submitted orders and cancels.

use admit_core::{CancelRequest, OrderRequest};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::RuleResult;
use crate::params::{merge_config, to_param_map, ParamMap, ParamValue};
use crate::rule::{Rejection, RiskRule, RuleContext};

pub const NAME: &str = "daily_limit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DailyLimitConfig {
    #[serde(default = "default_daily_order_limit")]
    pub daily_order_limit: u32,
    #[serde(default = "default_daily_cancel_limit")]
    pub daily_cancel_limit: u32,
}

fn default_daily_order_limit() -> u32 {
    1000
}

fn default_daily_cancel_limit() -> u32 {
    500
}

impl Default for DailyLimitConfig {
    fn default() -> Self {
        Self {
            daily_order_limit: default_daily_order_limit(),
            daily_cancel_limit: default_daily_cancel_limit(),
        }
    }
}

/// Counts admitted orders and cancels per calendar day (UTC).
///
/// The date is compared before every check; on a change both counters
/// restart from zero. A denied request is not counted.
#[derive(Debug, Default)]
pub struct DailyLimitRule {
    config: DailyLimitConfig,
    order_count: u32,
    cancel_count: u32,
    current_date: Option<NaiveDate>,
}

impl DailyLimitRule {
    pub fn new(config: DailyLimitConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn order_count(&self) -> u32 {
        self.order_count
    }

    pub fn cancel_count(&self) -> u32 {
        self.cancel_count
    }

    fn refresh_date(&mut self, ctx: &RuleContext<'_>) {
        let today = ctx.today();
        if self.current_date != Some(today) {
            if self.current_date.is_some() {
                info!(
                    rule = NAME,
                    date = %today,
                    orders = self.order_count,
                    cancels = self.cancel_count,
                    "Trading date changed, daily counters reset"
                );
            }
            self.current_date = Some(today);
            self.order_count = 0;
            self.cancel_count = 0;
        }
    }
}

impl RiskRule for DailyLimitRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn parameters(&self) -> ParamMap {
        to_param_map(&self.config)
    }

    fn variables(&self) -> ParamMap {
        let mut vars = ParamMap::new();
        vars.insert("order_count".to_string(), ParamValue::from(self.order_count));
        vars.insert(
            "cancel_count".to_string(),
            ParamValue::from(self.cancel_count),
        );
        vars.insert(
            "current_date".to_string(),
            ParamValue::from(
                self.current_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            ),
        );
        vars
    }

    fn update_parameters(&mut self, updates: &ParamMap) -> RuleResult<()> {
        self.config = merge_config(NAME, &self.config, updates)?;
        Ok(())
    }

    fn check_order(&mut self, _req: &OrderRequest, ctx: &RuleContext<'_>) -> Result<(), Rejection> {
        self.refresh_date(ctx);
        if self.order_count >= self.config.daily_order_limit {
            return Err(Rejection::new(
                NAME,
                format!(
                    "daily order count {} reached limit {}",
                    self.order_count, self.config.daily_order_limit
                ),
            ));
        }
        self.order_count += 1;
        Ok(())
    }

    fn check_cancel(&mut self, _req: &CancelRequest, ctx: &RuleContext<'_>) -> Result<(), Rejection> {
        self.refresh_date(ctx);
        if self.cancel_count >= self.config.daily_cancel_limit {
            return Err(Rejection::new(
                NAME,
                format!(
                    "daily cancel count {} reached limit {}",
                    self.cancel_count, self.config.daily_cancel_limit
                ),
            ));
        }
        self.cancel_count += 1;
        Ok(())
    }
}
