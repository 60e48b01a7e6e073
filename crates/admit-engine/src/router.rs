//! Event routing table.
//!
//! Built once from each rule's declared subscriptions. Delivery follows
//! registration order, and it ignores the `active` flag: an inactive rule
//! still keeps its event-driven state current.

use admit_core::{EventKind, Subscriptions};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct EventRouter {
    tick: Vec<usize>,
    order: Vec<usize>,
    trade: Vec<usize>,
    timer: Vec<usize>,
}

impl EventRouter {
    /// Build the table from `(rule name, subscriptions)` in registration
    /// order. Indices refer to positions in that sequence.
    pub fn build<'a>(rules: impl IntoIterator<Item = (&'a str, Subscriptions)>) -> Self {
        let mut router = Self::default();
        for (index, (name, subs)) in rules.into_iter().enumerate() {
            for kind in subs.kinds() {
                router.slot_mut(kind).push(index);
                debug!(rule = name, event = %kind, "Routed event to rule");
            }
        }
        router
    }

    /// Rule indices subscribed to `kind`, in registration order.
    pub fn targets(&self, kind: EventKind) -> &[usize] {
        match kind {
            EventKind::Tick => &self.tick,
            EventKind::Order => &self.order,
            EventKind::Trade => &self.trade,
            EventKind::Timer => &self.timer,
        }
    }

    fn slot_mut(&mut self, kind: EventKind) -> &mut Vec<usize> {
        match kind {
            EventKind::Tick => &mut self.tick,
            EventKind::Order => &mut self.order,
            EventKind::Trade => &mut self.trade,
            EventKind::Timer => &mut self.timer,
        }
    }
}
