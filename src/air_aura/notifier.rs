// air_aura - Alert aggregation service for the Air Aura dashboard
//
// Copyright 2022 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use crate::context::{AlertContext, ContextError};
use crate::debounce::Debouncer;
use crate::summary::{AlertCounts, AlertSummary};
use prometheus_client::metrics::counter::Counter;
use std::time::Duration;

/// Delay before a critical alert forces the alert modal open.
pub const DEFAULT_MODAL_DELAY: Duration = Duration::from_millis(1000);

/// Watches an `AlertContext` and opens the alert modal when a critical alert
/// shows up.
///
/// The modal is opened after a delay. Any change to the alert list or to the
/// modal flag before then cancels the pending open, and the decision is made
/// again against the new state.
#[derive(Debug)]
pub struct AlertNotifier {
    ctx: AlertContext,
    debounce: Debouncer<(u64, bool)>,
    auto_opens: Counter,
}

impl AlertNotifier {
    pub fn new(ctx: AlertContext, delay: Duration) -> Self {
        AlertNotifier {
            ctx,
            debounce: Debouncer::new(delay),
            auto_opens: Counter::default(),
        }
    }

    /// Create a notifier for the context provided to the current task.
    pub fn from_scope(delay: Duration) -> Result<Self, ContextError> {
        AlertContext::current().map(|ctx| Self::new(ctx, delay))
    }

    pub fn context(&self) -> &AlertContext {
        &self.ctx
    }

    /// Counter of automatic modal opens, shared with this notifier.
    pub fn auto_open_counter(&self) -> Counter {
        self.auto_opens.clone()
    }

    pub fn auto_opens(&self) -> u64 {
        self.auto_opens.get()
    }

    pub fn is_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// Recompute derived state for the current snapshot and re-arm the modal
    /// open if the alert list or modal flag changed since the last call.
    pub fn observe(&mut self) -> AlertCounts {
        observe(&self.ctx, &mut self.debounce, &self.auto_opens)
    }

    /// React to every change of the context until every other holder of it
    /// has dropped it. The task only holds a weak handle while waiting.
    pub async fn run(self) {
        let AlertNotifier {
            ctx,
            mut debounce,
            auto_opens,
        } = self;

        let mut rx = ctx.subscribe();
        let weak = ctx.downgrade();
        drop(ctx);

        while let Some(ctx) = weak.upgrade() {
            observe(&ctx, &mut debounce, &auto_opens);
            drop(ctx);

            if rx.changed().await.is_err() {
                break;
            }
        }

        tracing::debug!(message = "alert context dropped, stopping notifier");
    }
}

fn observe(ctx: &AlertContext, debounce: &mut Debouncer<(u64, bool)>, auto_opens: &Counter) -> AlertCounts {
    let snapshot = ctx.snapshot();
    let counts = AlertSummary::from_alerts(&snapshot.alerts).counts();

    if !debounce.rekey((snapshot.generation, snapshot.modal_open)) {
        return counts;
    }

    if counts.has_critical_alerts && !snapshot.modal_open {
        tracing::info!(
            message = "critical alert present, scheduling alert modal",
            generation = snapshot.generation,
            delay_ms = debounce.delay().as_millis() as u64,
        );

        let weak = ctx.downgrade();
        let auto_opens = auto_opens.clone();
        debounce.schedule(move || {
            let opened = weak.upgrade().map_or(false, |ctx| ctx.show_alerts());
            if opened {
                auto_opens.inc();
                tracing::info!(message = "opened alert modal for critical alert");
            }
        });
    }

    counts
}
