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

use crate::alert::AlertKind;
use crate::context::AlertSnapshot;
use crate::summary::AlertSummary;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct KindLabels {
    kind: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ResultLabels {
    result: String,
}

/// Holder for metrics describing the current alert snapshot and polling.
///
/// All metrics are created and registered upon call to `AlertMetrics::new()` and
/// share the prefix "air_aura_".
#[derive(Debug)]
pub struct AlertMetrics {
    alerts: Family<KindLabels, Gauge>,
    critical: Gauge,
    generation: Gauge,
    fetches: Family<ResultLabels, Counter>,
    malformed: Counter,
}

impl AlertMetrics {
    /// Create a new `AlertMetrics` and register each metric with the provided `Registry`.
    ///
    /// `auto_opens` is the counter kept by the `AlertNotifier` and is registered
    /// as-is.
    pub fn new(reg: &mut Registry, auto_opens: Counter) -> Self {
        let alerts = Family::<KindLabels, Gauge>::default();
        let critical = Gauge::default();
        let generation = Gauge::default();
        let fetches = Family::<ResultLabels, Counter>::default();
        let malformed = Counter::default();

        reg.register("air_aura_alerts", "Active alerts by kind", alerts.clone());
        reg.register(
            "air_aura_critical_alerts",
            "Whether at least one critical alert is active (0 or 1)",
            critical.clone(),
        );
        reg.register(
            "air_aura_snapshot_generation",
            "Number of alert snapshots received",
            generation.clone(),
        );
        reg.register(
            "air_aura_modal_auto_opens",
            "Times the alert modal was opened for a critical alert",
            auto_opens,
        );
        reg.register(
            "air_aura_fetches",
            "Alert fetches from the backend by result",
            fetches.clone(),
        );
        reg.register(
            "air_aura_malformed_alerts",
            "Alert records that failed to decode and were kept as unclassified",
            malformed.clone(),
        );

        // Export every kind, even with no alerts of that kind yet.
        for kind in AlertKind::all() {
            alerts.get_or_create(&KindLabels {
                kind: kind.as_str().to_owned(),
            });
        }

        Self {
            alerts,
            critical,
            generation,
            fetches,
            malformed,
        }
    }

    /// Set gauges from the provided snapshot.
    pub fn snapshot(&self, snapshot: &AlertSnapshot) {
        let counts = AlertSummary::from_alerts(&snapshot.alerts).counts();
        for kind in AlertKind::all() {
            self.alerts
                .get_or_create(&KindLabels {
                    kind: kind.as_str().to_owned(),
                })
                .set(counts.count(*kind) as i64);
        }

        self.critical.set(i64::from(counts.has_critical_alerts));
        self.generation.set(snapshot.generation as i64);
    }

    pub fn fetch_succeeded(&self) {
        self.fetch_result("success");
    }

    pub fn fetch_failed(&self) {
        self.fetch_result("failure");
    }

    pub fn malformed(&self, records: usize) {
        self.malformed.inc_by(records as u64);
    }

    fn fetch_result(&self, result: &str) {
        self.fetches
            .get_or_create(&ResultLabels {
                result: result.to_owned(),
            })
            .inc();
    }
}
