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

use crate::alert::{Alert, AlertKind, DisasterAlert, HealthRiskAlert};
use serde::Serialize;

/// Derived view over one alert snapshot.
///
/// Unclassified alerts count toward `total_alerts` but are in neither
/// sublist.
#[derive(Debug, Clone)]
pub struct AlertSummary<'a> {
    pub has_critical_alerts: bool,
    pub total_alerts: usize,
    pub disaster_alerts: Vec<&'a DisasterAlert>,
    pub health_alerts: Vec<&'a HealthRiskAlert>,
}

impl<'a> AlertSummary<'a> {
    pub fn from_alerts(alerts: &'a [Alert]) -> Self {
        AlertSummary {
            has_critical_alerts: alerts.iter().any(Alert::is_critical),
            total_alerts: alerts.len(),
            disaster_alerts: alerts.iter().filter_map(Alert::as_disaster).collect(),
            health_alerts: alerts.iter().filter_map(Alert::as_health).collect(),
        }
    }

    pub fn unclassified_alerts(&self) -> usize {
        self.total_alerts - self.disaster_alerts.len() - self.health_alerts.len()
    }

    pub fn counts(&self) -> AlertCounts {
        AlertCounts {
            has_critical_alerts: self.has_critical_alerts,
            total_alerts: self.total_alerts,
            disaster_alerts: self.disaster_alerts.len(),
            health_alerts: self.health_alerts.len(),
            unclassified_alerts: self.unclassified_alerts(),
        }
    }
}

/// Owned, serializable counts from an `AlertSummary`.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertCounts {
    pub has_critical_alerts: bool,
    pub total_alerts: usize,
    pub disaster_alerts: usize,
    pub health_alerts: usize,
    pub unclassified_alerts: usize,
}

impl AlertCounts {
    pub fn count(&self, kind: AlertKind) -> usize {
        match kind {
            AlertKind::Disaster => self.disaster_alerts,
            AlertKind::Health => self.health_alerts,
            AlertKind::Unclassified => self.unclassified_alerts,
        }
    }
}
