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

use crate::context::{AlertContext, AlertSnapshot, ContextError};
use crate::summary::{AlertCounts, AlertSummary};
use serde::Serialize;

const MESSAGE_CRITICAL: &str = "Alerta crítico ativo";

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BannerIcon {
    Critical,
    Health,
    Location,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BannerTone {
    Red,
    Orange,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BannerContent {
    pub message: String,
    pub detail: String,
    pub icon: BannerIcon,
    pub tone: BannerTone,
}

impl BannerContent {
    fn from_counts(counts: &AlertCounts) -> Self {
        let message = if counts.has_critical_alerts {
            MESSAGE_CRITICAL.to_string()
        } else {
            count_message(counts.total_alerts)
        };

        let icon = if counts.has_critical_alerts {
            BannerIcon::Critical
        } else if counts.health_alerts > 0 {
            BannerIcon::Health
        } else {
            BannerIcon::Location
        };

        let tone = if counts.has_critical_alerts || counts.health_alerts > 0 {
            BannerTone::Red
        } else {
            BannerTone::Orange
        };

        BannerContent {
            message,
            detail: detail_line(counts),
            icon,
            tone,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "state", content = "content", rename_all = "snake_case")]
pub enum BannerState {
    Hidden,
    Visible(BannerContent),
}

impl BannerState {
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Visible(_))
    }
}

/// Dismissible summary of the active alerts.
///
/// Dismissing only affects this `Banner` value. A new banner, or a new alert
/// list in the context, shows it again.
#[derive(Debug, Clone)]
pub struct Banner {
    ctx: AlertContext,
    dismissed_at: Option<u64>,
}

impl Banner {
    pub fn new(ctx: AlertContext) -> Self {
        Banner { ctx, dismissed_at: None }
    }

    /// Create a banner for the context provided to the current task.
    pub fn from_scope() -> Result<Self, ContextError> {
        AlertContext::current().map(Self::new)
    }

    pub fn state(&self) -> BannerState {
        self.state_for(&self.ctx.snapshot())
    }

    pub fn dismiss(&mut self) {
        self.dismissed_at = Some(self.ctx.generation());
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed_at == Some(self.ctx.generation())
    }

    /// Open the alert modal from the banner.
    pub fn open(&self) -> bool {
        self.ctx.show_alerts()
    }

    fn state_for(&self, snapshot: &AlertSnapshot) -> BannerState {
        let counts = AlertSummary::from_alerts(&snapshot.alerts).counts();
        let dismissed = self.dismissed_at == Some(snapshot.generation);

        if dismissed || counts.total_alerts == 0 || snapshot.modal_open {
            BannerState::Hidden
        } else {
            BannerState::Visible(BannerContent::from_counts(&counts))
        }
    }
}

fn count_message(total: usize) -> String {
    if total == 1 {
        "1 alerta ativo".to_string()
    } else {
        format!("{} alertas ativos", total)
    }
}

fn detail_line(counts: &AlertCounts) -> String {
    let mut parts = Vec::new();
    match counts.disaster_alerts {
        0 => {}
        1 => parts.push("1 desastre".to_string()),
        n => parts.push(format!("{} desastres", n)),
    }

    match counts.health_alerts {
        0 => {}
        1 => parts.push("1 alerta de saúde".to_string()),
        n => parts.push(format!("{} alertas de saúde", n)),
    }

    match counts.unclassified_alerts {
        0 => {}
        1 => parts.push("1 outro".to_string()),
        n => parts.push(format!("{} outros", n)),
    }

    parts.join(" · ")
}
