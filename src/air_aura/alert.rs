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

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error;
use std::fmt;

/// Severity or risk level of an alert, in ascending order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn is_critical(self) -> bool {
        self == Self::Critical
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DisasterKind {
    Earthquake,
    Flood,
    Wildfire,
    Hurricane,
    Tornado,
    Drought,
    Heatwave,
    Storm,
}

/// Which variant an alert decoded into.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Disaster,
    Health,
    Unclassified,
}

impl AlertKind {
    pub fn all() -> &'static [AlertKind] {
        &[Self::Disaster, Self::Health, Self::Unclassified]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disaster => "disaster",
            Self::Health => "health",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
pub enum AlertError {
    NotAnObject,
    Malformed(AlertKind, serde_json::Error),
}

impl fmt::Display for AlertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "alert payload is not a JSON object"),
            Self::Malformed(kind, e) => write!(f, "malformed {} alert: {}", kind, e),
        }
    }
}

impl error::Error for AlertError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Malformed(_, e) => Some(e),
            _ => None,
        }
    }
}

fn default_active() -> bool {
    true
}

/// Environmental hazard near the user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DisasterAlert {
    #[serde(alias = "id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DisasterKind,
    #[serde(alias = "severity")]
    pub severity: Severity,
    #[serde(alias = "title")]
    pub title: String,
    #[serde(alias = "description")]
    pub description: String,
    #[serde(alias = "location")]
    pub location: String,
    #[serde(alias = "distance")]
    pub distance_km: f64,
    #[serde(alias = "estimatedArrival")]
    pub estimated_arrival: Option<DateTime<Utc>>,
    #[serde(alias = "affectedRadius")]
    pub affected_radius_km: f64,
    #[serde(alias = "source")]
    pub source: String,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "isActive", default = "default_active")]
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthCondition {
    #[serde(alias = "id")]
    pub id: String,
    #[serde(alias = "name")]
    pub name: String,
    #[serde(alias = "severity")]
    pub severity: Severity,
    #[serde(alias = "affectedSystems", default)]
    pub affected_systems: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AirQualityReading {
    #[serde(alias = "aqi")]
    pub aqi: u32,
    #[serde(alias = "dominantPollutant")]
    pub dominant_pollutant: Option<String>,
    #[serde(alias = "pm25")]
    pub pm25: Option<f64>,
    #[serde(alias = "pm10")]
    pub pm10: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeatherReading {
    #[serde(alias = "temperature")]
    pub temperature: Option<f64>,
    #[serde(alias = "humidity")]
    pub humidity: Option<f64>,
    #[serde(alias = "uvIndex")]
    pub uv_index: Option<f64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DisasterProximity {
    #[serde(rename = "type")]
    pub kind: DisasterKind,
    #[serde(alias = "distance")]
    pub distance_km: f64,
}

/// Environmental readings that contributed to a health alert. Each is optional.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AffectedBy {
    #[serde(alias = "airQuality")]
    pub air_quality: Option<AirQualityReading>,
    #[serde(alias = "weather")]
    pub weather: Option<WeatherReading>,
    #[serde(alias = "disaster")]
    pub disaster: Option<DisasterProximity>,
}

/// A user's health condition tied to current environmental readings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HealthRiskAlert {
    #[serde(alias = "id")]
    pub id: String,
    #[serde(alias = "condition")]
    pub condition: HealthCondition,
    #[serde(alias = "riskLevel")]
    pub risk_level: Severity,
    #[serde(alias = "title")]
    pub title: String,
    #[serde(alias = "description")]
    pub description: String,
    #[serde(alias = "recommendations", default)]
    pub recommendations: Vec<String>,
    #[serde(alias = "affectedBy", default)]
    pub affected_by: AffectedBy,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "isActive", default = "default_active")]
    pub is_active: bool,
}

/// A record carrying neither a `type` nor a `condition` field, or one that
/// failed to decode as the variant those fields select.
///
/// Kept as-is so it still counts toward totals. The level is read from a
/// `severity`, `riskLevel`, or `level` field if one parses.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct UnclassifiedAlert {
    pub id: Option<String>,
    pub level: Option<Severity>,
    pub raw: Value,
}

impl UnclassifiedAlert {
    const LEVEL_FIELDS: &'static [&'static str] = &["severity", "riskLevel", "risk_level", "level"];

    pub fn from_value(value: Value) -> Self {
        let (id, level) = match value.as_object() {
            Some(obj) => (
                obj.get("id").and_then(Value::as_str).map(String::from),
                Self::LEVEL_FIELDS
                    .iter()
                    .filter_map(|k| obj.get(*k))
                    .find_map(|v| Severity::deserialize(v).ok()),
            ),
            None => (None, None),
        };

        UnclassifiedAlert { id, level, raw: value }
    }
}

/// An alert from the backend.
///
/// The backend payload has no explicit tag. Decoding picks the variant by
/// field presence: `type` means a disaster alert, otherwise `condition` means
/// a health alert, otherwise the record is unclassified.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Alert {
    Disaster(DisasterAlert),
    Health(HealthRiskAlert),
    Unclassified(UnclassifiedAlert),
}

impl Alert {
    pub fn kind(&self) -> AlertKind {
        match self {
            Self::Disaster(_) => AlertKind::Disaster,
            Self::Health(_) => AlertKind::Health,
            Self::Unclassified(_) => AlertKind::Unclassified,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Disaster(a) => Some(&a.id),
            Self::Health(a) => Some(&a.id),
            Self::Unclassified(a) => a.id.as_deref(),
        }
    }

    /// Severity for disaster alerts, risk level for health alerts.
    pub fn level(&self) -> Option<Severity> {
        match self {
            Self::Disaster(a) => Some(a.severity),
            Self::Health(a) => Some(a.risk_level),
            Self::Unclassified(a) => a.level,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.level().map(Severity::is_critical).unwrap_or(false)
    }

    pub fn as_disaster(&self) -> Option<&DisasterAlert> {
        match self {
            Self::Disaster(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_health(&self) -> Option<&HealthRiskAlert> {
        match self {
            Self::Health(a) => Some(a),
            _ => None,
        }
    }

    /// Decode a backend record, keeping a record that fails to decode as an
    /// unclassified alert. The decoding error, if any, is returned alongside.
    pub fn from_value_lossy(value: Value) -> (Alert, Option<AlertError>) {
        match Alert::try_from(value.clone()) {
            Ok(alert) => (alert, None),
            Err(e) => (Alert::Unclassified(UnclassifiedAlert::from_value(value)), Some(e)),
        }
    }
}

impl TryFrom<Value> for Alert {
    type Error = AlertError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let obj = value.as_object().ok_or(AlertError::NotAnObject)?;
        let has_type = obj.contains_key("type");
        let has_condition = obj.contains_key("condition");

        if has_type {
            serde_json::from_value(value)
                .map(Alert::Disaster)
                .map_err(|e| AlertError::Malformed(AlertKind::Disaster, e))
        } else if has_condition {
            serde_json::from_value(value)
                .map(Alert::Health)
                .map_err(|e| AlertError::Malformed(AlertKind::Health, e))
        } else {
            Ok(Alert::Unclassified(UnclassifiedAlert::from_value(value)))
        }
    }
}

impl<'de> Deserialize<'de> for Alert {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Alert::try_from(value).map_err(de::Error::custom)
    }
}
