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

//! Alert aggregation service for the Air Aura weather and air quality dashboard
//!
//! ## Features
//!
//! `air_aura` polls the Air Aura backend for active alerts and keeps the derived state the dashboard
//! needs to present them. Two kinds of alerts are understood:
//!
//! * Disaster alerts - environmental hazards (floods, storms, wildfires, ...) near the user.
//! * Health risk alerts - a user's health condition tied to current air quality or weather readings.
//!
//! From the current alert list, `air_aura` derives:
//!
//! * Counts of alerts by kind and whether any alert is critical.
//! * The state of the alert banner (hidden or visible, message, icon, and tone).
//! * An automatic, delayed opening of the alert modal whenever a critical alert is present.
//!
//! ## Usage
//!
//! ```text
//! ./air_aura --api-url https://backend.example.com/api/
//! ```
//!
//! If the backend is unreachable at startup, a static alert list can be used until the first
//! successful fetch.
//!
//! ```text
//! ./air_aura --api-url https://backend.example.com/api/ --fallback-file alerts.json
//! ```
//!
//! ### HTTP
//!
//! The following endpoints are exposed on port `9783`.
//!
//! * `GET /alerts` - The current alert snapshot.
//! * `GET /alerts/summary` - Counts of alerts by kind and the critical flag.
//! * `GET /alerts/banner` - The current banner state.
//! * `POST /alerts/show` and `POST /alerts/close` - Open or close the alert modal.
//! * `POST /alerts/banner/dismiss` - Dismiss the banner until the alert list changes. Both
//!   banner endpoints take an optional `client` query parameter and keep a separate banner
//!   per client.
//! * `GET /metrics` - Prometheus metrics.
//!
//! ### Prometheus
//!
//! * `air_aura_alerts{kind=$KIND}` - Active alerts by kind (`disaster`, `health`, `unclassified`).
//! * `air_aura_critical_alerts` - 1 if any active alert is critical, 0 otherwise.
//! * `air_aura_snapshot_generation` - Number of alert snapshots received.
//! * `air_aura_modal_auto_opens_total` - Times the alert modal was opened for a critical alert.
//! * `air_aura_fetches_total{result=$RESULT}` - Fetches from the backend by result.
//! * `air_aura_malformed_alerts_total` - Alert records that failed to decode and were kept
//!   as unclassified alerts.
//!

pub mod alert;
pub mod banner;
pub mod client;
pub mod context;
pub mod debounce;
pub mod http;
pub mod metrics;
pub mod notifier;
pub mod summary;
