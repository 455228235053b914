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

//! Process-wide alert state shared by the notifier, banner, and HTTP handlers.

use crate::alert::Alert;
use std::error;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::sync::watch;

tokio::task_local! {
    static CURRENT: AlertContext;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    OutsideProvider,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutsideProvider => write!(
                f,
                "alert context used outside of a provider scope; wrap the caller with AlertContext::provide"
            ),
        }
    }
}

impl error::Error for ContextError {}

/// Immutable view of the alert list at a point in time.
///
/// `generation` increases every time the list is replaced and is used as the
/// identity of the list. Toggling the modal does not change it.
#[derive(Debug, Clone)]
pub struct AlertSnapshot {
    pub generation: u64,
    pub alerts: Arc<[Alert]>,
    pub modal_open: bool,
}

/// Holder for the current alert list and the "alert modal open" flag.
///
/// Cloning is cheap and every clone refers to the same state.
#[derive(Debug, Clone)]
pub struct AlertContext {
    state: Arc<watch::Sender<AlertSnapshot>>,
}

impl AlertContext {
    pub fn new() -> Self {
        Self::with_alerts(Vec::new())
    }

    pub fn with_alerts(alerts: Vec<Alert>) -> Self {
        let (tx, _) = watch::channel(AlertSnapshot {
            generation: 0,
            alerts: alerts.into(),
            modal_open: false,
        });

        AlertContext { state: Arc::new(tx) }
    }

    /// Run `fut` with this context available to `AlertContext::current()`.
    pub async fn provide<F: Future>(&self, fut: F) -> F::Output {
        CURRENT.scope(self.clone(), fut).await
    }

    /// Context provided to the current task, or an error if the caller is not
    /// running inside `AlertContext::provide`.
    pub fn current() -> Result<AlertContext, ContextError> {
        CURRENT.try_with(|ctx| ctx.clone()).map_err(|_| ContextError::OutsideProvider)
    }

    pub fn snapshot(&self) -> AlertSnapshot {
        self.state.borrow().clone()
    }

    pub fn alerts(&self) -> Arc<[Alert]> {
        Arc::clone(&self.state.borrow().alerts)
    }

    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    pub fn is_modal_open(&self) -> bool {
        self.state.borrow().modal_open
    }

    /// Replace the whole alert list with a new snapshot.
    pub fn replace_alerts(&self, alerts: Vec<Alert>) {
        self.state.send_modify(|s| {
            s.generation += 1;
            s.alerts = alerts.into();
        });

        tracing::debug!(message = "replaced alert snapshot", generation = self.generation());
    }

    /// Replace the alert list only if it differs from the current one.
    /// Returns `true` if a new snapshot was created.
    pub fn update_alerts(&self, alerts: Vec<Alert>) -> bool {
        let unchanged = *self.state.borrow().alerts == *alerts;
        if unchanged {
            return false;
        }

        self.replace_alerts(alerts);
        true
    }

    /// Open the alert modal. Returns `true` if it was previously closed.
    pub fn show_alerts(&self) -> bool {
        self.set_modal(true)
    }

    /// Close the alert modal. Returns `true` if it was previously open.
    pub fn close_alerts(&self) -> bool {
        self.set_modal(false)
    }

    pub fn subscribe(&self) -> watch::Receiver<AlertSnapshot> {
        self.state.subscribe()
    }

    /// Handle that doesn't keep the context alive.
    pub fn downgrade(&self) -> WeakAlertContext {
        WeakAlertContext {
            state: Arc::downgrade(&self.state),
        }
    }

    fn set_modal(&self, open: bool) -> bool {
        let changed = self.state.send_if_modified(|s| {
            if s.modal_open == open {
                false
            } else {
                s.modal_open = open;
                true
            }
        });

        if changed {
            tracing::debug!(message = "alert modal toggled", open = open);
        }

        changed
    }
}

impl Default for AlertContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Weak reference to an `AlertContext`, see `AlertContext::downgrade`.
#[derive(Debug, Clone)]
pub struct WeakAlertContext {
    state: Weak<watch::Sender<AlertSnapshot>>,
}

impl WeakAlertContext {
    /// The context, if any strong handle to it is still alive.
    pub fn upgrade(&self) -> Option<AlertContext> {
        self.state.upgrade().map(|state| AlertContext { state })
    }
}
