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

//! Cancellable delayed actions keyed on a changing dependency.

use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs at most one delayed action at a time, tied to a dependency key.
///
/// Whenever the key changes, any pending action is cancelled. The caller then
/// decides whether to schedule a new one for the new key. An unchanged key
/// leaves the pending action alone. Dropping the `Debouncer` cancels whatever
/// is still pending.
///
/// Scheduling spawns onto the current tokio runtime.
#[derive(Debug)]
pub struct Debouncer<K> {
    delay: Duration,
    key: Option<K>,
    pending: Option<JoinHandle<()>>,
}

impl<K: PartialEq> Debouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            key: None,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record the current dependency key. Returns `true` if it differs from
    /// the previous one, in which case any pending action has been cancelled.
    pub fn rekey(&mut self, key: K) -> bool {
        if self.key.as_ref() == Some(&key) {
            return false;
        }

        self.key = Some(key);
        self.cancel();
        true
    }

    /// Run `action` once after the configured delay, replacing any pending action.
    pub fn schedule<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action();
        }));
    }

    /// Cancel the pending action, if any. Returns `true` if one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
