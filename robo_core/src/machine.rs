//! Bookkeeping shared by the three state machines.
//!
//! A `Machine` holds the current state symbol and how many ticks it has been
//! active. State actions request a transition with [`Machine::next_state`];
//! the request is applied by [`Machine::end_tick`], so the new state's
//! action first runs on the following tick.

use std::fmt::Debug;

#[derive(Debug, Clone)]
pub struct Machine<S> {
    name: &'static str,
    current: S,
    ticks_in_state: u32,
    pending: Option<S>,
    engaged: bool,
}

impl<S: Copy + PartialEq + Debug> Machine<S> {
    pub fn new(name: &'static str, initial: S) -> Self {
        Self {
            name,
            current: initial,
            ticks_in_state: 0,
            pending: None,
            engaged: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn current(&self) -> S {
        self.current
    }

    /// Completed ticks spent in the current state.
    pub fn ticks_in_state(&self) -> u32 {
        self.ticks_in_state
    }

    /// Force the machine into `state` now.
    ///
    /// The next tick runs that state's action but ignores any transition it
    /// requests.
    pub fn engage(&mut self, state: S) {
        if state != self.current {
            tracing::debug!(
                machine = self.name,
                from = ?self.current,
                to = ?state,
                "engaged"
            );
            self.current = state;
            self.ticks_in_state = 0;
        }
        self.pending = None;
        self.engaged = true;
    }

    /// True while the current tick follows an `engage` call.
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// Request a transition at the end of this tick. Later requests win.
    pub fn next_state(&mut self, state: S) {
        if self.engaged {
            tracing::trace!(machine = self.name, to = ?state, "transition suppressed after engage");
            return;
        }
        self.pending = Some(state);
    }

    pub fn pending(&self) -> Option<S> {
        self.pending
    }

    /// True on the last tick of a state lasting `duration_ticks`.
    pub fn expired(&self, duration_ticks: u32) -> bool {
        self.ticks_in_state.saturating_add(1) >= duration_ticks
    }

    /// Apply the pending transition, if any, and advance the state timer.
    pub fn end_tick(&mut self) {
        self.engaged = false;
        match self.pending.take() {
            Some(next) if next != self.current => {
                tracing::debug!(
                    machine = self.name,
                    from = ?self.current,
                    to = ?next,
                    ticks = self.ticks_in_state.saturating_add(1),
                    "transition"
                );
                self.current = next;
                self.ticks_in_state = 0;
            }
            _ => self.ticks_in_state = self.ticks_in_state.saturating_add(1),
        }
    }
}
