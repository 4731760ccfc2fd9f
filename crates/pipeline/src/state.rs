//! Pipeline state machine
//!
//! `created → starting → running → stopping → stopped`, strictly
//! forward. The cell is shared between the running pipeline task and
//! whoever observes it (the pipeline server, the admin API).

use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Lifecycle state of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Created = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
    Stopped = 4,
}

impl State {
    pub fn as_str(self) -> &'static str {
        match self {
            State::Created => "created",
            State::Starting => "starting",
            State::Running => "running",
            State::Stopping => "stopping",
            State::Stopped => "stopped",
        }
    }

    fn from_u8(value: u8) -> State {
        match value {
            0 => State::Created,
            1 => State::Starting,
            2 => State::Running,
            3 => State::Stopping,
            _ => State::Stopped,
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared, monotonic state cell
///
/// Transitions only move forward; a stale writer racing a later
/// transition loses silently.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(State::Created as u8))
    }

    pub fn get(&self) -> State {
        State::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn advance(&self, state: State) {
        self.0.fetch_max(state as u8, Ordering::AcqRel);
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_advance_monotonically() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), State::Created);

        cell.advance(State::Starting);
        cell.advance(State::Running);
        assert_eq!(cell.get(), State::Running);

        // stale transition loses
        cell.advance(State::Starting);
        assert_eq!(cell.get(), State::Running);

        cell.advance(State::Stopped);
        assert_eq!(cell.get(), State::Stopped);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(State::Running.to_string(), "running");
        assert_eq!(State::Stopped.to_string(), "stopped");
    }
}
