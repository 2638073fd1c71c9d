//! Table-driven connection state machine.
//!
//! ```text
//!                 ConnectRequested          Opened
//!  DISCONNECTED ───────────────────▶ CONNECTING ─────────▶ CONNECTED
//!     ▲   ▲                               │                   │
//!     │   │                     OpenFailed│                   │ StopRequested
//!     │   │      ConnectRequested         ▼                   │ LinkLost
//!     │   └───────────────────────────  FAILED                │
//!     │               StopRequested ◀────┘                    │
//!     └───────────────────────────────────────────────────────┘
//! ```
//!
//! The controller is the only writer.  The current state lives in an
//! atomic cell so the display flow can read it through a [`StateReader`]
//! without locking.  Triggers that have no row in the table are ignored.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use log::{debug, info};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
    Failed = 3,
}

impl ConnectionState {
    pub const COUNT: usize = 4;

    /// Convert a `u8` index back to a state.  Out-of-range indices map to
    /// `Disconnected` (debug builds assert).
    pub fn from_index(idx: u8) -> Self {
        match idx {
            0 => Self::Disconnected,
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Failed,
            _ => {
                debug_assert!(false, "invalid connection state index: {idx}");
                Self::Disconnected
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Failed => "Failed",
        }
    }

    /// Operator-facing status line.
    pub fn status_text(self) -> &'static str {
        match self {
            Self::Disconnected => "Status: Not Connected",
            Self::Connecting => "Status: Connecting",
            Self::Connected => "Status: Connected",
            Self::Failed => "Connection Failed",
        }
    }

    /// A connect request in this state would open a second link.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Triggers and transition table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Operator asked to connect to a port.
    ConnectRequested,
    /// The transport opened the link.
    Opened,
    /// The transport refused to open the link.
    OpenFailed,
    /// Operator asked to stop.
    StopRequested,
    /// The worker gave up on a dead link.
    LinkLost,
}

/// One row: `(from, trigger) -> to`.
struct TransitionRow {
    from: ConnectionState,
    trigger: Trigger,
    to: ConnectionState,
}

const fn row(from: ConnectionState, trigger: Trigger, to: ConnectionState) -> TransitionRow {
    TransitionRow { from, trigger, to }
}

const TRANSITIONS: [TransitionRow; 8] = {
    use ConnectionState::{Connected, Connecting, Disconnected, Failed};
    [
        row(Disconnected, Trigger::ConnectRequested, Connecting),
        row(Failed, Trigger::ConnectRequested, Connecting),
        row(Connecting, Trigger::Opened, Connected),
        row(Connecting, Trigger::OpenFailed, Failed),
        row(Connecting, Trigger::StopRequested, Disconnected),
        row(Connected, Trigger::StopRequested, Disconnected),
        row(Connected, Trigger::LinkLost, Disconnected),
        row(Failed, Trigger::StopRequested, Disconnected),
    ]
};

/// Look up the successor of `state` under `trigger`.
pub fn next_state(state: ConnectionState, trigger: Trigger) -> Option<ConnectionState> {
    TRANSITIONS
        .iter()
        .find(|r| r.from == state && r.trigger == trigger)
        .map(|r| r.to)
}

// ---------------------------------------------------------------------------
// Shared cell
// ---------------------------------------------------------------------------

/// Cloneable read-only view of the connection state.
#[derive(Debug, Clone)]
pub struct StateReader {
    cell: Arc<AtomicU8>,
}

impl StateReader {
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_index(self.cell.load(Ordering::Acquire))
    }
}

/// A transition that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

/// The state machine.  Not `Clone`: there is exactly one writer.
#[derive(Debug)]
pub struct ConnectionFsm {
    cell: Arc<AtomicU8>,
}

impl Default for ConnectionFsm {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionFsm {
    /// Start in `Disconnected`.
    pub fn new() -> Self {
        Self {
            cell: Arc::new(AtomicU8::new(ConnectionState::Disconnected as u8)),
        }
    }

    pub fn current(&self) -> ConnectionState {
        ConnectionState::from_index(self.cell.load(Ordering::Acquire))
    }

    pub fn reader(&self) -> StateReader {
        StateReader {
            cell: Arc::clone(&self.cell),
        }
    }

    /// Apply `trigger`.  Returns the transition taken, or `None` if the
    /// table has no row for the current state.
    pub fn fire(&mut self, trigger: Trigger) -> Option<Transition> {
        let from = self.current();
        let Some(to) = next_state(from, trigger) else {
            debug!("connection trigger {:?} ignored in {}", trigger, from);
            return None;
        };
        self.cell.store(to as u8, Ordering::Release);
        info!("connection transition: {} -> {}", from, to);
        Some(Transition { from, to })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_trigger() -> impl Strategy<Value = Trigger> {
        prop_oneof![
            Just(Trigger::ConnectRequested),
            Just(Trigger::Opened),
            Just(Trigger::OpenFailed),
            Just(Trigger::StopRequested),
            Just(Trigger::LinkLost),
        ]
    }

    proptest! {
        #[test]
        fn connected_only_via_connecting(triggers in proptest::collection::vec(arb_trigger(), 1..64)) {
            let mut fsm = ConnectionFsm::new();
            for trigger in triggers {
                let before = fsm.current();
                if let Some(t) = fsm.fire(trigger) {
                    if t.to == ConnectionState::Connected {
                        prop_assert_eq!(before, ConnectionState::Connecting);
                    }
                    prop_assert_eq!(t.from, before);
                } else {
                    prop_assert_eq!(fsm.current(), before);
                }
            }
        }
    }
}
