//! Outbound application events.
//!
//! The [`ConnectionController`](super::controller::ConnectionController)
//! emits these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters decide what to do with them: log them, update a status line,
//! forward them elsewhere.

use crate::acquisition::LinkLostReason;
use crate::config::TankConfig;
use crate::error::{ConfigError, ConnectError};
use crate::fsm::ConnectionState;
use crate::sensors::LevelPercentage;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The connection state machine moved.
    StateChanged {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// Opening the named port failed.
    ConnectFailed { port: String, error: ConnectError },

    /// The worker gave up on the link and it has been closed.
    LinkLost { port: String, reason: LinkLostReason },

    /// A new level was published since the previous poll.
    LevelUpdated(LevelPercentage),

    /// The operator submitted a tank height.  `error` is set when the input
    /// was rejected and computation is now disabled.
    TankHeightChanged {
        tank: TankConfig,
        error: Option<ConfigError>,
    },
}
