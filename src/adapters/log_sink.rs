//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! structured log line.  A GUI shell would implement the same trait to
//! drive its status label instead.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {} | {}", from, to, to.status_text());
            }
            AppEvent::ConnectFailed { port, error } => {
                warn!("LINK  | open {} failed: {}", port, error);
            }
            AppEvent::LinkLost { port, reason } => {
                warn!("LINK  | {} lost: {}", port, reason);
            }
            AppEvent::LevelUpdated(level) => {
                info!("LEVEL | {}", level.label());
            }
            AppEvent::TankHeightChanged { tank, error: None } => {
                info!("TANK  | height={:.1}cm", tank.height_cm);
            }
            AppEvent::TankHeightChanged {
                error: Some(error), ..
            } => {
                warn!("TANK  | {}, level computation disabled", error);
            }
        }
    }
}
