//! Acquisition loop — the background worker of an open connection.
//!
//! Each cycle:
//!
//! ```text
//!  has_data? ──no──▶ idle
//!     │yes
//!  read_line ──err──┐
//!     │             ├──▶ count failure ──▶ fatal or N in a row? ──▶ link lost
//!   parse ────err───┘
//!     │
//!  compute ──None (height disabled)──▶ keep previous level
//!     │
//!  publish
//! ```
//!
//! Between cycles the worker waits on the stop channel for one poll
//! interval, so a stop request is seen immediately unless a read is in
//! flight (bounded by the link's read timeout).

use core::fmt;
use core::time::Duration;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};

use log::{debug, info, warn};

use crate::app::ports::SerialLink;
use crate::config::MonitorConfig;
use crate::error::{ParseError, ReadError};
use crate::publish::SharedState;
use crate::sensors::{LevelPercentage, frame, level};

/// Why a frame produced no level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameFailure {
    Read(ReadError),
    Parse(ParseError),
}

impl fmt::Display for FrameFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "{e}"),
        }
    }
}

/// Why the worker abandoned the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkLostReason {
    /// A read error that cannot recover (device removed, link closed).
    Fatal(ReadError),
    /// Too many failed cycles in a row.
    ConsecutiveFailures { count: u32, last: FrameFailure },
}

impl fmt::Display for LinkLostReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal(e) => write!(f, "{e}"),
            Self::ConsecutiveFailures { count, last } => {
                write!(f, "{count} consecutive failures (last: {last})")
            }
        }
    }
}

/// Result of one acquisition cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// No data waiting.
    Idle,
    /// A new level was published.
    Published(LevelPercentage),
    /// The frame was valid but the tank height is disabled.
    Disabled,
    /// The frame was rejected; the loop carries on.
    Rejected(FrameFailure),
    /// The loop must stop and the link be closed.
    LinkLost(LinkLostReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// The controller asked the worker to stop.
    Stopped,
    LinkLost(LinkLostReason),
}

/// What the worker hands back when it finishes: the link (still open, for
/// the controller to close) and why it stopped.
#[derive(Debug)]
pub struct LoopExit<L> {
    pub link: L,
    pub reason: ExitReason,
}

pub struct AcquisitionLoop<L> {
    link: L,
    shared: SharedState,
    poll_interval: Duration,
    max_consecutive_failures: u32,
    consecutive_failures: u32,
}

impl<L: SerialLink> AcquisitionLoop<L> {
    pub fn new(link: L, shared: SharedState, config: &MonitorConfig) -> Self {
        Self {
            link,
            shared,
            poll_interval: config.poll_interval(),
            max_consecutive_failures: config.max_consecutive_failures.max(1),
            consecutive_failures: 0,
        }
    }

    /// Failed cycles since the last valid frame.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn into_link(self) -> L {
        self.link
    }

    /// Run until stopped or the link is lost.
    ///
    /// Sending on (or dropping the sender of) `stop` ends the loop.
    pub fn run(mut self, stop: &Receiver<()>) -> LoopExit<L> {
        info!("acquisition started, polling every {:?}", self.poll_interval);

        let reason = loop {
            if stop_requested(stop) {
                break ExitReason::Stopped;
            }
            if let CycleOutcome::LinkLost(reason) = self.run_cycle() {
                break ExitReason::LinkLost(reason);
            }
            match stop.recv_timeout(self.poll_interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break ExitReason::Stopped,
            }
        };

        match &reason {
            ExitReason::Stopped => info!("acquisition stopped"),
            ExitReason::LinkLost(why) => warn!("acquisition abandoning link: {}", why),
        }
        LoopExit {
            link: self.link,
            reason,
        }
    }

    /// One poll: check for data, read at most one frame, process it.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let frame = match self.link.has_data() {
            Ok(false) => return CycleOutcome::Idle,
            Ok(true) => self.link.read_line(),
            Err(e) => Err(e),
        };

        match frame {
            Ok(bytes) => self.process_frame(&bytes),
            Err(e) => {
                self.shared.diagnostics.record_read_failure();
                warn!("serial read failed: {}", e);
                self.record_failure(FrameFailure::Read(e))
            }
        }
    }

    fn process_frame(&mut self, bytes: &[u8]) -> CycleOutcome {
        let diag = &self.shared.diagnostics;
        diag.record_frame();

        let reading = match frame::parse_bytes(bytes) {
            Ok(reading) => reading,
            Err(e) => {
                diag.record_parse_failure();
                debug!("rejected frame {:?}: {}", String::from_utf8_lossy(bytes), e);
                return self.record_failure(FrameFailure::Parse(e));
            }
        };
        self.consecutive_failures = 0;

        let tank = self.shared.tank.load();
        match level::compute(reading.distance_cm, tank.height_cm) {
            Some(level) => {
                self.shared.level.publish(level);
                diag.record_published();
                debug!(
                    "distance {:.1} cm / height {:.1} cm -> {}",
                    reading.distance_cm, tank.height_cm, level
                );
                CycleOutcome::Published(level)
            }
            None => {
                diag.record_skipped_disabled();
                debug!(
                    "distance {:.1} cm ignored, tank height disabled",
                    reading.distance_cm
                );
                CycleOutcome::Disabled
            }
        }
    }

    fn record_failure(&mut self, failure: FrameFailure) -> CycleOutcome {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);

        if let FrameFailure::Read(e) = &failure {
            if e.is_fatal() {
                return CycleOutcome::LinkLost(LinkLostReason::Fatal(e.clone()));
            }
        }
        if self.consecutive_failures >= self.max_consecutive_failures {
            return CycleOutcome::LinkLost(LinkLostReason::ConsecutiveFailures {
                count: self.consecutive_failures,
                last: failure,
            });
        }
        CycleOutcome::Rejected(failure)
    }
}

fn stop_requested(stop: &Receiver<()>) -> bool {
    !matches!(stop.try_recv(), Err(TryRecvError::Empty))
}
