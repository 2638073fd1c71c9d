//! Connection controller — the hexagonal core.
//!
//! [`ConnectionController`] owns the connection state machine, the shared
//! cells and at most one acquisition worker.  It is driven from the
//! control flow (operator commands, periodic [`poll`]) and never blocks
//! for longer than one worker join.
//!
//! ```text
//!  SerialTransport ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                      │   ConnectionController   │
//!   operator input ──▶ │  FSM · worker · cells    │ ──▶ LevelSlot ──▶ display
//!                      └──────────────────────────┘
//! ```
//!
//! Worker lifecycle: the open link is moved into the worker thread and
//! handed back through the join handle when it finishes, so the link has
//! exactly one owner at all times and the controller closes it.
//!
//! [`poll`]: ConnectionController::poll

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use log::{error, info, warn};

use crate::acquisition::{AcquisitionLoop, ExitReason, LoopExit};
use crate::app::ports::{SerialLink, SerialTransport};
use crate::config::{MonitorConfig, TankConfig};
use crate::diagnostics::DiagnosticsSnapshot;
use crate::error::{ConfigError, ConnectError};
use crate::fsm::{ConnectionFsm, ConnectionState, StateReader, Transition, Trigger};
use crate::publish::{LevelSlot, SharedState};
use crate::sensors::LevelPercentage;

use super::events::AppEvent;
use super::ports::EventSink;

/// A running acquisition worker.
struct Worker<L> {
    port: String,
    stop_tx: Sender<()>,
    handle: JoinHandle<LoopExit<L>>,
}

pub struct ConnectionController<T: SerialTransport> {
    transport: T,
    config: MonitorConfig,
    fsm: ConnectionFsm,
    shared: SharedState,
    worker: Option<Worker<T::Link>>,
    /// Sequence of the last level reported by `poll`.
    last_seen_seq: u32,
}

impl<T: SerialTransport> ConnectionController<T> {
    /// Build an idle controller.  The tank height starts at the configured
    /// default.
    pub fn new(transport: T, config: MonitorConfig) -> Self {
        let shared = SharedState::new(config.default_tank());
        Self {
            transport,
            config,
            fsm: ConnectionFsm::new(),
            shared,
            worker: None,
            last_seen_seq: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Open `port_name` and start acquisition.
    ///
    /// A request while already connecting or connected is a no-op.  An
    /// empty name is rejected without touching the state.  An open failure
    /// leaves the controller in `Failed`; calling `connect` again retries.
    pub fn connect(&mut self, port_name: &str, sink: &mut impl EventSink) -> Result<(), ConnectError> {
        // A worker that died on its own must be reaped before a new one.
        self.reap_finished(sink);

        let state = self.fsm.current();
        if state.is_busy() {
            info!("connect to {} ignored, already {}", port_name, state);
            return Ok(());
        }
        let port_name = port_name.trim();
        if port_name.is_empty() {
            warn!("connect requested without a port");
            return Err(ConnectError::NoPortSelected);
        }

        self.fire(Trigger::ConnectRequested, sink);
        let settings = self.config.link_settings();
        info!(
            "opening {} at {} baud, timeout {:?}",
            port_name, settings.baud_rate, settings.read_timeout
        );

        let link = match self.transport.open(port_name, &settings) {
            Ok(link) => link,
            Err(e) => {
                error!("failed to open {}: {}", port_name, e);
                self.fire(Trigger::OpenFailed, sink);
                sink.emit(&AppEvent::ConnectFailed {
                    port: port_name.to_owned(),
                    error: e.clone(),
                });
                return Err(e);
            }
        };

        self.spawn_worker(port_name, link);
        self.fire(Trigger::Opened, sink);
        Ok(())
    }

    /// Stop acquisition: signal the worker, wait for it, close the link.
    ///
    /// Returns once the link is closed, so a following `connect` can never
    /// race the old worker.  Also acknowledges a `Failed` state.
    pub fn stop(&mut self, sink: &mut impl EventSink) {
        if let Some(worker) = self.worker.take() {
            let port = worker.port.clone();
            match join_worker(worker) {
                Some(exit) => {
                    let mut link = exit.link;
                    link.close();
                    if let ExitReason::LinkLost(reason) = exit.reason {
                        // Lost between the last poll and this stop.
                        self.shared.diagnostics.record_link_lost();
                        sink.emit(&AppEvent::LinkLost { port: port.clone(), reason });
                    }
                    info!("closed {}", port);
                }
                None => error!("acquisition worker for {} panicked", port),
            }
        }
        self.fire(Trigger::StopRequested, sink);
    }

    /// Control-flow heartbeat.
    ///
    /// Reaps a worker that gave up on its link, then reports the current
    /// level if it was published since the previous poll.
    pub fn poll(&mut self, sink: &mut impl EventSink) -> Option<LevelPercentage> {
        self.reap_finished(sink);

        let snapshot = self.shared.level.latest()?;
        if snapshot.seq == self.last_seen_seq {
            return None;
        }
        self.last_seen_seq = snapshot.seq;
        sink.emit(&AppEvent::LevelUpdated(snapshot.level));
        Some(snapshot.level)
    }

    // ── Operator input ────────────────────────────────────────

    /// Apply the tank-height field.
    ///
    /// Invalid input disables computation (height 0) instead of failing;
    /// the error is returned so the shell can tell the operator.
    pub fn set_tank_height(
        &mut self,
        input: &str,
        sink: &mut impl EventSink,
    ) -> Result<TankConfig, ConfigError> {
        let (tank, result) = match TankConfig::parse(input) {
            Ok(tank) => (tank, Ok(tank)),
            Err(e) => {
                warn!("tank height {:?} rejected ({}), level computation disabled", input, e);
                (TankConfig::DISABLED, Err(e))
            }
        };
        self.shared.tank.store(tank);
        sink.emit(&AppEvent::TankHeightChanged {
            tank,
            error: result.as_ref().err().cloned(),
        });
        result
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> ConnectionState {
        self.fsm.current()
    }

    pub fn state_reader(&self) -> StateReader {
        self.fsm.reader()
    }

    /// Latest published level, whether or not `poll` has reported it.
    pub fn level(&self) -> Option<LevelPercentage> {
        self.shared.level.level()
    }

    /// Shared handle for a display flow that reads on its own cadence.
    pub fn level_reader(&self) -> std::sync::Arc<LevelSlot> {
        std::sync::Arc::clone(&self.shared.level)
    }

    pub fn tank_height(&self) -> TankConfig {
        self.shared.tank.load()
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.shared.diagnostics.snapshot()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Port of the running worker, if any.
    pub fn connected_port(&self) -> Option<&str> {
        self.worker.as_ref().map(|w| w.port.as_str())
    }

    // ── Internal ──────────────────────────────────────────────

    fn fire(&mut self, trigger: Trigger, sink: &mut impl EventSink) {
        if let Some(Transition { from, to }) = self.fsm.fire(trigger) {
            sink.emit(&AppEvent::StateChanged { from, to });
        }
    }

    fn spawn_worker(&mut self, port_name: &str, link: T::Link) {
        let (stop_tx, stop_rx) = mpsc::channel();
        let acquisition = AcquisitionLoop::new(link, self.shared.clone(), &self.config);
        let handle = thread::spawn(move || acquisition.run(&stop_rx));
        self.shared.diagnostics.record_session_started();
        self.worker = Some(Worker {
            port: port_name.to_owned(),
            stop_tx,
            handle,
        });
    }

    /// Collect a worker that exited by itself and drop the connection.
    fn reap_finished(&mut self, sink: &mut impl EventSink) {
        if !self.worker.as_ref().is_some_and(|w| w.handle.is_finished()) {
            return;
        }
        let Some(worker) = self.worker.take() else {
            return;
        };
        let port = worker.port.clone();
        match join_worker(worker) {
            Some(LoopExit { mut link, reason }) => {
                link.close();
                if let ExitReason::LinkLost(reason) = reason {
                    error!("link to {} lost: {}", port, reason);
                    self.shared.diagnostics.record_link_lost();
                    self.fire(Trigger::LinkLost, sink);
                    sink.emit(&AppEvent::LinkLost { port, reason });
                    return;
                }
            }
            None => error!("acquisition worker for {} panicked", port),
        }
        self.fire(Trigger::StopRequested, sink);
    }
}

impl<T: SerialTransport> Drop for ConnectionController<T> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let port = worker.port.clone();
            if let Some(exit) = join_worker(worker) {
                let mut link = exit.link;
                link.close();
            }
            info!("controller dropped, closed {}", port);
        }
    }
}

/// Signal the worker and wait for it.  `None` if it panicked.
fn join_worker<L>(worker: Worker<L>) -> Option<LoopExit<L>> {
    // The worker may already be gone, in which case the send fails and the
    // join returns at once.
    let _ = worker.stop_tx.send(());
    drop(worker.stop_tx);
    worker.handle.join().ok()
}
