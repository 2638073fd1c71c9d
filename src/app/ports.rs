//! Port traits — the hexagonal boundary between the monitor core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ConnectionController / AcquisitionLoop
//! ```
//!
//! Driven adapters (serial transport, renderer, event sink, config store)
//! implement these traits.  The core consumes them via generics, so it
//! never touches a device, a terminal, or a file directly.
//!
//! All port errors are typed; callers handle every variant explicitly.

use crate::config::{LinkSettings, MonitorConfig};
use crate::error::{ConfigError, ConnectError, ReadError};
use crate::gauge::GaugeSpec;

// ───────────────────────────────────────────────────────────────
// Serial ports (driven adapter: device → core)
// ───────────────────────────────────────────────────────────────

/// Opens links.  The controller owns one transport for its lifetime.
pub trait SerialTransport {
    /// Link type produced by [`open`](Self::open).  Moved into the worker
    /// thread while the connection runs.
    type Link: SerialLink + Send + 'static;

    fn open(&mut self, port_name: &str, settings: &LinkSettings) -> Result<Self::Link, ConnectError>;
}

/// An open, line-oriented serial link.
pub trait SerialLink {
    /// Whether bytes (or an already buffered frame) are waiting.
    ///
    /// Fails when the device has gone away.
    fn has_data(&mut self) -> Result<bool, ReadError>;

    /// Read one frame, without its terminator.  Blocks for at most the
    /// read timeout the link was opened with.
    fn read_line(&mut self) -> Result<Vec<u8>, ReadError>;

    /// Release the device.  Idempotent; later reads fail with
    /// [`ReadError::Closed`].
    fn close(&mut self);
}

/// Lists addressable serial devices.  The core never calls this itself;
/// the shell uses it to offer choices to the operator.
pub trait PortEnumerator {
    fn list_ports(&self) -> Result<Vec<String>, ConnectError>;
}

// ───────────────────────────────────────────────────────────────
// Rendering port (driven adapter: core → display)
// ───────────────────────────────────────────────────────────────

/// Draws a [`GaugeSpec`].  Implementations own orientation, colours and
/// pixels; the core only decides what to show.
pub trait GaugeRenderer {
    fn render(&mut self, spec: &GaugeSpec);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: core → logging / UI status)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: core ↔ persisted config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`MonitorConfig`].
///
/// Implementations MUST validate before persisting and reject invalid
/// ranges with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Returns [`ConfigError::NotFound`] if nothing is stored yet.
    fn load(&self) -> Result<MonitorConfig, ConfigError>;

    fn save(&self, config: &MonitorConfig) -> Result<(), ConfigError>;
}
