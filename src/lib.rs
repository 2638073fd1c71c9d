//! Tank level monitor library.
//!
//! Reads distance frames from a serial sensor, converts them to a bounded
//! fill percentage and turns that into a renderer-agnostic gauge
//! description.
//!
//! ```text
//!  SerialLink ─▶ frame::parse ─▶ level::compute ─▶ LevelSlot ─▶ gauge::render_spec ─▶ GaugeRenderer
//!                                     ▲
//!                         tank height │ (operator)
//! ```

#![deny(unused_must_use)]

pub mod acquisition;
pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fsm;
pub mod gauge;
pub mod publish;
pub mod sensors;

pub use app::controller::ConnectionController;
pub use error::{ConfigError, ConnectError, Error, ParseError, ReadError, Result};
