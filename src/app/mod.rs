//! Application core — connection lifecycle and the port boundary.
//!
//! The controller coordinates the connection state machine and the
//! acquisition worker.  All interaction with devices, terminals and files
//! happens through **port traits** defined in [`ports`], keeping this
//! layer testable with scripted transports.

pub mod commands;
pub mod controller;
pub mod events;
pub mod ports;
