//! Unified error types for the tank gauge.
//!
//! Each pipeline stage returns its own typed error so the acquisition loop
//! can decide per failure whether to carry on or drop the link.  The
//! umbrella [`Error`] lets the shell funnel everything through one type.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate converts into this type.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The serial link could not be opened.
    Connect(ConnectError),
    /// A read from an open link failed.
    Read(ReadError),
    /// A frame did not carry a usable distance.
    Parse(ParseError),
    /// Configuration or operator input is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(e) => write!(f, "connect: {e}"),
            Self::Read(e) => write!(f, "read: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Connect errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// No port name was supplied.
    NoPortSelected,
    /// The named device does not exist.
    NotFound { port: String },
    /// The device exists but another process holds it, or access is denied.
    Busy { port: String },
    /// Any other failure reported by the transport.
    Io { port: String, message: String },
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPortSelected => write!(f, "no serial port selected"),
            Self::NotFound { port } => write!(f, "port {port} not found"),
            Self::Busy { port } => write!(f, "port {port} is busy or access was denied"),
            Self::Io { port, message } => write!(f, "port {port}: {message}"),
        }
    }
}

impl std::error::Error for ConnectError {}

impl From<ConnectError> for Error {
    fn from(e: ConnectError) -> Self {
        Self::Connect(e)
    }
}

// ---------------------------------------------------------------------------
// Read errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// No complete frame arrived within the read timeout.
    Timeout,
    /// The device went away (unplugged, port reset).
    DeviceRemoved,
    /// A line exceeded the frame buffer before its terminator arrived.
    FrameTooLong,
    /// The link was already closed.
    Closed,
    /// Any other I/O fault.
    Io(String),
}

impl ReadError {
    /// Fatal errors end the connection immediately instead of counting
    /// towards the consecutive-failure threshold.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DeviceRemoved | Self::Closed)
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "read timed out"),
            Self::DeviceRemoved => write!(f, "device removed"),
            Self::FrameTooLong => write!(f, "frame exceeds line buffer"),
            Self::Closed => write!(f, "link closed"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ReadError {}

impl From<ReadError> for Error {
    fn from(e: ReadError) -> Self {
        Self::Read(e)
    }
}

impl From<std::io::Error> for ReadError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => Self::Timeout,
            ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionReset
            | ErrorKind::NotFound => Self::DeviceRemoved,
            _ => Self::Io(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Empty, non-numeric, non-finite, or not valid UTF-8.
    Malformed,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed frame"),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Tank height input is not a finite positive number.
    InvalidHeight,
    /// No stored config exists.
    NotFound,
    /// Stored config could not be deserialised.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// The storage backend failed.
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHeight => write!(f, "tank height must be a positive number"),
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(field) => write!(f, "validation failed: {field}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_timeout_is_recoverable() {
        let e = ReadError::from(std::io::Error::from(std::io::ErrorKind::TimedOut));
        assert_eq!(e, ReadError::Timeout);
        assert!(!e.is_fatal());
    }

    #[test]
    fn broken_pipe_means_device_removed() {
        let e = ReadError::from(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert_eq!(e, ReadError::DeviceRemoved);
        assert!(e.is_fatal());
    }

    #[test]
    fn closed_is_fatal() {
        assert!(ReadError::Closed.is_fatal());
        assert!(!ReadError::FrameTooLong.is_fatal());
        assert!(!ReadError::Io("parity".into()).is_fatal());
    }

    #[test]
    fn umbrella_display_prefixes_stage() {
        let e: Error = ParseError::Malformed.into();
        assert_eq!(e.to_string(), "parse: malformed frame");
        let e: Error = ConnectError::NotFound { port: "COM9".into() }.into();
        assert_eq!(e.to_string(), "connect: port COM9 not found");
    }
}
