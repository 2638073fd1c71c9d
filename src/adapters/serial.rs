//! `serialport`-backed transport, link and port enumerator.
//!
//! The link reads raw bytes into a [`FrameAssembler`] and hands back one
//! line per [`read_line`](SerialLink::read_line).  Bytes of a partial line
//! survive a timeout and are completed by the next read.

use std::io::{self, Read};
use std::time::{Duration, Instant};

use log::{debug, info};
use serialport::SerialPort;

use crate::app::ports::{PortEnumerator, SerialLink, SerialTransport};
use crate::config::LinkSettings;
use crate::error::{ConnectError, ReadError};
use crate::sensors::frame::{FrameAssembler, MAX_FRAME_LEN};

/// Opens host serial devices (`/dev/ttyUSB0`, `COM3`, ...).
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialportTransport;

impl SerialTransport for SerialportTransport {
    type Link = SerialportLink;

    fn open(&mut self, port_name: &str, settings: &LinkSettings) -> Result<SerialportLink, ConnectError> {
        let port = serialport::new(port_name, settings.baud_rate)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| connect_error(port_name, &e))?;
        info!("opened {} at {} baud", port_name, settings.baud_rate);
        Ok(SerialportLink::new(port, settings.read_timeout))
    }
}

pub struct SerialportLink {
    /// `None` once closed.
    port: Option<Box<dyn SerialPort>>,
    assembler: FrameAssembler,
    read_timeout: Duration,
}

impl SerialportLink {
    pub fn new(port: Box<dyn SerialPort>, read_timeout: Duration) -> Self {
        Self {
            port: Some(port),
            assembler: FrameAssembler::new(),
            read_timeout,
        }
    }
}

impl SerialLink for SerialportLink {
    fn has_data(&mut self) -> Result<bool, ReadError> {
        if self.assembler.has_line() {
            return Ok(true);
        }
        let port = self.port.as_ref().ok_or(ReadError::Closed)?;
        let waiting = port.bytes_to_read().map_err(|e| read_error(&e))?;
        Ok(waiting > 0)
    }

    fn read_line(&mut self) -> Result<Vec<u8>, ReadError> {
        let deadline = Instant::now() + self.read_timeout;
        let mut chunk = [0u8; MAX_FRAME_LEN];

        loop {
            if let Some(line) = self.assembler.next_line() {
                return Ok(line);
            }
            if self.assembler.is_stalled() {
                // The rest of this line is still on the wire.
                self.assembler.discard_line();
                return Err(ReadError::FrameTooLong);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ReadError::Timeout);
            }

            let port = self.port.as_mut().ok_or(ReadError::Closed)?;
            port.set_timeout(remaining).map_err(|e| read_error(&e))?;
            let room = self.assembler.room();
            match port.read(&mut chunk[..room]) {
                Ok(0) => return Err(ReadError::DeviceRemoved),
                Ok(n) => self.assembler.extend(&chunk[..n])?,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(ReadError::from(e)),
            }
        }
    }

    fn close(&mut self) {
        if let Some(port) = self.port.take() {
            debug!("closing {}", port.name().unwrap_or_default());
        }
        self.assembler.reset();
    }
}

/// Lists devices via `serialport::available_ports`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialportEnumerator;

impl PortEnumerator for SerialportEnumerator {
    fn list_ports(&self) -> Result<Vec<String>, ConnectError> {
        let ports = serialport::available_ports().map_err(|e| ConnectError::Io {
            port: "*".into(),
            message: e.to_string(),
        })?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }
}

fn connect_error(port: &str, e: &serialport::Error) -> ConnectError {
    use serialport::ErrorKind;
    match e.kind() {
        ErrorKind::NoDevice | ErrorKind::Io(io::ErrorKind::NotFound) => ConnectError::NotFound {
            port: port.to_owned(),
        },
        ErrorKind::Io(
            io::ErrorKind::PermissionDenied | io::ErrorKind::AddrInUse | io::ErrorKind::ResourceBusy,
        ) => ConnectError::Busy {
            port: port.to_owned(),
        },
        _ => ConnectError::Io {
            port: port.to_owned(),
            message: e.description.clone(),
        },
    }
}

fn read_error(e: &serialport::Error) -> ReadError {
    match e.kind() {
        serialport::ErrorKind::NoDevice => ReadError::DeviceRemoved,
        serialport::ErrorKind::Io(kind) => ReadError::from(io::Error::new(kind, e.description.clone())),
        _ => ReadError::Io(e.description.clone()),
    }
}
