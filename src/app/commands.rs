//! Inbound operator commands.
//!
//! The shell reads one command per line and hands the parsed
//! [`AppCommand`] to the controller loop.

/// Commands an operator can issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Open the named serial port and start acquisition.
    Connect(String),

    /// Stop acquisition and close the link.
    Stop,

    /// Submit the tank-height field (raw text, validated by the controller).
    SetTankHeight(String),

    /// List serial ports.
    ListPorts,

    /// Print connection state, level and diagnostics.
    Status,

    /// Stop and exit.
    Quit,
}

impl AppCommand {
    /// Parse one input line.  `None` for blank or unknown input.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "connect" | "c" => Some(Self::Connect(rest.to_owned())),
            "stop" | "disconnect" => Some(Self::Stop),
            "height" | "h" => Some(Self::SetTankHeight(rest.to_owned())),
            "ports" | "list" => Some(Self::ListPorts),
            "status" | "s" => Some(Self::Status),
            "quit" | "exit" | "q" => Some(Self::Quit),
            _ => None,
        }
    }
}
