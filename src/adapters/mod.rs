//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                     | Connects to              |
//! |---------------|--------------------------------|--------------------------|
//! | `serial`      | SerialTransport, SerialLink    | Host serial devices      |
//! |               | PortEnumerator                 |                          |
//! | `log_sink`    | EventSink                      | `log` output             |
//! | `text_gauge`  | GaugeRenderer                  | Terminal / any `Write`   |
//! | `json_config` | ConfigPort                     | JSON file on disk        |

pub mod json_config;
pub mod log_sink;
pub mod serial;
pub mod text_gauge;
