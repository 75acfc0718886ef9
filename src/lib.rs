//! Push-based HTTP metrics listener.
//!
//! Accepts line-protocol writes over HTTP (TCP, TLS or unix socket), decodes
//! and parses them, tags each metric with request context and hands the
//! batch to a [`Sink`].

pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod metric;
pub mod net;
pub mod observability;
pub mod parser;
pub mod registry;
pub mod security;
pub mod sink;

pub use config::{ListenerConfig, ServiceConfig};
pub use error::{BindError, ConfigError, ParseError, ProtocolError, TransportError};
pub use http::{HttpListener, ListenerPhase, PATH_TAG};
pub use lifecycle::Shutdown;
pub use metric::{FieldValue, Metric};
pub use parser::{LineProtocolParser, Parser};
pub use registry::ListenerRegistry;
pub use sink::{ChannelSink, LogSink, Sink};
