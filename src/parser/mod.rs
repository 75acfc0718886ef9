//! Wire-format parsing subsystem.
//!
//! # Data Flow
//! ```text
//! decoded payload (Bytes)
//!     → Parser::parse (injected capability)
//!     → Vec<Metric> handed to tagging/forwarding
//! ```
//!
//! # Design Decisions
//! - Parsers are plain synchronous traits; no deadline is applied to them
//! - A failed parse rejects the whole batch
//! - An empty batch is not an error; it is reported once per process

pub mod line_protocol;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

use crate::error::ParseError;
use crate::metric::Metric;

pub use line_protocol::LineProtocolParser;

/// Converts a decoded payload into zero or more metrics.
pub trait Parser: Send + Sync {
    fn parse(&self, buf: &[u8]) -> Result<Vec<Metric>, ParseError>;
}

/// Fires its diagnostic only for the first empty batch it observes.
pub(crate) struct EmptyBatchNotice {
    once: Once,
    emissions: AtomicUsize,
}

impl EmptyBatchNotice {
    pub(crate) const fn new() -> Self {
        Self {
            once: Once::new(),
            emissions: AtomicUsize::new(0),
        }
    }

    /// Returns `true` for the single call that emitted the log line.
    pub(crate) fn observe(&self) -> bool {
        let mut emitted = false;
        self.once.call_once(|| {
            tracing::debug!("No metrics were created from a message. Verify your parser settings.");
            self.emissions.fetch_add(1, Ordering::Relaxed);
            emitted = true;
        });
        emitted
    }

    /// How many times the diagnostic has been logged.
    #[cfg(test)]
    pub(crate) fn emissions(&self) -> usize {
        self.emissions.load(Ordering::Relaxed)
    }
}

static EMPTY_BATCH: EmptyBatchNotice = EmptyBatchNotice::new();

/// Run the parser over a decoded payload.
pub(crate) fn parse_payload(parser: &dyn Parser, buf: &[u8]) -> Result<Vec<Metric>, ParseError> {
    let metrics = parser.parse(buf)?;
    if metrics.is_empty() {
        EMPTY_BATCH.observe();
    }
    Ok(metrics)
}
