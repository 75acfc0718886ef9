//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Listener states (http::server):
//!     Uninitialized → Initialized → Listening → Draining → Closed
//!
//! Shutdown (shutdown.rs):
//!     stop() or serve failure → Shutdown::trigger (first caller wins)
//!         → handlers answer 410 → serving task drains → Closed
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → service binary calls stop()
//! ```
//!
//! # Design Decisions
//! - Transitions are one-way; a closed listener is never reopened
//! - The drain signal is idempotent and visible to every handler
//! - Stop waits for in-flight requests without a deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
