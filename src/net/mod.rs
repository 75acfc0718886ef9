//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! service_address string
//!     → address.rs (scheme detection, tcp host:port or unix path)
//!     → listener.rs (bind TCP, or remove stale file + bind unix + chmod)
//!     → tls.rs (optional rustls acceptor for TCP)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Addresses without a scheme default to tcp
//! - Binding is synchronous so `start` can report failures directly
//! - TLS is optional and handled transparently

pub mod address;
pub mod listener;
pub mod tls;

pub use address::ServiceAddress;
pub use listener::{BoundSocket, LocalAddr};
