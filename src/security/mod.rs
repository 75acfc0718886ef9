//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → auth.rs (Basic Auth gate, constant-time comparison)
//!     → [dispatcher continues]
//! Response
//!     → headers.rs (static headers from config)
//! ```
//!
//! # Design Decisions
//! - Auth is enforced only when both username and password are configured
//! - Credential comparison never exits early on the first differing byte
//! - Handler-set headers win over static headers

pub mod auth;
pub mod headers;

pub use auth::BasicAuth;
