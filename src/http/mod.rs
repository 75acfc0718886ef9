//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP / TLS / unix connection
//!     → server.rs (socket ownership, serving task, drain)
//!     → dispatch.rs (path, auth, drain gate, size, method, decode, parse)
//!     → forward.rs (header and path tags, sink)
//!     → success status
//! ```

pub mod dispatch;
pub mod forward;
pub mod server;

pub use forward::PATH_TAG;
pub use server::{HttpListener, ListenerPhase};
