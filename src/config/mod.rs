//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated)
//!     → ListenerConfig handed to HttpListener::init
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Listener config is frozen once the listener starts; no hot reload

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_str};
pub use schema::{
    DataSource, ListenerConfig, ObservabilityConfig, ParserConfig, Precision, ServiceConfig,
    TlsConfig,
};
pub use validation::ValidationError;
