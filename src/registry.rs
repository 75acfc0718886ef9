//! Listener registry.
//!
//! Maps a plugin name to a constructor. The registry is built once at process
//! start and passed by reference; nothing registers itself implicitly.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ListenerConfig;
use crate::http::HttpListener;
use crate::parser::Parser;

/// Name of the built-in HTTP listener.
pub const HTTP_LISTENER_V2: &str = "http_listener_v2";

/// Constructor for a listener plugin.
pub type ListenerFactory = fn(ListenerConfig, Arc<dyn Parser>) -> HttpListener;

#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    factories: BTreeMap<&'static str, ListenerFactory>,
}

impl ListenerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in listeners.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(HTTP_LISTENER_V2, HttpListener::new);
        registry
    }

    /// Register a factory, replacing any previous one under the same name.
    pub fn register(&mut self, name: &'static str, factory: ListenerFactory) {
        if self.factories.insert(name, factory).is_some() {
            tracing::warn!(name, "Replaced listener factory");
        }
    }

    /// Build the listener registered under `name`.
    pub fn create(
        &self,
        name: &str,
        config: ListenerConfig,
        parser: Arc<dyn Parser>,
    ) -> Option<HttpListener> {
        self.factories.get(name).map(|factory| factory(config, parser))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}
