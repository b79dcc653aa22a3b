//! Per-model client cache.
//!
//! The registry builds a backend the first time a model is used and hands out the same
//! instance afterwards.  Entries are never evicted; a session that touches many models keeps
//! all of their clients alive.

use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

use crate::client::{ChatBackend, Ollama};
use crate::error::Result;
use crate::observability::CLIENTS_BUILT;

/// Builds a backend bound to an endpoint and model.
pub trait ClientFactory: Send + Sync {
    /// Construct a backend.  Must not perform network I/O.
    fn build(&self, endpoint: &Url, model: &str) -> Result<Arc<dyn ChatBackend>>;
}

/// Factory for [`Ollama`] clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct OllamaFactory;

impl ClientFactory for OllamaFactory {
    fn build(&self, endpoint: &Url, model: &str) -> Result<Arc<dyn ChatBackend>> {
        Ok(Arc::new(Ollama::new(endpoint.clone(), model)?))
    }
}

/// Lazily built, never evicted cache of one backend per model name.
pub struct ChatClientRegistry {
    endpoint: Url,
    factory: Box<dyn ClientFactory>,
    clients: HashMap<String, Arc<dyn ChatBackend>>,
}

impl ChatClientRegistry {
    /// Creates a registry that builds [`Ollama`] clients for `endpoint`.
    pub fn new(endpoint: Url) -> Self {
        Self::with_factory(endpoint, OllamaFactory)
    }

    /// Creates a registry with a custom factory.
    pub fn with_factory(endpoint: Url, factory: impl ClientFactory + 'static) -> Self {
        Self {
            endpoint,
            factory: Box::new(factory),
            clients: HashMap::new(),
        }
    }

    /// The endpoint new clients are bound to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the cached client for `model`, building it on first use.
    pub fn get_or_create(&mut self, model: &str) -> Result<Arc<dyn ChatBackend>> {
        if let Some(client) = self.clients.get(model) {
            return Ok(Arc::clone(client));
        }
        let client = self.factory.build(&self.endpoint, model)?;
        CLIENTS_BUILT.click();
        tracing::debug!(model, endpoint = %self.endpoint, "built chat client");
        self.clients.insert(model.to_string(), Arc::clone(&client));
        Ok(client)
    }

    /// True if a client for `model` has been built.
    pub fn contains(&self, model: &str) -> bool {
        self.clients.contains_key(model)
    }

    /// Number of cached clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// True if no client has been built yet.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
