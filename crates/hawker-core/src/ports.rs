//! Ports — the traits adapters implement for the scheduler.
//!
//! The dependency arrow stays one-way: adapter crates import these
//! traits and map their native errors into the port error types; the
//! core never imports an adapter.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::Product;
use crate::events::OutboundEvent;

// ── Product store ────────────────────────────────────────────────────────────

/// Errors surfaced by the external product store.
#[derive(Debug, Error)]
pub enum ProductStoreError {
    #[error("product not found: {0}")]
    NotFound(String),

    #[error("product store failure: {0}")]
    Storage(String),
}

/// Read access to the merchant's product records.
///
/// The relational store itself lives outside this core; `sync` exists so
/// a host can push product descriptors in bulk (the mobile client
/// re-issues its catalogue on reconnect).
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Product, ProductStoreError>;

    /// Upsert the given products; returns how many were stored.
    async fn sync(&self, products: Vec<Product>) -> Result<usize, ProductStoreError>;
}

/// In-memory [`ProductStore`], used by tests and the standalone binary.
#[derive(Default)]
pub struct MemProductStore {
    products: RwLock<HashMap<String, Product>>,
}

impl MemProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemProductStore {
    async fn find_by_id(&self, id: &str) -> Result<Product, ProductStoreError> {
        let guard = self
            .products
            .read()
            .map_err(|e| ProductStoreError::Storage(e.to_string()))?;
        guard
            .get(&id.to_lowercase())
            .cloned()
            .ok_or_else(|| ProductStoreError::NotFound(id.to_owned()))
    }

    async fn sync(&self, products: Vec<Product>) -> Result<usize, ProductStoreError> {
        let mut guard = self
            .products
            .write()
            .map_err(|e| ProductStoreError::Storage(e.to_string()))?;
        let count = products.len();
        for product in products {
            guard.insert(product.key(), product);
        }
        Ok(count)
    }
}

// ── Audio synthesis ──────────────────────────────────────────────────────────

/// Errors the synthesis port can report back to the scheduler.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// The governing token fired before the stream completed; no file
    /// was materialized.
    #[error("synthesis cancelled")]
    Cancelled,

    /// Dial or stream failure on the provider side. The text is logged,
    /// never forwarded to clients.
    #[error("TTS upstream failure: {0}")]
    Upstream(String),

    /// Local filesystem failure (tmp write, mkdir, rename).
    #[error("audio file error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynthesisError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Text-to-speech synthesis.
///
/// `identifier` is the path stem under the static audio root and may
/// contain subdirectories (`intros/...`). A successful call has
/// atomically materialized `<static>/<identifier>.mp3` and returns its
/// public URL; a failed or cancelled call has left no partial file.
#[async_trait]
pub trait AudioSynthesizer: Send + Sync {
    async fn generate_audio(
        &self,
        cancel: &CancellationToken,
        text: &str,
        identifier: &str,
        voice: &str,
    ) -> Result<String, SynthesisError>;

    /// Resolve a logical voice tag to the provider's concrete voice id.
    ///
    /// Needed outside synthesis proper because intro fingerprints hash
    /// the provider id, so a mapping change rotates the fingerprint.
    fn provider_voice_id(&self, voice: &str) -> String;
}

// ── Event broadcast ──────────────────────────────────────────────────────────

/// Fan-out of outbound events to every connected client.
///
/// Implementations must not block: the scheduler calls this from its
/// session loops. Delivery is best-effort; slow consumers are the
/// implementation's problem.
pub trait EventBroadcaster: Send + Sync {
    fn broadcast(&self, event: OutboundEvent);
}

/// No-op broadcaster for tests and headless wiring.
#[derive(Debug, Clone, Default)]
pub struct NoopBroadcaster;

impl EventBroadcaster for NoopBroadcaster {
    fn broadcast(&self, _event: OutboundEvent) {}
}
