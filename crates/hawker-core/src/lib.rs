//! Core domain and scheduling logic for the hawking service.
//!
//! This crate is transport-agnostic: it defines the domain types, the
//! ports (traits) the adapters implement, and the per-store session
//! scheduler that drives pitch generation, audio synthesis and event
//! broadcasting. Nothing in here knows about HTTP, WebSockets or the
//! concrete TTS provider.

pub mod cache;
pub mod catalogue;
pub mod domain;
pub mod error;
pub mod events;
pub mod generator;
pub mod ports;
pub mod scheduler;
pub mod settings;

// Re-export commonly used types for convenience
pub use catalogue::{IntroCatalogue, IntroScene, PrewarmOutcome, CANONICAL_SCENES};
pub use domain::{
    AddTaskRequest, HawkingIntro, HawkingMode, HawkingTask, IntroTemplate, Product, TasksSnapshot,
};
pub use error::CoreError;
pub use events::{OutboundEvent, PlayEvent};
pub use ports::{
    AudioSynthesizer, EventBroadcaster, MemProductStore, ProductStore, ProductStoreError,
    SynthesisError,
};
pub use scheduler::HawkingScheduler;
pub use settings::{Settings, ServerSettings, TtsSettings, DEFAULT_SERVER_PORT, DEFAULT_STATIC_DIR};
