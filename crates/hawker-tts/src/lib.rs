//! TTS provider adapter.
//!
//! Implements [`hawker_core::ports::AudioSynthesizer`] against the
//! provider's binary-framed WebSocket protocol and materializes the
//! resulting MP3 atomically under the static audio tree. The wire
//! format lives in [`protocol`]; voice-tag resolution in [`voices`].

pub mod client;
pub mod error;
pub mod protocol;
pub mod voices;

pub use client::DoubaoTtsService;
pub use error::TtsError;
