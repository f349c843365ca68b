//! Service settings — pure domain types with env-driven loading.
//!
//! All keys can be provided through the environment (`HAWKER_*`); the
//! binary loads a `.env` file first, so a checked-in dotenv works for
//! local development.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default HTTP port.
pub const DEFAULT_SERVER_PORT: u16 = 8090;

/// Default static root; audio lands under `<static>/audio`.
pub const DEFAULT_STATIC_DIR: &str = "./static";

/// Default TTS provider endpoint.
pub const DEFAULT_TTS_ENDPOINT: &str = "wss://openspeech.bytedance.com/api/v1/tts/ws_binary";

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub port: u16,
    /// Root of the static file tree served under `/static`.
    pub static_dir: PathBuf,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl ServerSettings {
    /// Directory audio files are written to and served from.
    pub fn audio_root(&self) -> PathBuf {
        self.static_dir.join("audio")
    }
}

/// Credentials and endpoint for the TTS provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsSettings {
    pub app_id: String,
    pub access_token: String,
    pub cluster_id: String,
    /// Provider WebSocket endpoint; overridable for tests.
    pub endpoint: String,
}

/// Top-level application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub tts: TtsSettings,
    /// Voice used when an AddTask request carries none.
    pub default_voice: Option<String>,
    /// Relational store DSN. Loaded for the host's CRUD layers; the
    /// scheduler core never touches it.
    pub database_url: Option<String>,
}

impl Settings {
    /// Load settings from `HAWKER_*` environment variables, falling back
    /// to defaults for everything except the TTS credentials (which
    /// default to empty and will fail loudly at the provider).
    pub fn from_env() -> Self {
        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        Self {
            server: ServerSettings {
                port: env("HAWKER_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SERVER_PORT),
                static_dir: env("HAWKER_STATIC_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            },
            tts: TtsSettings {
                app_id: env("HAWKER_TTS_APP_ID").unwrap_or_default(),
                access_token: env("HAWKER_TTS_ACCESS_TOKEN").unwrap_or_default(),
                cluster_id: env("HAWKER_TTS_CLUSTER_ID").unwrap_or_default(),
                endpoint: env("HAWKER_TTS_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_TTS_ENDPOINT.to_owned()),
            },
            default_voice: env("HAWKER_DEFAULT_VOICE"),
            database_url: env("DATABASE_URL"),
        }
    }

    /// The voice assigned to requests that carry none.
    pub fn effective_default_voice(&self) -> &str {
        self.default_voice.as_deref().unwrap_or(crate::domain::voice::SUNNY_BOY)
    }
}
