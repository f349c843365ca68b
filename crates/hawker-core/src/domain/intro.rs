//! Intro (opener) templates and their wire projection.

use serde::Serialize;

/// An opener template held by the in-memory catalogue.
///
/// `id` is stable (e.g. "morning_01") even when the underlying audio
/// fingerprint rotates with a copy or voice-mapping change.
#[derive(Debug, Clone)]
pub struct IntroTemplate {
    pub id: String,
    pub text: String,
    pub voice_type: String,
    /// "morning", "noon", "evening", "default", ...
    pub scene_tag: String,
    /// Applicable hours, half-open: `[start, end)`.
    pub hour_range: [u32; 2],
    /// Pre-synthesized audio path.
    pub audio_url: String,
}

/// The client-facing projection of an [`IntroTemplate`].
#[derive(Debug, Clone, Serialize)]
pub struct HawkingIntro {
    pub audio_url: String,
    pub text: String,
    pub scene: String,
    pub intro_id: String,
    pub start_hour: u32,
    pub end_hour: u32,
    pub voice_type: String,
}

impl From<&IntroTemplate> for HawkingIntro {
    fn from(t: &IntroTemplate) -> Self {
        Self {
            audio_url: t.audio_url.clone(),
            text: t.text.clone(),
            scene: t.scene_tag.clone(),
            intro_id: t.id.clone(),
            start_hour: t.hour_range[0],
            end_hour: t.hour_range[1],
            voice_type: t.voice_type.clone(),
        }
    }
}
