//! In-memory intro-template catalogue and its startup pre-warm.
//!
//! The catalogue is append-mostly: populated once at startup, read on
//! every snapshot and play event. Lookups are linear scans over a small
//! fixed set (4 voices × 4 scenes), which keeps the structure trivially
//! correct under the reader-writer lock.

use std::path::Path;
use std::sync::{Arc, RwLock};

use sha1::{Digest, Sha1};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cache;
use crate::domain::{voice, HawkingIntro, IntroTemplate};
use crate::ports::AudioSynthesizer;

/// One canonical opener scene: stable template id, scene tag, copy and
/// applicable hour range (half-open).
pub struct IntroScene {
    pub id: &'static str,
    pub tag: &'static str,
    pub text: &'static str,
    pub hour_range: [u32; 2],
}

/// The four canonical scenes every voice is pre-warmed with.
pub const CANONICAL_SCENES: [IntroScene; 4] = [
    IntroScene {
        id: "morning_01",
        tag: "morning",
        text: "大家早上好！新鲜肉菜刚刚到货，快来选购吧！",
        hour_range: [6, 11],
    },
    IntroScene {
        id: "noon_01",
        tag: "noon",
        text: "中午好，辛苦忙碌半天，买点好菜犒劳一下家人吧！",
        hour_range: [11, 14],
    },
    IntroScene {
        id: "evening_01",
        tag: "evening",
        text: "晚市大促销开始啦，新鲜不隔夜，卖完就收摊！",
        hour_range: [17, 21],
    },
    IntroScene {
        id: "default_01",
        tag: "default",
        text: "走过路过不要错过，咱家生鲜，品质看得见！",
        hour_range: [0, 24],
    },
];

/// Thread-safe registry of intro templates.
#[derive(Default)]
pub struct IntroCatalogue {
    templates: RwLock<Vec<IntroTemplate>>,
}

impl IntroCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a template. No deduplication.
    pub fn add_template(&self, template: IntroTemplate) {
        self.templates.write().expect("catalogue lock poisoned").push(template);
    }

    /// First template matching id and voice.
    pub fn find_by_id(&self, id: &str, voice: &str) -> Option<IntroTemplate> {
        let guard = self.templates.read().expect("catalogue lock poisoned");
        guard
            .iter()
            .find(|t| t.id == id && t.voice_type == voice)
            .cloned()
    }

    /// First template whose voice matches and whose hour range contains
    /// `hour` (half-open at the end hour).
    pub fn find_by_time(&self, hour: u32, voice: &str) -> Option<IntroTemplate> {
        let guard = self.templates.read().expect("catalogue lock poisoned");
        guard
            .iter()
            .find(|t| t.voice_type == voice && hour >= t.hour_range[0] && hour < t.hour_range[1])
            .cloned()
    }

    /// All templates for a voice, in insertion order.
    pub fn find_all_by_voice(&self, voice: &str) -> Vec<IntroTemplate> {
        let guard = self.templates.read().expect("catalogue lock poisoned");
        guard.iter().filter(|t| t.voice_type == voice).cloned().collect()
    }

    /// Subset of [`Self::find_all_by_voice`] also satisfying the hour
    /// predicate.
    pub fn find_all_by_time(&self, hour: u32, voice: &str) -> Vec<IntroTemplate> {
        let guard = self.templates.read().expect("catalogue lock poisoned");
        guard
            .iter()
            .filter(|t| t.voice_type == voice && hour >= t.hour_range[0] && hour < t.hour_range[1])
            .cloned()
            .collect()
    }

    /// The wire-shaped opener pool for a voice.
    pub fn intro_pool(&self, voice: &str) -> Vec<HawkingIntro> {
        let guard = self.templates.read().expect("catalogue lock poisoned");
        guard
            .iter()
            .filter(|t| t.voice_type == voice)
            .map(HawkingIntro::from)
            .collect()
    }
}

/// Content fingerprint of an intro: first 8 hex chars of
/// sha1(text|provider-voice-id). Hashing the provider id (not the tag)
/// means a voice-mapping change rotates the fingerprint too.
pub fn intro_fingerprint(text: &str, provider_voice_id: &str) -> String {
    let digest = Sha1::digest(format!("{text}|{provider_voice_id}").as_bytes());
    hex::encode(digest)[..8].to_owned()
}

/// Result of one pre-warm pass, for logging and tests.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PrewarmOutcome {
    pub registered: usize,
    pub synthesized: usize,
    pub failed: usize,
}

/// Pre-warm the catalogue: for each (voice, scene) make sure the intro
/// audio exists on disk, delete stale fingerprints for that slot, and
/// register the template under its stable id.
///
/// Synthesis failures are logged and leave that template registered
/// without audio — startup never aborts over a flaky TTS upstream.
pub async fn prewarm_intros(
    catalogue: &IntroCatalogue,
    tts: &Arc<dyn AudioSynthesizer>,
    audio_root: &Path,
) -> PrewarmOutcome {
    let mut outcome = PrewarmOutcome::default();
    let cancel = CancellationToken::new();

    info!("pre-warming intro audio resources");

    for voice_tag in voice::ALL {
        let provider_id = tts.provider_voice_id(voice_tag);
        for scene in &CANONICAL_SCENES {
            let fingerprint = intro_fingerprint(scene.text, &provider_id);
            let identifier = format!("intros/{}_{}_{}", scene.tag, voice_tag, fingerprint);
            let mut audio_url = cache::audio_url(&identifier);

            if !cache::exists(audio_root, &identifier) {
                info!(voice = voice_tag, scene = scene.tag, "synthesizing intro template");
                match tts
                    .generate_audio(&cancel, scene.text, &identifier, voice_tag)
                    .await
                {
                    Ok(url) => {
                        outcome.synthesized += 1;
                        audio_url = url;
                        cache::evict_superseded_intros(audio_root, scene.tag, voice_tag, &identifier);
                    }
                    Err(e) => {
                        outcome.failed += 1;
                        warn!(voice = voice_tag, scene = scene.tag, error = %e, "intro pre-warm failed");
                        audio_url = String::new();
                    }
                }
            } else {
                cache::evict_superseded_intros(audio_root, scene.tag, voice_tag, &identifier);
            }

            catalogue.add_template(IntroTemplate {
                id: scene.id.to_owned(),
                text: scene.text.to_owned(),
                voice_type: voice_tag.to_owned(),
                scene_tag: scene.tag.to_owned(),
                hour_range: scene.hour_range,
                audio_url,
            });
            outcome.registered += 1;
        }
    }

    info!(
        registered = outcome.registered,
        synthesized = outcome.synthesized,
        failed = outcome.failed,
        "intro pre-warm complete"
    );
    outcome
}
