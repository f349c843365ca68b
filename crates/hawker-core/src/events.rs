//! Outbound WebSocket event envelopes.
//!
//! Every message pushed to clients is one of these variants, serialized
//! as `{"type": "...", "data": {...}}`. Serialization happens once in
//! the hub; the scheduler only hands over the typed event.

use serde::Serialize;

use crate::domain::{HawkingIntro, HawkingTask, TasksSnapshot};

/// Payload of a `HAWKING_PLAY_EVENT`: one newly playable task plus the
/// full opener pool for the session's current voice.
#[derive(Debug, Clone, Serialize)]
pub struct PlayEvent {
    pub session_id: String,
    pub product_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intro_pool: Vec<HawkingIntro>,
    /// The task, with `audio_url` and `is_synthesized` freshly set.
    pub product: HawkingTask,
    pub voice_type: String,
}

/// Server → client message envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OutboundEvent {
    /// A single task became playable.
    #[serde(rename = "HAWKING_PLAY_EVENT")]
    HawkingPlayEvent(PlayEvent),
    /// Full snapshot after a bulk mutation; clients replace local state.
    #[serde(rename = "TASK_CONF_UPDATE")]
    TaskConfUpdate(TasksSnapshot),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_event_envelope_shape() {
        let event = OutboundEvent::HawkingPlayEvent(PlayEvent {
            session_id: "store-1".into(),
            product_id: "p1".into(),
            intro_pool: vec![],
            product: HawkingTask {
                product_id: "p1".into(),
                audio_url: "/static/audio/p1_sunny_boy_abcd1234.mp3".into(),
                text: "走过路过".into(),
                custom_text: String::new(),
                scene: "custom".into(),
                price: 9.9,
                original_price: 0.0,
                unit: "斤".into(),
                min_qty: 0.0,
                condition_unit: String::new(),
                voice_type: "sunny_boy".into(),
                promotion_tag: String::new(),
                use_repeat_mode: false,
                is_synthesized: true,
            },
            voice_type: "sunny_boy".into(),
        });

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "HAWKING_PLAY_EVENT");
        assert_eq!(json["data"]["session_id"], "store-1");
        assert_eq!(json["data"]["voice_type"], "sunny_boy");
        // Empty pool is omitted entirely, not serialized as [].
        assert!(json["data"].get("intro_pool").is_none());
    }

    #[test]
    fn snapshot_envelope_shape() {
        let event = OutboundEvent::TaskConfUpdate(TasksSnapshot::default());
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TASK_CONF_UPDATE");
        assert!(json["data"]["products"].as_array().unwrap().is_empty());
        assert!(json["data"]["intro_pool"].as_array().unwrap().is_empty());
    }
}
