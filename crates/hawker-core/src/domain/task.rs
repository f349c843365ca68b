//! Hawking tasks — the unit of work inside a session.

use serde::{Deserialize, Serialize};

use super::HawkingIntro;

/// One product's promotion slot within a session.
///
/// `text` is locked at creation (either the caller's custom copy or the
/// generated pitch) and never changes afterwards; voice switches
/// re-synthesize the same text against a different voice. This keeps the
/// copy stable across voice changes and makes the content hash a pure
/// function of the task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HawkingTask {
    pub product_id: String,
    /// Public URL of the synthesized audio; empty until synthesized.
    #[serde(default)]
    pub audio_url: String,
    /// The locked, canonical synthesis input.
    pub text: String,
    /// The raw user-supplied copy, possibly empty.
    #[serde(default)]
    pub custom_text: String,
    /// "custom" | "smart_generated"
    #[serde(default)]
    pub scene: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub original_price: f64,
    /// Unit override for this task, e.g. "斤" or "3个".
    #[serde(default)]
    pub unit: String,
    /// Threshold quantity for conditional promotions, e.g. 2.
    #[serde(default)]
    pub min_qty: f64,
    /// Threshold unit, e.g. "条".
    #[serde(default)]
    pub condition_unit: String,
    pub voice_type: String,
    /// "特价", "秒杀", ...
    #[serde(default)]
    pub promotion_tag: String,
    #[serde(default)]
    pub use_repeat_mode: bool,
    #[serde(default)]
    pub is_synthesized: bool,
}

/// Body of `POST /hawking/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddTaskRequest {
    pub session_id: String,
    pub product_id: String,
    /// Fully custom copy; empty means "generate for me".
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub original_price: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub min_qty: f64,
    #[serde(default)]
    pub condition_unit: String,
    /// Chosen voice tag, e.g. "sunny_boy"; empty falls back to the
    /// configured default voice.
    #[serde(default)]
    pub voice_type: String,
    /// Requested opener id; "none" means no opener.
    #[serde(default)]
    pub intro_id: String,
    #[serde(default)]
    pub promotion_tag: String,
    #[serde(default)]
    pub use_repeat_mode: bool,
}

/// The reconciliation payload a client uses to rebuild its local view:
/// the intro pool for the session's voice plus every active task.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TasksSnapshot {
    pub intro_pool: Vec<HawkingIntro>,
    pub products: Vec<HawkingTask>,
}
