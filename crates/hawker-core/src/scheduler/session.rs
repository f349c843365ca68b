//! Per-store session state.
//!
//! A session owns the task table for one store plus the cancellation
//! scopes that govern its work: the session token (cancelled only on
//! teardown) and the batch token (a child of the session token,
//! replaced on every voice switch so teardown implicitly aborts any
//! in-flight batch).
//!
//! Locking discipline: `state` is a std `RwLock` and is never held
//! across an await point — waves are snapshotted out, synthesized
//! without the lock, and committed back under a short write lock with
//! the voice-version fence.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::cache;
use crate::domain::HawkingTask;

/// One wave of synthesis work: the tasks to synthesize, pinned to the
/// voice and voice-version they were captured under. Commits are fenced
/// on the version so a later switch silently invalidates the wave.
#[derive(Debug)]
pub(crate) struct Wave {
    pub voice: String,
    pub version: u64,
    pub cancel: CancellationToken,
    pub tasks: Vec<HawkingTask>,
}

struct SessionState {
    voice_type: String,
    /// Keyed by lowercased product id.
    tasks: HashMap<String, HawkingTask>,
    /// Bumped on every voice switch; commits compare against it.
    voice_version: u64,
    /// Cancels the current synthesis wave only.
    batch_cancel: CancellationToken,
}

/// Per-store execution context.
pub struct Session {
    id: String,
    state: RwLock<SessionState>,
    /// Single-slot coalescing wakeup for the session loop.
    wakeup: Notify,
    /// Session-wide switch; cancelled on GC or shutdown.
    cancel: CancellationToken,
}

impl Session {
    pub fn new(id: impl Into<String>, voice_type: impl Into<String>) -> Self {
        let cancel = CancellationToken::new();
        Self {
            id: id.into(),
            state: RwLock::new(SessionState {
                voice_type: voice_type.into(),
                tasks: HashMap::new(),
                voice_version: 0,
                batch_cancel: cancel.child_token(),
            }),
            wakeup: Notify::new(),
            cancel,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Tear the session down: aborts the loop and, via the child batch
    /// token, any in-flight synthesis.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wake the session loop. Coalescing: if a wakeup is already
    /// pending the signal is absorbed, and the loop re-scans the task
    /// table after every drain anyway, so nothing is lost.
    pub fn wake(&self) {
        self.wakeup.notify_one();
    }

    /// Await the next wakeup signal.
    pub async fn notified(&self) {
        self.wakeup.notified().await;
    }

    pub fn voice(&self) -> String {
        self.state.read().unwrap().voice_type.clone()
    }

    pub fn task_count(&self) -> usize {
        self.state.read().unwrap().tasks.len()
    }

    /// Insert (or replace) a task under its lowercased product id.
    /// The caller wakes the loop separately.
    pub fn insert_task(&self, task: HawkingTask) {
        let key = task.product_id.to_lowercase();
        self.state.write().unwrap().tasks.insert(key, task);
    }

    /// Remove a task; returns the number of tasks left.
    pub fn remove_task(&self, product_id: &str) -> usize {
        let mut state = self.state.write().unwrap();
        state.tasks.remove(&product_id.to_lowercase());
        state.tasks.len()
    }

    /// The session's current voice together with a copy of every task.
    pub fn snapshot_tasks(&self) -> (String, Vec<HawkingTask>) {
        let state = self.state.read().unwrap();
        (state.voice_type.clone(), state.tasks.values().cloned().collect())
    }

    /// Capture the pending wave for the session loop: every task that
    /// is not yet synthesized and whose voice matches the session's
    /// current voice (a mismatch means the task belongs to a stale
    /// signal and the switch path owns it).
    pub(crate) fn pending_wave(&self) -> Wave {
        let state = self.state.read().unwrap();
        Wave {
            voice: state.voice_type.clone(),
            version: state.voice_version,
            cancel: state.batch_cancel.clone(),
            tasks: state
                .tasks
                .values()
                .filter(|t| !t.is_synthesized && t.voice_type == state.voice_type)
                .cloned()
                .collect(),
        }
    }

    /// Commit a synthesis result, fenced on the captured voice version.
    ///
    /// Returns the updated task on success; `None` when the version
    /// moved on (the result is discarded — never broadcast) or the task
    /// was removed meanwhile. Only `is_synthesized` and `audio_url` are
    /// touched: `text` stays immutable for the life of the task.
    pub(crate) fn commit_synthesis(
        &self,
        product_id: &str,
        version: u64,
        audio_url: &str,
    ) -> Option<HawkingTask> {
        let mut state = self.state.write().unwrap();
        if state.voice_version != version {
            return None;
        }
        let task = state.tasks.get_mut(&product_id.to_lowercase())?;
        task.is_synthesized = true;
        task.audio_url = audio_url.to_owned();
        Some(task.clone())
    }

    /// Switch the session to a new voice.
    ///
    /// Cancels the current batch token (aborting any in-flight
    /// synthesis), installs a fresh child token, bumps the version and
    /// re-evaluates every task against the on-disk cache for the new
    /// voice: hits are marked synthesized immediately, misses are
    /// reset. When at least one task needs synthesis the whole table is
    /// returned as the batch wave — hits included, so clients get a
    /// play event for every task under the new voice. Returns `None`
    /// when everything was a cache hit (no batch, the switch ack
    /// snapshot carries the reconciled state).
    pub(crate) fn switch_voice(&self, new_voice: &str, audio_root: &Path) -> Option<Wave> {
        let mut state = self.state.write().unwrap();

        state.batch_cancel.cancel();
        state.batch_cancel = self.cancel.child_token();
        state.voice_version += 1;
        state.voice_type = new_voice.to_owned();

        let mut has_pending = false;
        for task in state.tasks.values_mut() {
            task.voice_type = new_voice.to_owned();

            // The hash is computed from the locked text, never from a
            // regenerated pitch.
            let (stem, _) = cache::identifier_for(&task.product_id, new_voice, &task.text);
            if cache::exists(audio_root, &stem) {
                task.is_synthesized = true;
                task.audio_url = cache::audio_url(&stem);
            } else {
                task.is_synthesized = false;
                task.audio_url = String::new();
                has_pending = true;
            }
        }

        if !has_pending {
            return None;
        }
        Some(Wave {
            voice: state.voice_type.clone(),
            version: state.voice_version,
            cancel: state.batch_cancel.clone(),
            tasks: state.tasks.values().cloned().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(product_id: &str, voice: &str, text: &str) -> HawkingTask {
        HawkingTask {
            product_id: product_id.to_owned(),
            audio_url: String::new(),
            text: text.to_owned(),
            custom_text: String::new(),
            scene: "custom".to_owned(),
            price: 9.9,
            original_price: 0.0,
            unit: "斤".to_owned(),
            min_qty: 0.0,
            condition_unit: String::new(),
            voice_type: voice.to_owned(),
            promotion_tag: String::new(),
            use_repeat_mode: false,
            is_synthesized: false,
        }
    }

    #[test]
    fn insert_is_keyed_by_lowercased_product_id() {
        let session = Session::new("store-1", "sunny_boy");
        session.insert_task(task("ABC-123", "sunny_boy", "a"));
        session.insert_task(task("abc-123", "sunny_boy", "b"));
        assert_eq!(session.task_count(), 1);
    }

    #[test]
    fn commit_is_fenced_on_voice_version() {
        let session = Session::new("store-1", "sunny_boy");
        session.insert_task(task("p1", "sunny_boy", "text"));

        let wave = session.pending_wave();
        assert_eq!(wave.tasks.len(), 1);

        // A switch between capture and commit invalidates the wave.
        let dir = tempfile::tempdir().unwrap();
        let _ = session.switch_voice("soft_girl", dir.path());
        assert!(session.commit_synthesis("p1", wave.version, "/static/audio/x.mp3").is_none());

        let (_, tasks) = session.snapshot_tasks();
        assert!(!tasks[0].is_synthesized);
        assert!(tasks[0].audio_url.is_empty());
    }

    #[test]
    fn switch_voice_cancels_previous_batch_token() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new("store-1", "sunny_boy");
        session.insert_task(task("p1", "sunny_boy", "text"));

        let first = session.pending_wave();
        assert!(!first.cancel.is_cancelled());

        let second = session.switch_voice("soft_girl", dir.path()).unwrap();
        assert!(first.cancel.is_cancelled());
        assert!(!second.cancel.is_cancelled());
        assert_eq!(second.voice, "soft_girl");
        assert_eq!(second.version, first.version + 1);
    }

    #[test]
    fn switch_voice_reuses_on_disk_cache() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new("store-1", "sunny_boy");
        session.insert_task(task("p1", "sunny_boy", "走过路过"));
        session.insert_task(task("p2", "sunny_boy", "不要错过"));

        // Pre-create p1's audio for the target voice.
        let (stem, _) = cache::identifier_for("p1", "soft_girl", "走过路过");
        std::fs::write(dir.path().join(format!("{stem}.mp3")), b"mp3").unwrap();

        // One miss forces a batch; the wave carries the whole table so
        // every task gets a play event under the new voice.
        let wave = session.switch_voice("soft_girl", dir.path()).unwrap();
        assert_eq!(wave.tasks.len(), 2);

        let (_, tasks) = session.snapshot_tasks();
        let p1 = tasks.iter().find(|t| t.product_id == "p1").unwrap();
        assert!(p1.is_synthesized);
        assert_eq!(p1.audio_url, cache::audio_url(&stem));
        let p2 = tasks.iter().find(|t| t.product_id == "p2").unwrap();
        assert!(!p2.is_synthesized);
    }

    #[test]
    fn shutdown_cancels_batch_via_child_token() {
        let session = Session::new("store-1", "sunny_boy");
        session.insert_task(task("p1", "sunny_boy", "text"));
        let wave = session.pending_wave();
        session.shutdown();
        assert!(wave.cancel.is_cancelled());
    }

    #[test]
    fn text_survives_voice_switch_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::new("store-1", "sunny_boy");
        session.insert_task(task("p1", "sunny_boy", "锁定的文案"));

        let _ = session.switch_voice("soft_girl", dir.path());
        let _ = session.switch_voice("promo_boss", dir.path());

        let (_, tasks) = session.snapshot_tasks();
        assert_eq!(tasks[0].text, "锁定的文案");
        assert_eq!(tasks[0].voice_type, "promo_boss");
    }
}
