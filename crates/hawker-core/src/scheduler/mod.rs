//! The hawking scheduler: session registry plus the per-session
//! synthesis loops.
//!
//! One spawned task per session drives that store's synthesis work
//! sequentially; sessions are independent, so cross-store parallelism
//! falls out naturally. Sessions are created lazily on the first
//! AddTask for a store and garbage-collected when RemoveTask drops the
//! last entry. Nothing is persisted — on restart clients re-issue
//! their task lists.

mod session;

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use futures_util::FutureExt;
use tracing::{debug, error, info, warn};

use crate::cache;
use crate::catalogue::IntroCatalogue;
use crate::domain::{AddTaskRequest, HawkingIntro, HawkingTask, Product, TasksSnapshot};
use crate::events::{OutboundEvent, PlayEvent};
use crate::generator;
use crate::ports::{AudioSynthesizer, EventBroadcaster, ProductStore};

pub use session::Session;
use session::Wave;

/// Session registry and synthesis driver.
pub struct HawkingScheduler {
    products: Arc<dyn ProductStore>,
    catalogue: Arc<IntroCatalogue>,
    tts: Arc<dyn AudioSynthesizer>,
    broadcaster: Arc<dyn EventBroadcaster>,
    /// Directory synthesized audio is written to and probed in.
    audio_root: PathBuf,
    /// Voice assigned to requests that carry none.
    default_voice: String,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl HawkingScheduler {
    pub fn new(
        products: Arc<dyn ProductStore>,
        catalogue: Arc<IntroCatalogue>,
        tts: Arc<dyn AudioSynthesizer>,
        broadcaster: Arc<dyn EventBroadcaster>,
        audio_root: PathBuf,
        default_voice: impl Into<String>,
    ) -> Self {
        Self {
            products,
            catalogue,
            tts,
            broadcaster,
            audio_root,
            default_voice: default_voice.into(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Add (or replace) a task in the store's session, creating and
    /// starting the session if this is its first task.
    ///
    /// The task's `text` is locked here: the caller's custom copy when
    /// present, a generated pitch otherwise. Voice switches later
    /// re-synthesize this exact text.
    pub fn add_task(self: &Arc<Self>, product: &Product, req: &AddTaskRequest) {
        let voice = if req.voice_type.is_empty() {
            self.default_voice.clone()
        } else {
            req.voice_type.clone()
        };

        let session = self.get_or_spawn_session(&req.session_id, &voice);

        let mut task = HawkingTask {
            product_id: req.product_id.clone(),
            audio_url: String::new(),
            text: req.text.clone(),
            custom_text: req.text.clone(),
            scene: "custom".to_owned(),
            price: req.price,
            original_price: req.original_price,
            unit: req.unit.clone(),
            min_qty: req.min_qty,
            condition_unit: req.condition_unit.clone(),
            voice_type: voice,
            promotion_tag: req.promotion_tag.clone(),
            use_repeat_mode: req.use_repeat_mode,
            is_synthesized: false,
        };
        if task.text.is_empty() {
            task.text = generator::generate_pitch(product, &task);
            task.scene = "smart_generated".to_owned();
        }

        session.insert_task(task);
        session.wake();
    }

    /// Remove a task; an emptied session is shut down and dropped from
    /// the registry.
    pub fn remove_task(&self, session_id: &str, product_id: &str) {
        let mut sessions = self.sessions.write().unwrap();
        let Some(session) = sessions.get(session_id) else {
            return;
        };

        let remaining = session.remove_task(product_id);
        if remaining == 0 {
            session.shutdown();
            sessions.remove(session_id);
            info!(session = session_id, "session emptied, stopped and dropped");
        }
    }

    /// Snapshot a session's tasks plus the opener pool for its voice.
    /// Unknown sessions yield the empty snapshot.
    pub fn snapshot(&self, session_id: &str) -> TasksSnapshot {
        let session = {
            let sessions = self.sessions.read().unwrap();
            sessions.get(session_id).cloned()
        };
        let Some(session) = session else {
            return TasksSnapshot::default();
        };

        let (voice, products) = session.snapshot_tasks();
        TasksSnapshot {
            intro_pool: self.catalogue.intro_pool(&voice),
            products,
        }
    }

    /// Switch a session's voice. In-flight synthesis for the previous
    /// voice is aborted; tasks whose audio already exists on disk for
    /// the new voice are reused without any TTS call; the rest are
    /// re-synthesized by a spawned batch whose results are fenced on
    /// the voice version. Unknown sessions are a no-op.
    ///
    /// `product_ids` is accepted for API compatibility but the whole
    /// table is re-evaluated regardless — in-memory metadata must stay
    /// consistent for every task, not just the ones the client knew
    /// about.
    pub fn change_session_voice(
        self: &Arc<Self>,
        session_id: &str,
        new_voice: &str,
        _product_ids: &[String],
    ) {
        let session = {
            let sessions = self.sessions.read().unwrap();
            sessions.get(session_id).cloned()
        };
        let Some(session) = session else {
            warn!(session = session_id, "voice switch for unknown session ignored");
            return;
        };

        match session.switch_voice(new_voice, &self.audio_root) {
            Some(wave) => {
                info!(
                    session = session_id,
                    voice = new_voice,
                    pending = wave.tasks.len(),
                    "voice switched, synthesis batch started"
                );
                let scheduler = Arc::clone(self);
                let session = Arc::clone(&session);
                tokio::spawn(async move {
                    scheduler.run_wave(&session, wave).await;
                });
            }
            None => {
                info!(session = session_id, voice = new_voice, "voice switched, all tasks cache-hit");
            }
        }
    }

    /// Opener pool pass-through.
    pub fn intro_pool(&self, voice: &str) -> Vec<HawkingIntro> {
        self.catalogue.intro_pool(voice)
    }

    /// Whether a session is currently registered (test / introspection
    /// hook).
    pub fn has_session(&self, session_id: &str) -> bool {
        self.sessions.read().unwrap().contains_key(session_id)
    }

    /// The session's cancellation state, if it exists.
    pub fn session_cancelled(&self, session_id: &str) -> Option<bool> {
        let sessions = self.sessions.read().unwrap();
        sessions.get(session_id).map(|s| s.cancel_token().is_cancelled())
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn get_or_spawn_session(self: &Arc<Self>, session_id: &str, voice: &str) -> Arc<Session> {
        if let Some(session) = self.sessions.read().unwrap().get(session_id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().unwrap();
        // Someone else may have created it between the two locks.
        if let Some(session) = sessions.get(session_id) {
            return Arc::clone(session);
        }

        let session = Arc::new(Session::new(session_id, voice));
        sessions.insert(session_id.to_owned(), Arc::clone(&session));
        info!(session = session_id, voice, "session created");
        self.spawn_session_loop(Arc::clone(&session));
        session
    }

    fn spawn_session_loop(self: &Arc<Self>, session: Arc<Session>) {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            // Restart the loop if its body ever panics; only
            // cancellation ends the session for good.
            loop {
                let run = AssertUnwindSafe(scheduler.run_session_loop(&session)).catch_unwind();
                match run.await {
                    Ok(()) => break,
                    Err(_) => {
                        if session.cancel_token().is_cancelled() {
                            break;
                        }
                        error!(session = session.id(), "session loop panicked, restarting");
                    }
                }
            }
            info!(session = session.id(), "session loop stopped");
        });
    }

    async fn run_session_loop(&self, session: &Session) {
        loop {
            tokio::select! {
                _ = session.cancel_token().cancelled() => return,
                _ = session.notified() => {
                    debug!(session = session.id(), "session woken, scanning for pending tasks");
                }
            }

            let wave = session.pending_wave();
            if wave.tasks.is_empty() {
                continue;
            }
            self.run_wave(session, wave).await;
        }
    }

    /// Synthesize one wave of tasks sequentially.
    ///
    /// Shared by the session loop and voice-switch batches: per task —
    /// product lookup, cache probe, TTS on a miss, async eviction of
    /// superseded versions, version-fenced commit, play-event
    /// broadcast. A failed task stays pending and is retried on the
    /// next wakeup; a cancelled or out-fenced wave stops silently.
    async fn run_wave(&self, session: &Session, wave: Wave) {
        for task in &wave.tasks {
            if wave.cancel.is_cancelled() {
                return;
            }

            let product = match self.products.find_by_id(&task.product_id).await {
                Ok(product) => product,
                Err(e) => {
                    warn!(product = %task.product_id, error = %e, "product lookup failed, task skipped");
                    continue;
                }
            };

            let (stem, _) = cache::identifier_for(&task.product_id, &wave.voice, &task.text);
            let audio_url = if cache::exists(&self.audio_root, &stem) {
                debug!(product = %product.name, stem, "copy unchanged, reusing cached audio");
                cache::audio_url(&stem)
            } else {
                info!(product = %product.name, voice = %wave.voice, "synthesizing audio");
                match self
                    .tts
                    .generate_audio(&wave.cancel, &task.text, &stem, &wave.voice)
                    .await
                {
                    Ok(url) => {
                        self.spawn_eviction(&task.product_id, &wave.voice, &stem);
                        url
                    }
                    Err(e) if e.is_cancelled() => {
                        debug!(product = %product.name, "synthesis cancelled, wave abandoned");
                        return;
                    }
                    Err(e) => {
                        // Task stays unsynthesized; the next wakeup retries it.
                        error!(product = %product.name, error = %e, "synthesis failed");
                        continue;
                    }
                }
            };

            let Some(committed) = session.commit_synthesis(&task.product_id, wave.version, &audio_url)
            else {
                debug!(session = session.id(), "voice version moved on, wave results discarded");
                return;
            };

            let intro_pool = self.catalogue.intro_pool(&committed.voice_type);
            debug!(product = %product.name, "broadcasting play event");
            self.broadcaster.broadcast(OutboundEvent::HawkingPlayEvent(PlayEvent {
                session_id: session.id().to_owned(),
                product_id: product.id.to_string(),
                intro_pool,
                voice_type: committed.voice_type.clone(),
                product: committed,
            }));
        }
    }

    fn spawn_eviction(&self, product_id: &str, voice: &str, current_stem: &str) {
        let root = self.audio_root.clone();
        let product_id = product_id.to_owned();
        let voice = voice.to_owned();
        let current_stem = current_stem.to_owned();
        tokio::spawn(async move {
            cache::evict_superseded(&root, &product_id, &voice, &current_stem);
        });
    }
}
