//! Handlers for the `/hawking/*` endpoints.
//!
//! Handlers are thin wrappers — each translates one request into a
//! scheduler call and answers with the current session snapshot so a
//! freshly reconnected client reconciles in a single round-trip.
//! Request shapes are co-located here to keep the surface
//! self-contained.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use hawker_core::domain::{AddTaskRequest, HawkingIntro, TasksSnapshot};
use hawker_core::events::OutboundEvent;

use crate::error::HttpError;
use crate::state::AppState;

// ── Request/response shapes ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SnapshotQuery {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveTaskQuery {
    #[serde(default)]
    pub store_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeVoiceRequest {
    pub session_id: String,
    pub voice_id: String,
    #[serde(default)]
    pub product_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct IntroPoolQuery {
    pub voice_id: String,
}

#[derive(Debug, Serialize)]
pub struct SessionSnapshotResponse {
    pub session_id: String,
    pub tasks: TasksSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ChangeVoiceResponse {
    pub status: &'static str,
    pub tasks: TasksSnapshot,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// `POST /api/v1/hawking/tasks`
pub async fn add_task(
    State(state): State<AppState>,
    Json(req): Json<AddTaskRequest>,
) -> Result<Json<SessionSnapshotResponse>, HttpError> {
    if req.product_id.is_empty() {
        return Err(HttpError::BadRequest("product_id is required".to_owned()));
    }
    if req.session_id.is_empty() {
        return Err(HttpError::BadRequest("session_id is required".to_owned()));
    }

    let product = state.products.find_by_id(&req.product_id).await?;
    state.scheduler.add_task(&product, &req);

    let tasks = state.scheduler.snapshot(&req.session_id);
    // Other devices of the same store reconcile over the socket.
    state.hub.broadcast_event(&OutboundEvent::TaskConfUpdate(tasks.clone()));

    Ok(Json(SessionSnapshotResponse {
        session_id: req.session_id,
        tasks,
    }))
}

/// `DELETE /api/v1/hawking/tasks/{id}?store_id=X`
pub async fn remove_task(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
    Query(query): Query<RemoveTaskQuery>,
) -> Result<Json<SessionSnapshotResponse>, HttpError> {
    let Some(store_id) = query.store_id.filter(|s| !s.is_empty()) else {
        return Err(HttpError::BadRequest("store_id is required".to_owned()));
    };

    state.scheduler.remove_task(&store_id, &product_id);

    let tasks = state.scheduler.snapshot(&store_id);
    state.hub.broadcast_event(&OutboundEvent::TaskConfUpdate(tasks.clone()));

    Ok(Json(SessionSnapshotResponse {
        session_id: store_id,
        tasks,
    }))
}

/// `GET /api/v1/hawking/tasks?session_id=X`
pub async fn get_tasks(
    State(state): State<AppState>,
    Query(query): Query<SnapshotQuery>,
) -> Json<SessionSnapshotResponse> {
    let tasks = state.scheduler.snapshot(&query.session_id);
    Json(SessionSnapshotResponse {
        session_id: query.session_id,
        tasks,
    })
}

/// `POST /api/v1/hawking/voice`
///
/// The switch is acknowledged immediately; re-synthesized tasks arrive
/// as play events over the socket as the batch completes.
pub async fn change_voice(
    State(state): State<AppState>,
    Json(req): Json<ChangeVoiceRequest>,
) -> Result<Json<ChangeVoiceResponse>, HttpError> {
    if req.voice_id.is_empty() {
        return Err(HttpError::BadRequest("voice_id is required".to_owned()));
    }

    state
        .scheduler
        .change_session_voice(&req.session_id, &req.voice_id, &req.product_ids);

    Ok(Json(ChangeVoiceResponse {
        status: "processing",
        tasks: state.scheduler.snapshot(&req.session_id),
    }))
}

/// `GET /api/v1/hawking/intros?voice_id=X`
pub async fn intro_pool(
    State(state): State<AppState>,
    Query(query): Query<IntroPoolQuery>,
) -> Json<Vec<HawkingIntro>> {
    Json(state.scheduler.intro_pool(&query.voice_id))
}
