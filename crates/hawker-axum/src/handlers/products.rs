//! Product sync handler.
//!
//! The relational product store lives outside this service; this
//! endpoint lets the mobile client push its catalogue in bulk so the
//! scheduler can resolve products by id.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use hawker_core::domain::Product;

use crate::error::HttpError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub status: &'static str,
    pub count: usize,
}

/// `POST /api/v1/products/sync`
pub async fn sync(
    State(state): State<AppState>,
    Json(products): Json<Vec<Product>>,
) -> Result<Json<SyncResponse>, HttpError> {
    let count = state.products.sync(products).await?;
    Ok(Json(SyncResponse { status: "ok", count }))
}
