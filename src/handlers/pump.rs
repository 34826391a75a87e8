use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::error;

use crate::error::Result;
use crate::models::{FeedbackStatus, PumpId, StateSnapshot};
use crate::repositories::HistoryQuery;
use crate::AppState;

pub const HISTORY_DEFAULT_LIMIT: i64 = 1000;
pub const HISTORY_MAX_LIMIT: i64 = 5000;

#[derive(Debug, Deserialize)]
pub struct ControlRequest {
    pub pump_id: i64,
    pub state: i64,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub pump_id: i64,
    pub status: i64,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub count: usize,
    pub data: Vec<StateSnapshot>,
}

/// Forward the command to the control topic. The gateway's own subscription
/// applies the echoed command, so the returned `current_state` is read back
/// after a short beat rather than mutated here.
pub async fn control(
    State(app): State<AppState>,
    Json(req): Json<ControlRequest>,
) -> Result<Response> {
    let pump = PumpId::try_from(req.pump_id)?;
    let state = i64::from(req.state != 0);

    match app.publisher.publish_control(pump.as_i64(), state).await {
        Ok(()) => {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let current = app.store.snapshot();
            Ok(Json(json!({ "status": "sent", "current_state": current })).into_response())
        }
        Err(e) => {
            error!(error = %e, "control publish failed");
            Ok((StatusCode::BAD_GATEWAY, Json(json!({ "status": "error" }))).into_response())
        }
    }
}

pub async fn feedback(
    State(app): State<AppState>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<serde_json::Value>> {
    let pump = PumpId::try_from(req.pump_id)?;
    app.store
        .set_pump_feedback(pump, FeedbackStatus::from_wire(req.status));
    Ok(Json(json!({ "status": "ok" })))
}

pub async fn status(State(app): State<AppState>) -> Json<StateSnapshot> {
    Json(app.store.snapshot())
}

pub async fn history(
    State(app): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>> {
    let limit = params
        .limit
        .unwrap_or(HISTORY_DEFAULT_LIMIT)
        .clamp(1, HISTORY_MAX_LIMIT);
    let data = app
        .repo
        .snapshot_history(&HistoryQuery {
            limit,
            from: params.from,
            to: params.to,
        })
        .await?;
    Ok(Json(HistoryResponse {
        count: data.len(),
        data,
    }))
}
