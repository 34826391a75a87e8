use axum::{extract::State, Json};
use chrono::Utc;

use crate::models::GatewayStatusResponse;
use crate::AppState;

pub async fn status(State(app): State<AppState>) -> Json<GatewayStatusResponse> {
    let gateway = app.store.gateway_status();
    let now = Utc::now().timestamp();
    Json(GatewayStatusResponse {
        status: gateway.status,
        is_online: gateway.is_online_at(now),
        device_id: gateway.device_id,
        firmware: gateway.firmware,
        last_seen: gateway.last_seen,
        seconds_since_last_seen: now - gateway.last_seen,
    })
}
