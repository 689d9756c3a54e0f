use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::{handlers::error_status, state::AppState};

/// 账户的缓存持仓
pub async fn get_positions(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.account_store.find(&account_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to load account {}: {}", account_id, e);
            return Err(error_status(&e));
        }
    }

    let positions = state.connections.positions(&account_id);
    let total = positions.len();
    let response = json!({
        "success": true,
        "data": positions,
        "total": total
    });
    Ok(Json(response))
}
