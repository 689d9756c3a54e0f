use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde_json::{json, Value};

use crate::{handlers::error_status, models::IbAccount, state::AppState};

/// 查询所有账户
pub async fn get_ib_accounts(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    match state.account_service.list_accounts().await {
        Ok(accounts) => {
            let total = accounts.len();
            let response = json!({
                "success": true,
                "data": accounts,
                "total": total
            });
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("Failed to list accounts: {}", e);
            Err(error_status(&e))
        }
    }
}

/// 更新账户配置
pub async fn update_ib_account(
    State(state): State<AppState>,
    RequestJson(account): RequestJson<IbAccount>,
) -> Result<Json<Value>, StatusCode> {
    match state.account_service.update_account(account).await {
        Ok(Some(account)) => {
            let response = json!({
                "success": true,
                "data": account,
                "message": "Account updated successfully"
            });
            Ok(Json(response))
        }
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to update account: {}", e);
            Err(error_status(&e))
        }
    }
}

/// 建立或断开账户的 IB 连接
pub async fn connect_ib_account(
    State(state): State<AppState>,
    Path((account_id, connect)): Path<(String, bool)>,
) -> Result<Json<Value>, StatusCode> {
    match state.account_service.set_connected(&account_id, connect).await {
        Ok(Some(account)) => {
            let response = json!({
                "success": true,
                "data": account
            });
            Ok(Json(response))
        }
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to change connection for {}: {}", account_id, e);
            Err(error_status(&e))
        }
    }
}
