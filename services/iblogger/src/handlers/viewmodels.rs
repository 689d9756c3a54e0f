use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::state::AppState;

/// 已注册的视图模型别名
pub async fn list_viewmodels(State(state): State<AppState>) -> Json<Value> {
    let aliases = state.viewmodels.aliases();
    Json(json!({
        "success": true,
        "data": aliases,
        "total": aliases.len()
    }))
}

/// 按别名解析视图模型描述符
///
/// 前端打开面板时调用一次，描述符告诉框架需要实例化哪些数据集合。
pub async fn get_viewmodel(
    State(state): State<AppState>,
    Path(alias): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match state.viewmodels.resolve(&alias) {
        Ok(descriptor) => {
            let response = json!({
                "success": true,
                "data": descriptor
            });
            Ok(Json(response))
        }
        Err(e) => {
            tracing::warn!("View-model resolution failed: {}", e);
            Err(StatusCode::NOT_FOUND)
        }
    }
}
