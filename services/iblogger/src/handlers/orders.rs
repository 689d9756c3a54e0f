use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    filter::parse_ib_order_filter,
    handlers::error_status,
    models::{LogOrderRequest, OrderStatus, Price},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub filter: Option<String>,
    pub start: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OrderEventRequest {
    pub status: String,
    pub price: Option<Price>,
}

/// 过滤 + 分页查询账户订单
pub async fn get_filtered_ib_orders(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Value>, StatusCode> {
    match state.account_store.find(&account_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to load account {}: {}", account_id, e);
            return Err(error_status(&e));
        }
    }

    let filter = match parse_ib_order_filter(query.filter.as_deref()) {
        Ok(filter) => filter,
        Err(e) => {
            tracing::error!("Rejected order filter: {}", e);
            return Err(error_status(&e));
        }
    };

    let start = query.start.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(25).clamp(1, 1000);

    match state
        .order_service
        .list_orders(&account_id, &filter, start, limit)
        .await
    {
        Ok((orders, total)) => {
            let response = json!({
                "success": true,
                "data": orders,
                "total": total,
                "pagination": {
                    "start": start,
                    "limit": limit
                }
            });
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("Failed to list orders for {}: {}", account_id, e);
            Err(error_status(&e))
        }
    }
}

/// 上报新订单
pub async fn log_ib_order(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    RequestJson(request): RequestJson<LogOrderRequest>,
) -> Result<Json<Value>, StatusCode> {
    match state.account_store.find(&account_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to load account {}: {}", account_id, e);
            return Err(error_status(&e));
        }
    }

    match state.order_service.log_order(&account_id, request).await {
        Ok(order) => {
            let response = json!({
                "success": true,
                "data": order,
                "message": "Order logged successfully"
            });
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("Failed to log order for {}: {}", account_id, e);
            Err(error_status(&e))
        }
    }
}

/// 应用订单事件
pub async fn apply_order_event(
    State(state): State<AppState>,
    Path((account_id, perm_id)): Path<(String, i64)>,
    RequestJson(request): RequestJson<OrderEventRequest>,
) -> Result<Json<Value>, StatusCode> {
    let status = match request.status.parse::<OrderStatus>() {
        Ok(status) => status,
        Err(e) => {
            tracing::error!("Rejected order event: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    match state
        .order_service
        .apply_event(&account_id, perm_id, status, request.price)
        .await
    {
        Ok(order) => {
            let response = json!({
                "success": true,
                "data": order,
                "message": "Order event applied"
            });
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!(
                "Failed to apply event for {} permId {}: {}",
                account_id,
                perm_id,
                e
            );
            Err(error_status(&e))
        }
    }
}
