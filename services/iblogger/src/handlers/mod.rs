use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Router,
};

use crate::models::IbLoggerError;
use crate::state::AppState;

pub mod accounts;
pub mod health;
pub mod orders;
pub mod positions;
pub mod report;
pub mod viewmodels;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // 健康检查与指标
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        // 账户管理
        .route("/iblogger/ibaccounts", get(accounts::get_ib_accounts))
        .route("/iblogger/ibaccounts", put(accounts::update_ib_account))
        .route(
            "/iblogger/ibaccounts/:account_id/connect/:connect",
            put(accounts::connect_ib_account),
        )
        // 订单跟踪
        .route(
            "/iblogger/ibaccounts/:account_id/iborders",
            get(orders::get_filtered_ib_orders),
        )
        .route(
            "/iblogger/ibaccounts/:account_id/iborders",
            post(orders::log_ib_order),
        )
        .route(
            "/iblogger/ibaccounts/:account_id/iborders/:perm_id/events",
            post(orders::apply_order_event),
        )
        // 持仓
        .route(
            "/iblogger/ibaccounts/:account_id/positions",
            get(positions::get_positions),
        )
        // 视图模型
        .route("/iblogger/viewmodels", get(viewmodels::list_viewmodels))
        .route(
            "/iblogger/viewmodels/:alias",
            get(viewmodels::get_viewmodel),
        )
        // 报表
        .route(
            "/report/statistics/:interval",
            get(report::get_statistics),
        )
        // WebSocket 推送
        .route("/ws/:topic", get(crate::websocket::topic_websocket))
}

/// 域错误到 HTTP 状态码
pub fn error_status(error: &IbLoggerError) -> StatusCode {
    match error {
        IbLoggerError::InvalidOrder(_)
        | IbLoggerError::InvalidFilter(_)
        | IbLoggerError::InvalidEvent(_) => StatusCode::BAD_REQUEST,
        IbLoggerError::OrderNotFound(_) | IbLoggerError::AccountNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        IbLoggerError::DatabaseError(_) | IbLoggerError::ConfigError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&IbLoggerError::InvalidFilter("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&IbLoggerError::AccountNotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&IbLoggerError::DatabaseError("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
