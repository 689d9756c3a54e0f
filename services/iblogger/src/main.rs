mod config;
mod filter;
mod handlers;
mod models;
mod report;
mod services;
mod state;
mod storage;
mod viewmodel;
mod websocket;

use anyhow::Result;
use axum::Router;
use han_utils::{AppMetrics, LoggingInitializer};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tokio::time::{interval, Duration};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    config::IbLoggerConfig, handlers::create_routes, services::RiskMonitor, state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    // 初始化日志
    LoggingInitializer::init()?;

    // 加载配置
    let config = IbLoggerConfig::load()?;
    info!("IB logger configuration loaded");

    // 初始化指标
    let metrics = Arc::new(AppMetrics::new()?);
    info!("Metrics initialized");

    // 创建应用状态
    let state = AppState::new(config.clone(), metrics.clone()).await?;
    info!("Application state initialized");

    // 心跳任务
    spawn_heartbeat_task(state.clone());

    // 风控监视器
    if config.risk.enabled {
        let monitor = RiskMonitor::new(
            state.order_store.clone(),
            state.event_tx.clone(),
            config.risk.max_open_orders_per_account,
        );
        let event_rx = state.event_tx.subscribe();
        tokio::spawn(monitor.run(event_rx));
    }

    // 创建中间件层
    let middleware = ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    // 创建路由
    let app: Router = create_routes().layer(middleware).with_state(state);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    info!("IB logger server starting on {}", addr);
    info!("Health check available at http://{}/health", addr);
    info!("Metrics available at http://{}/metrics", addr);
    info!("Accounts API available at http://{}/iblogger/ibaccounts", addr);
    info!("View-models available at http://{}/iblogger/viewmodels", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// 周期性心跳：对每个处于连接状态的账户推进一轮心跳
fn spawn_heartbeat_task(state: AppState) {
    let period = Duration::from_secs(state.config.heartbeat.interval_secs);

    tokio::spawn(async move {
        let mut ticker = interval(period);
        info!("Heartbeat task started, interval {:?}", period);

        loop {
            ticker.tick().await;

            for account_id in state.connections.connected_accounts() {
                match state.order_service.expire_heartbeats(&account_id).await {
                    Ok(expired) if !expired.is_empty() => {
                        info!(
                            "Heartbeat round for {}: {} orders moved to UNKNOWN",
                            account_id,
                            expired.len()
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Heartbeat round failed for {}: {}", account_id, e);
                    }
                }
            }
        }
    });
}
