use anyhow::Result;
use han_models::SchemaRegistry;
use han_protocols::BusEvent;
use han_utils::AppMetrics;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

use crate::{
    config::IbLoggerConfig,
    report::StatisticsCalculator,
    services::{AccountService, HeartbeatControl, IbConnectionManager, OrderService},
    storage::{AccountStore, OrderStore, TradeStore},
    viewmodel::ViewModelRegistry,
};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub config: IbLoggerConfig,
    pub metrics: Arc<AppMetrics>,
    pub db_pool: Arc<PgPool>,

    // 存储层
    pub order_store: Arc<OrderStore>,
    pub account_store: Arc<AccountStore>,
    pub trade_store: Arc<TradeStore>,

    // 服务层
    pub order_service: Arc<OrderService>,
    pub account_service: Arc<AccountService>,
    pub heartbeat: Arc<HeartbeatControl>,
    pub connections: Arc<IbConnectionManager>,
    pub statistics: Arc<StatisticsCalculator>,

    // 配置注册表
    pub schemas: Arc<SchemaRegistry>,
    pub viewmodels: Arc<ViewModelRegistry>,

    // 事件总线
    pub event_tx: broadcast::Sender<BusEvent>,
}

impl AppState {
    pub async fn new(config: IbLoggerConfig, metrics: Arc<AppMetrics>) -> Result<Self> {
        // 创建数据库连接池
        let db_pool = Arc::new(
            PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
                .connect(&config.database.url)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?,
        );

        // 创建存储层
        let order_store = Arc::new(OrderStore::new(db_pool.clone()));
        let account_store = Arc::new(AccountStore::new(db_pool.clone()));
        let trade_store = Arc::new(TradeStore::new(db_pool.clone()));

        // 事件总线
        let (event_tx, _) = broadcast::channel(config.websocket.channel_capacity);

        // 连接管理与心跳控制
        let connections = Arc::new(IbConnectionManager::new(config.ib.client_id));
        let heartbeat = Arc::new(HeartbeatControl::new(config.heartbeat.max_fails));

        // 从存储恢复：登记账户，为打开的订单建立心跳
        let accounts = account_store.list().await?;
        for account in &accounts {
            connections.register_account(account);
            heartbeat.register_account(&account.account_id);

            let open_orders = order_store.open_orders(&account.account_id).await?;
            for order in &open_orders {
                heartbeat.init_heartbeat(order);
            }
            info!(
                "Account {} registered, {} open orders tracked",
                account.account_id,
                open_orders.len()
            );
        }

        // 创建服务层
        let order_service = Arc::new(OrderService::new(
            order_store.clone(),
            heartbeat.clone(),
            connections.clone(),
            metrics.clone(),
            event_tx.clone(),
        ));
        let account_service = Arc::new(AccountService::new(
            account_store.clone(),
            connections.clone(),
        ));
        let statistics = Arc::new(StatisticsCalculator::new());

        // 模式注册表与视图模型注册表
        let schemas = Arc::new(han_models::default_registry());
        let viewmodels = Arc::new(
            ViewModelRegistry::with_defaults(schemas.clone())
                .map_err(|e| anyhow::anyhow!("View-model registration failed: {}", e))?,
        );

        Ok(Self {
            config,
            metrics,
            db_pool,
            order_store,
            account_store,
            trade_store,
            order_service,
            account_service,
            heartbeat,
            connections,
            statistics,
            schemas,
            viewmodels,
            event_tx,
        })
    }

    /// 检查数据库健康状态
    pub async fn check_database_health(&self) -> String {
        match sqlx::query("SELECT 1").fetch_one(&*self.db_pool).await {
            Ok(_) => "healthy".to_string(),
            Err(e) => format!("unhealthy: {}", e),
        }
    }
}
