use han_protocols::{BusEvent, EventMessage, EventTypes, Topics};
use han_utils::AppMetrics;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    filter::IbOrderFilter,
    models::{IbLoggerError, IbLoggerResult, IbOrder, LogOrderRequest, OrderStatus, Price},
    services::{HeartbeatControl, IbConnectionManager},
    storage::OrderStore,
};

/// 订单服务
///
/// 订单跟踪的写入口：上报、事件迁移、心跳失联，全部动作落库并在
/// ordtrack 主题上广播。
#[derive(Clone)]
pub struct OrderService {
    order_store: Arc<OrderStore>,
    heartbeat: Arc<HeartbeatControl>,
    connections: Arc<IbConnectionManager>,
    metrics: Arc<AppMetrics>,
    event_tx: broadcast::Sender<BusEvent>,
}

impl OrderService {
    pub fn new(
        order_store: Arc<OrderStore>,
        heartbeat: Arc<HeartbeatControl>,
        connections: Arc<IbConnectionManager>,
        metrics: Arc<AppMetrics>,
        event_tx: broadcast::Sender<BusEvent>,
    ) -> Self {
        Self {
            order_store,
            heartbeat,
            connections,
            metrics,
            event_tx,
        }
    }

    /// 记录新订单
    pub async fn log_order(
        &self,
        account_id: &str,
        request: LogOrderRequest,
    ) -> IbLoggerResult<IbOrder> {
        let order = request.to_order(account_id)?;

        if self
            .order_store
            .find_by_perm_id(account_id, order.perm_id)
            .await?
            .is_some()
        {
            return Err(IbLoggerError::InvalidOrder(format!(
                "Order with perm id {} already logged for account {}",
                order.perm_id, account_id
            )));
        }

        self.order_store.create_order(&order).await?;
        self.heartbeat.init_heartbeat(&order);
        self.metrics.orders_logged.inc();

        info!(
            "Order logged, account={}, permId={}",
            account_id, order.perm_id
        );
        self.publish(EventTypes::ORDER_CREATED, &order);

        Ok(order)
    }

    /// 应用订单事件
    ///
    /// 打开状态重置心跳，终态撤出心跳跟踪；成交并入持仓缓存。
    pub async fn apply_event(
        &self,
        account_id: &str,
        perm_id: i64,
        status: OrderStatus,
        price: Option<Price>,
    ) -> IbLoggerResult<IbOrder> {
        let mut order = self
            .order_store
            .find_by_perm_id(account_id, perm_id)
            .await?
            .ok_or_else(|| IbLoggerError::OrderNotFound(format!("permId {}", perm_id)))?;

        order.add_event(status, price)?;
        self.order_store.update_order(&order).await?;

        if order.status.is_open() {
            self.heartbeat.init_heartbeat(&order);
        } else {
            self.heartbeat.remove_heartbeat(account_id, perm_id);
        }

        if order.status == OrderStatus::Filled {
            if let Some(fill_price) = order.fill_price {
                self.connections.record_fill(&order, fill_price)?;
            }
        }

        self.metrics.order_events.inc();
        info!(
            "Order event applied, account={}, permId={}, status={}",
            account_id, perm_id, order.status
        );
        self.publish(EventTypes::ORDER_UPDATED, &order);

        Ok(order)
    }

    /// 过滤 + 分页查询，打开的订单带上剩余心跳数
    pub async fn list_orders(
        &self,
        account_id: &str,
        filter: &IbOrderFilter,
        start: i64,
        limit: i64,
    ) -> IbLoggerResult<(Vec<IbOrder>, i64)> {
        let mut orders = self
            .order_store
            .list_filtered(account_id, filter, start, limit)
            .await?;
        let total = self.order_store.count_filtered(account_id, filter).await?;

        for order in orders.iter_mut().filter(|o| o.is_open()) {
            order.heartbeat_count = self.heartbeat.heartbeat_count(account_id, order.perm_id);
        }

        Ok((orders, total))
    }

    /// 一轮心跳，把计数耗尽的订单迁移到 UNKNOWN
    pub async fn expire_heartbeats(&self, account_id: &str) -> IbLoggerResult<Vec<IbOrder>> {
        let mut expired_orders = Vec::new();

        for perm_id in self.heartbeat.tick(account_id) {
            let order = self.order_store.find_by_perm_id(account_id, perm_id).await?;

            let mut order = match order {
                Some(order) => order,
                None => {
                    warn!(
                        "Heartbeat tracked unknown order, account={}, permId={}",
                        account_id, perm_id
                    );
                    continue;
                }
            };

            if order.status.is_terminal() {
                continue;
            }

            order.add_event(OrderStatus::Unknown, None)?;
            self.order_store.update_order(&order).await?;
            self.metrics.orders_unknown.inc();

            warn!(
                "Order moved to UNKNOWN after missed heartbeats, account={}, permId={}",
                account_id, perm_id
            );
            self.publish(EventTypes::ORDER_UNKNOWN, &order);
            expired_orders.push(order);
        }

        Ok(expired_orders)
    }

    fn publish(&self, event_type: &str, order: &IbOrder) {
        let payload = match serde_json::to_value(order) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize order event: {}", e);
                return;
            }
        };

        let message = EventMessage::new(event_type, "iblogger", payload)
            .with_metadata("accountId", serde_json::json!(order.account_id));

        // 没有订阅者不算错误
        let _ = self.event_tx.send(BusEvent::new(Topics::ORDTRACK, message));
    }
}
