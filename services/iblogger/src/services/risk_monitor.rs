use han_protocols::{BusEvent, EventMessage, EventTypes, Topics};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::storage::OrderStore;

/// 风控监视器
///
/// 订阅订单事件，账户打开订单数超限时在 riskmgt 主题上发告警。
pub struct RiskMonitor {
    order_store: Arc<OrderStore>,
    event_tx: broadcast::Sender<BusEvent>,
    max_open_orders: usize,
}

impl RiskMonitor {
    pub fn new(
        order_store: Arc<OrderStore>,
        event_tx: broadcast::Sender<BusEvent>,
        max_open_orders: usize,
    ) -> Self {
        Self {
            order_store,
            event_tx,
            max_open_orders,
        }
    }

    /// 打开订单数是否超限，0 表示不限制
    pub fn exceeds_limit(open_orders: usize, max_open_orders: usize) -> bool {
        max_open_orders > 0 && open_orders > max_open_orders
    }

    /// 事件循环，随服务启动
    pub async fn run(self, mut event_rx: broadcast::Receiver<BusEvent>) {
        info!(
            "Risk monitor started, max open orders per account: {}",
            self.max_open_orders
        );

        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Risk monitor lagged, {} events skipped", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            if event.topic != Topics::ORDTRACK
                || event.message.event_type != EventTypes::ORDER_CREATED
            {
                continue;
            }

            let account_id = match event
                .message
                .metadata
                .get("accountId")
                .and_then(|v| v.as_str())
            {
                Some(account_id) => account_id.to_string(),
                None => continue,
            };

            if let Err(e) = self.check_account(&account_id).await {
                warn!("Risk check failed for account {}: {}", account_id, e);
            }
        }

        info!("Risk monitor stopped");
    }

    async fn check_account(&self, account_id: &str) -> crate::models::IbLoggerResult<()> {
        let open_orders = self.order_store.open_orders(account_id).await?.len();

        if Self::exceeds_limit(open_orders, self.max_open_orders) {
            warn!(
                "Account {} has {} open orders, limit is {}",
                account_id, open_orders, self.max_open_orders
            );

            let message = EventMessage::new(
                EventTypes::RISK_ALERT,
                "iblogger",
                serde_json::json!({
                    "accountId": account_id,
                    "openOrders": open_orders,
                    "maxOpenOrders": self.max_open_orders,
                }),
            );
            let _ = self.event_tx.send(BusEvent::new(Topics::RISKMGT, message));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exceeds_limit() {
        assert!(RiskMonitor::exceeds_limit(11, 10));
        assert!(!RiskMonitor::exceeds_limit(10, 10));
        assert!(!RiskMonitor::exceeds_limit(5, 10));
        // 0 表示不限制
        assert!(!RiskMonitor::exceeds_limit(1000, 0));
    }
}
