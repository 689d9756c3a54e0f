use crate::models::{IbAccount, IbConnection, IbLoggerResult, IbOrder, Position};
use dashmap::DashMap;
use tracing::info;

/// IB API 连接管理器
///
/// 每个账户一条到 TWS 的 API 连接。这里维护连接状态和按账户缓存的
/// 持仓，实际的 TWS 会话由外部网关进程持有。
pub struct IbConnectionManager {
    client_id: i32,
    connections: DashMap<String, IbConnection>,
    positions: DashMap<String, Vec<Position>>,
}

impl IbConnectionManager {
    pub fn new(client_id: i32) -> Self {
        Self {
            client_id,
            connections: DashMap::new(),
            positions: DashMap::new(),
        }
    }

    /// 登记账户，初始为断开状态
    pub fn register_account(&self, account: &IbAccount) {
        self.connections
            .entry(account.account_id.clone())
            .or_insert_with(|| {
                IbConnection::new(
                    &account.account_id,
                    &account.host,
                    account.port,
                    self.client_id,
                )
            });
        self.positions
            .entry(account.account_id.clone())
            .or_insert_with(Vec::new);
    }

    /// 建立连接
    pub fn connect(&self, account_id: &str) -> Option<IbConnection> {
        let mut entry = self.connections.get_mut(account_id)?;
        entry.mark_connected();
        info!("IB connection established for account {}", account_id);
        Some(entry.value().clone())
    }

    /// 断开连接
    pub fn disconnect(&self, account_id: &str) -> Option<IbConnection> {
        let mut entry = self.connections.get_mut(account_id)?;
        entry.mark_disconnected();
        info!("IB connection closed for account {}", account_id);
        Some(entry.value().clone())
    }

    /// 当前连接信息
    pub fn connection(&self, account_id: &str) -> Option<IbConnection> {
        self.connections
            .get(account_id)
            .map(|entry| entry.value().clone())
    }

    pub fn is_connected(&self, account_id: &str) -> bool {
        self.connections
            .get(account_id)
            .map(|entry| entry.state.is_connected())
            .unwrap_or(false)
    }

    /// 处于连接状态的账户
    pub fn connected_accounts(&self) -> Vec<String> {
        self.connections
            .iter()
            .filter(|entry| entry.state.is_connected())
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// 账户的缓存持仓，未知账户返回空表
    pub fn positions(&self, account_id: &str) -> Vec<Position> {
        self.positions
            .get(account_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// 将成交并入持仓缓存
    ///
    /// 同账户同标的（symbol + secType + currency）合并为一条持仓，
    /// 平掉的持仓从缓存中移除。
    pub fn record_fill(&self, order: &IbOrder, price: crate::models::Price) -> IbLoggerResult<()> {
        let mut entry = self
            .positions
            .entry(order.account_id.clone())
            .or_insert_with(Vec::new);

        let existing = entry.iter_mut().find(|p| {
            p.symbol == order.symbol
                && p.sec_type == order.sec_type
                && p.currency == order.currency
        });

        match existing {
            Some(position) => {
                position.apply_fill(order.action, order.quantity, price)?;
            }
            None => {
                let mut position = Position::new(
                    &order.account_id,
                    &order.symbol,
                    order.currency,
                    order.sec_type,
                );
                position.underlying = order.underlying.clone();
                position.apply_fill(order.action, order.quantity, price)?;
                entry.push(position);
            }
        }

        entry.retain(|p| !p.is_flat());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConnectionState, Currency, OrderAction, OrderKind, SecType};
    use rust_decimal_macros::dec;

    fn account() -> IbAccount {
        IbAccount::new("DU12345", "localhost", 7496)
    }

    fn filled_order(action: OrderAction, quantity: rust_decimal::Decimal) -> IbOrder {
        IbOrder::new(
            "DU12345",
            1001,
            1,
            action,
            quantity,
            "AAPL",
            Some("AAPL".to_string()),
            Currency::Usd,
            SecType::Stk,
            OrderKind::Mkt,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_connect_disconnect() {
        let manager = IbConnectionManager::new(0);
        manager.register_account(&account());

        assert!(!manager.is_connected("DU12345"));

        let connection = manager.connect("DU12345").unwrap();
        assert_eq!(connection.state, ConnectionState::Connected);
        assert_eq!(connection.client_id, 0);
        assert_eq!(manager.connected_accounts(), vec!["DU12345".to_string()]);

        let connection = manager.disconnect("DU12345").unwrap();
        assert_eq!(connection.state, ConnectionState::Disconnected);
        assert!(manager.connected_accounts().is_empty());
    }

    #[test]
    fn test_unknown_account() {
        let manager = IbConnectionManager::new(0);
        assert!(manager.connect("DU99999").is_none());
        assert!(manager.connection("DU99999").is_none());
        assert!(manager.positions("DU99999").is_empty());
    }

    #[test]
    fn test_record_fill_builds_position() {
        let manager = IbConnectionManager::new(0);
        manager.register_account(&account());

        manager
            .record_fill(&filled_order(OrderAction::Buy, dec!(100)), dec!(180))
            .unwrap();

        let positions = manager.positions("DU12345");
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].size, dec!(100));
        assert_eq!(positions[0].avg_price, dec!(180));

        // 反向成交平仓后持仓从缓存移除
        manager
            .record_fill(&filled_order(OrderAction::Sell, dec!(100)), dec!(190))
            .unwrap();
        assert!(manager.positions("DU12345").is_empty());
    }
}
