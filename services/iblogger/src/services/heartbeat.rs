use crate::models::IbOrder;
use dashmap::DashMap;

/// 心跳控制
///
/// 按账户跟踪每个打开订单剩余的失败心跳数。计数归零后订单在下一轮
/// 被判定为失联，由调用方迁移到 UNKNOWN 状态。本结构只管理计数，
/// 不触碰存储。
pub struct HeartbeatControl {
    max_fails: i32,
    entries: DashMap<String, DashMap<i64, i32>>,
}

impl HeartbeatControl {
    pub fn new(max_fails: i32) -> Self {
        Self {
            max_fails,
            entries: DashMap::new(),
        }
    }

    /// 为账户建立心跳表
    pub fn register_account(&self, account_id: &str) {
        self.entries
            .entry(account_id.to_string())
            .or_insert_with(DashMap::new);
    }

    /// 开始跟踪一个打开的订单，重复调用会重置计数
    pub fn init_heartbeat(&self, order: &IbOrder) {
        self.entries
            .entry(order.account_id.clone())
            .or_insert_with(DashMap::new)
            .insert(order.perm_id, self.max_fails);
    }

    /// 停止跟踪
    pub fn remove_heartbeat(&self, account_id: &str, perm_id: i64) {
        if let Some(inner) = self.entries.get(account_id) {
            inner.remove(&perm_id);
        }
    }

    /// 当前剩余心跳数
    pub fn heartbeat_count(&self, account_id: &str, perm_id: i64) -> Option<i32> {
        self.entries
            .get(account_id)?
            .get(&perm_id)
            .map(|entry| *entry)
    }

    /// 账户下跟踪中的订单数
    pub fn tracked(&self, account_id: &str) -> usize {
        self.entries
            .get(account_id)
            .map(|inner| inner.len())
            .unwrap_or(0)
    }

    /// 全部账户跟踪中的订单数
    pub fn total_tracked(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    /// 一轮心跳
    ///
    /// 计数已耗尽的订单从表中移除并返回其 perm id，其余订单计数减一。
    pub fn tick(&self, account_id: &str) -> Vec<i64> {
        let mut expired = Vec::new();

        if let Some(inner) = self.entries.get(account_id) {
            let perm_ids: Vec<i64> = inner.iter().map(|entry| *entry.key()).collect();

            for perm_id in perm_ids {
                let exhausted = match inner.get(&perm_id) {
                    Some(entry) => *entry <= 0,
                    None => continue,
                };

                if exhausted {
                    inner.remove(&perm_id);
                    expired.push(perm_id);
                } else if let Some(mut entry) = inner.get_mut(&perm_id) {
                    *entry -= 1;
                }
            }
        }

        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, OrderAction, OrderKind, SecType};
    use rust_decimal_macros::dec;

    fn order(perm_id: i64) -> IbOrder {
        IbOrder::new(
            "DU12345",
            perm_id,
            1,
            OrderAction::Buy,
            dec!(10),
            "AAPL",
            None,
            Currency::Usd,
            SecType::Stk,
            OrderKind::Mkt,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_init_and_count() {
        let control = HeartbeatControl::new(5);
        control.init_heartbeat(&order(1001));

        assert_eq!(control.heartbeat_count("DU12345", 1001), Some(5));
        assert_eq!(control.heartbeat_count("DU12345", 9999), None);
        assert_eq!(control.tracked("DU12345"), 1);
        assert_eq!(control.tracked("DU99999"), 0);
    }

    #[test]
    fn test_tick_decrements_then_expires() {
        let control = HeartbeatControl::new(2);
        control.init_heartbeat(&order(1001));

        // 2 -> 1 -> 0，计数归零后的下一轮才判失联
        assert!(control.tick("DU12345").is_empty());
        assert_eq!(control.heartbeat_count("DU12345", 1001), Some(1));
        assert!(control.tick("DU12345").is_empty());
        assert_eq!(control.heartbeat_count("DU12345", 1001), Some(0));

        let expired = control.tick("DU12345");
        assert_eq!(expired, vec![1001]);
        assert_eq!(control.heartbeat_count("DU12345", 1001), None);
        assert_eq!(control.tracked("DU12345"), 0);
    }

    #[test]
    fn test_remove_heartbeat() {
        let control = HeartbeatControl::new(5);
        control.init_heartbeat(&order(1001));
        control.init_heartbeat(&order(1002));

        control.remove_heartbeat("DU12345", 1001);
        assert_eq!(control.heartbeat_count("DU12345", 1001), None);
        assert_eq!(control.tracked("DU12345"), 1);
    }

    #[test]
    fn test_reinit_resets_count() {
        let control = HeartbeatControl::new(3);
        let o = order(1001);
        control.init_heartbeat(&o);
        control.tick("DU12345");
        assert_eq!(control.heartbeat_count("DU12345", 1001), Some(2));

        control.init_heartbeat(&o);
        assert_eq!(control.heartbeat_count("DU12345", 1001), Some(3));
    }
}
