use super::{Currency, IbLoggerError, IbLoggerResult, OrderAction, Price, Quantity, SecType, Timestamp};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal::prelude::Signed;
use serde::{Deserialize, Serialize};

/// 持仓
///
/// 持仓是运行期数据，由连接管理器按账户缓存在内存中，成交回报
/// 到达时增量更新。正数为多头，负数为空头。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub account_id: String,
    pub conid: Option<i64>,
    pub symbol: String,
    pub underlying: Option<String>,
    pub currency: Currency,
    pub sec_type: SecType,
    pub size: Quantity,
    pub avg_price: Price,
    pub updated_at: Timestamp,
}

impl Position {
    pub fn new(account_id: &str, symbol: &str, currency: Currency, sec_type: SecType) -> Self {
        Self {
            account_id: account_id.to_string(),
            conid: None,
            symbol: symbol.to_string(),
            underlying: None,
            currency,
            sec_type,
            size: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    /// 应用一笔成交
    ///
    /// 加仓时重新计算平均价，减仓保持平均价不变。
    pub fn apply_fill(
        &mut self,
        action: OrderAction,
        quantity: Quantity,
        price: Price,
    ) -> IbLoggerResult<()> {
        if quantity <= Decimal::ZERO {
            return Err(IbLoggerError::InvalidEvent(
                "Fill quantity must be positive".to_string(),
            ));
        }
        if price <= Decimal::ZERO {
            return Err(IbLoggerError::InvalidEvent(
                "Fill price must be positive".to_string(),
            ));
        }

        let signed = match action {
            OrderAction::Buy => quantity,
            OrderAction::Sell => -quantity,
        };
        let new_size = self.size + signed;

        let increases = (self.size >= Decimal::ZERO && signed > Decimal::ZERO)
            || (self.size <= Decimal::ZERO && signed < Decimal::ZERO);

        if increases {
            let old_value = self.avg_price * self.size.abs();
            let fill_value = price * quantity;
            self.avg_price = (old_value + fill_value) / new_size.abs();
        } else if new_size == Decimal::ZERO {
            self.avg_price = Decimal::ZERO;
        } else if new_size.signum() != self.size.signum() {
            // 反向穿仓，剩余部分按本次成交价重新开仓
            self.avg_price = price;
        }

        self.size = new_size;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_flat(&self) -> bool {
        self.size == Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_position() -> Position {
        Position::new("DU12345", "AAPL", Currency::Usd, SecType::Stk)
    }

    #[test]
    fn test_apply_buy_fills() {
        let mut position = sample_position();

        position.apply_fill(OrderAction::Buy, dec!(100), dec!(180)).unwrap();
        assert_eq!(position.size, dec!(100));
        assert_eq!(position.avg_price, dec!(180));

        // 加仓，平均价按成交价值加权
        position.apply_fill(OrderAction::Buy, dec!(100), dec!(190)).unwrap();
        assert_eq!(position.size, dec!(200));
        assert_eq!(position.avg_price, dec!(185));
    }

    #[test]
    fn test_apply_sell_reduces() {
        let mut position = sample_position();
        position.apply_fill(OrderAction::Buy, dec!(200), dec!(185)).unwrap();

        position.apply_fill(OrderAction::Sell, dec!(100), dec!(195)).unwrap();
        assert_eq!(position.size, dec!(100));
        // 减仓不改变平均价
        assert_eq!(position.avg_price, dec!(185));

        position.apply_fill(OrderAction::Sell, dec!(100), dec!(195)).unwrap();
        assert!(position.is_flat());
        assert_eq!(position.avg_price, Decimal::ZERO);
    }

    #[test]
    fn test_cross_through_zero() {
        let mut position = sample_position();
        position.apply_fill(OrderAction::Buy, dec!(100), dec!(180)).unwrap();

        // 卖出 150，剩余 -50 空头，按本次成交价开仓
        position.apply_fill(OrderAction::Sell, dec!(150), dec!(190)).unwrap();
        assert_eq!(position.size, dec!(-50));
        assert_eq!(position.avg_price, dec!(190));
    }

    #[test]
    fn test_invalid_fill() {
        let mut position = sample_position();
        assert!(position
            .apply_fill(OrderAction::Buy, Decimal::ZERO, dec!(180))
            .is_err());
        assert!(position
            .apply_fill(OrderAction::Buy, dec!(1), Decimal::ZERO)
            .is_err());
    }
}
