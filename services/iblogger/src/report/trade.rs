use crate::models::{Amount, Currency, Id, OrderAction, Price, Quantity, SecType, Timestamp};
use serde::{Deserialize, Serialize};

/// 交易方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeType {
    Long,
    Short,
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeType::Long => write!(f, "LONG"),
            TradeType::Short => write!(f, "SHORT"),
        }
    }
}

impl std::str::FromStr for TradeType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LONG" => Ok(TradeType::Long),
            "SHORT" => Ok(TradeType::Short),
            _ => Err(anyhow::anyhow!("Invalid trade type: {}", s)),
        }
    }
}

/// 单笔成交
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: Id,
    pub fill_date: Timestamp,
    pub action: OrderAction,
    pub quantity: Quantity,
    pub price: Price,
}

/// 交易
///
/// 一笔交易覆盖同一标的从开仓到平仓的全部成交。`close_date` 为空
/// 表示仍然持有，已实现盈亏只在平仓后有值。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: Id,
    pub trade_type: TradeType,
    pub symbol: String,
    pub underlying: Option<String>,
    pub currency: Currency,
    pub sec_type: SecType,
    pub open_date: Timestamp,
    pub close_date: Option<Timestamp>,
    pub executions: Vec<Execution>,
    pub profit_loss: Option<Amount>,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.close_date.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_type_parsing() {
        assert_eq!("LONG".parse::<TradeType>().unwrap(), TradeType::Long);
        assert_eq!("short".parse::<TradeType>().unwrap(), TradeType::Short);
        assert!("FLAT".parse::<TradeType>().is_err());
    }
}
