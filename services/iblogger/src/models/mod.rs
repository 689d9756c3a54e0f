pub mod account;
pub mod order;
pub mod position;

pub use account::*;
pub use order::*;
pub use position::*;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 通用ID类型
pub type Id = Uuid;

/// 通用时间戳类型
pub type Timestamp = DateTime<Utc>;

/// 通用价格类型
pub type Price = Decimal;

/// 通用数量类型
pub type Quantity = Decimal;

/// 通用金额类型
pub type Amount = Decimal;

/// 证券类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecType {
    Stk,
    Opt,
    Fut,
    Cash,
    Cfd,
}

impl std::fmt::Display for SecType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecType::Stk => write!(f, "STK"),
            SecType::Opt => write!(f, "OPT"),
            SecType::Fut => write!(f, "FUT"),
            SecType::Cash => write!(f, "CASH"),
            SecType::Cfd => write!(f, "CFD"),
        }
    }
}

impl std::str::FromStr for SecType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STK" => Ok(SecType::Stk),
            "OPT" => Ok(SecType::Opt),
            "FUT" => Ok(SecType::Fut),
            "CASH" => Ok(SecType::Cash),
            "CFD" => Ok(SecType::Cfd),
            _ => Err(anyhow::anyhow!("Invalid security type: {}", s)),
        }
    }
}

/// 币种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Chf,
    Jpy,
    Aud,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Currency::Usd => write!(f, "USD"),
            Currency::Eur => write!(f, "EUR"),
            Currency::Gbp => write!(f, "GBP"),
            Currency::Chf => write!(f, "CHF"),
            Currency::Jpy => write!(f, "JPY"),
            Currency::Aud => write!(f, "AUD"),
        }
    }
}

impl std::str::FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "CHF" => Ok(Currency::Chf),
            "JPY" => Ok(Currency::Jpy),
            "AUD" => Ok(Currency::Aud),
            _ => Err(anyhow::anyhow!("Invalid currency: {}", s)),
        }
    }
}

/// 订单方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderAction {
    Buy,
    Sell,
}

impl OrderAction {
    pub fn opposite(&self) -> Self {
        match self {
            OrderAction::Buy => OrderAction::Sell,
            OrderAction::Sell => OrderAction::Buy,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, OrderAction::Buy)
    }
}

impl std::fmt::Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderAction::Buy => write!(f, "BUY"),
            OrderAction::Sell => write!(f, "SELL"),
        }
    }
}

impl std::str::FromStr for OrderAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" | "B" => Ok(OrderAction::Buy),
            "SELL" | "S" => Ok(OrderAction::Sell),
            _ => Err(anyhow::anyhow!("Invalid order action: {}", s)),
        }
    }
}

/// 错误类型
#[derive(Debug, thiserror::Error)]
pub enum IbLoggerError {
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type IbLoggerResult<T> = Result<T, IbLoggerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sec_type_parsing() {
        assert_eq!("STK".parse::<SecType>().unwrap(), SecType::Stk);
        assert_eq!("fut".parse::<SecType>().unwrap(), SecType::Fut);
        assert_eq!(SecType::Cash.to_string(), "CASH");
        assert!("BOND".parse::<SecType>().is_err());
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!("USD".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::Eur);
        assert_eq!(Currency::Chf.to_string(), "CHF");
        assert!("XXX".parse::<Currency>().is_err());
    }

    #[test]
    fn test_order_action() {
        assert_eq!("BUY".parse::<OrderAction>().unwrap(), OrderAction::Buy);
        assert_eq!("s".parse::<OrderAction>().unwrap(), OrderAction::Sell);
        assert_eq!(OrderAction::Buy.opposite(), OrderAction::Sell);
        assert!(OrderAction::Buy.is_buy());
    }
}
