use super::{Id, IbLoggerError, IbLoggerResult, OrderAction, Price, Quantity, SecType, Timestamp};
use super::Currency;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 订单状态
///
/// SUBMITTED/UPDATED 视为打开状态，心跳控制只跟踪打开的订单。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Submitted,
    Updated,
    Filled,
    Cancelled,
    Unknown,
}

impl OrderStatus {
    /// 是否为打开状态
    pub fn is_open(&self) -> bool {
        matches!(self, OrderStatus::Submitted | OrderStatus::Updated)
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Unknown
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Submitted => write!(f, "SUBMITTED"),
            OrderStatus::Updated => write!(f, "UPDATED"),
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
            OrderStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SUBMITTED" => Ok(OrderStatus::Submitted),
            "UPDATED" => Ok(OrderStatus::Updated),
            "FILLED" => Ok(OrderStatus::Filled),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            "UNKNOWN" => Ok(OrderStatus::Unknown),
            _ => Err(anyhow::anyhow!("Invalid order status: {}", s)),
        }
    }
}

/// 订单类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    Mkt,
    Lmt,
    Stp,
    Trail,
}

impl OrderKind {
    /// 是否需要委托价格
    pub fn requires_price(&self) -> bool {
        matches!(self, OrderKind::Lmt | OrderKind::Stp)
    }
}

impl std::fmt::Display for OrderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderKind::Mkt => write!(f, "MKT"),
            OrderKind::Lmt => write!(f, "LMT"),
            OrderKind::Stp => write!(f, "STP"),
            OrderKind::Trail => write!(f, "TRAIL"),
        }
    }
}

impl std::str::FromStr for OrderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MKT" => Ok(OrderKind::Mkt),
            "LMT" => Ok(OrderKind::Lmt),
            "STP" => Ok(OrderKind::Stp),
            "TRAIL" => Ok(OrderKind::Trail),
            _ => Err(anyhow::anyhow!("Invalid order kind: {}", s)),
        }
    }
}

/// 订单事件
///
/// 每次状态变化追加一条事件，订单保留完整的事件历史。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IbOrderEvent {
    pub id: Id,
    pub event_date: Timestamp,
    pub status: OrderStatus,
    pub price: Option<Price>,
}

/// IB 订单
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IbOrder {
    pub id: Id,
    pub account_id: String,
    pub perm_id: i64,
    pub order_id: i32,
    pub action: OrderAction,
    pub quantity: Quantity,
    pub symbol: String,
    pub underlying: Option<String>,
    pub currency: Currency,
    pub sec_type: SecType,
    pub order_kind: OrderKind,
    pub order_price: Option<Price>,
    pub fill_price: Option<Price>,
    pub status: OrderStatus,
    /// 剩余心跳数，仅对打开的订单有意义，不落库
    pub heartbeat_count: Option<i32>,
    pub events: Vec<IbOrderEvent>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl IbOrder {
    /// 创建新订单，初始状态 SUBMITTED 并带有首条事件
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        account_id: &str,
        perm_id: i64,
        order_id: i32,
        action: OrderAction,
        quantity: Quantity,
        symbol: &str,
        underlying: Option<String>,
        currency: Currency,
        sec_type: SecType,
        order_kind: OrderKind,
        order_price: Option<Price>,
    ) -> IbLoggerResult<Self> {
        if account_id.is_empty() {
            return Err(IbLoggerError::InvalidOrder(
                "Account id must not be empty".to_string(),
            ));
        }

        if perm_id <= 0 {
            return Err(IbLoggerError::InvalidOrder(
                "Perm id must be positive".to_string(),
            ));
        }

        if quantity <= Decimal::ZERO {
            return Err(IbLoggerError::InvalidOrder(
                "Quantity must be positive".to_string(),
            ));
        }

        if order_kind.requires_price() && order_price.is_none() {
            return Err(IbLoggerError::InvalidOrder(
                "Price is required for this order kind".to_string(),
            ));
        }

        if let Some(p) = order_price {
            if p <= Decimal::ZERO {
                return Err(IbLoggerError::InvalidOrder(
                    "Price must be positive".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let mut order = Self {
            id: Uuid::new_v4(),
            account_id: account_id.to_string(),
            perm_id,
            order_id,
            action,
            quantity,
            symbol: symbol.to_string(),
            underlying,
            currency,
            sec_type,
            order_kind,
            order_price,
            fill_price: None,
            status: OrderStatus::Submitted,
            heartbeat_count: None,
            events: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        order.push_event(OrderStatus::Submitted, order_price);
        Ok(order)
    }

    /// 追加事件并迁移状态
    ///
    /// FILLED 事件必须带价格，并记录为成交价。终态订单不再接受事件。
    pub fn add_event(&mut self, status: OrderStatus, price: Option<Price>) -> IbLoggerResult<()> {
        if self.status.is_terminal() {
            return Err(IbLoggerError::InvalidEvent(format!(
                "Cannot apply event to order in status {}",
                self.status
            )));
        }

        if status == OrderStatus::Filled {
            let fill_price = price.ok_or_else(|| {
                IbLoggerError::InvalidEvent("Fill event requires a price".to_string())
            })?;
            if fill_price <= Decimal::ZERO {
                return Err(IbLoggerError::InvalidEvent(
                    "Fill price must be positive".to_string(),
                ));
            }
            self.fill_price = Some(fill_price);
        }

        self.push_event(status, price);
        Ok(())
    }

    fn push_event(&mut self, status: OrderStatus, price: Option<Price>) {
        let now = Utc::now();
        self.events.push(IbOrderEvent {
            id: Uuid::new_v4(),
            event_date: now,
            status,
            price,
        });
        self.status = status;
        self.updated_at = now;
    }

    /// 是否为打开状态
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}

/// 订单上报请求
///
/// 订单跟踪入口接收交易侧上报的新订单，字符串字段在转换时解析。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogOrderRequest {
    pub perm_id: i64,
    pub order_id: i32,
    pub action: String,
    pub quantity: Quantity,
    pub symbol: String,
    pub underlying: Option<String>,
    pub currency: String,
    pub sec_type: String,
    pub order_kind: String,
    pub order_price: Option<Price>,
}

impl LogOrderRequest {
    /// 转换为订单
    pub fn to_order(&self, account_id: &str) -> IbLoggerResult<IbOrder> {
        let action = self
            .action
            .parse()
            .map_err(|e| IbLoggerError::InvalidOrder(format!("Invalid action: {}", e)))?;

        let currency = self
            .currency
            .parse()
            .map_err(|e| IbLoggerError::InvalidOrder(format!("Invalid currency: {}", e)))?;

        let sec_type = self
            .sec_type
            .parse()
            .map_err(|e| IbLoggerError::InvalidOrder(format!("Invalid sec type: {}", e)))?;

        let order_kind = self
            .order_kind
            .parse()
            .map_err(|e| IbLoggerError::InvalidOrder(format!("Invalid order kind: {}", e)))?;

        IbOrder::new(
            account_id,
            self.perm_id,
            self.order_id,
            action,
            self.quantity,
            &self.symbol,
            self.underlying.clone(),
            currency,
            sec_type,
            order_kind,
            self.order_price,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_order() -> IbOrder {
        IbOrder::new(
            "DU12345",
            1001,
            1,
            OrderAction::Buy,
            dec!(100),
            "AAPL",
            Some("AAPL".to_string()),
            Currency::Usd,
            SecType::Stk,
            OrderKind::Lmt,
            Some(dec!(185.50)),
        )
        .unwrap()
    }

    #[test]
    fn test_new_order_submitted() {
        let order = sample_order();

        assert_eq!(order.status, OrderStatus::Submitted);
        assert!(order.is_open());
        assert_eq!(order.events.len(), 1);
        assert_eq!(order.events[0].status, OrderStatus::Submitted);
        assert!(order.fill_price.is_none());
    }

    #[test]
    fn test_order_validation() {
        // 数量必须为正
        let result = IbOrder::new(
            "DU12345",
            1001,
            1,
            OrderAction::Buy,
            Decimal::ZERO,
            "AAPL",
            None,
            Currency::Usd,
            SecType::Stk,
            OrderKind::Mkt,
            None,
        );
        assert!(result.is_err());

        // 限价单必须有价格
        let result = IbOrder::new(
            "DU12345",
            1001,
            1,
            OrderAction::Buy,
            dec!(1),
            "AAPL",
            None,
            Currency::Usd,
            SecType::Stk,
            OrderKind::Lmt,
            None,
        );
        assert!(result.is_err());

        // perm id 必须为正
        let result = IbOrder::new(
            "DU12345",
            0,
            1,
            OrderAction::Buy,
            dec!(1),
            "AAPL",
            None,
            Currency::Usd,
            SecType::Stk,
            OrderKind::Mkt,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_event_transitions() {
        let mut order = sample_order();

        order.add_event(OrderStatus::Updated, Some(dec!(186.00))).unwrap();
        assert_eq!(order.status, OrderStatus::Updated);
        assert!(order.is_open());

        order.add_event(OrderStatus::Filled, Some(dec!(185.75))).unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.fill_price, Some(dec!(185.75)));
        assert_eq!(order.events.len(), 3);

        // 终态后不再接受事件
        let err = order.add_event(OrderStatus::Cancelled, None).unwrap_err();
        assert!(matches!(err, IbLoggerError::InvalidEvent(_)));
    }

    #[test]
    fn test_fill_requires_price() {
        let mut order = sample_order();

        let err = order.add_event(OrderStatus::Filled, None).unwrap_err();
        assert!(matches!(err, IbLoggerError::InvalidEvent(_)));
        assert_eq!(order.status, OrderStatus::Submitted);
    }

    #[test]
    fn test_status_helpers() {
        assert!(OrderStatus::Submitted.is_open());
        assert!(OrderStatus::Updated.is_open());
        assert!(!OrderStatus::Filled.is_open());
        assert!(OrderStatus::Unknown.is_terminal());
        assert!(!OrderStatus::Updated.is_terminal());
    }
}
