use crate::models::{Currency, IbLoggerError, IbLoggerResult, OrderStatus, SecType};
use serde::Deserialize;

/// 订单查询过滤条件
///
/// 前端 ibOrders 集合配置了远端过滤，过滤条件以 JSON 数组形式
/// 附在查询参数上，每项为 {"property": ..., "value": ...}。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IbOrderFilter {
    pub status: Option<OrderStatus>,
    pub symbol: Option<String>,
    pub sec_type: Option<SecType>,
    pub currency: Option<Currency>,
}

impl IbOrderFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.symbol.is_none()
            && self.sec_type.is_none()
            && self.currency.is_none()
    }
}

#[derive(Debug, Deserialize)]
struct FilterItem {
    property: String,
    value: serde_json::Value,
}

/// 解析前端过滤参数
///
/// 缺失或空串视为无过滤；未知属性和非法取值拒绝。
pub fn parse_ib_order_filter(json_filter: Option<&str>) -> IbLoggerResult<IbOrderFilter> {
    let json_filter = match json_filter {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(IbOrderFilter::default()),
    };

    let items: Vec<FilterItem> = serde_json::from_str(json_filter)
        .map_err(|e| IbLoggerError::InvalidFilter(format!("Malformed filter: {}", e)))?;

    let mut filter = IbOrderFilter::default();
    for item in items {
        let value = item
            .value
            .as_str()
            .ok_or_else(|| {
                IbLoggerError::InvalidFilter(format!(
                    "Filter value for {} must be a string",
                    item.property
                ))
            })?
            .to_string();

        match item.property.as_str() {
            "status" => {
                filter.status = Some(value.parse::<OrderStatus>().map_err(|e| {
                    IbLoggerError::InvalidFilter(e.to_string())
                })?);
            }
            "symbol" => filter.symbol = Some(value),
            "secType" => {
                filter.sec_type = Some(value.parse::<SecType>().map_err(|e| {
                    IbLoggerError::InvalidFilter(e.to_string())
                })?);
            }
            "currency" => {
                filter.currency = Some(value.parse::<Currency>().map_err(|e| {
                    IbLoggerError::InvalidFilter(e.to_string())
                })?);
            }
            other => {
                return Err(IbLoggerError::InvalidFilter(format!(
                    "Unknown filter property: {}",
                    other
                )));
            }
        }
    }

    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_filter_is_empty() {
        assert!(parse_ib_order_filter(None).unwrap().is_empty());
        assert!(parse_ib_order_filter(Some("")).unwrap().is_empty());
        assert!(parse_ib_order_filter(Some("  ")).unwrap().is_empty());
    }

    #[test]
    fn test_parse_filter_items() {
        let json = r#"[
            {"property": "status", "value": "SUBMITTED"},
            {"property": "symbol", "value": "AAPL"},
            {"property": "secType", "value": "STK"},
            {"property": "currency", "value": "USD"}
        ]"#;

        let filter = parse_ib_order_filter(Some(json)).unwrap();
        assert_eq!(filter.status, Some(OrderStatus::Submitted));
        assert_eq!(filter.symbol.as_deref(), Some("AAPL"));
        assert_eq!(filter.sec_type, Some(SecType::Stk));
        assert_eq!(filter.currency, Some(Currency::Usd));
    }

    #[test]
    fn test_unknown_property_rejected() {
        let json = r#"[{"property": "price", "value": "100"}]"#;
        let err = parse_ib_order_filter(Some(json)).unwrap_err();
        assert!(matches!(err, IbLoggerError::InvalidFilter(message) if message.contains("price")));
    }

    #[test]
    fn test_invalid_value_rejected() {
        let json = r#"[{"property": "status", "value": "PENDING"}]"#;
        assert!(parse_ib_order_filter(Some(json)).is_err());

        let json = r#"[{"property": "symbol", "value": 42}]"#;
        assert!(parse_ib_order_filter(Some(json)).is_err());

        assert!(parse_ib_order_filter(Some("not json")).is_err());
    }
}
