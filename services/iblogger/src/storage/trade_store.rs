use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::models::{Currency, IbLoggerError, IbLoggerResult, SecType};
use crate::report::Trade;

/// 交易存储
///
/// 报表模块只读：交易由上游的订单跟踪流程生成。
#[derive(Clone)]
pub struct TradeStore {
    pool: Arc<PgPool>,
}

impl TradeStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 按可选条件查询交易，按开仓时间排序
    pub async fn list_trades(
        &self,
        sec_type: Option<SecType>,
        currency: Option<Currency>,
        underlying: Option<&str>,
    ) -> IbLoggerResult<Vec<Trade>> {
        let mut query = "SELECT * FROM trades WHERE 1 = 1".to_string();
        let mut param_count = 0;

        if sec_type.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND sec_type = ${}", param_count));
        }
        if currency.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND currency = ${}", param_count));
        }
        if underlying.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND underlying = ${}", param_count));
        }

        query.push_str(" ORDER BY open_date");

        let mut sql_query = sqlx::query(&query);
        if let Some(sec_type) = sec_type {
            sql_query = sql_query.bind(sec_type.to_string());
        }
        if let Some(currency) = currency {
            sql_query = sql_query.bind(currency.to_string());
        }
        if let Some(underlying) = underlying {
            sql_query = sql_query.bind(underlying.to_string());
        }

        let rows = sql_query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| IbLoggerError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(|row| self.row_to_trade(row)).collect()
    }

    fn row_to_trade(&self, row: sqlx::postgres::PgRow) -> IbLoggerResult<Trade> {
        let trade_type_str: String = row.get("trade_type");
        let trade_type = trade_type_str
            .parse()
            .map_err(|e| IbLoggerError::DatabaseError(format!("Invalid trade type: {}", e)))?;

        let currency_str: String = row.get("currency");
        let currency = currency_str
            .parse()
            .map_err(|e| IbLoggerError::DatabaseError(format!("Invalid currency: {}", e)))?;

        let sec_type_str: String = row.get("sec_type");
        let sec_type = sec_type_str
            .parse()
            .map_err(|e| IbLoggerError::DatabaseError(format!("Invalid sec type: {}", e)))?;

        let executions_json: serde_json::Value = row.get("executions");
        let executions = serde_json::from_value(executions_json)
            .map_err(|e| IbLoggerError::DatabaseError(format!("Invalid executions: {}", e)))?;

        Ok(Trade {
            id: row.get("id"),
            trade_type,
            symbol: row.get("symbol"),
            underlying: row.get("underlying"),
            currency,
            sec_type,
            open_date: row.get("open_date"),
            close_date: row.get("close_date"),
            executions,
            profit_loss: row.get("profit_loss"),
        })
    }
}
