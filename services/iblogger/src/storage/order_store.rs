use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::filter::IbOrderFilter;
use crate::models::{IbLoggerError, IbLoggerResult, IbOrder};

/// 订单存储
#[derive(Clone)]
pub struct OrderStore {
    pool: Arc<PgPool>,
}

impl OrderStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 写入新订单
    pub async fn create_order(&self, order: &IbOrder) -> IbLoggerResult<()> {
        let query = r#"
            INSERT INTO ib_orders (
                id, account_id, perm_id, order_id, action, quantity, symbol,
                underlying, currency, sec_type, order_kind, order_price,
                fill_price, status, events, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17
            )
        "#;

        sqlx::query(query)
            .bind(order.id)
            .bind(&order.account_id)
            .bind(order.perm_id)
            .bind(order.order_id)
            .bind(order.action.to_string())
            .bind(order.quantity)
            .bind(&order.symbol)
            .bind(&order.underlying)
            .bind(order.currency.to_string())
            .bind(order.sec_type.to_string())
            .bind(order.order_kind.to_string())
            .bind(order.order_price)
            .bind(order.fill_price)
            .bind(order.status.to_string())
            .bind(
                serde_json::to_value(&order.events)
                    .map_err(|e| IbLoggerError::DatabaseError(e.to_string()))?,
            )
            .bind(order.created_at)
            .bind(order.updated_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| IbLoggerError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// 更新订单状态、成交价和事件历史
    pub async fn update_order(&self, order: &IbOrder) -> IbLoggerResult<()> {
        let query = r#"
            UPDATE ib_orders SET
                status = $2, fill_price = $3, events = $4, updated_at = $5
            WHERE id = $1
        "#;

        let result = sqlx::query(query)
            .bind(order.id)
            .bind(order.status.to_string())
            .bind(order.fill_price)
            .bind(
                serde_json::to_value(&order.events)
                    .map_err(|e| IbLoggerError::DatabaseError(e.to_string()))?,
            )
            .bind(order.updated_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| IbLoggerError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(IbLoggerError::OrderNotFound(order.id.to_string()));
        }

        Ok(())
    }

    /// 按账户和 perm id 查询订单
    pub async fn find_by_perm_id(
        &self,
        account_id: &str,
        perm_id: i64,
    ) -> IbLoggerResult<Option<IbOrder>> {
        let query = r#"
            SELECT * FROM ib_orders WHERE account_id = $1 AND perm_id = $2
        "#;

        let row = sqlx::query(query)
            .bind(account_id)
            .bind(perm_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| IbLoggerError::DatabaseError(e.to_string()))?;

        row.map(|row| self.row_to_order(row)).transpose()
    }

    /// 账户的打开订单（SUBMITTED/UPDATED）
    pub async fn open_orders(&self, account_id: &str) -> IbLoggerResult<Vec<IbOrder>> {
        let query = r#"
            SELECT * FROM ib_orders
            WHERE account_id = $1 AND status IN ('SUBMITTED', 'UPDATED')
            ORDER BY created_at DESC
        "#;

        let rows = sqlx::query(query)
            .bind(account_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| IbLoggerError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(|row| self.row_to_order(row)).collect()
    }

    /// 过滤 + 分页查询
    pub async fn list_filtered(
        &self,
        account_id: &str,
        filter: &IbOrderFilter,
        start: i64,
        limit: i64,
    ) -> IbLoggerResult<Vec<IbOrder>> {
        let (mut query, param_count) = Self::filtered_query_base(
            "SELECT * FROM ib_orders WHERE account_id = $1",
            filter,
        );

        query.push_str(" ORDER BY created_at DESC");
        query.push_str(&format!(" LIMIT ${}", param_count + 1));
        query.push_str(&format!(" OFFSET ${}", param_count + 2));

        let mut sql_query = sqlx::query(&query).bind(account_id);
        sql_query = Self::bind_filter(sql_query, filter);
        sql_query = sql_query.bind(limit).bind(start);

        let rows = sql_query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| IbLoggerError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(|row| self.row_to_order(row)).collect()
    }

    /// 过滤结果总数，供前端分页器使用
    pub async fn count_filtered(
        &self,
        account_id: &str,
        filter: &IbOrderFilter,
    ) -> IbLoggerResult<i64> {
        let (query, _) = Self::filtered_query_base(
            "SELECT COUNT(*) AS total FROM ib_orders WHERE account_id = $1",
            filter,
        );

        let mut sql_query = sqlx::query(&query).bind(account_id);
        sql_query = Self::bind_filter(sql_query, filter);

        let row = sql_query
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| IbLoggerError::DatabaseError(e.to_string()))?;

        Ok(row.get("total"))
    }

    fn filtered_query_base(base: &str, filter: &IbOrderFilter) -> (String, usize) {
        let mut query = base.to_string();
        let mut param_count = 1;

        if filter.status.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND status = ${}", param_count));
        }
        if filter.symbol.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND symbol = ${}", param_count));
        }
        if filter.sec_type.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND sec_type = ${}", param_count));
        }
        if filter.currency.is_some() {
            param_count += 1;
            query.push_str(&format!(" AND currency = ${}", param_count));
        }

        (query, param_count)
    }

    fn bind_filter<'q>(
        mut sql_query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
        filter: &IbOrderFilter,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
        if let Some(status) = filter.status {
            sql_query = sql_query.bind(status.to_string());
        }
        if let Some(symbol) = filter.symbol.clone() {
            sql_query = sql_query.bind(symbol);
        }
        if let Some(sec_type) = filter.sec_type {
            sql_query = sql_query.bind(sec_type.to_string());
        }
        if let Some(currency) = filter.currency {
            sql_query = sql_query.bind(currency.to_string());
        }
        sql_query
    }

    /// 将数据库行转换为订单对象
    fn row_to_order(&self, row: sqlx::postgres::PgRow) -> IbLoggerResult<IbOrder> {
        let action_str: String = row.get("action");
        let action = action_str
            .parse()
            .map_err(|e| IbLoggerError::DatabaseError(format!("Invalid action: {}", e)))?;

        let currency_str: String = row.get("currency");
        let currency = currency_str
            .parse()
            .map_err(|e| IbLoggerError::DatabaseError(format!("Invalid currency: {}", e)))?;

        let sec_type_str: String = row.get("sec_type");
        let sec_type = sec_type_str
            .parse()
            .map_err(|e| IbLoggerError::DatabaseError(format!("Invalid sec type: {}", e)))?;

        let order_kind_str: String = row.get("order_kind");
        let order_kind = order_kind_str
            .parse()
            .map_err(|e| IbLoggerError::DatabaseError(format!("Invalid order kind: {}", e)))?;

        let status_str: String = row.get("status");
        let status = status_str
            .parse()
            .map_err(|e| IbLoggerError::DatabaseError(format!("Invalid status: {}", e)))?;

        let events_json: serde_json::Value = row.get("events");
        let events = serde_json::from_value(events_json)
            .map_err(|e| IbLoggerError::DatabaseError(format!("Invalid events: {}", e)))?;

        Ok(IbOrder {
            id: row.get("id"),
            account_id: row.get("account_id"),
            perm_id: row.get("perm_id"),
            order_id: row.get("order_id"),
            action,
            quantity: row.get("quantity"),
            symbol: row.get("symbol"),
            underlying: row.get("underlying"),
            currency,
            sec_type,
            order_kind,
            order_price: row.get("order_price"),
            fill_price: row.get("fill_price"),
            status,
            heartbeat_count: None,
            events,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
