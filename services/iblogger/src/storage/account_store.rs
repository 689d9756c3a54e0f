use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::models::{IbAccount, IbLoggerError, IbLoggerResult};

/// 账户存储
#[derive(Clone)]
pub struct AccountStore {
    pool: Arc<PgPool>,
}

impl AccountStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 按账户ID查询
    pub async fn find(&self, account_id: &str) -> IbLoggerResult<Option<IbAccount>> {
        let query = r#"
            SELECT * FROM ib_accounts WHERE account_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(account_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| IbLoggerError::DatabaseError(e.to_string()))?;

        row.map(|row| self.row_to_account(row)).transpose()
    }

    /// 所有账户，按 TWS 端口排序
    pub async fn list(&self) -> IbLoggerResult<Vec<IbAccount>> {
        let query = r#"
            SELECT * FROM ib_accounts ORDER BY port
        "#;

        let rows = sqlx::query(query)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| IbLoggerError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(|row| self.row_to_account(row)).collect()
    }

    /// 更新账户配置
    pub async fn update(&self, account: &IbAccount) -> IbLoggerResult<()> {
        let query = r#"
            UPDATE ib_accounts SET
                host = $2, port = $3, permitted = $4, updated_at = $5
            WHERE account_id = $1
        "#;

        let result = sqlx::query(query)
            .bind(&account.account_id)
            .bind(&account.host)
            .bind(account.port as i32)
            .bind(account.permitted)
            .bind(account.updated_at)
            .execute(&*self.pool)
            .await
            .map_err(|e| IbLoggerError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(IbLoggerError::AccountNotFound(account.account_id.clone()));
        }

        Ok(())
    }

    fn row_to_account(&self, row: sqlx::postgres::PgRow) -> IbLoggerResult<IbAccount> {
        let port: i32 = row.get("port");

        Ok(IbAccount {
            account_id: row.get("account_id"),
            host: row.get("host"),
            port: port as u16,
            permitted: row.get("permitted"),
            ib_connection: None,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}
