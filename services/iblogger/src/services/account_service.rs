use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::{
    models::{IbAccount, IbLoggerResult},
    services::IbConnectionManager,
    storage::AccountStore,
};

/// 账户服务
#[derive(Clone)]
pub struct AccountService {
    account_store: Arc<AccountStore>,
    connections: Arc<IbConnectionManager>,
}

impl AccountService {
    pub fn new(account_store: Arc<AccountStore>, connections: Arc<IbConnectionManager>) -> Self {
        Self {
            account_store,
            connections,
        }
    }

    /// 所有账户，带实时连接信息
    pub async fn list_accounts(&self) -> IbLoggerResult<Vec<IbAccount>> {
        let mut accounts = self.account_store.list().await?;
        for account in accounts.iter_mut() {
            account.set_connection(self.connections.connection(&account.account_id));
        }
        Ok(accounts)
    }

    /// 单个账户，带实时连接信息
    pub async fn find_account(&self, account_id: &str) -> IbLoggerResult<Option<IbAccount>> {
        let mut account = self.account_store.find(account_id).await?;
        if let Some(account) = account.as_mut() {
            account.set_connection(self.connections.connection(account_id));
        }
        Ok(account)
    }

    /// 更新账户配置
    ///
    /// 账户不存在时返回 None，由调用方转换为 404。
    pub async fn update_account(
        &self,
        mut account: IbAccount,
    ) -> IbLoggerResult<Option<IbAccount>> {
        if self.account_store.find(&account.account_id).await?.is_none() {
            return Ok(None);
        }

        account.updated_at = Utc::now();
        self.account_store.update(&account).await?;
        info!("Account updated: {}", account.account_id);

        self.find_account(&account.account_id).await
    }

    /// 建立或断开账户的 IB 连接，返回刷新后的账户
    pub async fn set_connected(
        &self,
        account_id: &str,
        connect: bool,
    ) -> IbLoggerResult<Option<IbAccount>> {
        if self.account_store.find(account_id).await?.is_none() {
            return Ok(None);
        }

        if connect {
            self.connections.connect(account_id);
        } else {
            self.connections.disconnect(account_id);
        }

        self.find_account(account_id).await
    }
}
