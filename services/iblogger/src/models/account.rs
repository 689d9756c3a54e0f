use super::Timestamp;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// IB API 连接状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "CONNECTED"),
            ConnectionState::Disconnected => write!(f, "DISCONNECTED"),
        }
    }
}

/// 账户对应的 IB API 连接信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IbConnection {
    pub account_id: String,
    pub host: String,
    pub port: u16,
    pub client_id: i32,
    pub state: ConnectionState,
    pub last_connect_attempt: Option<Timestamp>,
}

impl IbConnection {
    pub fn new(account_id: &str, host: &str, port: u16, client_id: i32) -> Self {
        Self {
            account_id: account_id.to_string(),
            host: host.to_string(),
            port,
            client_id,
            state: ConnectionState::Disconnected,
            last_connect_attempt: None,
        }
    }

    pub fn mark_connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.last_connect_attempt = Some(Utc::now());
    }

    pub fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }
}

/// IB 账户
///
/// 账户本身是静态配置，`ib_connection` 在返回给前端前由连接管理器
/// 填充，不落库。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IbAccount {
    pub account_id: String,
    pub host: String,
    pub port: u16,
    pub permitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ib_connection: Option<IbConnection>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl IbAccount {
    pub fn new(account_id: &str, host: &str, port: u16) -> Self {
        let now = Utc::now();
        Self {
            account_id: account_id.to_string(),
            host: host.to_string(),
            port,
            permitted: true,
            ib_connection: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_connection(&mut self, connection: Option<IbConnection>) {
        self.ib_connection = connection;
    }
}
