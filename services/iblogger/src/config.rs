use anyhow::Result;
use serde::{Deserialize, Serialize};

/// IB logger 服务主配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IbLoggerConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ib: IbConfig,
    pub heartbeat: HeartbeatConfig,
    pub risk: RiskConfig,
    pub websocket: WebSocketConfig,
    pub monitoring: MonitoringConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

/// IB API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IbConfig {
    pub client_id: i32,
}

/// 心跳配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// 订单失联前允许的失败心跳数
    pub max_fails: i32,
    pub interval_secs: u64,
}

/// 风控配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    pub enabled: bool,
    /// 单账户打开订单数上限，0 表示不限制
    pub max_open_orders_per_account: usize,
}

/// WebSocket配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    pub enabled: bool,
    pub channel_capacity: usize,
    pub ping_interval_secs: u64,
}

/// 监控配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub metrics_path: String,
    pub health_path: String,
}

impl IbLoggerConfig {
    /// 加载配置
    ///
    /// 默认值 < 配置文件 < IBLOGGER__ 前缀的环境变量。
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default(
                "database.url",
                "postgresql://localhost:5432/hanalytics",
            )?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 5)?
            .set_default("database.connect_timeout_secs", 10)?
            .set_default("ib.client_id", 0)?
            .set_default("heartbeat.max_fails", 5)?
            .set_default("heartbeat.interval_secs", 30)?
            .set_default("risk.enabled", true)?
            .set_default("risk.max_open_orders_per_account", 50)?
            .set_default("websocket.enabled", true)?
            .set_default("websocket.channel_capacity", 256)?
            .set_default("websocket.ping_interval_secs", 30)?
            .set_default("monitoring.enabled", true)?
            .set_default("monitoring.metrics_path", "/metrics")?
            .set_default("monitoring.health_path", "/health")?
            .add_source(config::File::with_name("config/iblogger").required(false))
            .add_source(config::Environment::with_prefix("IBLOGGER").separator("__"))
            .build()?;

        let config: IbLoggerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.database.url.is_empty() {
            return Err(anyhow::anyhow!("Database URL is required"));
        }

        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("Database max connections cannot be 0"));
        }

        if self.heartbeat.max_fails <= 0 {
            return Err(anyhow::anyhow!("Heartbeat max fails must be positive"));
        }

        if self.heartbeat.interval_secs == 0 {
            return Err(anyhow::anyhow!("Heartbeat interval cannot be 0"));
        }

        if self.websocket.channel_capacity == 0 {
            return Err(anyhow::anyhow!("WebSocket channel capacity cannot be 0"));
        }

        Ok(())
    }
}

impl Default for IbLoggerConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost:5432/hanalytics".to_string(),
                max_connections: 20,
                min_connections: 5,
                connect_timeout_secs: 10,
            },
            ib: IbConfig { client_id: 0 },
            heartbeat: HeartbeatConfig {
                max_fails: 5,
                interval_secs: 30,
            },
            risk: RiskConfig {
                enabled: true,
                max_open_orders_per_account: 50,
            },
            websocket: WebSocketConfig {
                enabled: true,
                channel_capacity: 256,
                ping_interval_secs: 30,
            },
            monitoring: MonitoringConfig {
                enabled: true,
                metrics_path: "/metrics".to_string(),
                health_path: "/health".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = IbLoggerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.heartbeat.max_fails, 5);
        assert_eq!(config.ib.client_id, 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = IbLoggerConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = IbLoggerConfig::default();
        config.database.url.clear();
        assert!(config.validate().is_err());

        let mut config = IbLoggerConfig::default();
        config.heartbeat.max_fails = 0;
        assert!(config.validate().is_err());
    }
}
