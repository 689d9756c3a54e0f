use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 事件消息包装器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage<T> {
    pub id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub source: String,
    pub event_type: String,
    pub version: String,
    pub data: T,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl<T> EventMessage<T> {
    pub fn new(event_type: &str, source: &str, data: T) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now(),
            source: source.to_string(),
            event_type: event_type.to_string(),
            version: "1.0".to_string(),
            data,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }
}

/// 总线消息：主题 + 事件内容
///
/// 在服务内部的 broadcast 通道上传递，WebSocket 端按主题转发。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusEvent {
    pub topic: String,
    pub message: EventMessage<serde_json::Value>,
}

impl BusEvent {
    pub fn new(topic: &str, message: EventMessage<serde_json::Value>) -> Self {
        Self {
            topic: topic.to_string(),
            message,
        }
    }
}

/// 主题定义
pub struct Topics;

impl Topics {
    /// 订单跟踪推送
    pub const ORDTRACK: &'static str = "ordtrack";
    /// 风控告警
    pub const RISKMGT: &'static str = "riskmgt";
    /// 报表计算完成通知
    pub const REPORT: &'static str = "report";

    pub const ALL: [&'static str; 3] = [Self::ORDTRACK, Self::RISKMGT, Self::REPORT];

    pub fn is_valid(topic: &str) -> bool {
        Self::ALL.contains(&topic)
    }
}

/// 事件类型定义
pub struct EventTypes;

impl EventTypes {
    pub const ORDER_CREATED: &'static str = "order.created";
    pub const ORDER_UPDATED: &'static str = "order.updated";
    pub const ORDER_UNKNOWN: &'static str = "order.unknown";
    pub const RISK_ALERT: &'static str = "risk.alert";
    pub const STATISTICS_CALCULATED: &'static str = "statistics.calculated";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_message_builder() {
        let message = EventMessage::new(EventTypes::ORDER_CREATED, "iblogger", 42u32)
            .with_metadata("accountId", serde_json::json!("DU12345"))
            .with_version("1.1");

        assert_eq!(message.event_type, "order.created");
        assert_eq!(message.source, "iblogger");
        assert_eq!(message.version, "1.1");
        assert_eq!(message.data, 42);
        assert_eq!(
            message.metadata.get("accountId"),
            Some(&serde_json::json!("DU12345"))
        );
    }

    #[test]
    fn test_topic_validation() {
        assert!(Topics::is_valid("ordtrack"));
        assert!(Topics::is_valid("riskmgt"));
        assert!(Topics::is_valid("report"));
        assert!(!Topics::is_valid("market"));
    }
}
