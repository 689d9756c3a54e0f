use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// 应用指标
///
/// 所有计数器注册在同一个 registry 上，由 /metrics 端点导出。
pub struct AppMetrics {
    registry: Registry,
    pub orders_logged: IntCounter,
    pub order_events: IntCounter,
    pub orders_unknown: IntCounter,
    pub statistics_calculated: IntCounter,
    pub ws_connections: IntGauge,
}

impl AppMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let orders_logged = IntCounter::new(
            "iblogger_orders_logged_total",
            "Total number of orders logged",
        )?;
        let order_events = IntCounter::new(
            "iblogger_order_events_total",
            "Total number of order events applied",
        )?;
        let orders_unknown = IntCounter::new(
            "iblogger_orders_unknown_total",
            "Total number of orders moved to UNKNOWN by heartbeat control",
        )?;
        let statistics_calculated = IntCounter::new(
            "iblogger_statistics_calculated_total",
            "Total number of statistics calculations performed",
        )?;
        let ws_connections = IntGauge::new(
            "iblogger_ws_connections",
            "Number of active WebSocket connections",
        )?;

        registry.register(Box::new(orders_logged.clone()))?;
        registry.register(Box::new(order_events.clone()))?;
        registry.register(Box::new(orders_unknown.clone()))?;
        registry.register(Box::new(statistics_calculated.clone()))?;
        registry.register(Box::new(ws_connections.clone()))?;

        Ok(Self {
            registry,
            orders_logged,
            order_events,
            orders_unknown,
            statistics_calculated,
            ws_connections,
        })
    }

    /// 导出 Prometheus 文本格式
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_gather() {
        let metrics = AppMetrics::new().unwrap();

        metrics.orders_logged.inc();
        metrics.ws_connections.set(2);

        let output = metrics.gather().unwrap();
        assert!(output.contains("iblogger_orders_logged_total 1"));
        assert!(output.contains("iblogger_ws_connections 2"));
    }
}
