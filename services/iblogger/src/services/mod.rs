pub mod account_service;
pub mod connection;
pub mod heartbeat;
pub mod order_service;
pub mod risk_monitor;

pub use account_service::AccountService;
pub use connection::IbConnectionManager;
pub use heartbeat::HeartbeatControl;
pub use order_service::OrderService;
pub use risk_monitor::RiskMonitor;
