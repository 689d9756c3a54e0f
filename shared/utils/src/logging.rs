use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// 日志初始化
///
/// 服务启动时调用一次，重复初始化视为错误。过滤级别优先读取
/// RUST_LOG 环境变量。
pub struct LoggingInitializer;

impl LoggingInitializer {
    /// 生产环境初始化，默认 info 级别
    pub fn init() -> Result<()> {
        Self::init_with_default("info")
    }

    /// 开发环境初始化，默认 debug 级别
    pub fn init_dev() -> Result<()> {
        Self::init_with_default("debug")
    }

    fn init_with_default(default_filter: &str) -> Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

        Ok(())
    }
}
