use super::{StoreSpec, ViewDescriptor};
use han_models::SchemaRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 视图模型配置错误
///
/// 全部是启动期配置错误，不重试。
#[derive(Debug, thiserror::Error)]
pub enum ViewModelError {
    #[error("Duplicate view-model alias: {0}")]
    DuplicateAlias(String),

    #[error("View-model not found: {0}")]
    NotFound(String),

    #[error("Invalid store spec: {0}")]
    InvalidSpec(String),
}

/// 视图模型注册表
///
/// 按别名持有视图模型描述符。注册时校验每个 store 的分页配置和
/// 模型引用，之后只读，供前端在打开面板时解析。
pub struct ViewModelRegistry {
    schemas: Arc<SchemaRegistry>,
    descriptors: HashMap<String, ViewDescriptor>,
}

impl ViewModelRegistry {
    pub fn new(schemas: Arc<SchemaRegistry>) -> Self {
        Self {
            schemas,
            descriptors: HashMap::new(),
        }
    }

    /// 创建注册表并注册内置描述符
    pub fn with_defaults(schemas: Arc<SchemaRegistry>) -> Result<Self, ViewModelError> {
        let mut registry = Self::new(schemas);
        registry.register(han_iblogger_descriptor())?;
        Ok(registry)
    }

    /// 注册描述符
    ///
    /// 别名冲突、非法分页或未注册的模型引用都会失败。
    pub fn register(&mut self, descriptor: ViewDescriptor) -> Result<(), ViewModelError> {
        if descriptor.alias.is_empty() {
            return Err(ViewModelError::InvalidSpec(
                "View-model alias must not be empty".to_string(),
            ));
        }

        if self.descriptors.contains_key(&descriptor.alias) {
            return Err(ViewModelError::DuplicateAlias(descriptor.alias));
        }

        for (store_name, spec) in &descriptor.stores {
            self.validate_spec(&descriptor.alias, store_name, spec)?;
        }

        info!(
            "View-model registered: {} ({} stores)",
            descriptor.alias,
            descriptor.stores.len()
        );
        self.descriptors.insert(descriptor.alias.clone(), descriptor);
        Ok(())
    }

    /// 按别名解析描述符
    pub fn resolve(&self, alias: &str) -> Result<&ViewDescriptor, ViewModelError> {
        self.descriptors
            .get(alias)
            .ok_or_else(|| ViewModelError::NotFound(alias.to_string()))
    }

    /// 已注册的别名，排序后返回
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    fn validate_spec(
        &self,
        alias: &str,
        store_name: &str,
        spec: &StoreSpec,
    ) -> Result<(), ViewModelError> {
        if spec.page_size == 0 {
            return Err(ViewModelError::InvalidSpec(format!(
                "Store {} in view-model {}: page size must be positive",
                store_name, alias
            )));
        }

        if !self.schemas.contains(&spec.model_name) {
            return Err(ViewModelError::InvalidSpec(format!(
                "Store {} in view-model {}: unknown model {}",
                store_name, alias, spec.model_name
            )));
        }

        Ok(())
    }
}

/// IB logger 面板的内置视图模型
///
/// 订单集合走远端过滤（过滤条件发给后端），持仓和账户集合数据量小，
/// 在本地过滤排序。
pub fn han_iblogger_descriptor() -> ViewDescriptor {
    ViewDescriptor::new("han-iblogger")
        .with_store(
            "ibOrders",
            StoreSpec::new("IbOrder", 25)
                .with_remote_filter(true)
                .with_remote_sort(false),
        )
        .with_store("positions", StoreSpec::new("Position", 25))
        .with_store("ibAccounts", StoreSpec::new("IbAccount", 10))
}

#[cfg(test)]
mod tests {
    use super::*;
    use han_models::default_registry;

    fn registry() -> ViewModelRegistry {
        ViewModelRegistry::new(Arc::new(default_registry()))
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = registry();
        registry.register(han_iblogger_descriptor()).unwrap();

        let descriptor = registry.resolve("han-iblogger").unwrap();
        assert_eq!(descriptor.alias, "han-iblogger");
        assert_eq!(registry.aliases(), vec!["han-iblogger"]);
    }

    #[test]
    fn test_duplicate_alias_fails() {
        let mut registry = registry();
        registry.register(han_iblogger_descriptor()).unwrap();

        let err = registry.register(han_iblogger_descriptor()).unwrap_err();
        assert!(matches!(err, ViewModelError::DuplicateAlias(alias) if alias == "han-iblogger"));
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let registry = registry();
        let err = registry.resolve("han-report").unwrap_err();
        assert!(matches!(err, ViewModelError::NotFound(alias) if alias == "han-report"));
    }

    #[test]
    fn test_zero_page_size_fails() {
        let mut registry = registry();
        let descriptor =
            ViewDescriptor::new("han-broken").with_store("ibOrders", StoreSpec::new("IbOrder", 0));

        let err = registry.register(descriptor).unwrap_err();
        assert!(matches!(err, ViewModelError::InvalidSpec(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unknown_model_fails() {
        let mut registry = registry();
        let descriptor =
            ViewDescriptor::new("han-broken").with_store("trades", StoreSpec::new("Trade", 25));

        let err = registry.register(descriptor).unwrap_err();
        assert!(matches!(err, ViewModelError::InvalidSpec(message) if message.contains("Trade")));
    }

    #[test]
    fn test_builtin_descriptor_values() {
        let registry = ViewModelRegistry::with_defaults(Arc::new(default_registry())).unwrap();
        let descriptor = registry.resolve("han-iblogger").unwrap();

        assert_eq!(descriptor.stores.len(), 3);

        let ib_orders = descriptor.store("ibOrders").unwrap();
        assert_eq!(ib_orders.model_name, "IbOrder");
        assert!(ib_orders.autoload);
        assert_eq!(ib_orders.page_size, 25);
        assert!(ib_orders.remote_filter);
        assert!(!ib_orders.remote_sort);

        let positions = descriptor.store("positions").unwrap();
        assert_eq!(positions.model_name, "Position");
        assert!(positions.autoload);
        assert_eq!(positions.page_size, 25);
        assert!(!positions.remote_filter);
        assert!(!positions.remote_sort);

        let ib_accounts = descriptor.store("ibAccounts").unwrap();
        assert_eq!(ib_accounts.model_name, "IbAccount");
        assert!(ib_accounts.autoload);
        assert_eq!(ib_accounts.page_size, 10);
        assert!(!ib_accounts.remote_filter);
        assert!(!ib_accounts.remote_sort);
    }
}
