pub mod registry;

pub use registry::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 单个数据集合的分页/过滤/排序配置
///
/// 字段名与前端视图模型配置保持一致（camelCase），`remoteFilter` 与
/// `remoteSort` 省略时默认为本地处理。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSpec {
    pub model_name: String,
    pub autoload: bool,
    pub page_size: u32,
    #[serde(default)]
    pub remote_filter: bool,
    #[serde(default)]
    pub remote_sort: bool,
}

impl StoreSpec {
    pub fn new(model_name: &str, page_size: u32) -> Self {
        Self {
            model_name: model_name.to_string(),
            autoload: true,
            page_size,
            remote_filter: false,
            remote_sort: false,
        }
    }

    pub fn with_autoload(mut self, autoload: bool) -> Self {
        self.autoload = autoload;
        self
    }

    pub fn with_remote_filter(mut self, remote_filter: bool) -> Self {
        self.remote_filter = remote_filter;
        self
    }

    pub fn with_remote_sort(mut self, remote_sort: bool) -> Self {
        self.remote_sort = remote_sort;
        self
    }
}

/// 视图模型描述符
///
/// 声明一个面板需要的命名数据集合。启动时构建一次，之后只读；
/// 运行期的数据加载由消费方的前端框架负责。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDescriptor {
    pub alias: String,
    pub stores: HashMap<String, StoreSpec>,
}

impl ViewDescriptor {
    pub fn new(alias: &str) -> Self {
        Self {
            alias: alias.to_string(),
            stores: HashMap::new(),
        }
    }

    pub fn with_store(mut self, name: &str, spec: StoreSpec) -> Self {
        self.stores.insert(name.to_string(), spec);
        self
    }

    pub fn store(&self, name: &str) -> Option<&StoreSpec> {
        self.stores.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_spec_builder() {
        let spec = StoreSpec::new("IbOrder", 25)
            .with_remote_filter(true)
            .with_remote_sort(false);

        assert_eq!(spec.model_name, "IbOrder");
        assert!(spec.autoload);
        assert_eq!(spec.page_size, 25);
        assert!(spec.remote_filter);
        assert!(!spec.remote_sort);
    }

    #[test]
    fn test_remote_flags_default_to_false() {
        // 前端配置省略 remoteFilter/remoteSort 时默认为本地处理
        let json = r#"{"modelName": "Position", "autoload": true, "pageSize": 25}"#;
        let spec: StoreSpec = serde_json::from_str(json).unwrap();

        assert!(!spec.remote_filter);
        assert!(!spec.remote_sort);
        assert_eq!(spec.page_size, 25);
    }

    #[test]
    fn test_descriptor_stores() {
        let descriptor = ViewDescriptor::new("han-test")
            .with_store("ibOrders", StoreSpec::new("IbOrder", 25))
            .with_store("ibAccounts", StoreSpec::new("IbAccount", 10));

        assert_eq!(descriptor.stores.len(), 2);
        assert_eq!(descriptor.store("ibOrders").unwrap().page_size, 25);
        assert!(descriptor.store("missing").is_none());
    }
}
