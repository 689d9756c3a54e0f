use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    /// 无类型字段，消费方原样接收
    Auto,
}

/// 记录模式中的单个字段定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldDef {
    pub fn new(name: &str, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required,
        }
    }
}

/// 记录模式，描述一个数据模型的字段集合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSchema {
    pub name: String,
    pub version: u32,
    pub fields: Vec<FieldDef>,
}

impl ModelSchema {
    pub fn new(name: &str, version: u32) -> Self {
        Self {
            name: name.to_string(),
            version,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: &str, kind: FieldKind, required: bool) -> Self {
        self.fields.push(FieldDef::new(name, kind, required));
        self
    }

    /// 按名称查找字段定义
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// 模式注册表错误
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("duplicate schema: {0}")]
    Duplicate(String),

    #[error("schema not found: {0}")]
    NotFound(String),
}

/// 模式注册表
///
/// 启动时注册所有记录模式，之后只读。视图模型描述符在注册时
/// 通过 `contains` 校验其 `modelName` 引用。
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, ModelSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个模式，名称重复时失败
    pub fn register(&mut self, schema: ModelSchema) -> Result<(), SchemaError> {
        if self.schemas.contains_key(&schema.name) {
            return Err(SchemaError::Duplicate(schema.name));
        }
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// 按名称解析模式
    pub fn resolve(&self, name: &str) -> Result<&ModelSchema, SchemaError> {
        self.schemas
            .get(name)
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// 已注册的模式名称，排序后返回
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// 构建默认注册表，包含 IB logger 面板用到的三个记录模式
pub fn default_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();

    let ib_order = ModelSchema::new("IbOrder", 1)
        .with_field("id", FieldKind::String, true)
        .with_field("accountId", FieldKind::String, true)
        .with_field("permId", FieldKind::Integer, true)
        .with_field("orderId", FieldKind::Integer, true)
        .with_field("action", FieldKind::String, true)
        .with_field("quantity", FieldKind::Decimal, true)
        .with_field("symbol", FieldKind::String, true)
        .with_field("underlying", FieldKind::String, false)
        .with_field("currency", FieldKind::String, true)
        .with_field("secType", FieldKind::String, true)
        .with_field("orderKind", FieldKind::String, true)
        .with_field("orderPrice", FieldKind::Decimal, false)
        .with_field("fillPrice", FieldKind::Decimal, false)
        .with_field("status", FieldKind::String, true)
        .with_field("heartbeatCount", FieldKind::Integer, false)
        .with_field("events", FieldKind::Auto, false)
        .with_field("createdAt", FieldKind::DateTime, true)
        .with_field("updatedAt", FieldKind::DateTime, true);

    let position = ModelSchema::new("Position", 1)
        .with_field("accountId", FieldKind::String, true)
        .with_field("conid", FieldKind::Integer, false)
        .with_field("symbol", FieldKind::String, true)
        .with_field("underlying", FieldKind::String, false)
        .with_field("currency", FieldKind::String, true)
        .with_field("secType", FieldKind::String, true)
        .with_field("size", FieldKind::Decimal, true)
        .with_field("avgPrice", FieldKind::Decimal, true)
        .with_field("updatedAt", FieldKind::DateTime, true);

    let ib_account = ModelSchema::new("IbAccount", 1)
        .with_field("accountId", FieldKind::String, true)
        .with_field("host", FieldKind::String, true)
        .with_field("port", FieldKind::Integer, true)
        .with_field("permitted", FieldKind::Boolean, true)
        .with_field("ibConnection", FieldKind::Auto, false)
        .with_field("createdAt", FieldKind::DateTime, true)
        .with_field("updatedAt", FieldKind::DateTime, true);

    // 三个模式名称互不相同，注册不会失败
    let mut register = |schema: ModelSchema| {
        registry
            .register(schema)
            .expect("default schemas are unique");
    };
    register(ib_order);
    register(position);
    register(ib_account);

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = SchemaRegistry::new();
        let schema = ModelSchema::new("IbOrder", 1).with_field("permId", FieldKind::Integer, true);

        registry.register(schema).unwrap();

        let resolved = registry.resolve("IbOrder").unwrap();
        assert_eq!(resolved.version, 1);
        assert!(resolved.field("permId").is_some());
        assert!(resolved.field("missing").is_none());
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = SchemaRegistry::new();
        registry.register(ModelSchema::new("Position", 1)).unwrap();

        let err = registry.register(ModelSchema::new("Position", 2)).unwrap_err();
        assert!(matches!(err, SchemaError::Duplicate(name) if name == "Position"));
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let registry = SchemaRegistry::new();
        let err = registry.resolve("Unknown").unwrap_err();
        assert!(matches!(err, SchemaError::NotFound(name) if name == "Unknown"));
    }

    #[test]
    fn test_default_registry_models() {
        let registry = default_registry();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["IbAccount", "IbOrder", "Position"]);
        assert!(registry.contains("IbOrder"));

        let order = registry.resolve("IbOrder").unwrap();
        assert!(order.field("permId").unwrap().required);
        assert!(!order.field("heartbeatCount").unwrap().required);
    }
}
