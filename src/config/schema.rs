//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RouterConfig {
    /// Filters wrapping dispatch, outermost first.
    pub filters: Vec<FilterConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// One filter definition.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterConfig {
    /// Regex the whole request id must match. Absent matches any id.
    pub pattern: Option<String>,

    /// Method names the filter applies to. Absent matches any method.
    pub methods: Option<Vec<String>>,

    /// Predicate deciding whether the hooks run.
    pub condition: Option<ScriptConfig>,

    /// Runs before dispatch; may replace the request.
    pub on_request: Option<ScriptConfig>,

    /// Runs after a successful dispatch.
    pub on_response: Option<ScriptConfig>,

    /// Runs after a failed dispatch.
    pub on_failure: Option<ScriptConfig>,
}

/// A script reference.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct ScriptConfig {
    /// Script type (`native`, `literal`, ...).
    #[serde(rename = "type")]
    pub script_type: String,

    /// Registered script name, for `native`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Inline source, for script types that compile source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Yielded value, for `literal`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = RouterConfig::default();
        assert!(config.filters.is_empty());
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_filter_keys_are_camel_case() {
        let config: RouterConfig = serde_json::from_value(json!({
            "filters": [{
                "pattern": "managed/.*",
                "methods": ["create", "update"],
                "onRequest": { "type": "native", "name": "audit" }
            }]
        }))
        .unwrap();

        let filter = &config.filters[0];
        assert_eq!(filter.pattern.as_deref(), Some("managed/.*"));
        assert_eq!(filter.on_request.as_ref().unwrap().name.as_deref(), Some("audit"));
        assert!(filter.condition.is_none());
    }

    #[test]
    fn test_toml_filters() {
        let config: RouterConfig = toml::from_str(
            r#"
            [observability]
            log_level = "debug"

            [[filters]]
            methods = ["read"]

            [filters.condition]
            type = "literal"
            value = true
            "#,
        )
        .unwrap();

        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.filters.len(), 1);
        assert_eq!(config.filters[0].condition.as_ref().unwrap().value, Some(json!(true)));
    }
}
