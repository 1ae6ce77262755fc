//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that id patterns compile and method names are known
//! - Check that script definitions carry what their type needs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Whether a `native` script name is registered is checked when the chain is built

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::config::schema::{FilterConfig, RouterConfig, ScriptConfig};
use crate::resource::Method;
use crate::script::registry::{LITERAL_TYPE, NATIVE_TYPE};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Location of the offending value, e.g. `/filters/2/pattern`.
    pub pointer: String,
    pub message: String,
}

impl ValidationError {
    fn new(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pointer, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = match validate_filters(&config.filters) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "/observability/metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate only the filter section. Used when the chain is rebuilt,
/// which never touches the observability settings.
pub fn validate_filters(filters: &[FilterConfig]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    for (index, filter) in filters.iter().enumerate() {
        validate_filter(&format!("/filters/{}", index), filter, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_filter(pointer: &str, filter: &FilterConfig, errors: &mut Vec<ValidationError>) {
    if let Some(pattern) = &filter.pattern {
        if let Err(e) = Regex::new(pattern) {
            errors.push(ValidationError::new(format!("{}/pattern", pointer), e.to_string()));
        }
    }

    if let Some(methods) = &filter.methods {
        for (i, method) in methods.iter().enumerate() {
            if Method::from_str(method).is_err() {
                errors.push(ValidationError::new(
                    format!("{}/methods/{}", pointer, i),
                    format!("unknown method '{}'", method),
                ));
            }
        }
    }

    let hooks = [
        ("condition", &filter.condition),
        ("onRequest", &filter.on_request),
        ("onResponse", &filter.on_response),
        ("onFailure", &filter.on_failure),
    ];
    for (name, script) in hooks {
        if let Some(script) = script {
            validate_script(&format!("{}/{}", pointer, name), script, errors);
        }
    }
}

fn validate_script(pointer: &str, script: &ScriptConfig, errors: &mut Vec<ValidationError>) {
    match script.script_type.as_str() {
        "" => errors.push(ValidationError::new(pointer, "script type is required")),
        NATIVE_TYPE if script.name.as_deref().map_or(true, str::is_empty) => {
            errors.push(ValidationError::new(pointer, "native script requires a name"))
        }
        LITERAL_TYPE if script.value.is_none() => {
            errors.push(ValidationError::new(pointer, "literal script requires a value"))
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(pattern: Option<&str>, methods: Option<Vec<&str>>) -> FilterConfig {
        FilterConfig {
            pattern: pattern.map(String::from),
            methods: methods.map(|m| m.into_iter().map(String::from).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let mut config = RouterConfig::default();
        config.filters.push(filter(Some("managed/user/.*"), Some(vec!["create", "update"])));
        config.filters.push(filter(None, None));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RouterConfig::default();
        config.filters.push(filter(Some("managed/(user"), Some(vec!["create", "upsert"])));
        config.filters.push(FilterConfig {
            on_request: Some(ScriptConfig {
                script_type: "native".into(),
                ..Default::default()
            }),
            condition: Some(ScriptConfig::default()),
            ..Default::default()
        });

        let errors = validate_config(&config).unwrap_err();
        let pointers: Vec<&str> = errors.iter().map(|e| e.pointer.as_str()).collect();
        assert_eq!(
            pointers,
            vec![
                "/filters/0/pattern",
                "/filters/0/methods/1",
                "/filters/1/condition",
                "/filters/1/onRequest",
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_when_enabled() {
        let mut config = RouterConfig::default();
        config.observability.metrics_address = "not-an-address".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].pointer, "/observability/metrics_address");
    }

    #[test]
    fn test_filters_checked_without_observability() {
        let mut config = RouterConfig::default();
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "not-an-address".into();
        config.filters.push(filter(Some("managed/.*"), None));
        assert!(validate_filters(&config.filters).is_ok());

        config.filters.push(filter(Some("["), None));
        let errors = validate_filters(&config.filters).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].pointer, "/filters/1/pattern");
    }
}
