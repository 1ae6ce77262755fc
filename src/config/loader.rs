//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading and filter construction.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Json(serde_json::Error),
    Validation(Vec<ValidationError>),
    /// A filter definition could not be turned into a filter.
    Filter { pointer: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::Filter { pointer, reason } => write!(f, "Invalid filter {}: {}", pointer, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// `.json` files are JSON, everything else is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Deserialize configuration text without semantic checks.
pub fn decode_config(content: &str, format: ConfigFormat) -> Result<RouterConfig, ConfigError> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(ConfigError::Parse),
        ConfigFormat::Json => serde_json::from_str(content).map_err(ConfigError::Json),
    }
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<RouterConfig, ConfigError> {
    let config = decode_config(content, format)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Read and deserialize a file, leaving filter checks to chain construction.
pub fn read_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    decode_config(&content, ConfigFormat::from_path(path))
}

/// Load and validate configuration from a TOML or JSON file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content, ConfigFormat::from_path(path))
}

/// Startup configuration. Never fails: a file that cannot be read or
/// decoded yields the defaults, and a decodable file with invalid entries
/// is returned as is so the router rejects just those parts. The problem,
/// if any, is handed back for the caller to report.
pub fn load_or_default(path: Option<&Path>) -> (RouterConfig, Option<ConfigError>) {
    let Some(path) = path else {
        return (RouterConfig::default(), None);
    };
    match read_config(path) {
        Ok(config) => match validate_config(&config) {
            Ok(()) => (config, None),
            Err(errors) => (config, Some(ConfigError::Validation(errors))),
        },
        Err(e) => (RouterConfig::default(), Some(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_json_and_toml() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("router.json");
        fs::write(&json_path, r#"{"filters": [{"methods": ["read"]}]}"#).unwrap();
        let config = load_config(&json_path).unwrap();
        assert_eq!(config.filters[0].methods, Some(vec!["read".to_string()]));

        let toml_path = dir.path().join("router.toml");
        let mut file = fs::File::create(&toml_path).unwrap();
        writeln!(file, "[[filters]]\npattern = \"system/.*\"").unwrap();
        let config = load_config(&toml_path).unwrap();
        assert_eq!(config.filters[0].pattern.as_deref(), Some("system/.*"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/router.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_validation_failure_reported() {
        let err = parse_config(r#"{"filters": [{"methods": ["fetch"]}]}"#, ConfigFormat::Json).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("/filters/0/methods/0"));
    }

    #[test]
    fn test_load_or_default_never_fails() {
        let dir = tempfile::tempdir().unwrap();

        let (config, problem) = load_or_default(None);
        assert_eq!(config, RouterConfig::default());
        assert!(problem.is_none());

        let (config, problem) = load_or_default(Some(&dir.path().join("absent.toml")));
        assert_eq!(config, RouterConfig::default());
        assert!(matches!(problem, Some(ConfigError::Io(_))));

        let garbled = dir.path().join("garbled.json");
        fs::write(&garbled, "{ not json").unwrap();
        let (config, problem) = load_or_default(Some(&garbled));
        assert_eq!(config, RouterConfig::default());
        assert!(matches!(problem, Some(ConfigError::Json(_))));

        let invalid = dir.path().join("invalid.json");
        fs::write(&invalid, r#"{"filters": [{"pattern": "["}], "observability": {"log_level": "debug"}}"#).unwrap();
        let (config, problem) = load_or_default(Some(&invalid));
        assert_eq!(config.filters.len(), 1);
        assert_eq!(config.observability.log_level, "debug");
        assert!(matches!(problem, Some(ConfigError::Validation(_))));
    }

    #[test]
    fn test_read_config_skips_semantic_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.json");
        fs::write(&path, r#"{"filters": [{"methods": ["fetch"]}]}"#).unwrap();

        assert!(read_config(&path).is_ok());
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("router.JSON")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("router.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("router")), ConfigFormat::Toml);
    }
}
