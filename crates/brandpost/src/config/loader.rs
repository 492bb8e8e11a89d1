use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let compiled =
        jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
            message: format!("Failed to compile JSON schema: {}", e),
        })?;

    let error_messages: Vec<String> = compiled
        .iter_errors(json_value)
        .map(|e| format!("{} at {}", e, e.instance_path()))
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.categories.is_empty() {
        return Err(ConfigError::Validation {
            message: "At least one category must be configured".to_string(),
        });
    }

    let mut ids = HashSet::new();
    for category in &config.categories {
        if !ids.insert(category.id.as_str()) {
            return Err(ConfigError::InvalidCategory {
                id: category.id.clone(),
                reason: "Duplicate category id".to_string(),
            });
        }
    }

    if let Some(ref aggregate) = config.aggregate {
        if ids.contains(aggregate.id.as_str()) {
            return Err(ConfigError::InvalidCategory {
                id: aggregate.id.clone(),
                reason: "Aggregate category id collides with a configured category".to_string(),
            });
        }
    }

    for color in [
        &config.branding.background_color,
        &config.branding.highlight_color,
        &config.branding.text_color,
    ] {
        if parse_hex_color(color).is_none() {
            return Err(ConfigError::Validation {
                message: format!("Invalid hex color: {}", color),
            });
        }
    }

    Ok(())
}

/// Parses a `#rrggbb` string into RGB components.
pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}
