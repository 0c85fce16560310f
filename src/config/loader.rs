//! Configuration loading from disk or the command line.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::{ProxyConfig, RouteDescriptor};
use crate::config::validation::{validate_routes, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Route config parse error: {0}")]
    Routes(#[from] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("No route config specified (use a config file or inline config string)")]
    MissingRoutes,
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where the route descriptors come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSource {
    /// Path to a JSON file.
    File(PathBuf),
    /// JSON passed directly on the command line.
    Inline(String),
}

/// Read settings from a TOML file.
///
/// Semantic validation happens later, once command line overrides have been
/// applied.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ProxyConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Parse and validate a JSON array of route descriptors.
pub fn parse_routes(json: &str) -> Result<Vec<RouteDescriptor>, ConfigError> {
    let routes: Vec<RouteDescriptor> = serde_json::from_str(json)?;
    validate_routes(&routes).map_err(ConfigError::Validation)?;
    Ok(routes)
}

/// Load route descriptors from the given source.
pub fn load_routes(source: &RouteSource) -> Result<Vec<RouteDescriptor>, ConfigError> {
    match source {
        RouteSource::Inline(json) => parse_routes(json),
        RouteSource::File(path) => {
            let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            parse_routes(&content)
        }
    }
}
