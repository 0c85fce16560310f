//! Director API types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while talking to the director.
#[derive(Debug, Error)]
pub enum DirectorError {
    /// Token request failed, was rejected, or returned an unusable body.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Deployment listing failed.
    #[error("Topology fetch failed: {0}")]
    Fetch(String),

    /// Endpoint configuration is unusable.
    #[error("Invalid director endpoint: {0}")]
    Endpoint(String),

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Result type for director operations.
pub type DirectorResult<T> = Result<T, DirectorError>;

/// Bearer token returned by the token endpoint.
///
/// The value is kept out of `Debug` output so it cannot leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Body of a successful OAuth token response.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub jti: String,
}

/// Entry of the deployments listing. Only the name is used.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeploymentSummary {
    pub name: String,
}

/// One running instance of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Instance {
    pub id: String,
    pub agent_id: String,
    pub job: String,
    pub index: Option<u32>,
    pub ips: Vec<String>,
}

/// A named deployment and its instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Deployment {
    pub name: String,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl Deployment {
    pub fn new(name: impl Into<String>, instances: Vec<Instance>) -> Self {
        Self {
            name: name.into(),
            instances,
        }
    }
}

/// Topology snapshot for one sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub deployments: Vec<Deployment>,
}

impl Topology {
    pub fn new(deployments: Vec<Deployment>) -> Self {
        Self { deployments }
    }

    /// Total number of instances across all deployments.
    pub fn instance_count(&self) -> usize {
        self.deployments.iter().map(|d| d.instances.len()).sum()
    }
}
