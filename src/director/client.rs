//! Director API client.
//!
//! # Responsibilities
//! - Exchange client credentials for a bearer token
//! - List deployments and their instances
//! - Tolerate per-deployment failures while listing instances
//!
//! # Design Decisions
//! - A fresh token is requested for every sync cycle; nothing is cached
//! - No retries; the next sync cycle is the retry
//! - Certificate validation is disabled for the control plane connection

use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{DirectorConfig, TimeoutConfig};
use crate::director::types::{
    AccessToken, AuthResponse, Deployment, DeploymentSummary, DirectorError, DirectorResult,
    Instance, Topology,
};
use crate::net::tls::insecure_client_builder;

/// Base URLs of the token endpoint and the director API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorEndpoints {
    auth_base: Url,
    api_base: Url,
}

impl DirectorEndpoints {
    /// Build endpoints from configuration.
    ///
    /// Explicit `auth_url`/`api_url` win over `host` with the standard ports.
    pub fn from_config(config: &DirectorConfig) -> DirectorResult<Self> {
        let auth_base = match &config.auth_url {
            Some(url) => parse_base(url)?,
            None => parse_base(&format!("https://{}:{}", config.host, config.auth_port))?,
        };
        let api_base = match &config.api_url {
            Some(url) => parse_base(url)?,
            None => parse_base(&format!("https://{}:{}", config.host, config.api_port))?,
        };
        Ok(Self { auth_base, api_base })
    }

    /// `POST {auth}/oauth/token`
    pub fn token_url(&self) -> DirectorResult<Url> {
        with_segments(&self.auth_base, &["oauth", "token"])
    }

    /// `GET {api}/deployments`
    pub fn deployments_url(&self) -> DirectorResult<Url> {
        with_segments(&self.api_base, &["deployments"])
    }

    /// `GET {api}/deployments/{name}/instances`
    pub fn instances_url(&self, deployment: &str) -> DirectorResult<Url> {
        with_segments(&self.api_base, &["deployments", deployment, "instances"])
    }
}

fn parse_base(raw: &str) -> DirectorResult<Url> {
    Url::parse(raw).map_err(|e| DirectorError::Endpoint(format!("'{}': {}", raw, e)))
}

fn with_segments(base: &Url, segments: &[&str]) -> DirectorResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| DirectorError::Endpoint(format!("'{}' cannot be a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Client for a single director.
#[derive(Debug, Clone)]
pub struct DirectorClient {
    http: reqwest::Client,
    endpoints: DirectorEndpoints,
    client_id: String,
    client_secret: String,
}

impl DirectorClient {
    /// Create a new director client.
    pub fn new(config: &DirectorConfig, timeouts: &TimeoutConfig) -> DirectorResult<Self> {
        let endpoints = DirectorEndpoints::from_config(config)?;
        let http = insecure_client_builder(timeouts)
            .build()
            .map_err(|e| DirectorError::Client(e.to_string()))?;

        Ok(Self {
            http,
            endpoints,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }

    pub fn endpoints(&self) -> &DirectorEndpoints {
        &self.endpoints
    }

    /// Perform the OAuth client-credentials exchange.
    pub async fn authenticate(&self) -> DirectorResult<AccessToken> {
        let url = self.endpoints.token_url()?;
        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .http
            .post(url)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| DirectorError::Auth(format!("error issuing login request: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DirectorError::Auth(format!("error reading login response body: {}", e)))?;

        if !status.is_success() {
            return Err(DirectorError::Auth(format!("token endpoint returned {}", status)));
        }

        let parsed: AuthResponse = serde_json::from_str(&body)
            .map_err(|e| DirectorError::Auth(format!("error decoding login response body: {}", e)))?;

        if parsed.access_token.is_empty() {
            return Err(DirectorError::Auth("token endpoint returned an empty access token".into()));
        }

        tracing::debug!(
            client_id = %self.client_id,
            token_type = %parsed.token_type,
            expires_in = parsed.expires_in,
            "Director token acquired"
        );

        Ok(AccessToken::new(parsed.access_token))
    }

    /// Fetch every deployment and its instances.
    ///
    /// Listing deployments must succeed. A deployment whose instances cannot
    /// be fetched is kept with an empty instance list.
    pub async fn fetch_topology(&self, token: &AccessToken) -> DirectorResult<Topology> {
        let url = self.endpoints.deployments_url()?;
        let summaries: Vec<DeploymentSummary> = self
            .get_json(url, token)
            .await
            .map_err(|e| DirectorError::Fetch(format!("error listing deployments: {}", e)))?;

        let mut deployments = Vec::with_capacity(summaries.len());
        for summary in summaries {
            tracing::debug!(deployment = %summary.name, "Processing deployment");

            let instances = match self.fetch_instances(&summary.name, token).await {
                Ok(instances) => instances,
                Err(e) => {
                    tracing::error!(
                        deployment = %summary.name,
                        error = %e,
                        "Failed to get instances for deployment"
                    );
                    Vec::new()
                }
            };

            deployments.push(Deployment::new(summary.name, instances));
        }

        Ok(Topology::new(deployments))
    }

    async fn fetch_instances(&self, deployment: &str, token: &AccessToken) -> DirectorResult<Vec<Instance>> {
        let url = self.endpoints.instances_url(deployment)?;
        self.get_json(url, token)
            .await
            .map_err(|e| DirectorError::Fetch(format!("error listing instances: {}", e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, token: &AccessToken) -> Result<T, reqwest::Error> {
        self.http
            .get(url)
            .header(ACCEPT, "application/json")
            .bearer_auth(token.as_str())
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await
    }
}
