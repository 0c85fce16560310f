//! Deployment matching logic.
//!
//! # Responsibilities
//! - Match a deployment name exactly
//! - Match a deployment name prefix
//! - Combine conditions with OR semantics
//!
//! # Design Decisions
//! - Matching is case-sensitive (director names are)
//! - An unset or empty condition never matches
//! - No regex

/// Trait for matching deployment names against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the deployment name matches this condition.
    fn matches(&self, deployment: &str) -> bool;
}

/// Matches one deployment name exactly.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    name: String,
}

impl ExactMatcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Matcher for ExactMatcher {
    fn matches(&self, deployment: &str) -> bool {
        deployment == self.name
    }
}

/// Matches deployment names starting with a prefix.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PrefixMatcher {
    fn matches(&self, deployment: &str) -> bool {
        deployment.starts_with(&self.prefix)
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug, Default)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }

    /// Build the matcher for a route's `deployment` / `deployment-prefix` pair.
    pub fn for_deployment(exact: Option<&str>, prefix: Option<&str>) -> Self {
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        if let Some(name) = exact.filter(|n| !n.is_empty()) {
            matchers.push(Box::new(ExactMatcher::new(name)));
        }
        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            matchers.push(Box::new(PrefixMatcher::new(prefix)));
        }
        Self::new(matchers)
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, deployment: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(deployment))
    }
}
