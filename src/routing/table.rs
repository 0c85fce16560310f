//! Route table: logical hosts and their resolved backend candidates.
//!
//! # Responsibilities
//! - Hold the route entries built from configuration
//! - Rebuild every entry's candidates from a topology snapshot
//! - Pick a random candidate for a host
//!
//! # Design Decisions
//! - Entries are fixed at startup; only their resolution changes
//! - Each resolution is built off to the side and published with one
//!   `ArcSwap` store, so readers see the old list or the new one
//! - Lists are rebuilt from empty every cycle, never merged
//! - A list with fewer than two candidates is treated as not ready
//! - The random source is injected so selection is reproducible in tests

use arc_swap::ArcSwap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::config::validation::validate_routes;
use crate::config::{ConfigError, RouteDescriptor};
use crate::director::Topology;
use crate::routing::matcher::{AnyMatcher, Matcher};

/// Minimum number of candidates before a route serves traffic.
pub const MIN_READY_CANDIDATES: usize = 2;

/// Why a lookup did not produce an address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No entry has this logical host.
    #[error("no route configured for host '{host}'")]
    NoRoute { host: String },

    /// The entry exists but has too few candidates.
    #[error("route '{host}' is not ready ({candidates} candidate(s))")]
    NotReady { host: String, candidates: usize },
}

impl LookupError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            LookupError::NoRoute { .. } => "no_route",
            LookupError::NotReady { .. } => "not_ready",
        }
    }
}

/// Result of the latest update for one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Last deployment that matched during the update, if any.
    pub deployment: Option<String>,
    /// Backend addresses in topology order.
    pub candidates: Vec<IpAddr>,
}

/// One configured route.
#[derive(Debug)]
pub struct RouteEntry {
    logical_host: String,
    job: String,
    deployment: Option<String>,
    deployment_prefix: Option<String>,
    matcher: AnyMatcher,
    resolution: ArcSwap<Resolution>,
}

impl RouteEntry {
    fn from_descriptor(descriptor: &RouteDescriptor) -> Self {
        Self {
            logical_host: descriptor.route.clone(),
            job: descriptor.job.clone(),
            deployment: descriptor.deployment.clone(),
            deployment_prefix: descriptor.deployment_prefix.clone(),
            matcher: AnyMatcher::for_deployment(
                descriptor.deployment.as_deref(),
                descriptor.deployment_prefix.as_deref(),
            ),
            resolution: ArcSwap::from_pointee(Resolution::default()),
        }
    }

    pub fn logical_host(&self) -> &str {
        &self.logical_host
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    /// Current resolution snapshot.
    pub fn resolution(&self) -> Arc<Resolution> {
        self.resolution.load_full()
    }

    fn resolve(&self, topology: &Topology) -> Resolution {
        let mut resolution = Resolution::default();

        for deployment in topology.deployments.iter().filter(|d| self.matcher.matches(&d.name)) {
            resolution.deployment = Some(deployment.name.clone());

            for instance in deployment.instances.iter().filter(|i| i.job == self.job) {
                if instance.ips.is_empty() {
                    continue;
                }
                tracing::debug!(
                    route = %self.logical_host,
                    deployment = %deployment.name,
                    job = %instance.job,
                    ip_count = instance.ips.len(),
                    "Adding instance IPs to route"
                );
                for ip in &instance.ips {
                    match ip.parse::<IpAddr>() {
                        Ok(addr) => resolution.candidates.push(addr),
                        Err(_) => tracing::warn!(
                            route = %self.logical_host,
                            deployment = %deployment.name,
                            ip = %ip,
                            "Skipping unparsable instance IP"
                        ),
                    }
                }
            }
        }

        resolution
    }
}

/// Read-only view of one entry for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteStatus {
    pub route: String,
    pub job: String,
    pub deployment: Option<String>,
    pub deployment_prefix: Option<String>,
    pub resolved_deployment: Option<String>,
    pub candidates: usize,
}

impl RouteStatus {
    pub fn is_empty(&self) -> bool {
        self.candidates == 0
    }
}

/// The set of configured routes.
#[derive(Debug)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    rng: Mutex<StdRng>,
    generation: AtomicU64,
}

impl RouteTable {
    /// Build a table with an entropy-seeded random source.
    pub fn load(descriptors: &[RouteDescriptor]) -> Result<Self, ConfigError> {
        Self::with_rng(descriptors, StdRng::from_entropy())
    }

    /// Build a table with a fixed seed.
    pub fn with_seed(descriptors: &[RouteDescriptor], seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(descriptors, StdRng::seed_from_u64(seed))
    }

    /// Build a table with the given random source.
    ///
    /// Entries start with no candidates. Duplicate hosts are kept; lookup
    /// uses the first one.
    pub fn with_rng(descriptors: &[RouteDescriptor], rng: StdRng) -> Result<Self, ConfigError> {
        validate_routes(descriptors).map_err(ConfigError::Validation)?;

        Ok(Self {
            entries: descriptors.iter().map(RouteEntry::from_descriptor).collect(),
            rng: Mutex::new(rng),
            generation: AtomicU64::new(0),
        })
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recompute every entry's candidates from the topology.
    pub fn update(&self, topology: &Topology) {
        for entry in &self.entries {
            let resolution = entry.resolve(topology);
            entry.resolution.store(Arc::new(resolution));
        }
        self.generation.fetch_add(1, Ordering::Release);
    }

    /// Number of updates applied so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Every address currently a candidate of some entry.
    pub fn candidate_addresses(&self) -> HashSet<IpAddr> {
        self.entries
            .iter()
            .flat_map(|e| e.resolution.load().candidates.clone())
            .collect()
    }

    /// Pick a backend for the host.
    pub fn lookup(&self, host: &str) -> Result<IpAddr, LookupError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.logical_host == host)
            .ok_or_else(|| LookupError::NoRoute {
                host: host.to_string(),
            })?;

        let resolution = entry.resolution.load();
        let candidates = &resolution.candidates;
        if candidates.len() < MIN_READY_CANDIDATES {
            return Err(LookupError::NotReady {
                host: host.to_string(),
                candidates: candidates.len(),
            });
        }

        let index = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            rng.gen_range(0..candidates.len())
        };
        Ok(candidates[index])
    }

    /// Status of every entry, in configuration order.
    pub fn snapshot(&self) -> Vec<RouteStatus> {
        self.entries
            .iter()
            .map(|entry| {
                let resolution = entry.resolution.load();
                RouteStatus {
                    route: entry.logical_host.clone(),
                    job: entry.job.clone(),
                    deployment: entry.deployment.clone(),
                    deployment_prefix: entry.deployment_prefix.clone(),
                    resolved_deployment: resolution.deployment.clone(),
                    candidates: resolution.candidates.len(),
                }
            })
            .collect()
    }

    /// Whether each entry currently has zero candidates.
    pub fn emptiness(&self) -> Vec<bool> {
        self.entries
            .iter()
            .map(|e| e.resolution.load().candidates.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::director::{Deployment, Instance};
    use std::collections::HashSet;

    fn descriptor(route: &str, deployment: Option<&str>, prefix: Option<&str>, job: &str) -> RouteDescriptor {
        RouteDescriptor {
            route: route.to_string(),
            deployment: deployment.map(String::from),
            deployment_prefix: prefix.map(String::from),
            job: job.to_string(),
        }
    }

    fn instance(job: &str, ips: &[&str]) -> Instance {
        Instance {
            job: job.to_string(),
            ips: ips.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn cf_topology() -> Topology {
        Topology::new(vec![
            Deployment::new(
                "cf-123",
                vec![
                    instance("router", &["10.0.0.1"]),
                    instance("router", &["10.0.0.2"]),
                    instance("diego-cell", &["10.0.1.1"]),
                ],
            ),
            Deployment::new("cf-456", vec![instance("router", &["10.0.0.3"])]),
            Deployment::new("hub-1", vec![instance("router", &["10.9.9.9"])]),
        ])
    }

    #[test]
    fn test_prefix_collects_across_deployments() {
        let table = RouteTable::with_seed(&[descriptor("cf.example", None, Some("cf"), "router")], 7).unwrap();
        table.update(&cf_topology());

        let resolution = table.entries()[0].resolution();
        assert_eq!(resolution.candidates, vec![ip("10.0.0.1"), ip("10.0.0.2"), ip("10.0.0.3")]);
        assert_eq!(resolution.deployment.as_deref(), Some("cf-456"));
    }

    #[test]
    fn test_exact_or_prefix_match() {
        let table = RouteTable::with_seed(
            &[descriptor("mixed.example", Some("hub-1"), Some("cf-4"), "router")],
            7,
        )
        .unwrap();
        table.update(&cf_topology());

        let candidates: HashSet<IpAddr> = table.entries()[0].resolution().candidates.iter().copied().collect();
        assert_eq!(candidates, HashSet::from([ip("10.0.0.3"), ip("10.9.9.9")]));
    }

    #[test]
    fn test_update_is_idempotent() {
        let table = RouteTable::with_seed(&[descriptor("cf.example", None, Some("cf"), "router")], 7).unwrap();
        let topology = cf_topology();

        table.update(&topology);
        let once = table.entries()[0].resolution();
        table.update(&topology);
        let twice = table.entries()[0].resolution();

        assert_eq!(once, twice);
        assert_eq!(twice.candidates.len(), 3);
    }

    #[test]
    fn test_update_replaces_previous_candidates() {
        let table = RouteTable::with_seed(&[descriptor("cf.example", None, Some("cf"), "router")], 7).unwrap();
        table.update(&cf_topology());

        let shrunk = Topology::new(vec![Deployment::new(
            "cf-123",
            vec![instance("router", &["10.0.0.8"]), instance("router", &["10.0.0.9"])],
        )]);
        table.update(&shrunk);

        assert_eq!(table.entries()[0].resolution().candidates, vec![ip("10.0.0.8"), ip("10.0.0.9")]);
    }

    #[test]
    fn test_generation_and_live_addresses_follow_updates() {
        let table = RouteTable::with_seed(
            &[
                descriptor("cf.example", None, Some("cf"), "router"),
                descriptor("cells.example", Some("cf-123"), None, "diego-cell"),
            ],
            7,
        )
        .unwrap();
        assert_eq!(table.generation(), 0);
        assert!(table.candidate_addresses().is_empty());

        table.update(&cf_topology());
        assert_eq!(table.generation(), 1);
        let live: HashSet<IpAddr> = ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.1.1"].iter().map(|s| ip(s)).collect();
        assert_eq!(table.candidate_addresses(), live);

        let entry = &table.entries()[1];
        assert_eq!(entry.logical_host(), "cells.example");
        assert_eq!(entry.job(), "diego-cell");

        table.update(&Topology::default());
        assert_eq!(table.generation(), 2);
        assert!(table.candidate_addresses().is_empty());
    }

    #[test]
    fn test_unmatched_route_is_empty() {
        let table = RouteTable::with_seed(
            &[
                descriptor("cf.example", None, Some("cf"), "router"),
                descriptor("gone.example", None, Some("tanzu-hub"), "controller"),
            ],
            7,
        )
        .unwrap();
        table.update(&cf_topology());

        assert_eq!(table.emptiness(), vec![false, true]);
        let status = &table.snapshot()[1];
        assert!(status.is_empty());
        assert_eq!(status.resolved_deployment, None);
        assert_eq!(status.deployment_prefix.as_deref(), Some("tanzu-hub"));
    }

    #[test]
    fn test_matching_deployment_without_job() {
        let table = RouteTable::with_seed(&[descriptor("cf.example", Some("cf-123"), None, "uaa")], 7).unwrap();
        table.update(&cf_topology());

        let resolution = table.entries()[0].resolution();
        assert!(resolution.candidates.is_empty());
        assert_eq!(resolution.deployment.as_deref(), Some("cf-123"));
    }

    #[test]
    fn test_invalid_ips_are_skipped() {
        let table = RouteTable::with_seed(&[descriptor("cf.example", Some("cf-1"), None, "router")], 7).unwrap();
        table.update(&Topology::new(vec![Deployment::new(
            "cf-1",
            vec![instance("router", &["10.0.0.1", "not-an-ip", "fd00::1"])],
        )]));

        assert_eq!(table.entries()[0].resolution().candidates, vec![ip("10.0.0.1"), ip("fd00::1")]);
    }

    #[test]
    fn test_lookup_unknown_host() {
        let table = RouteTable::with_seed(&[descriptor("cf.example", None, Some("cf"), "router")], 7).unwrap();
        table.update(&cf_topology());

        let err = table.lookup("other.example").unwrap_err();
        assert_eq!(err, LookupError::NoRoute { host: "other.example".into() });
        assert_eq!(err.reason(), "no_route");
    }

    #[test]
    fn test_lookup_before_first_update() {
        let table = RouteTable::with_seed(&[descriptor("cf.example", None, Some("cf"), "router")], 7).unwrap();
        let err = table.lookup("cf.example").unwrap_err();
        assert_eq!(err, LookupError::NotReady { host: "cf.example".into(), candidates: 0 });
    }

    #[test]
    fn test_single_candidate_is_not_ready() {
        let table = RouteTable::with_seed(&[descriptor("cf.example", Some("cf-456"), None, "router")], 7).unwrap();
        table.update(&cf_topology());

        assert_eq!(table.entries()[0].resolution().candidates.len(), 1);
        let err = table.lookup("cf.example").unwrap_err();
        assert_eq!(err, LookupError::NotReady { host: "cf.example".into(), candidates: 1 });
    }

    #[test]
    fn test_lookup_covers_every_candidate() {
        let table = RouteTable::with_seed(&[descriptor("cf.example", None, Some("cf"), "router")], 42).unwrap();
        table.update(&cf_topology());

        let expected = HashSet::from([ip("10.0.0.1"), ip("10.0.0.2"), ip("10.0.0.3")]);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let addr = table.lookup("cf.example").unwrap();
            assert!(expected.contains(&addr), "unexpected candidate {addr}");
            seen.insert(addr);
        }
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let routes = [descriptor("cf.example", None, Some("cf"), "router")];
        let a = RouteTable::with_seed(&routes, 99).unwrap();
        let b = RouteTable::with_seed(&routes, 99).unwrap();
        a.update(&cf_topology());
        b.update(&cf_topology());

        let picks_a: Vec<_> = (0..20).map(|_| a.lookup("cf.example").unwrap()).collect();
        let picks_b: Vec<_> = (0..20).map(|_| b.lookup("cf.example").unwrap()).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn test_duplicate_host_first_wins() {
        let table = RouteTable::with_seed(
            &[
                descriptor("dup.example", Some("cf-456"), None, "router"),
                descriptor("dup.example", None, Some("cf"), "router"),
            ],
            7,
        )
        .unwrap();
        table.update(&cf_topology());

        // first entry has a single candidate, so the host is not ready even
        // though the second entry has three
        assert!(matches!(
            table.lookup("dup.example"),
            Err(LookupError::NotReady { candidates: 1, .. })
        ));
    }

    #[test]
    fn test_host_match_is_verbatim() {
        let table = RouteTable::with_seed(&[descriptor("cf.example", None, Some("cf"), "router")], 7).unwrap();
        table.update(&cf_topology());

        assert!(table.lookup("cf.example").is_ok());
        assert!(table.lookup("CF.example").is_err());
        assert!(table.lookup("cf.example:443").is_err());
    }

    #[test]
    fn test_load_rejects_malformed_descriptor() {
        let err = RouteTable::load(&[descriptor("cf.example", None, None, "router")]).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_concurrent_lookups_during_updates() {
        let table = Arc::new(RouteTable::with_seed(&[descriptor("cf.example", None, Some("cf"), "router")], 7).unwrap());
        let full = cf_topology();
        let alternate = Topology::new(vec![Deployment::new(
            "cf-9",
            vec![instance("router", &["10.1.0.1", "10.1.0.2"])],
        )]);
        table.update(&full);

        let allowed = HashSet::from([
            ip("10.0.0.1"),
            ip("10.0.0.2"),
            ip("10.0.0.3"),
            ip("10.1.0.1"),
            ip("10.1.0.2"),
        ]);

        let writer = {
            let table = table.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    table.update(if i % 2 == 0 { &alternate } else { &full });
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let table = table.clone();
                let allowed = allowed.clone();
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let len = table.entries()[0].resolution().candidates.len();
                        assert!(len == 2 || len == 3, "observed partial list of {len}");
                        let addr = table.lookup("cf.example").unwrap();
                        assert!(allowed.contains(&addr));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
