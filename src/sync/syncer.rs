//! Background route synchronization.

use std::future::Future;
use std::sync::Arc;
use tokio::time::sleep;

use crate::director::{DirectorClient, DirectorResult, Topology};
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::sync::interval::{select_mode, SyncIntervals, SyncMode};

/// Something that can produce a fresh topology snapshot.
pub trait TopologySource: Send + Sync {
    fn load_topology(&self) -> impl Future<Output = DirectorResult<Topology>> + Send;
}

impl TopologySource for DirectorClient {
    /// Authenticate from scratch, then fetch.
    async fn load_topology(&self) -> DirectorResult<Topology> {
        let token = self.authenticate().await?;
        self.fetch_topology(&token).await
    }
}

impl<T: TopologySource> TopologySource for Arc<T> {
    fn load_topology(&self) -> impl Future<Output = DirectorResult<Topology>> + Send {
        (**self).load_topology()
    }
}

/// Keeps a route table in step with the director.
pub struct Syncer<S> {
    source: S,
    table: Arc<RouteTable>,
    intervals: SyncIntervals,
}

impl<S: TopologySource> Syncer<S> {
    pub fn new(source: S, table: Arc<RouteTable>, intervals: SyncIntervals) -> Self {
        Self {
            source,
            table,
            intervals,
        }
    }

    /// Run one cycle and return the mode chosen at its start.
    ///
    /// On failure the table is left untouched.
    pub async fn sync_once(&self) -> SyncMode {
        let statuses = self.table.snapshot();
        for status in statuses.iter().filter(|s| s.is_empty()) {
            tracing::info!(
                route = %status.route,
                deployment = ?status.deployment,
                deployment_prefix = ?status.deployment_prefix,
                job = %status.job,
                "Empty host list detected"
            );
        }
        let mode = select_mode(statuses.iter().map(|s| s.is_empty()));

        tracing::debug!(mode = mode.as_str(), "Reloading director mappings");
        match self.source.load_topology().await {
            Ok(topology) => {
                self.table.update(&topology);
                metrics::record_sync_cycle("success");
                for status in self.table.snapshot() {
                    metrics::record_route_candidates(&status.route, status.candidates);
                }
                tracing::info!(
                    deployments = topology.deployments.len(),
                    instances = topology.instance_count(),
                    "Route table updated"
                );
            }
            Err(e) => {
                metrics::record_sync_cycle("failure");
                tracing::error!(error = %e, "Failed to reload director mappings");
            }
        }

        mode
    }

    /// Sync forever.
    pub async fn run(self) {
        tracing::info!(
            degraded_secs = self.intervals.degraded.as_secs(),
            normal_secs = self.intervals.normal.as_secs(),
            routes = self.table.len(),
            "Route syncer starting"
        );

        loop {
            let mode = self.sync_once().await;
            let interval = self.intervals.for_mode(mode);
            tracing::debug!(mode = mode.as_str(), interval_secs = interval.as_secs(), "Next sync scheduled");
            sleep(interval).await;
        }
    }
}
