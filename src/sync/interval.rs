//! Adaptive sync interval.

use std::time::Duration;

use crate::config::SyncConfig;

/// Polling state of the sync loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// At least one route has no candidates; poll often.
    Degraded,
    /// Every route has candidates.
    Normal,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Degraded => "degraded",
            SyncMode::Normal => "normal",
        }
    }
}

/// Pick the mode from the per-route emptiness flags.
///
/// A table without routes is `Normal`.
pub fn select_mode<I>(empty_routes: I) -> SyncMode
where
    I: IntoIterator<Item = bool>,
{
    if empty_routes.into_iter().any(|empty| empty) {
        SyncMode::Degraded
    } else {
        SyncMode::Normal
    }
}

/// Sleep durations for each mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncIntervals {
    pub degraded: Duration,
    pub normal: Duration,
}

impl SyncIntervals {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            degraded: Duration::from_secs(config.degraded_interval_secs),
            normal: Duration::from_secs(config.normal_interval_secs),
        }
    }

    pub fn for_mode(&self, mode: SyncMode) -> Duration {
        match mode {
            SyncMode::Degraded => self.degraded,
            SyncMode::Normal => self.normal,
        }
    }
}

impl Default for SyncIntervals {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}
