//! Refresh orchestrator.
//!
//! Re-runs the pipeline on a fixed interval and keeps the last good
//! dashboard for the HTTP layer:
//! 1. Fetch the sheet (memoized for a few seconds by the source)
//! 2. Check the layout and build the leaderboard
//! 3. Publish the new dashboard, or record the failure and keep the old one

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::fetch::DataSource;
use crate::models::ColumnMap;
use crate::pipeline::{run_cycle, Dashboard, PipelineError};

/// Errors returned by a manual refresh.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("A refresh is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

/// Outcome of the most recent refresh cycles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshState {
    pub status: RefreshStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// When a dashboard was last published
    pub last_success_at: Option<DateTime<Utc>>,
    /// Message of the last failed cycle, cleared on success
    pub last_error: Option<String>,
    pub cycles: u64,
    pub failures: u64,
}

/// Runs refresh cycles and holds their results.
pub struct Refresher {
    source: Arc<dyn DataSource>,
    columns: ColumnMap,
    interval: Duration,
    state: RwLock<RefreshState>,
    dashboard: RwLock<Option<Arc<Dashboard>>>,
}

impl Refresher {
    pub fn new(source: Arc<dyn DataSource>, columns: ColumnMap, interval: Duration) -> Self {
        Self {
            source,
            columns,
            interval,
            state: RwLock::new(RefreshState::default()),
            dashboard: RwLock::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Get current refresh state.
    pub async fn state(&self) -> RefreshState {
        self.state.read().await.clone()
    }

    /// Last successfully built dashboard.
    pub async fn dashboard(&self) -> Option<Arc<Dashboard>> {
        self.dashboard.read().await.clone()
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.status == RefreshStatus::Running
    }

    /// Mark a cycle as started; `false` if one is already running.
    pub async fn try_begin(&self) -> bool {
        let mut state = self.state.write().await;
        if state.status == RefreshStatus::Running {
            return false;
        }
        state.status = RefreshStatus::Running;
        state.started_at = Some(Utc::now());
        true
    }

    /// Run one full cycle.
    pub async fn refresh_once(&self) -> Result<Arc<Dashboard>, RefreshError> {
        if !self.try_begin().await {
            warn!("Refresh already in progress");
            return Err(RefreshError::AlreadyRunning);
        }
        self.run_started().await
    }

    /// Finish a cycle that [`try_begin`](Self::try_begin) started.
    pub async fn run_started(&self) -> Result<Arc<Dashboard>, RefreshError> {
        let result = run_cycle(self.source.as_ref(), &self.columns).await;
        let now = Utc::now();

        match result {
            Ok(dashboard) => {
                let dashboard = Arc::new(dashboard);
                {
                    let mut current = self.dashboard.write().await;
                    let changed = current
                        .as_ref()
                        .map_or(true, |d| d.fingerprint != dashboard.fingerprint);
                    if changed {
                        info!("Leaderboard updated (fingerprint {})", dashboard.fingerprint);
                    }
                    *current = Some(dashboard.clone());
                }

                let mut state = self.state.write().await;
                state.status = RefreshStatus::Completed;
                state.completed_at = Some(now);
                state.last_success_at = Some(now);
                state.last_error = None;
                state.cycles += 1;
                Ok(dashboard)
            }
            Err(e) => {
                error!("Refresh failed: {}", e);
                let mut state = self.state.write().await;
                state.status = RefreshStatus::Failed;
                state.completed_at = Some(now);
                state.last_error = Some(e.to_string());
                state.cycles += 1;
                state.failures += 1;
                Err(e.into())
            }
        }
    }

    /// Refresh on every tick until the task is dropped.
    pub async fn run_periodic(self: Arc<Self>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Starting periodic refresh every {:?}", self.interval);

        loop {
            ticker.tick().await;

            // Failures are logged by the cycle; the next tick retries
            if let Ok(dashboard) = self.refresh_once().await {
                info!(
                    "Periodic refresh completed: {} entities",
                    dashboard.leaderboard.len()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticSource;

    const SHEET: &str = "\
Entity,Total Applied,Total Approved,Total MoUs,Total Total
CC,4,2,1,2
CN,1,0,0,0
";

    fn refresher(source: StaticSource) -> Refresher {
        Refresher::new(
            Arc::new(source),
            ColumnMap::default(),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_refresh_state_default() {
        let state = RefreshState::default();
        assert_eq!(state.status, RefreshStatus::Idle);
        assert!(state.started_at.is_none());
        assert!(state.last_error.is_none());
        assert_eq!(state.cycles, 0);
    }

    #[test]
    fn test_refresh_status_variants() {
        let variants = [
            (RefreshStatus::Idle, "\"idle\""),
            (RefreshStatus::Running, "\"running\""),
            (RefreshStatus::Completed, "\"completed\""),
            (RefreshStatus::Failed, "\"failed\""),
        ];
        for (status, expected) in &variants {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(&json, expected);
            let parsed: RefreshStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(&parsed, status);
        }
    }

    #[tokio::test]
    async fn test_refresh_once_publishes_dashboard() {
        let r = refresher(StaticSource::from_csv(SHEET));
        assert!(r.dashboard().await.is_none());

        let dashboard = r.refresh_once().await.unwrap();
        assert_eq!(dashboard.leaderboard.len(), 2);

        let state = r.state().await;
        assert_eq!(state.status, RefreshStatus::Completed);
        assert!(state.last_success_at.is_some());
        assert_eq!(state.cycles, 1);
        assert!(r.dashboard().await.is_some());
    }

    #[tokio::test]
    async fn test_failed_refresh_is_recorded() {
        let r = refresher(StaticSource::failing("network down"));

        let err = r.refresh_once().await.unwrap_err();
        assert!(matches!(err, RefreshError::Pipeline(_)));

        let state = r.state().await;
        assert_eq!(state.status, RefreshStatus::Failed);
        assert_eq!(state.failures, 1);
        assert!(state.last_error.unwrap().contains("network down"));
        assert!(r.dashboard().await.is_none());
    }

    #[tokio::test]
    async fn test_failure_after_success_keeps_last_dashboard() {
        let source = Arc::new(StaticSource::from_csv(SHEET));
        let r = Refresher::new(source.clone(), ColumnMap::default(), Duration::from_secs(60));

        let first = r.refresh_once().await.unwrap();
        source.fail_with("sheet unpublished");
        assert!(r.refresh_once().await.is_err());

        let kept = r.dashboard().await.expect("last good dashboard is kept");
        assert!(Arc::ptr_eq(&kept, &first));

        let state = r.state().await;
        assert_eq!(state.status, RefreshStatus::Failed);
        assert_eq!(state.cycles, 2);
        assert_eq!(state.failures, 1);
        assert!(state.last_error.unwrap().contains("sheet unpublished"));
        assert!(state.last_success_at.is_some());
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_schema_failure_keeps_no_partial_dashboard() {
        let r = refresher(StaticSource::from_csv("Entity,Total Applied\nCC,1\n"));

        assert!(r.refresh_once().await.is_err());
        assert!(r.dashboard().await.is_none());
        assert!(r
            .state()
            .await
            .last_error
            .unwrap()
            .contains("Total Approved"));
    }

    #[tokio::test]
    async fn test_rejects_concurrent_refresh() {
        let r = refresher(StaticSource::from_csv(SHEET));
        assert!(r.try_begin().await);

        assert!(matches!(
            r.refresh_once().await,
            Err(RefreshError::AlreadyRunning)
        ));

        r.run_started().await.unwrap();
        assert!(!r.is_running().await);
    }
}
