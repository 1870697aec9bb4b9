//! Serial execution of an aggregated launch.
//!
//! Items run strictly one after another. Cancellation is cooperative and only
//! observed between items; a launch that is already in flight always runs to
//! completion.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::aggregated::AggregatedLaunchConfig;
use crate::error::Result;

/// Starts a named launch target. `Ok(false)` means the target was not found
/// or did not start.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn start_launch(&self, target: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureAction {
    Continue,
    Stop,
}

/// Chooses how to proceed after an item failed.
#[async_trait]
pub trait FailureDecider: Send + Sync {
    async fn decide(&self, item: &str, reason: &str) -> FailureAction;
}

/// Always answers the same way.
pub struct FixedDecision(pub FailureAction);

#[async_trait]
impl FailureDecider for FixedDecision {
    async fn decide(&self, _item: &str, _reason: &str) -> FailureAction {
        self.0
    }
}

pub trait ProgressSink: Send + Sync {
    fn begin(&self, config: &str, total: usize);
    /// Called before each attempt with a 1-based index.
    fn step(&self, index: usize, total: usize, item: &str);
    fn warn(&self, message: &str);
    fn finish(&self, state: RunState);
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn begin(&self, _config: &str, _total: usize) {}
    fn step(&self, _index: usize, _total: usize, _item: &str) {}
    fn warn(&self, _message: &str) {}
    fn finish(&self, _state: RunState) {}
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunState {
    /// Nothing to run.
    Idle,
    Running,
    Completed,
    Cancelled,
    AbortedOnFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub config: String,
    pub state: RunState,
    pub total: usize,
    pub attempted: Vec<String>,
    pub launched: Vec<String>,
    pub failed: Vec<FailedItem>,
}

const NOT_STARTED: &str = "launch target not found or failed to start";

pub async fn run_sequence(
    config: &AggregatedLaunchConfig,
    launcher: &dyn Launcher,
    decider: &dyn FailureDecider,
    progress: &dyn ProgressSink,
    cancel: &CancelToken,
) -> RunReport {
    let items = config.enabled_items();
    let total = items.len();
    let mut report = RunReport {
        config: config.name.clone(),
        state: RunState::Idle,
        total,
        attempted: Vec::new(),
        launched: Vec::new(),
        failed: Vec::new(),
    };

    if items.is_empty() {
        let message = format!("Aggregated launch '{}' has no enabled items", config.name);
        warn!(config = %config.name, "no enabled items; nothing to launch");
        progress.warn(&message);
        return report;
    }

    report.state = RunState::Running;
    progress.begin(&config.name, total);
    info!(config = %config.name, total, "starting aggregated launch");

    for (i, item) in items.into_iter().enumerate() {
        if cancel.is_cancelled() {
            report.state = RunState::Cancelled;
            break;
        }

        progress.step(i + 1, total, &item.name);

        if let Some(delay) = item.delay.filter(|d| *d > 0) {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if cancel.is_cancelled() {
                report.state = RunState::Cancelled;
                break;
            }
        }

        report.attempted.push(item.name.clone());
        let reason = match launcher.start_launch(&item.name).await {
            Ok(true) => {
                info!(item = %item.name, "launched");
                report.launched.push(item.name.clone());
                continue;
            }
            Ok(false) => NOT_STARTED.to_string(),
            Err(err) => err.to_string(),
        };

        error!(item = %item.name, %reason, "launch failed");
        report.failed.push(FailedItem {
            name: item.name.clone(),
            reason: reason.clone(),
        });

        if decider.decide(&item.name, &reason).await == FailureAction::Stop {
            report.state = RunState::AbortedOnFailure;
            break;
        }
    }

    if report.state == RunState::Running {
        report.state = RunState::Completed;
    }
    info!(config = %config.name, state = ?report.state, "aggregated launch finished");
    progress.finish(report.state);
    report
}
