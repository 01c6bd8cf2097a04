use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::ValidationError;
use crate::models::AnalysisResult;
use crate::provider::AnalysisProvider;
use crate::sample::SAMPLE_REVIEWS;

pub const ANALYSIS_FAILED_MESSAGE: &str =
    "Failed to analyze reviews. Please check your API key and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisStatus {
    Idle,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSnapshot {
    pub status: AnalysisStatus,
    pub input: String,
    pub result: Option<Arc<AnalysisResult>>,
    pub error_message: Option<String>,
}

impl AnalysisSnapshot {
    pub fn initial() -> Self {
        Self {
            status: AnalysisStatus::Idle,
            input: SAMPLE_REVIEWS.to_string(),
            result: None,
            error_message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisTransitionError {
    #[error("cannot resolve an analysis while '{status:?}'")]
    NotRunning { status: AnalysisStatus },
}

/// `Idle | Succeeded | Failed -> Running`. Drops any held result and error so
/// nothing stale is visible while the new request is in flight.
pub fn begin_analysis(
    from: &AnalysisSnapshot,
    raw_text: &str,
) -> Result<AnalysisSnapshot, ValidationError> {
    if raw_text.trim().is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    if from.status == AnalysisStatus::Running {
        return Err(ValidationError::Busy);
    }
    Ok(AnalysisSnapshot {
        status: AnalysisStatus::Running,
        input: raw_text.to_string(),
        result: None,
        error_message: None,
    })
}

/// `Running -> Succeeded | Failed`.
pub fn resolve_analysis(
    from: &AnalysisSnapshot,
    outcome: Result<AnalysisResult, String>,
) -> Result<AnalysisSnapshot, AnalysisTransitionError> {
    if from.status != AnalysisStatus::Running {
        return Err(AnalysisTransitionError::NotRunning {
            status: from.status,
        });
    }
    let next = match outcome {
        Ok(result) => AnalysisSnapshot {
            status: AnalysisStatus::Succeeded,
            input: from.input.clone(),
            result: Some(Arc::new(result)),
            error_message: None,
        },
        Err(message) => AnalysisSnapshot {
            status: AnalysisStatus::Failed,
            input: from.input.clone(),
            result: None,
            error_message: Some(message),
        },
    };
    Ok(next)
}

/// Single-shot analyze workflow. Holds the only `AnalysisResult`; everyone
/// else reads it through [`AnalysisSession::subscribe`].
pub struct AnalysisSession {
    provider: Arc<dyn AnalysisProvider>,
    state: watch::Sender<AnalysisSnapshot>,
}

impl AnalysisSession {
    pub fn new(provider: Arc<dyn AnalysisProvider>) -> Self {
        let (state, _) = watch::channel(AnalysisSnapshot::initial());
        Self { provider, state }
    }

    pub fn snapshot(&self) -> AnalysisSnapshot {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> AnalysisStatus {
        self.state.borrow().status
    }

    /// Observers always see the latest snapshot. `watch` keeps only the most
    /// recent value, so a slow reader can miss intermediate states.
    pub fn subscribe(&self) -> watch::Receiver<AnalysisSnapshot> {
        self.state.subscribe()
    }

    /// Replaces the draft input. Status and result are untouched.
    pub fn set_input(&self, text: &str) {
        self.state.send_modify(|snap| snap.input = text.to_string());
    }

    pub fn reset_to_sample(&self) {
        debug!("Input reset to sample reviews");
        self.set_input(SAMPLE_REVIEWS);
    }

    /// Runs one analysis to completion and returns the status it settled in.
    /// Rejected without any transition when `raw_text` is blank or another
    /// analysis is still running.
    pub async fn submit(&self, raw_text: &str) -> Result<AnalysisStatus, ValidationError> {
        let mut rejected = None;
        self.state.send_if_modified(|snap| match begin_analysis(snap, raw_text) {
            Ok(next) => {
                debug!("Analysis transition - {:?} -> Running", snap.status);
                *snap = next;
                true
            }
            Err(e) => {
                rejected = Some(e);
                false
            }
        });
        if let Some(e) = rejected {
            debug!("Analysis submit rejected - reason={}", e);
            return Err(e);
        }

        let in_flight = InFlight {
            state: &self.state,
            settled: false,
        };

        let start = Instant::now();
        info!("Analysis started - input_length={} chars", raw_text.len());

        let outcome = match self.provider.analyze(raw_text).await {
            Ok(result) => {
                info!(
                    "Analysis completed - duration={:.2}s, reviews={}, keywords={}, insights={}",
                    start.elapsed().as_secs_f32(),
                    result.review_count,
                    result.keywords.len(),
                    result.insights.len()
                );
                Ok(result)
            }
            Err(e) => {
                warn!(
                    "Analysis failed - duration={:.2}s, error={}",
                    start.elapsed().as_secs_f32(),
                    e
                );
                Err(ANALYSIS_FAILED_MESSAGE.to_string())
            }
        };

        Ok(in_flight.settle(outcome))
    }
}

/// The submit that moved the session into `Running`. If that future is
/// dropped before the provider answers, the analysis settles as `Failed` so
/// the next submit is accepted.
struct InFlight<'a> {
    state: &'a watch::Sender<AnalysisSnapshot>,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, outcome: Result<AnalysisResult, String>) -> AnalysisStatus {
        self.settled = true;
        apply_resolution(self.state, outcome)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Analysis abandoned before the provider answered - settling as Failed");
            apply_resolution(self.state, Err(ANALYSIS_FAILED_MESSAGE.to_string()));
        }
    }
}

fn apply_resolution(
    state: &watch::Sender<AnalysisSnapshot>,
    outcome: Result<AnalysisResult, String>,
) -> AnalysisStatus {
    let mut settled = AnalysisStatus::Running;
    state.send_if_modified(|snap| match resolve_analysis(snap, outcome) {
        Ok(next) => {
            debug!("Analysis transition - Running -> {:?}", next.status);
            settled = next.status;
            *snap = next;
            true
        }
        Err(e) => {
            error!("Analysis result discarded - {}", e);
            settled = snap.status;
            false
        }
    });
    settled
}
