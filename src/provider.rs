use async_trait::async_trait;

use crate::error::ProviderError;
use crate::models::{AnalysisResult, ChatContext, ChatTurn};

/// The remote collaborator that does the actual language understanding.
/// Calls are made once; retrying is up to the user.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, raw_text: &str) -> Result<AnalysisResult, ProviderError>;

    /// `transcript` holds the prior turns in creation order, without the
    /// seeded greeting and without `new_message`.
    async fn chat(
        &self,
        transcript: &[ChatTurn],
        new_message: &str,
        context: Option<&ChatContext>,
    ) -> Result<String, ProviderError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex, MutexGuard};

    use tokio::sync::Notify;

    use super::*;
    use crate::models::{Category, Insight, Priority, TrendPoint, WeightedItem};

    #[derive(Debug, Clone)]
    pub struct RecordedChat {
        pub transcript: Vec<ChatTurn>,
        pub new_message: String,
        pub context: Option<ChatContext>,
    }

    #[derive(Default)]
    struct Script {
        analyses: VecDeque<Result<AnalysisResult, String>>,
        replies: VecDeque<Result<String, String>>,
        analyze_calls: Vec<String>,
        chat_calls: Vec<RecordedChat>,
    }

    /// Replays queued outcomes in order. When a gate is installed every call
    /// waits on it, so a test can look at the in-flight state.
    #[derive(Default)]
    pub struct ScriptedProvider {
        script: Mutex<Script>,
        gate: Option<Arc<Notify>>,
    }

    fn lock(m: &Mutex<Script>) -> MutexGuard<'_, Script> {
        m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    impl ScriptedProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn gated(gate: Arc<Notify>) -> Self {
            Self {
                script: Mutex::default(),
                gate: Some(gate),
            }
        }

        pub fn push_analysis(&self, outcome: Result<AnalysisResult, &str>) -> &Self {
            lock(&self.script)
                .analyses
                .push_back(outcome.map_err(str::to_string));
            self
        }

        pub fn push_reply(&self, outcome: Result<&str, &str>) -> &Self {
            lock(&self.script)
                .replies
                .push_back(outcome.map(str::to_string).map_err(str::to_string));
            self
        }

        pub fn analyze_calls(&self) -> Vec<String> {
            lock(&self.script).analyze_calls.clone()
        }

        pub fn chat_calls(&self) -> Vec<RecordedChat> {
            lock(&self.script).chat_calls.clone()
        }

        async fn wait_gate(&self) {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
        }
    }

    #[async_trait]
    impl AnalysisProvider for ScriptedProvider {
        async fn analyze(&self, raw_text: &str) -> Result<AnalysisResult, ProviderError> {
            let outcome = {
                let mut script = lock(&self.script);
                script.analyze_calls.push(raw_text.to_string());
                script.analyses.pop_front()
            };
            self.wait_gate().await;
            match outcome {
                Some(Ok(result)) => Ok(result),
                Some(Err(msg)) => Err(ProviderError::Transport(msg)),
                None => Err(ProviderError::EmptyResponse),
            }
        }

        async fn chat(
            &self,
            transcript: &[ChatTurn],
            new_message: &str,
            context: Option<&ChatContext>,
        ) -> Result<String, ProviderError> {
            let outcome = {
                let mut script = lock(&self.script);
                script.chat_calls.push(RecordedChat {
                    transcript: transcript.to_vec(),
                    new_message: new_message.to_string(),
                    context: context.cloned(),
                });
                script.replies.pop_front()
            };
            self.wait_gate().await;
            match outcome {
                Some(Ok(reply)) => Ok(reply),
                Some(Err(msg)) => Err(ProviderError::Transport(msg)),
                None => Err(ProviderError::EmptyResponse),
            }
        }
    }

    pub fn sample_result(summary: &str) -> AnalysisResult {
        AnalysisResult {
            overall_score: 0.4,
            review_count: 2,
            trend: vec![
                TrendPoint {
                    sequence_id: 1,
                    label: "10/01".into(),
                    score: 0.9,
                    excerpt: "TREND-EXCERPT love the dashboard".into(),
                },
                TrendPoint {
                    sequence_id: 2,
                    label: "10/02".into(),
                    score: -0.5,
                    excerpt: "TREND-EXCERPT load times are terrible".into(),
                },
            ],
            keywords: vec![
                WeightedItem::new("fast", 8.0, Category::Praise),
                WeightedItem::new("bug", 3.0, Category::Complaint),
            ],
            summary: summary.to_string(),
            insights: vec![Insight {
                title: "Speed up reports".into(),
                description: "Report generation is slow".into(),
                priority: Priority::High,
            }],
        }
    }
}
