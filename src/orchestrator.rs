use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::analysis_session::{AnalysisSession, AnalysisSnapshot, AnalysisStatus};
use crate::chat_session::{ChatSession, ChatSnapshot};
use crate::config::CanvasConfig;
use crate::error::ValidationError;
use crate::models::{Bounds, ChatTurn, PackedCircle};
use crate::pack::pack;
use crate::provider::AnalysisProvider;
use crate::render::{render_report_markdown, render_transcript_markdown};
use crate::viz_export::{write_all_viz, write_json};

/// What the keyword chart should draw.
#[derive(Debug, Clone, PartialEq)]
pub enum KeywordMap {
    /// No analysis yet, or nothing in it survived validation.
    NoData,
    Ready(Vec<PackedCircle>),
}

impl KeywordMap {
    pub fn circles(&self) -> &[PackedCircle] {
        match self {
            KeywordMap::NoData => &[],
            KeywordMap::Ready(circles) => circles,
        }
    }
}

/// The surface the UI talks to: read-only snapshots plus intent functions.
pub struct Sentimind {
    analysis: AnalysisSession,
    chat: ChatSession,
    canvas: CanvasConfig,
}

impl Sentimind {
    pub fn new(provider: Arc<dyn AnalysisProvider>, canvas: CanvasConfig) -> Self {
        let analysis = AnalysisSession::new(provider.clone());
        let chat = ChatSession::new(provider, analysis.subscribe());
        Self {
            analysis,
            chat,
            canvas,
        }
    }

    pub fn canvas(&self) -> CanvasConfig {
        self.canvas
    }

    pub fn analysis_snapshot(&self) -> AnalysisSnapshot {
        self.analysis.snapshot()
    }

    pub fn chat_snapshot(&self) -> ChatSnapshot {
        self.chat.snapshot()
    }

    pub fn subscribe_analysis(&self) -> watch::Receiver<AnalysisSnapshot> {
        self.analysis.subscribe()
    }

    pub fn subscribe_chat(&self) -> watch::Receiver<ChatSnapshot> {
        self.chat.subscribe()
    }

    pub async fn submit_analysis(&self, text: &str) -> Result<AnalysisStatus, ValidationError> {
        self.analysis.submit(text).await
    }

    pub async fn send_chat_message(&self, text: &str) -> Result<ChatTurn, ValidationError> {
        self.chat.send(text).await
    }

    pub fn set_input(&self, text: &str) {
        self.analysis.set_input(text);
    }

    pub fn reset_to_sample(&self) {
        self.analysis.reset_to_sample();
    }

    /// Packs the current result's keywords into the configured canvas.
    /// Recomputed from scratch on every call.
    pub fn keyword_layout(&self) -> KeywordMap {
        self.keyword_layout_in(self.canvas.bounds(), self.canvas.padding)
    }

    pub fn keyword_layout_in(&self, bounds: Bounds, padding: f64) -> KeywordMap {
        let snapshot = self.analysis.snapshot();
        let Some(result) = snapshot.result.as_deref() else {
            return KeywordMap::NoData;
        };
        let circles = pack(&result.keywords, bounds, padding);
        if circles.is_empty() {
            KeywordMap::NoData
        } else {
            KeywordMap::Ready(circles)
        }
    }
}

/// One CLI run: analyze `reviews`, persist the report and charts, then ask
/// each follow-up question. Returns the directory everything was written to.
pub async fn run_report(
    app: &Sentimind,
    reviews: &str,
    output_dir: &Path,
    questions: &[String],
) -> Result<PathBuf> {
    let pipeline_start = std::time::Instant::now();
    info!(
        "Pipeline started - input_length={} chars, questions={}",
        reviews.len(),
        questions.len()
    );

    // 1) analyze
    match app.submit_analysis(reviews).await {
        Ok(AnalysisStatus::Succeeded) => {}
        Ok(status) => {
            let snapshot = app.analysis_snapshot();
            let message = snapshot
                .error_message
                .unwrap_or_else(|| format!("analysis ended in state {:?}", status));
            error!("Analysis did not succeed - status={:?}", status);
            bail!(message);
        }
        Err(e) => bail!("Nothing to analyze: {}", e),
    }

    let snapshot = app.analysis_snapshot();
    let Some(result) = snapshot.result else {
        bail!("Analysis succeeded without a result");
    };

    // 2) persist to a run-scoped directory
    let run_dir = output_dir.join(Utc::now().format("%Y-%m-%d-%H%M%S").to_string());
    std::fs::create_dir_all(&run_dir)?;
    debug!("Output directory: {}", run_dir.display());

    write_json(run_dir.join("analysis.json"), &*result)?;
    std::fs::write(run_dir.join("report.md"), render_report_markdown(&result))?;
    debug!("Wrote analysis.json and report.md");

    // 3) keyword layout + chart bundle
    let canvas = app.canvas();
    let layout = app.keyword_layout();
    if layout == KeywordMap::NoData {
        warn!("Keyword map has no data - keywords={}", result.keywords.len());
    }
    write_all_viz(&run_dir, &result, layout.circles(), canvas.bounds(), canvas.padding)?;
    debug!("Wrote viz bundle");

    // 4) follow-up questions; failures turn into fallback replies, never abort
    for question in questions {
        match app.send_chat_message(question).await {
            Ok(reply) => info!("Chat reply received - turn={}, length={} chars", reply.id, reply.text.len()),
            Err(e) => warn!("Question skipped - reason={}", e),
        }
    }
    if !questions.is_empty() {
        let transcript = app.chat_snapshot().transcript;
        write_json(run_dir.join("chat.json"), &transcript)?;
        std::fs::write(run_dir.join("chat.md"), render_transcript_markdown(&transcript))?;
        debug!("Wrote chat transcript - turns={}", transcript.len());
    }

    info!(
        "Pipeline completed successfully - total_duration={:.2}s, directory={}",
        pipeline_start.elapsed().as_secs_f32(),
        run_dir.display()
    );
    Ok(run_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, WeightedItem};
    use crate::provider::test_support::{sample_result, ScriptedProvider};
    use crate::sample::SAMPLE_REVIEWS;

    fn app(provider: Arc<ScriptedProvider>) -> Sentimind {
        Sentimind::new(provider, CanvasConfig::default())
    }

    #[tokio::test]
    async fn keyword_map_follows_analysis() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_analysis(Ok(sample_result("S")));
        let app = app(provider);

        assert_eq!(app.keyword_layout(), KeywordMap::NoData);

        app.submit_analysis("good service").await.unwrap();
        let KeywordMap::Ready(circles) = app.keyword_layout() else {
            panic!("expected a layout");
        };
        let fast = circles.iter().find(|c| c.item.label == "fast").unwrap();
        let bug = circles.iter().find(|c| c.item.label == "bug").unwrap();
        assert!(fast.radius > bug.radius);

        let d = ((fast.center_x - bug.center_x).powi(2) + (fast.center_y - bug.center_y).powi(2)).sqrt();
        assert!(d - fast.radius - bug.radius >= 3.0 - 1e-6);
    }

    #[tokio::test]
    async fn all_invalid_keywords_show_no_data() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut result = sample_result("S");
        result.keywords = vec![WeightedItem::new("broken", -1.0, Category::Neutral)];
        provider.push_analysis(Ok(result));
        let app = app(provider);

        app.submit_analysis("text").await.unwrap();
        assert_eq!(app.keyword_layout(), KeywordMap::NoData);
    }

    #[tokio::test]
    async fn reset_restores_sample_input() {
        let app = app(Arc::new(ScriptedProvider::new()));
        app.set_input("custom");
        app.reset_to_sample();
        assert_eq!(app.analysis_snapshot().input, SAMPLE_REVIEWS);
    }

    #[tokio::test]
    async fn report_run_writes_everything() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_analysis(Ok(sample_result("S")))
            .push_reply(Ok("Because of load times."))
            .push_reply(Err("offline"));
        let app = app(provider.clone());
        let out = tempfile::tempdir().unwrap();

        let questions = vec!["why?".to_string(), "   ".to_string(), "what next?".to_string()];
        let dir = run_report(&app, SAMPLE_REVIEWS, out.path(), &questions).await.unwrap();

        for name in [
            "analysis.json",
            "report.md",
            "viz.trend.json",
            "viz.keywords.json",
            "viz.insights.json",
            "viz.index.json",
            "chat.json",
            "chat.md",
        ] {
            assert!(dir.join(name).exists(), "missing {name}");
        }

        // greeting + two answered questions; the blank one was skipped
        let transcript = app.chat_snapshot().transcript;
        assert_eq!(transcript.len(), 5);
        assert_eq!(transcript[4].text, crate::chat_session::CHAT_FALLBACK_REPLY);
        assert_eq!(provider.chat_calls().len(), 2);
    }

    #[tokio::test]
    async fn report_run_fails_on_provider_error() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_analysis(Err("bad key"));
        let app = app(provider);
        let out = tempfile::tempdir().unwrap();

        let err = run_report(&app, "good service", out.path(), &[]).await.unwrap_err();
        assert!(err.to_string().contains("Failed to analyze reviews"));
        assert_eq!(app.analysis_snapshot().status, AnalysisStatus::Failed);
    }

    #[tokio::test]
    async fn report_run_rejects_blank_input() {
        let app = app(Arc::new(ScriptedProvider::new()));
        let out = tempfile::tempdir().unwrap();
        assert!(run_report(&app, "  ", out.path(), &[]).await.is_err());
        assert_eq!(app.analysis_snapshot().status, AnalysisStatus::Idle);
    }
}
