use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::analysis_session::AnalysisSnapshot;
use crate::budget::{exceeds_soft_cap, transcript_tokens, HISTORY_SOFT_CAP_TOKENS};
use crate::error::ValidationError;
use crate::models::{ChatContext, ChatTurn, Role};
use crate::provider::AnalysisProvider;

pub const GREETING: &str =
    "Hi! I can help you dig deeper into this data. Ask me anything about the reviews.";
pub const CHAT_FALLBACK_REPLY: &str =
    "Sorry, I encountered an error while processing your request.";

/// Id of the seeded greeting; never forwarded to the provider.
pub const GREETING_ID: u64 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChatStatus {
    Ready,
    Sending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatSnapshot {
    pub status: ChatStatus,
    pub transcript: Vec<ChatTurn>,
}

impl ChatSnapshot {
    pub fn initial() -> Self {
        Self {
            status: ChatStatus::Ready,
            transcript: vec![ChatTurn {
                id: GREETING_ID,
                role: Role::Assistant,
                text: GREETING.to_string(),
                created_at: Utc::now(),
            }],
        }
    }

    fn next_id(&self) -> u64 {
        self.transcript.last().map_or(GREETING_ID, |t| t.id) + 1
    }

    fn append(&mut self, role: Role, text: &str) -> ChatTurn {
        let turn = ChatTurn {
            id: self.next_id(),
            role,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.transcript.push(turn.clone());
        turn
    }
}

/// Summary and insights of the latest analysis, if there is one.
pub fn compose_context(analysis: &AnalysisSnapshot) -> Option<ChatContext> {
    analysis.result.as_deref().map(ChatContext::from_result)
}

/// Every turn after the greeting, in creation order.
pub fn forwarded_history(transcript: &[ChatTurn]) -> Vec<ChatTurn> {
    transcript
        .iter()
        .filter(|t| t.id != GREETING_ID)
        .cloned()
        .collect()
}

/// Multi-turn follow-up conversation. A failed turn never blocks the next one.
pub struct ChatSession {
    provider: Arc<dyn AnalysisProvider>,
    analysis: watch::Receiver<AnalysisSnapshot>,
    state: watch::Sender<ChatSnapshot>,
}

impl ChatSession {
    pub fn new(
        provider: Arc<dyn AnalysisProvider>,
        analysis: watch::Receiver<AnalysisSnapshot>,
    ) -> Self {
        let (state, _) = watch::channel(ChatSnapshot::initial());
        Self {
            provider,
            analysis,
            state,
        }
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> ChatStatus {
        self.state.borrow().status
    }

    /// Latest-value subscription; intermediate snapshots may be coalesced.
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.state.subscribe()
    }

    /// Appends the user turn right away, asks the provider, then appends
    /// exactly one assistant turn (the reply, or a fixed apology on failure)
    /// and returns it.
    pub async fn send(&self, message: &str) -> Result<ChatTurn, ValidationError> {
        let mut accepted: Result<Vec<ChatTurn>, ValidationError> = Err(ValidationError::EmptyInput);
        self.state.send_if_modified(|snap| {
            if message.trim().is_empty() {
                accepted = Err(ValidationError::EmptyInput);
                return false;
            }
            if snap.status == ChatStatus::Sending {
                accepted = Err(ValidationError::Busy);
                return false;
            }
            accepted = Ok(forwarded_history(&snap.transcript));
            let turn = snap.append(Role::User, message);
            snap.status = ChatStatus::Sending;
            debug!("Chat transition - Ready -> Sending, user_turn={}", turn.id);
            true
        });
        let history = match accepted {
            Ok(history) => history,
            Err(e) => {
                debug!("Chat send rejected - reason={}", e);
                return Err(e);
            }
        };

        let in_flight = InFlight {
            state: &self.state,
            finished: false,
        };

        let context = compose_context(&self.analysis.borrow());
        if exceeds_soft_cap(&history) {
            warn!(
                "Chat history above soft cap - tokens={}, cap={}, turns={}",
                transcript_tokens(&history),
                HISTORY_SOFT_CAP_TOKENS,
                history.len()
            );
        }

        let start = Instant::now();
        debug!(
            "Chat turn starting - history={}, has_context={}",
            history.len(),
            context.is_some()
        );
        let reply = match self
            .provider
            .chat(&history, message, context.as_ref())
            .await
        {
            Ok(text) => {
                info!(
                    "Chat turn completed - duration={:.2}s, reply_length={} chars",
                    start.elapsed().as_secs_f32(),
                    text.len()
                );
                text
            }
            Err(e) => {
                warn!("Chat turn failed, replying with fallback - error={}", e);
                CHAT_FALLBACK_REPLY.to_string()
            }
        };

        Ok(in_flight.finish(&reply))
    }
}

/// The send that moved the session into `Sending`. If that future is dropped
/// before the provider answers, the fallback turn is appended and the session
/// returns to `Ready`.
struct InFlight<'a> {
    state: &'a watch::Sender<ChatSnapshot>,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self, reply: &str) -> ChatTurn {
        self.finished = true;
        append_reply(self.state, reply)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!("Chat turn abandoned before the provider answered - replying with fallback");
            append_reply(self.state, CHAT_FALLBACK_REPLY);
        }
    }
}

/// `Sending -> Ready`, appending exactly one assistant turn.
fn append_reply(state: &watch::Sender<ChatSnapshot>, reply: &str) -> ChatTurn {
    // Only the in-flight send writes the transcript, so nothing can land
    // between this read and the replace.
    let mut next = state.borrow().clone();
    let assistant = next.append(Role::Assistant, reply);
    next.status = ChatStatus::Ready;
    debug!("Chat transition - Sending -> Ready, assistant_turn={}", assistant.id);
    state.send_replace(next);
    assistant
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis_session::AnalysisSession;
    use crate::provider::test_support::{sample_result, ScriptedProvider};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn detached_chat(provider: Arc<ScriptedProvider>) -> ChatSession {
        let (_tx, rx) = watch::channel(AnalysisSnapshot::initial());
        ChatSession::new(provider, rx)
    }

    #[test]
    fn starts_ready_with_greeting() {
        let chat = detached_chat(Arc::new(ScriptedProvider::new()));
        let snap = chat.snapshot();
        assert_eq!(snap.status, ChatStatus::Ready);
        assert_eq!(snap.transcript.len(), 1);
        assert_eq!(snap.transcript[0].id, GREETING_ID);
        assert_eq!(snap.transcript[0].text, GREETING);
    }

    #[tokio::test]
    async fn blank_message_appends_nothing() {
        let provider = Arc::new(ScriptedProvider::new());
        let chat = detached_chat(provider.clone());

        assert_eq!(chat.send("").await.unwrap_err(), ValidationError::EmptyInput);
        assert_eq!(chat.send("   ").await.unwrap_err(), ValidationError::EmptyInput);

        assert_eq!(chat.snapshot().transcript.len(), 1);
        assert!(provider.chat_calls().is_empty());
    }

    #[tokio::test]
    async fn each_send_adds_exactly_two_turns() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_reply(Ok("first answer")).push_reply(Ok("second answer"));
        let chat = detached_chat(provider.clone());

        let reply = chat.send("why?").await.unwrap();
        assert_eq!(reply.text, "first answer");
        assert_eq!(chat.snapshot().transcript.len(), 3);

        chat.send("and then?").await.unwrap();
        let snap = chat.snapshot();
        assert_eq!(snap.transcript.len(), 5);
        assert_eq!(snap.status, ChatStatus::Ready);

        let roles: Vec<Role> = snap.transcript.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        let ids: Vec<u64> = snap.transcript.iter().map(|t| t.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn provider_failure_becomes_fallback_turn() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_reply(Err("timeout")).push_reply(Ok("back again"));
        let chat = detached_chat(provider);

        let reply = chat.send("hello?").await.unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.text, CHAT_FALLBACK_REPLY);
        assert_eq!(chat.status(), ChatStatus::Ready);

        // not blocked after a failure
        assert_eq!(chat.send("retry").await.unwrap().text, "back again");
        assert_eq!(chat.snapshot().transcript.len(), 5);
    }

    #[tokio::test]
    async fn history_skips_greeting_and_new_message() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_reply(Ok("a1")).push_reply(Ok("a2"));
        let chat = detached_chat(provider.clone());

        chat.send("q1").await.unwrap();
        chat.send("q2").await.unwrap();

        let calls = provider.chat_calls();
        assert!(calls[0].transcript.is_empty());
        assert_eq!(calls[0].new_message, "q1");

        let texts: Vec<&str> = calls[1].transcript.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["q1", "a1"]);
        assert_eq!(calls[1].new_message, "q2");
    }

    #[tokio::test]
    async fn context_carries_summary_and_insights_only() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_analysis(Ok(sample_result("S"))).push_reply(Ok("because"));
        let analysis = AnalysisSession::new(provider.clone());
        let chat = ChatSession::new(provider.clone(), analysis.subscribe());

        analysis.submit("good service").await.unwrap();
        chat.send("why?").await.unwrap();

        let call = &provider.chat_calls()[0];
        let ctx = call.context.as_ref().expect("context present after analysis");
        assert_eq!(ctx.summary, "S");
        assert_eq!(ctx.insights.len(), 1);
        assert_eq!(ctx.insights[0].title, "Speed up reports");

        let wire = serde_json::to_string(ctx).unwrap();
        assert!(!wire.contains("TREND-EXCERPT"));
        assert!(!wire.contains("fast"));
    }

    #[tokio::test]
    async fn no_analysis_means_no_context() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_reply(Ok("hi"));
        let chat = detached_chat(provider.clone());
        chat.send("anything?").await.unwrap();
        assert!(provider.chat_calls()[0].context.is_none());
    }

    #[tokio::test]
    async fn user_turn_is_visible_while_sending_and_gates_resend() {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(ScriptedProvider::gated(gate.clone()));
        provider.push_reply(Ok("done"));
        let chat = detached_chat(provider.clone());

        let (reply, _) = tokio::join!(chat.send("first"), async {
            let snap = chat.snapshot();
            assert_eq!(snap.status, ChatStatus::Sending);
            assert_eq!(snap.transcript.len(), 2);
            assert_eq!(snap.transcript[1].role, Role::User);
            assert_eq!(chat.send("second").await.unwrap_err(), ValidationError::Busy);
            assert_eq!(chat.snapshot().transcript.len(), 2);
            gate.notify_one();
        });

        assert_eq!(reply.unwrap().text, "done");
        assert_eq!(chat.snapshot().transcript.len(), 3);
        assert_eq!(provider.chat_calls().len(), 1);
    }

    #[tokio::test]
    async fn dropped_send_appends_fallback_and_unblocks() {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(ScriptedProvider::gated(gate.clone()));
        provider.push_reply(Ok("never seen")).push_reply(Ok("answered"));
        let chat = detached_chat(provider.clone());

        let abandoned = tokio::time::timeout(Duration::from_millis(20), chat.send("q")).await;
        assert!(abandoned.is_err());

        let snap = chat.snapshot();
        assert_eq!(snap.status, ChatStatus::Ready);
        assert_eq!(snap.transcript.len(), 3);
        assert_eq!(snap.transcript[2].role, Role::Assistant);
        assert_eq!(snap.transcript[2].text, CHAT_FALLBACK_REPLY);

        gate.notify_one();
        assert_eq!(chat.send("retry").await.unwrap().text, "answered");
        assert_eq!(chat.snapshot().transcript.len(), 5);
    }

    #[tokio::test]
    async fn chat_failure_leaves_analysis_untouched() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_analysis(Ok(sample_result("S"))).push_reply(Err("down"));
        let analysis = AnalysisSession::new(provider.clone());
        let chat = ChatSession::new(provider, analysis.subscribe());

        analysis.submit("good service").await.unwrap();
        let before = analysis.snapshot();
        chat.send("why?").await.unwrap();
        assert_eq!(analysis.snapshot(), before);
    }
}
