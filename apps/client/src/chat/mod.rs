//! Chat Session Controller — an append-only transcript plus a one-request-at-a-time guard.
//!
//! The controller is a two-state machine:
//!
//! ```text
//!   Idle --begin(text)--> Awaiting --settle(outcome)--> Idle
//! ```
//!
//! `begin` appends the user message and hands back the request to issue; `settle`
//! appends the answer (or the fallback) once that request completes. Between the
//! two the caller owns the request and may keep doing other work.

use tracing::warn;

use crate::errors::AppError;
use crate::models::{ChatMessage, ChatResponse};

pub const GREETING: &str = "Hi there 👋 I've gone through the resume. Feel free to ask me \
    anything — skills, experience, education, or anything else you'd like to know.";
pub const FALLBACK: &str = "⚠️ Something went wrong. Please try again.";
pub const THINKING: &str = "Thinking it through…";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Awaiting,
}

/// The single request a successful `begin` authorises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    session_id: String,
    transcript: Vec<ChatMessage>,
    state: ChatState,
}

impl ChatSession {
    /// Starts a conversation about one parsed document, seeded with the greeting.
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            transcript: vec![ChatMessage::assistant(GREETING)],
            state: ChatState::Idle,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn is_pending(&self) -> bool {
        self.state == ChatState::Awaiting
    }

    /// Idle → Awaiting. Blank text, or a call while a request is in flight, is ignored.
    pub fn begin(&mut self, text: &str) -> Option<PendingRequest> {
        let text = text.trim();
        if text.is_empty() || self.is_pending() {
            return None;
        }

        self.transcript.push(ChatMessage::user(text));
        self.state = ChatState::Awaiting;
        Some(PendingRequest {
            session_id: self.session_id.clone(),
            message: text.to_string(),
        })
    }

    /// Awaiting → Idle. Failures are absorbed into the transcript as the fallback reply.
    /// Returns the appended reply, or `None` if nothing was in flight.
    pub fn settle(&mut self, outcome: Result<ChatResponse, AppError>) -> Option<&ChatMessage> {
        if !self.is_pending() {
            warn!("Chat response arrived with no request in flight; dropping it");
            return None;
        }

        let reply = match outcome {
            Ok(response) => ChatMessage::assistant(response.answer),
            Err(e) => {
                warn!("Chat request failed: {e}");
                ChatMessage::assistant(FALLBACK)
            }
        };
        self.transcript.push(reply);
        self.state = ChatState::Idle;
        self.transcript.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::ResumeBackend;
    use crate::models::{ParseResponse, Role, Schema};
    use crate::upload::PdfFile;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers "answer N" for the Nth call, failing on the calls listed in `fail_on`.
    struct ScriptedBackend {
        calls: AtomicUsize,
        fail_on: Vec<usize>,
    }

    impl ScriptedBackend {
        fn new(fail_on: Vec<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl ResumeBackend for ScriptedBackend {
        async fn schema_options(&self) -> Result<Vec<Schema>, AppError> {
            Ok(Vec::new())
        }

        async fn parse_resume(&self, _: &PdfFile, _: &Schema) -> Result<ParseResponse, AppError> {
            unreachable!("chat never parses")
        }

        async fn chat(&self, session_id: &str, message: &str) -> Result<ChatResponse, AppError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            assert_eq!(session_id, "s1");
            if self.fail_on.contains(&n) {
                return Err(AppError::Backend {
                    status: 503,
                    detail: None,
                });
            }
            Ok(ChatResponse {
                answer: format!("answer {n}: {message}"),
            })
        }
    }

    /// One full send: begin, call the backend, settle.
    async fn send(session: &mut ChatSession, text: &str, backend: &dyn ResumeBackend) -> bool {
        let Some(request) = session.begin(text) else {
            return false;
        };
        let outcome = backend.chat(&request.session_id, &request.message).await;
        session.settle(outcome);
        true
    }

    #[test]
    fn test_new_session_is_seeded_with_greeting() {
        let session = ChatSession::new("s1");
        assert_eq!(session.transcript(), [ChatMessage::assistant(GREETING)]);
        assert_eq!(session.state, ChatState::Idle);
    }

    #[tokio::test]
    async fn test_send_appends_question_then_answer() {
        let backend = ScriptedBackend::new(vec![]);
        let mut session = ChatSession::new("s1");

        assert!(send(&mut session, "What skills?", &backend).await);
        assert_eq!(
            session.transcript(),
            [
                ChatMessage::assistant(GREETING),
                ChatMessage::user("What skills?"),
                ChatMessage::assistant("answer 1: What skills?"),
            ]
        );
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_blank_send_is_ignored() {
        let backend = ScriptedBackend::new(vec![]);
        let mut session = ChatSession::new("s1");

        assert!(!send(&mut session, "   \n", &backend).await);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_second_begin_while_awaiting_is_rejected() {
        let mut session = ChatSession::new("s1");
        let first = session.begin("  What skills?  ").unwrap();
        assert_eq!(first.message, "What skills?");
        assert_eq!(first.session_id, "s1");
        assert!(session.is_pending());

        let before = session.transcript().to_vec();
        assert!(session.begin("And education?").is_none());
        assert_eq!(session.transcript(), before.as_slice());

        session.settle(Ok(ChatResponse {
            answer: "Rust, Go".to_string(),
        }));
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.transcript()[2], ChatMessage::assistant("Rust, Go"));
    }

    #[test]
    fn test_settle_without_request_is_ignored() {
        let mut session = ChatSession::new("s1");
        assert!(session
            .settle(Ok(ChatResponse {
                answer: "stray".to_string()
            }))
            .is_none());
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_appends_fallback_and_recovers() {
        let backend = ScriptedBackend::new(vec![1]);
        let mut session = ChatSession::new("s1");

        assert!(send(&mut session, "What skills?", &backend).await);
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(session.transcript()[2], ChatMessage::assistant(FALLBACK));
        assert!(!session.is_pending());

        assert!(send(&mut session, "What skills?", &backend).await);
        let last = session.transcript().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.text, "answer 2: What skills?");
        assert_eq!(session.transcript().len(), 5);
    }

    #[tokio::test]
    async fn test_transcript_alternates_after_many_sends() {
        let backend = ScriptedBackend::new(vec![2, 3]);
        let mut session = ChatSession::new("s1");
        for question in ["a", "b", "c", "d"] {
            send(&mut session, question, &backend).await;
        }

        let roles: Vec<Role> = session.transcript().iter().map(|m| m.role).collect();
        let mut expected = vec![Role::Assistant];
        for _ in 0..4 {
            expected.push(Role::User);
            expected.push(Role::Assistant);
        }
        assert_eq!(roles, expected);
    }
}
