//! Client-side chat state machine.
//!
//! `idle -> sending -> (success | error) -> idle`. Each submitted question
//! gets a sequence number; completions for anything but the latest number
//! are dropped so a slow reply can never land after a newer one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::ask::{AskRequest, AskResponse};
use crate::chat::sources::Source;
use crate::error::AppError;

pub const EMPTY_ANSWER_APOLOGY: &str =
    "I apologize, but I couldn't generate a response. Please try again.";

pub const REQUEST_FAILED_MESSAGE: &str = "I'm sorry, I encountered an error while processing your question. Please make sure the backend service is running and try again.";

const DEFAULT_CONFIDENCE: &str = "medium";
const ERROR_CONFIDENCE: &str = "error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Whether an answer was grounded on retrieved chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    Rag,
    Basic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<AnswerMode>,
}

/// A request the caller must send, tagged with its sequence number.
#[derive(Debug, Clone)]
pub struct PendingAsk {
    pub seq: u64,
    pub request: AskRequest,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    input: String,
    is_loading: bool,
    last_seq: u64,
    next_message_id: u64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, value: impl Into<String>) {
        self.input = value.into();
    }

    /// Submit the current input.
    ///
    /// Returns `None` (and changes nothing) when the input is blank or a
    /// request is already in flight.
    pub fn submit(&mut self, selected_titles: &[String]) -> Option<PendingAsk> {
        let question = self.input.trim().to_string();
        if question.is_empty() || self.is_loading {
            return None;
        }

        self.push(Role::User, self.input.clone(), Vec::new(), None, None);
        self.input.clear();
        self.is_loading = true;
        self.last_seq += 1;

        Some(PendingAsk {
            seq: self.last_seq,
            request: AskRequest {
                question,
                selected_documents: selected_titles.to_vec(),
                use_rag: true,
            },
        })
    }

    /// Apply the outcome of request `seq`. Returns `false` when the
    /// completion was stale and ignored.
    pub fn complete(&mut self, seq: u64, outcome: Result<AskResponse, AppError>) -> bool {
        if seq != self.last_seq || !self.is_loading {
            tracing::debug!(seq, latest = self.last_seq, "Dropping stale chat completion");
            return false;
        }

        match outcome {
            Ok(response) => {
                let content = if response.answer.is_empty() {
                    EMPTY_ANSWER_APOLOGY.to_string()
                } else {
                    response.answer
                };
                let confidence = response
                    .confidence
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| DEFAULT_CONFIDENCE.to_string());
                let mode = if response.rag_enabled == Some(true) {
                    AnswerMode::Rag
                } else {
                    AnswerMode::Basic
                };
                self.push(
                    Role::Assistant,
                    content,
                    response.sources,
                    Some(confidence),
                    Some(mode),
                );
            }
            Err(e) => {
                tracing::warn!("Chat request failed: {e}");
                self.push(
                    Role::Assistant,
                    REQUEST_FAILED_MESSAGE.to_string(),
                    Vec::new(),
                    Some(ERROR_CONFIDENCE.to_string()),
                    None,
                );
            }
        }
        self.is_loading = false;
        true
    }

    /// Drop the conversation. Any in-flight reply becomes stale.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.is_loading = false;
        self.last_seq += 1;
    }

    /// Plain-text export of the conversation.
    pub fn transcript(&self, selected_titles: &[String], generated_at: DateTime<Utc>) -> String {
        let selected = if selected_titles.is_empty() {
            "No documents were selected during this conversation.\n\n".to_string()
        } else {
            format!("Selected Documents: {}\n\n", selected_titles.join(", "))
        };

        let body = self
            .messages
            .iter()
            .map(|m| {
                let who = match m.role {
                    Role::User => "You",
                    Role::Assistant => "Policy Assistant",
                };
                format!("[{}] {}: {}", m.timestamp.format(TIME_FORMAT), who, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "Policy Assistant Chat History\nGenerated on: {}\n\n{selected}{body}",
            generated_at.format(TIME_FORMAT)
        )
    }

    fn push(
        &mut self,
        role: Role,
        content: String,
        sources: Vec<Source>,
        confidence: Option<String>,
        mode: Option<AnswerMode>,
    ) {
        self.next_message_id += 1;
        self.messages.push(ChatMessage {
            id: self.next_message_id,
            role,
            content,
            timestamp: Utc::now(),
            sources,
            confidence,
            mode,
        });
    }
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
