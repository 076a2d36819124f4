//! Food assistant chat
//!
//! The generative-language backend sits behind the `ChatProvider` trait so the
//! HTTP layer never depends on a particular vendor. Requests are forwarded once;
//! there is no retry.
use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{ChatMessage, ChatReply},
};

pub mod gemini;

pub use gemini::GeminiProvider;

/// Instructions prepended to every conversation
pub const SYSTEM_PREAMBLE: &str = "You are a helpful food assistant. You can help with food recommendations, recipes, and any food-related questions.";

/// Trait for chat backends
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    /// Sends the conversation so far and returns the assistant's reply text
    async fn send_chat(&self, history: &[ChatMessage]) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Checks that there is a message to answer
pub fn validate_history(history: &[ChatMessage]) -> AppResult<()> {
    let last = history.last().ok_or_else(|| {
        AppError::InvalidInput("Messages are required and must be a non-empty array".to_string())
    })?;

    if last.content.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "The last message must have content".to_string(),
        ));
    }

    Ok(())
}

/// Flattens a conversation into a single prompt
///
/// Earlier turns are rendered as `role: content` lines; the last message is
/// treated as the user's question.
pub fn build_prompt(history: &[ChatMessage]) -> String {
    let (last, previous) = match history.split_last() {
        Some(split) => split,
        None => return format!("{}\nAssistant:", SYSTEM_PREAMBLE),
    };

    let conversation = previous
        .iter()
        .map(|message| format!("{}: {}", message.role.as_str(), message.content))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\nPrevious conversation: {}\nUser: {}\nAssistant:",
        SYSTEM_PREAMBLE, conversation, last.content
    )
}

/// Validates the conversation and asks the provider for a reply
pub async fn reply(provider: &dyn ChatProvider, history: &[ChatMessage]) -> AppResult<ChatReply> {
    validate_history(history)?;

    tracing::info!(
        provider = provider.name(),
        turns = history.len(),
        "Forwarding chat request"
    );

    let message = provider.send_chat(history).await.map_err(|e| {
        tracing::error!(provider = provider.name(), error = %e, "Chat provider failed");
        e
    })?;

    Ok(ChatReply {
        message,
        created_at: Utc::now(),
    })
}
