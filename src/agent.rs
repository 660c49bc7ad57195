use crate::cli::Args;
use crate::history::{ initialize_history_store, HistoryStore };
use crate::llm::chat::{ new_client as new_chat_client, ChatClient };
use crate::llm::LlmConfig;
use crate::models::chat::{ Conversation, Role };

use log::{ error, info };
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Outcome of one rejected or aborted turn. Validation failures leave the
/// store unchanged; a generation fault leaves the user message appended
/// with no assistant reply.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Please enter a message.")]
    EmptyMessage,
    #[error("Character limit exceeded. Please keep your message under {max} characters.")]
    LimitExceeded {
        max: usize,
    },
    #[error("generation request failed: {0}")]
    Generation(Box<dyn StdError + Send + Sync>),
    #[error("history store failure: {0}")]
    History(Box<dyn StdError + Send + Sync>),
}

impl TurnError {
    /// Validation errors are recoverable: the user may simply resubmit.
    pub fn is_validation(&self) -> bool {
        matches!(self, TurnError::EmptyMessage | TurnError::LimitExceeded { .. })
    }
}

pub struct ChatAgent {
    chat_client: Arc<dyn ChatClient>,
    history_store: Arc<dyn HistoryStore>,
    max_message_chars: usize,
}

impl ChatAgent {
    pub fn new(args: &Args) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_config = LlmConfig {
            llm_type: args.chat_llm_type.parse()?,
            base_url: args.chat_base_url.clone(),
            api_key: Some(args.chat_api_key.clone()).filter(|k| !k.is_empty()),
            completion_model: args.chat_model.clone(),
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={}",
            args.chat_llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default")
        );

        let history_store = initialize_history_store(args)?;

        Ok(Self {
            chat_client,
            history_store,
            max_message_chars: args.max_message_chars,
        })
    }

    pub fn with_parts(
        chat_client: Arc<dyn ChatClient>,
        history_store: Arc<dyn HistoryStore>,
        max_message_chars: usize
    ) -> Self {
        Self {
            chat_client,
            history_store,
            max_message_chars,
        }
    }

    pub fn max_message_chars(&self) -> usize {
        self.max_message_chars
    }

    pub async fn conversation(
        &self,
        session_id: &str
    ) -> Result<Conversation, Box<dyn StdError + Send + Sync>> {
        self.history_store.get_conversation(session_id).await
    }

    /// Runs one user-submission-to-reply cycle and returns the updated
    /// conversation. The raw text is validated exactly as submitted: no
    /// trimming, length counted in characters.
    pub async fn process_turn(
        &self,
        session_id: &str,
        raw_text: &str
    ) -> Result<Conversation, TurnError> {
        if raw_text.is_empty() {
            return Err(TurnError::EmptyMessage);
        }
        if raw_text.chars().count() > self.max_message_chars {
            return Err(TurnError::LimitExceeded { max: self.max_message_chars });
        }

        self.history_store
            .add_message(session_id, Role::User, raw_text).await
            .map_err(TurnError::History)?;

        let completion = self.chat_client.complete(raw_text).await.map_err(|e| {
            error!("Generation call failed for session {}: {}", session_id, e);
            TurnError::Generation(e)
        })?;

        self.history_store
            .add_message(session_id, Role::Assistant, &completion.response).await
            .map_err(TurnError::History)?;

        self.history_store.get_conversation(session_id).await.map_err(TurnError::History)
    }
}
