use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error;
use tokio::sync::Mutex;

use crate::history::HistoryStore;
use crate::models::chat::{ ChatMessage, Conversation, Role };

/// In-memory session store. Each session id owns an independent,
/// append-only conversation; nothing survives process exit.
pub struct MemoryHistoryStore {
    sessions: Mutex<HashMap<String, Conversation>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn add_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut sessions = self.sessions.lock().await;
        let conversation = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Conversation::new(session_id));
        conversation.messages.push(ChatMessage::new(role, content));
        Ok(())
    }

    async fn get_conversation(
        &self,
        session_id: &str
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>> {
        let sessions = self.sessions.lock().await;
        Ok(
            sessions
                .get(session_id)
                .cloned()
                .unwrap_or_else(|| Conversation::new(session_id))
        )
    }
}
