mod memory;

pub use memory::MemoryHistoryStore;

use async_trait::async_trait;
use log::info;
use std::error::Error;
use std::sync::Arc;
use crate::cli::Args;
use crate::models::chat::{ Conversation, Role };

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn add_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn get_conversation(
        &self,
        session_id: &str
    ) -> Result<Conversation, Box<dyn Error + Send + Sync>>;
}

pub fn create_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    match args.history_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryHistoryStore::new())),
        other =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported history store type: {}", other)
                    )
                )
            ),
    }
}

pub fn initialize_history_store(
    args: &Args
) -> Result<Arc<dyn HistoryStore>, Box<dyn Error + Send + Sync>> {
    info!("Chat history will be stored in: {} (per-session, discarded on exit)", args.history_type);
    create_history_store(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn factory_rejects_unknown_store_type() {
        let mut args = Args::try_parse_from(["gemini-chat"]).unwrap();
        args.history_type = "redis".to_string();
        assert!(create_history_store(&args).is_err());
    }

    #[test]
    fn factory_builds_memory_store() {
        let args = Args::try_parse_from(["gemini-chat"]).unwrap();
        assert!(create_history_store(&args).is_ok());
    }
}
