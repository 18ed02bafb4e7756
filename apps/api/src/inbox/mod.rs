//! Conversation list: filtering, pinned-first ordering, unread tracking.

pub mod handlers;

use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::conversation::{Conversation, ConversationStatus};
use crate::models::flow::Channel;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationFilter {
    pub channel: Option<Channel>,
    pub status: Option<ConversationStatus>,
    #[serde(default)]
    pub unread_only: bool,
    /// Case-insensitive match on contact name or last message.
    pub search: Option<String>,
}

impl ConversationFilter {
    pub fn matches(&self, c: &Conversation) -> bool {
        if self.channel.is_some_and(|ch| ch != c.channel) {
            return false;
        }
        if self.status.is_some_and(|s| s != c.status) {
            return false;
        }
        if self.unread_only && c.unread_count == 0 {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => {
                let q = q.to_lowercase();
                c.contact_name.to_lowercase().contains(&q)
                    || c.last_message.to_lowercase().contains(&q)
            }
            _ => true,
        }
    }
}

/// Pinned conversations first, then most recent message first.
pub fn sort_for_display(conversations: &mut [Conversation]) {
    conversations.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.last_message_at.cmp(&a.last_message_at))
    });
}

#[derive(Debug, Default)]
pub struct Inbox {
    conversations: RwLock<Vec<Conversation>>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, conversation: Conversation) {
        self.conversations.write().await.push(conversation);
    }

    pub async fn all(&self) -> Vec<Conversation> {
        self.conversations.read().await.clone()
    }

    pub async fn list(&self, filter: &ConversationFilter) -> Vec<Conversation> {
        let mut out: Vec<Conversation> = self
            .conversations
            .read()
            .await
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        sort_for_display(&mut out);
        out
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<Conversation, AppError> {
        self.mutate(id, |c| c.unread_count = 0).await
    }

    pub async fn toggle_pin(&self, id: Uuid) -> Result<Conversation, AppError> {
        self.mutate(id, |c| c.pinned = !c.pinned).await
    }

    async fn mutate<F>(&self, id: Uuid, op: F) -> Result<Conversation, AppError>
    where
        F: FnOnce(&mut Conversation),
    {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Conversation {id} not found")))?;
        op(conversation);
        Ok(conversation.clone())
    }
}
