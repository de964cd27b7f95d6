use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::GymError;

pub const MAX_MESSAGE_LENGTH: usize = 4000;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

impl SendMessageRequest {
    /// Trimmed message body
    pub fn body(&self) -> Result<&str, GymError> {
        let body = self.message.trim();
        if body.is_empty() {
            return Err(GymError::validation("message cannot be empty"));
        }
        if body.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(GymError::validation(format!(
                "message cannot exceed {MAX_MESSAGE_LENGTH} characters"
            )));
        }
        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    /// Number of most recent messages (default: 50, max: 200)
    pub limit: Option<i64>,
}

impl ConversationQuery {
    pub fn get_limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 200)
    }
}

/// Someone the caller has exchanged messages with
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: String,
    pub unread_count: i64,
    pub last_message_at: DateTime<Utc>,
}

/// Someone the caller may start a conversation with
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipient {
    pub user_id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadCount {
    pub unread: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_is_trimmed() {
        let request = SendMessageRequest {
            message: "  see you at 6  ".to_string(),
        };
        assert_eq!(request.body().unwrap(), "see you at 6");
    }

    #[test]
    fn test_blank_body_rejected() {
        let request = SendMessageRequest {
            message: " \n\t".to_string(),
        };
        assert!(request.body().is_err());
    }

    #[test]
    fn test_conversation_limit() {
        assert_eq!(ConversationQuery { limit: None }.get_limit(), 50);
        assert_eq!(ConversationQuery { limit: Some(1000) }.get_limit(), 200);
    }
}
