use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::UserRole;
use crate::error::{GymError, GymResult};
use crate::models::{ChatMessage, Contact, Recipient, SendMessageRequest, UnreadCount};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, message, read, created_at";

/// Managers are shown by gym name, trainers and athletes by full name
const DISPLAY_NAME_SQL: &str = r#"
    COALESCE(
        CASE u.role
            WHEN 'gym_manager' THEN g.gym_name
            WHEN 'trainer' THEN t.full_name
            WHEN 'athlete' THEN a.full_name
        END,
        u.username
    )
"#;

#[derive(Debug, Clone)]
pub struct ChatService {
    db: PgPool,
}

impl ChatService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn send_message(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        request: &SendMessageRequest,
    ) -> GymResult<ChatMessage> {
        let body = request.body()?;
        if sender_id == receiver_id {
            return Err(GymError::validation("You cannot message yourself"));
        }
        self.ensure_user_exists(receiver_id).await?;

        let message = sqlx::query_as::<_, ChatMessage>(&format!(
            "INSERT INTO chat_messages (id, sender_id, receiver_id, message)
             VALUES ($1, $2, $3, $4)
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(body)
        .fetch_one(&self.db)
        .await?;

        info!(message_id = %message.id, sender_id = %sender_id, receiver_id = %receiver_id, "message sent");
        Ok(message)
    }

    /// Latest `limit` messages between two users, oldest first; incoming ones are marked read
    pub async fn conversation(&self, user_id: Uuid, other_id: Uuid, limit: i64) -> GymResult<Vec<ChatMessage>> {
        self.ensure_user_exists(other_id).await?;

        let marked = sqlx::query(
            "UPDATE chat_messages SET read = true
             WHERE sender_id = $1 AND receiver_id = $2 AND NOT read",
        )
        .bind(other_id)
        .bind(user_id)
        .execute(&self.db)
        .await?
        .rows_affected();

        if marked > 0 {
            info!(user_id = %user_id, other_id = %other_id, marked, "messages marked read");
        }

        let mut messages = sqlx::query_as::<_, ChatMessage>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages
             WHERE (sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $3"
        ))
        .bind(user_id)
        .bind(other_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        messages.reverse();
        Ok(messages)
    }

    /// Everyone the user has exchanged messages with, most recent first
    pub async fn contacts(&self, user_id: Uuid) -> GymResult<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(&format!(
            r#"
            WITH partners AS (
                SELECT CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END AS partner_id,
                       created_at,
                       (receiver_id = $1 AND NOT read) AS unread
                FROM chat_messages
                WHERE sender_id = $1 OR receiver_id = $1
            )
            SELECT u.id AS user_id, u.username, {DISPLAY_NAME_SQL} AS display_name, u.role,
                   COUNT(*) FILTER (WHERE p.unread) AS unread_count,
                   MAX(p.created_at) AS last_message_at
            FROM partners p
            JOIN users u ON u.id = p.partner_id
            LEFT JOIN gym_details g ON g.user_id = u.id
            LEFT JOIN trainer_details t ON t.user_id = u.id
            LEFT JOIN athlete_details a ON a.user_id = u.id
            GROUP BY u.id, u.username, u.role, g.gym_name, t.full_name, a.full_name
            ORDER BY last_message_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(contacts)
    }

    /// Users the caller may start a conversation with, by role
    pub async fn recipients(&self, user_id: Uuid, role: UserRole) -> GymResult<Vec<Recipient>> {
        let sql = match role {
            UserRole::GymManager => {
                r#"
                SELECT u.id AS user_id, u.username, a.full_name AS display_name, u.role
                FROM gym_details g
                JOIN athlete_details a ON a.gym_id = g.id
                JOIN users u ON u.id = a.user_id
                WHERE g.user_id = $1
                ORDER BY display_name
                "#
            }
            UserRole::Trainer => {
                r#"
                SELECT u.id AS user_id, u.username, a.full_name AS display_name, u.role
                FROM trainer_details t
                JOIN athlete_details a ON a.trainer_id = t.id
                JOIN users u ON u.id = a.user_id
                WHERE t.user_id = $1
                UNION
                SELECT u.id, u.username, g.gym_name, u.role
                FROM trainer_details t
                JOIN gym_details g ON g.id = t.gym_id
                JOIN users u ON u.id = g.user_id
                WHERE t.user_id = $1
                ORDER BY display_name
                "#
            }
            UserRole::Athlete => {
                r#"
                SELECT u.id AS user_id, u.username, t.full_name AS display_name, u.role
                FROM athlete_details a
                JOIN trainer_details t ON t.id = a.trainer_id
                JOIN users u ON u.id = t.user_id
                WHERE a.user_id = $1
                UNION
                SELECT u.id, u.username, g.gym_name, u.role
                FROM athlete_details a
                JOIN gym_details g ON g.id = a.gym_id
                JOIN users u ON u.id = g.user_id
                WHERE a.user_id = $1
                ORDER BY display_name
                "#
            }
        };

        let recipients = sqlx::query_as::<_, Recipient>(sql)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;

        Ok(recipients)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> GymResult<UnreadCount> {
        let unread: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE receiver_id = $1 AND NOT read")
                .bind(user_id)
                .fetch_one(&self.db)
                .await?;

        Ok(UnreadCount { unread })
    }

    async fn ensure_user_exists(&self, user_id: Uuid) -> GymResult<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

        if exists {
            Ok(())
        } else {
            Err(GymError::NotFound("User"))
        }
    }
}
