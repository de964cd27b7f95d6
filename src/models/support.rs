use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::GymError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Closed => "closed",
        }
    }

    /// Accepts `in_progress`, `in progress` and `in-progress` in any case
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "open" => Some(TicketStatus::Open),
            "in_progress" => Some(TicketStatus::InProgress),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SupportTicket {
    pub id: Uuid,
    pub athlete_id: Uuid,
    pub gym_id: Uuid,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Ticket joined with the names both sides need
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketSummary {
    pub id: Uuid,
    pub athlete_id: Uuid,
    pub athlete_name: String,
    pub gym_id: Uuid,
    pub gym_name: String,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub response_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketResponse {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub responder_id: Uuid,
    pub responder_username: String,
    pub responder_role: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetail {
    pub ticket: TicketSummary,
    pub responses: Vec<TicketResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub message: String,
}

impl CreateTicketRequest {
    pub fn validate(&self) -> Result<(), GymError> {
        if self.subject.trim().is_empty() {
            return Err(GymError::validation("subject is required"));
        }
        if self.subject.trim().chars().count() > 255 {
            return Err(GymError::validation("subject cannot exceed 255 characters"));
        }
        if self.message.trim().is_empty() {
            return Err(GymError::validation("message is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketReplyRequest {
    pub message: String,
    /// Managers may move the ticket to a new status with the reply
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTicketStatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct TicketQuery {
    pub status: Option<String>,
}

impl TicketQuery {
    pub fn status_filter(&self) -> Result<Option<TicketStatus>, GymError> {
        match self.status.as_deref().map(str::trim) {
            None => Ok(None),
            Some(value) if value.is_empty() || value.eq_ignore_ascii_case("all") => Ok(None),
            Some(value) => TicketStatus::parse(value)
                .map(Some)
                .ok_or_else(|| GymError::validation(format!("unknown ticket status: {value}"))),
        }
    }
}
