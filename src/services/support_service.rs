use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{GymError, GymResult};
use crate::models::{
    AthleteDetails, CreateTicketRequest, SupportTicket, TicketDetail, TicketReplyRequest,
    TicketResponse, TicketStatus, TicketSummary,
};

const TICKET_SELECT: &str = r#"
    SELECT t.id, t.athlete_id, a.full_name AS athlete_name, t.gym_id, g.gym_name,
           t.subject, t.message, t.status,
           (SELECT COUNT(*) FROM support_responses r WHERE r.ticket_id = t.id) AS response_count,
           t.created_at
    FROM support_tickets t
    JOIN athlete_details a ON a.id = t.athlete_id
    JOIN gym_details g ON g.id = t.gym_id
"#;

/// Who is looking at a ticket
#[derive(Debug, Clone, Copy)]
pub enum TicketViewer {
    Manager { gym_id: Uuid },
    Athlete { athlete_id: Uuid },
}

impl TicketViewer {
    fn can_see(&self, ticket: &TicketSummary) -> bool {
        match *self {
            TicketViewer::Manager { gym_id } => ticket.gym_id == gym_id,
            TicketViewer::Athlete { athlete_id } => ticket.athlete_id == athlete_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SupportService {
    db: PgPool,
}

impl SupportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create_ticket(&self, athlete: &AthleteDetails, request: CreateTicketRequest) -> GymResult<TicketSummary> {
        request.validate()?;

        let gym_id = athlete
            .gym_id
            .ok_or_else(|| GymError::validation("choose a gym before opening a ticket"))?;

        let ticket = sqlx::query_as::<_, SupportTicket>(
            "INSERT INTO support_tickets (id, athlete_id, gym_id, subject, message, status)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, athlete_id, gym_id, subject, message, status, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(athlete.id)
        .bind(gym_id)
        .bind(request.subject.trim())
        .bind(request.message.trim())
        .bind(TicketStatus::Open.as_str())
        .fetch_one(&self.db)
        .await?;

        info!(ticket_id = %ticket.id, athlete_id = %athlete.id, gym_id = %gym_id, "support ticket opened");
        self.get_ticket(ticket.id).await
    }

    pub async fn list_tickets(
        &self,
        viewer: TicketViewer,
        status: Option<TicketStatus>,
    ) -> GymResult<Vec<TicketSummary>> {
        let (filter, owner_id) = match viewer {
            TicketViewer::Manager { gym_id } => ("t.gym_id", gym_id),
            TicketViewer::Athlete { athlete_id } => ("t.athlete_id", athlete_id),
        };

        let tickets = sqlx::query_as::<_, TicketSummary>(&format!(
            "{TICKET_SELECT} WHERE {filter} = $1 AND ($2::text IS NULL OR t.status = $2)
             ORDER BY t.created_at DESC"
        ))
        .bind(owner_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.db)
        .await?;

        Ok(tickets)
    }

    pub async fn ticket_detail(&self, viewer: TicketViewer, ticket_id: Uuid) -> GymResult<TicketDetail> {
        let ticket = self.visible_ticket(viewer, ticket_id).await?;

        let responses = sqlx::query_as::<_, TicketResponse>(
            r#"
            SELECT r.id, r.ticket_id, r.responder_id, u.username AS responder_username,
                   u.role AS responder_role, r.message, r.created_at
            FROM support_responses r
            JOIN users u ON u.id = r.responder_id
            WHERE r.ticket_id = $1
            ORDER BY r.created_at ASC
            "#,
        )
        .bind(ticket.id)
        .fetch_all(&self.db)
        .await?;

        Ok(TicketDetail { ticket, responses })
    }

    /// Add a response; managers may change status in the same call
    pub async fn respond(
        &self,
        viewer: TicketViewer,
        responder_id: Uuid,
        ticket_id: Uuid,
        request: TicketReplyRequest,
    ) -> GymResult<TicketDetail> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(GymError::validation("message is required"));
        }

        let ticket = self.visible_ticket(viewer, ticket_id).await?;

        let mut tx = self.db.begin().await?;

        // Lock the ticket so a concurrent close is seen before the reply lands
        let current: String = sqlx::query_scalar("SELECT status FROM support_tickets WHERE id = $1 FOR UPDATE")
            .bind(ticket.id)
            .fetch_one(&mut *tx)
            .await?;
        check_reply(viewer, request.status, &current)?;

        sqlx::query(
            "INSERT INTO support_responses (id, ticket_id, responder_id, message) VALUES ($1, $2, $3, $4)",
        )
        .bind(Uuid::new_v4())
        .bind(ticket.id)
        .bind(responder_id)
        .bind(message)
        .execute(&mut *tx)
        .await?;

        if let Some(status) = request.status {
            sqlx::query("UPDATE support_tickets SET status = $2 WHERE id = $1")
                .bind(ticket.id)
                .bind(status.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(ticket_id = %ticket.id, responder_id = %responder_id, status = ?request.status, "ticket response added");
        self.ticket_detail(viewer, ticket.id).await
    }

    pub async fn update_status(&self, gym_id: Uuid, ticket_id: Uuid, status: TicketStatus) -> GymResult<TicketSummary> {
        let result = sqlx::query("UPDATE support_tickets SET status = $3 WHERE id = $1 AND gym_id = $2")
            .bind(ticket_id)
            .bind(gym_id)
            .bind(status.as_str())
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(GymError::NotFound("Ticket"));
        }

        info!(ticket_id = %ticket_id, status = status.as_str(), "ticket status updated");
        self.get_ticket(ticket_id).await
    }

    async fn visible_ticket(&self, viewer: TicketViewer, ticket_id: Uuid) -> GymResult<TicketSummary> {
        let ticket = self.get_ticket(ticket_id).await?;
        if !viewer.can_see(&ticket) {
            return Err(GymError::NotFound("Ticket"));
        }
        Ok(ticket)
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> GymResult<TicketSummary> {
        sqlx::query_as::<_, TicketSummary>(&format!("{TICKET_SELECT} WHERE t.id = $1"))
            .bind(ticket_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(GymError::NotFound("Ticket"))
    }
}

/// Athletes may not change status and may not add to a closed ticket
fn check_reply(viewer: TicketViewer, requested: Option<TicketStatus>, current: &str) -> GymResult<()> {
    if let TicketViewer::Athlete { .. } = viewer {
        if requested.is_some() {
            return Err(GymError::forbidden("Only the gym manager can change ticket status"));
        }
        if TicketStatus::parse(current) == Some(TicketStatus::Closed) {
            return Err(GymError::conflict("This ticket is closed"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ticket(gym_id: Uuid, athlete_id: Uuid) -> TicketSummary {
        TicketSummary {
            id: Uuid::new_v4(),
            athlete_id,
            athlete_name: "Sam".to_string(),
            gym_id,
            gym_name: "Iron Temple".to_string(),
            subject: "Locker".to_string(),
            message: "Broken lock".to_string(),
            status: "open".to_string(),
            response_count: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_visibility() {
        let gym_id = Uuid::new_v4();
        let athlete_id = Uuid::new_v4();
        let ticket = ticket(gym_id, athlete_id);

        assert!(TicketViewer::Manager { gym_id }.can_see(&ticket));
        assert!(TicketViewer::Athlete { athlete_id }.can_see(&ticket));
        assert!(!TicketViewer::Manager { gym_id: Uuid::new_v4() }.can_see(&ticket));
        assert!(!TicketViewer::Athlete { athlete_id: Uuid::new_v4() }.can_see(&ticket));
    }

    #[test]
    fn test_reply_rules() {
        let athlete = TicketViewer::Athlete { athlete_id: Uuid::new_v4() };
        let manager = TicketViewer::Manager { gym_id: Uuid::new_v4() };

        assert!(check_reply(athlete, None, "open").is_ok());
        assert!(matches!(
            check_reply(athlete, None, "closed"),
            Err(GymError::Conflict(_))
        ));
        assert!(matches!(
            check_reply(athlete, Some(TicketStatus::Closed), "open"),
            Err(GymError::Forbidden(_))
        ));

        assert!(check_reply(manager, None, "closed").is_ok());
        assert!(check_reply(manager, Some(TicketStatus::Open), "closed").is_ok());
    }
}
