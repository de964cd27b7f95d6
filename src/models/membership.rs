use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::GymError;

pub const MAX_PLAN_MONTHS: i32 = 36;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MembershipPlan {
    pub id: Uuid,
    pub gym_id: Uuid,
    pub plan_name: String,
    pub duration_months: i32,
    pub price: f64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavePlanRequest {
    pub plan_name: String,
    pub duration_months: i32,
    pub price: f64,
    pub description: Option<String>,
}

impl SavePlanRequest {
    pub fn validate(&self) -> Result<(), GymError> {
        if self.plan_name.trim().is_empty() {
            return Err(GymError::validation("plan_name is required"));
        }
        if !(1..=MAX_PLAN_MONTHS).contains(&self.duration_months) {
            return Err(GymError::validation(format!(
                "duration_months must be between 1 and {MAX_PLAN_MONTHS}"
            )));
        }
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err(GymError::validation("price must be greater than zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub athlete_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

/// Membership row joined with plan and member names
#[derive(Debug, Clone, FromRow)]
pub struct MembershipRecord {
    pub id: Uuid,
    pub athlete_id: Uuid,
    pub athlete_name: String,
    pub plan_id: Uuid,
    pub plan_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipView {
    pub id: Uuid,
    pub athlete_id: Uuid,
    pub athlete_name: String,
    pub plan_id: Uuid,
    pub plan_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub payment_status: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl MembershipView {
    pub fn from_record(record: MembershipRecord, today: NaiveDate) -> Self {
        Self {
            active: is_membership_active(record.start_date, record.end_date, today),
            id: record.id,
            athlete_id: record.athlete_id,
            athlete_name: record.athlete_name,
            plan_id: record.plan_id,
            plan_name: record.plan_name,
            start_date: record.start_date,
            end_date: record.end_date,
            payment_status: record.payment_status,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub plan_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
}

/// Calendar-month end date; days past the end of a shorter month clamp to its last day
pub fn membership_end_date(start: NaiveDate, duration_months: i32) -> Option<NaiveDate> {
    let months = u32::try_from(duration_months).ok()?;
    start.checked_add_months(Months::new(months))
}

pub fn is_membership_active(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> bool {
    start <= today && today <= end
}
