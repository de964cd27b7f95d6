use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::GymError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewTarget {
    Gym,
    Trainer,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub athlete_id: Uuid,
    pub gym_id: Option<Uuid>,
    pub trainer_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReviewView {
    pub id: Uuid,
    pub athlete_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReviewRequest {
    pub target: ReviewTarget,
    /// Optional; must match the athlete's own gym or trainer when present
    pub target_id: Option<Uuid>,
    pub rating: i32,
    pub comment: Option<String>,
}

impl CreateReviewRequest {
    pub fn validate(&self) -> Result<(), GymError> {
        if !(1..=5).contains(&self.rating) {
            return Err(GymError::validation("rating must be between 1 and 5"));
        }
        Ok(())
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub count: i64,
    pub average: f64,
    /// Review count per star rating, 1 through 5
    pub distribution: BTreeMap<i32, i64>,
}

impl RatingSummary {
    pub fn from_ratings(ratings: &[i32]) -> Self {
        let mut distribution: BTreeMap<i32, i64> = (1..=5).map(|star| (star, 0)).collect();
        let mut total = 0i64;
        let mut count = 0i64;

        for &rating in ratings {
            if let Some(bucket) = distribution.get_mut(&rating) {
                *bucket += 1;
                total += i64::from(rating);
                count += 1;
            }
        }

        let average = if count == 0 {
            0.0
        } else {
            ((total as f64 / count as f64) * 100.0).round() / 100.0
        };

        Self {
            count,
            average,
            distribution,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewsResponse {
    pub summary: RatingSummary,
    pub reviews: Vec<ReviewView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_summary() {
        let summary = RatingSummary::from_ratings(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, 0.0);
        assert_eq!(summary.distribution.len(), 5);
        assert!(summary.distribution.values().all(|&n| n == 0));
    }

    #[test]
    fn test_summary_distribution_and_average() {
        let summary = RatingSummary::from_ratings(&[5, 4, 4, 1]);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.average, 3.5);
        assert_eq!(summary.distribution[&4], 2);
        assert_eq!(summary.distribution[&3], 0);
        assert_eq!(summary.distribution[&1], 1);
    }

    #[test]
    fn test_average_rounds_to_two_places() {
        let summary = RatingSummary::from_ratings(&[5, 4, 4]);
        assert_eq!(summary.average, 4.33);
    }

    #[test]
    fn test_distribution_serializes_with_string_keys() {
        let summary = RatingSummary::from_ratings(&[3]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["distribution"]["3"], 1);
    }

    #[test]
    fn test_rating_bounds() {
        let mut request = CreateReviewRequest {
            target: ReviewTarget::Gym,
            target_id: None,
            rating: 6,
            comment: Some("  ".to_string()),
        };
        assert!(request.validate().is_err());
        request.rating = 5;
        assert!(request.validate().is_ok());
        assert_eq!(request.comment(), None);
    }
}
