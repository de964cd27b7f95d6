use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{GymError, GymResult};
use crate::models::{
    AthleteDetails, CreateReviewRequest, RatingSummary, Review, ReviewTarget, ReviewView,
    ReviewsResponse,
};

const REVIEW_VIEW_SELECT: &str = r#"
    SELECT r.id, a.full_name AS athlete_name, r.rating, r.comment, r.created_at
    FROM reviews r
    JOIN athlete_details a ON a.id = r.athlete_id
"#;

#[derive(Debug, Clone)]
pub struct ReviewService {
    db: PgPool,
}

impl ReviewService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Athletes review only their own gym or trainer
    pub async fn add_review(&self, athlete: &AthleteDetails, request: CreateReviewRequest) -> GymResult<Review> {
        request.validate()?;

        let (gym_id, trainer_id) = match request.target {
            ReviewTarget::Gym => {
                let gym_id = athlete
                    .gym_id
                    .ok_or_else(|| GymError::forbidden("You can only review your own gym"))?;
                if request.target_id.is_some_and(|id| id != gym_id) {
                    return Err(GymError::forbidden("You can only review your own gym"));
                }
                (Some(gym_id), None)
            }
            ReviewTarget::Trainer => {
                let trainer_id = athlete
                    .trainer_id
                    .ok_or_else(|| GymError::forbidden("You can only review your own trainer"))?;
                if request.target_id.is_some_and(|id| id != trainer_id) {
                    return Err(GymError::forbidden("You can only review your own trainer"));
                }
                (None, Some(trainer_id))
            }
        };

        let review = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (id, athlete_id, gym_id, trainer_id, rating, comment)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, athlete_id, gym_id, trainer_id, rating, comment, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(athlete.id)
        .bind(gym_id)
        .bind(trainer_id)
        .bind(request.rating)
        .bind(request.comment())
        .fetch_one(&self.db)
        .await?;

        info!(review_id = %review.id, athlete_id = %athlete.id, rating = review.rating, "review added");
        Ok(review)
    }

    pub async fn gym_reviews(&self, gym_id: Uuid) -> GymResult<ReviewsResponse> {
        let reviews = sqlx::query_as::<_, ReviewView>(&format!(
            "{REVIEW_VIEW_SELECT} WHERE r.gym_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(gym_id)
        .fetch_all(&self.db)
        .await?;

        Ok(with_summary(reviews))
    }

    pub async fn trainer_reviews(&self, trainer_id: Uuid) -> GymResult<ReviewsResponse> {
        let reviews = sqlx::query_as::<_, ReviewView>(&format!(
            "{REVIEW_VIEW_SELECT} WHERE r.trainer_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(trainer_id)
        .fetch_all(&self.db)
        .await?;

        Ok(with_summary(reviews))
    }
}

fn with_summary(reviews: Vec<ReviewView>) -> ReviewsResponse {
    let ratings: Vec<i32> = reviews.iter().map(|r| r.rating).collect();
    ReviewsResponse {
        summary: RatingSummary::from_ratings(&ratings),
        reviews,
    }
}
