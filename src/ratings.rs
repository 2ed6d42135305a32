//! Post-session ratings and per-professional summaries.
//!
//! Submission runs the same three-step sequence the booking service has
//! always used: insert the rating, flag the booking as rated, recompute the
//! professional's summary from all stored ratings.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::booking::model::BookingRecord;
use crate::error::{Error, RatingError};
use crate::store::BookingStore;

/// The three scored axes, each 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingScores {
    pub overall: u8,
    pub service_quality: u8,
    pub value_for_money: u8,
}

impl RatingScores {
    /// Validate all three axes.
    pub fn new(overall: u8, service_quality: u8, value_for_money: u8) -> Result<Self, RatingError> {
        for (field, value) in [
            ("overall", overall),
            ("service quality", service_quality),
            ("value for money", value_for_money),
        ] {
            if !(1..=5).contains(&value) {
                return Err(RatingError::InvalidScore {
                    field: field.to_string(),
                    value,
                });
            }
        }
        Ok(Self {
            overall,
            service_quality,
            value_for_money,
        })
    }
}

/// One user's rating of one completed booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRating {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub user_email: String,
    pub user_display_name: String,
    pub professional_id: String,
    pub professional_name: String,
    pub scores: RatingScores,
    pub would_recommend: bool,
    pub comments: Option<String>,
    /// Hide the user's name when the rating is shown publicly.
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

impl BookingRating {
    pub fn new(
        booking: &BookingRecord,
        scores: RatingScores,
        would_recommend: bool,
        comments: Option<String>,
        is_anonymous: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            user_email: booking.request.user_email.clone(),
            user_display_name: booking.request.user_name.clone(),
            professional_id: booking.request.professional_id.clone(),
            professional_name: booking.request.professional_name.clone(),
            scores,
            would_recommend,
            comments,
            is_anonymous,
            created_at: Utc::now(),
        }
    }
}

/// Aggregated rating figures for one professional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub professional_id: String,
    pub average_overall: Decimal,
    pub average_service_quality: Decimal,
    pub average_value_for_money: Decimal,
    pub total_ratings: u32,
    /// Whole-number percentage of raters who would recommend.
    pub recommendation_percentage: Decimal,
    /// Star counts; index 0 holds one-star ratings, index 4 five-star.
    pub distribution: [u32; 5],
    pub last_update: DateTime<Utc>,
}

impl RatingSummary {
    /// Compute a summary from every stored rating for a professional.
    /// No ratings yields an all-zero summary rather than absence, so display
    /// code never has to special-case a new professional.
    pub fn from_ratings(professional_id: &str, ratings: &[BookingRating]) -> Self {
        let total = ratings.len() as u32;
        if total == 0 {
            return Self {
                professional_id: professional_id.to_string(),
                average_overall: Decimal::ZERO,
                average_service_quality: Decimal::ZERO,
                average_value_for_money: Decimal::ZERO,
                total_ratings: 0,
                recommendation_percentage: Decimal::ZERO,
                distribution: [0; 5],
                last_update: Utc::now(),
            };
        }

        let average = |pick: fn(&RatingScores) -> u8| {
            let sum: u32 = ratings.iter().map(|r| pick(&r.scores) as u32).sum();
            (Decimal::from(sum) / Decimal::from(total)).round_dp(1)
        };

        let recommended = ratings.iter().filter(|r| r.would_recommend).count() as u32;
        let recommendation_percentage =
            (Decimal::from(recommended * 100) / Decimal::from(total)).round_dp(0);

        let mut distribution = [0u32; 5];
        for rating in ratings {
            let star = rating.scores.overall.clamp(1, 5) as usize;
            distribution[star - 1] += 1;
        }

        Self {
            professional_id: professional_id.to_string(),
            average_overall: average(|s| s.overall),
            average_service_quality: average(|s| s.service_quality),
            average_value_for_money: average(|s| s.value_for_money),
            total_ratings: total,
            recommendation_percentage,
            distribution,
            last_update: Utc::now(),
        }
    }
}

/// Rating submission and summary maintenance over the booking store.
pub struct RatingsService {
    store: Arc<dyn BookingStore>,
}

impl RatingsService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Submit a rating for a booking.
    ///
    /// Sequence: insert the rating, mark the booking rated, recompute the
    /// professional's summary. A booking can be rated once.
    pub async fn submit_rating(
        &self,
        booking_id: Uuid,
        scores: RatingScores,
        would_recommend: bool,
        comments: Option<String>,
        is_anonymous: bool,
    ) -> Result<BookingRating, Error> {
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or(RatingError::BookingNotFound { booking_id })?;

        if booking.has_rated {
            return Err(RatingError::AlreadyRated { booking_id }.into());
        }

        let rating = BookingRating::new(&booking, scores, would_recommend, comments, is_anonymous);

        self.store.insert_rating(&rating).await?;
        self.store.mark_booking_rated(booking_id, rating.id).await?;
        self.refresh_summary(&rating.professional_id).await?;

        info!(
            booking_id = %booking_id,
            professional_id = %rating.professional_id,
            overall = rating.scores.overall,
            "Rating submitted"
        );
        Ok(rating)
    }

    /// Recompute and persist one professional's summary.
    pub async fn refresh_summary(&self, professional_id: &str) -> Result<RatingSummary, Error> {
        let ratings = self.store.ratings_for_professional(professional_id).await?;
        let summary = RatingSummary::from_ratings(professional_id, &ratings);
        self.store.upsert_rating_summary(&summary).await?;
        Ok(summary)
    }
}
