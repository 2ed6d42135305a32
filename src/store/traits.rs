//! `BookingStore` trait — single async interface for booking persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::model::BookingRecord;
use crate::error::StoreError;
use crate::ratings::{BookingRating, RatingSummary};

/// Backend-agnostic store covering bookings, ratings, and rating summaries.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), StoreError>;

    // ── Bookings ────────────────────────────────────────────────────

    /// Insert a new booking.
    async fn create_booking(&self, booking: &BookingRecord) -> Result<(), StoreError>;

    /// Get a booking by ID.
    async fn get_booking(&self, id: Uuid) -> Result<Option<BookingRecord>, StoreError>;

    /// Get a user's bookings, most recent first, up to `limit`.
    async fn bookings_for_user(
        &self,
        email: &str,
        limit: usize,
    ) -> Result<Vec<BookingRecord>, StoreError>;

    /// Flag a booking as rated and link the rating that covers it.
    async fn mark_booking_rated(&self, id: Uuid, rating_id: Uuid) -> Result<(), StoreError>;

    // ── Ratings ─────────────────────────────────────────────────────

    /// Insert a new rating.
    async fn insert_rating(&self, rating: &BookingRating) -> Result<(), StoreError>;

    /// Get every rating for a professional, most recent first.
    async fn ratings_for_professional(
        &self,
        professional_id: &str,
    ) -> Result<Vec<BookingRating>, StoreError>;

    /// Insert or replace a professional's rating summary.
    async fn upsert_rating_summary(&self, summary: &RatingSummary) -> Result<(), StoreError>;

    /// Get a professional's rating summary.
    async fn get_rating_summary(
        &self,
        professional_id: &str,
    ) -> Result<Option<RatingSummary>, StoreError>;

    // ── Rating reminders ────────────────────────────────────────────

    /// Unrated bookings created before `older_than` whose last reminder,
    /// if any, went out before `resend_before`.
    async fn bookings_needing_reminder(
        &self,
        older_than: DateTime<Utc>,
        resend_before: DateTime<Utc>,
    ) -> Result<Vec<BookingRecord>, StoreError>;

    /// Record that a reminder went out for a booking.
    async fn mark_reminder_sent(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
}
