//! libSQL backend — async `BookingStore` implementation.
//!
//! Supports local file and in-memory databases. Dates are stored as
//! RFC 3339 text, prices and averages as decimal text, list-shaped fields
//! as JSON text.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::booking::model::{BookingRecord, BookingRequest};
use crate::error::StoreError;
use crate::ratings::{BookingRating, RatingScores, RatingSummary};
use crate::store::migrations;
use crate::store::traits::BookingStore;

/// libSQL store backend.
///
/// Holds a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("Failed to create database directory: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        let store = Self {
            db: Arc::new(db),
            conn,
        };
        store.run_migrations().await?;
        Ok(store)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_optional_datetime(s: &Option<String>) -> Option<DateTime<Utc>> {
    s.as_ref().map(|s| parse_datetime(s))
}

/// Convert `Option<String>` to a libsql Value.
fn opt_text(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// Convert `Option<i64>` to a libsql Value.
fn opt_int(v: Option<i64>) -> libsql::Value {
    match v {
        Some(v) => libsql::Value::Integer(v),
        None => libsql::Value::Null,
    }
}

/// Map a libsql Row to a BookingRecord.
///
/// Column order matches BOOKING_COLUMNS.
fn row_to_booking(row: &libsql::Row) -> Result<BookingRecord, StoreError> {
    let text = |i: i32| -> Result<String, StoreError> {
        row.get::<String>(i)
            .map_err(|e| StoreError::Query(format!("booking column {i}: {e}")))
    };
    let flag = |i: i32| -> Result<bool, StoreError> {
        Ok(row
            .get::<i64>(i)
            .map_err(|e| StoreError::Query(format!("booking column {i}: {e}")))?
            != 0)
    };

    let id = Uuid::parse_str(&text(0)?)
        .map_err(|e| StoreError::Serialization(format!("booking id: {e}")))?;
    let user_issues: Vec<String> = serde_json::from_str(&text(4)?)
        .map_err(|e| StoreError::Serialization(format!("user_issues: {e}")))?;
    let professional_kind = text(8)?
        .parse()
        .map_err(|e| StoreError::Serialization(format!("professional_kind: {e}")))?;
    let session_type = text(9)?
        .parse()
        .map_err(|e| StoreError::Serialization(format!("session_type: {e}")))?;
    let date = NaiveDate::parse_from_str(&text(10)?, "%Y-%m-%d")
        .map_err(|e| StoreError::Serialization(format!("session_date: {e}")))?;
    let time = NaiveTime::parse_from_str(&text(11)?, "%H:%M:%S")
        .map_err(|e| StoreError::Serialization(format!("session_time: {e}")))?;
    let price: Decimal = text(13)?
        .parse()
        .map_err(|e| StoreError::Serialization(format!("price: {e}")))?;

    Ok(BookingRecord {
        id,
        request: BookingRequest {
            user_name: text(1)?,
            user_email: text(2)?,
            phone: text(3)?,
            user_issues,
            selected_issue: text(5)?,
            professional_id: text(6)?,
            professional_name: text(7)?,
            professional_kind,
            session_type,
            date,
            time,
            duration_minutes: row.get::<i64>(12).ok().map(|v| v as u32),
            price,
            previous_therapy: text(14)?,
            current_medication: text(15)?,
            urgency: row.get::<String>(16).ok().and_then(|s| s.parse().ok()),
            additional_notes: text(17)?,
        },
        has_rated: flag(18)?,
        rating_id: row
            .get::<String>(19)
            .ok()
            .and_then(|s| Uuid::parse_str(&s).ok()),
        rating_reminder_sent: flag(20)?,
        last_reminder_date: parse_optional_datetime(&row.get::<String>(21).ok()),
        created_at: parse_datetime(&text(22)?),
        updated_at: parse_datetime(&text(23)?),
    })
}

/// Map a libsql Row to a BookingRating.
///
/// Column order matches RATING_COLUMNS.
fn row_to_rating(row: &libsql::Row) -> Result<BookingRating, StoreError> {
    let text = |i: i32| -> Result<String, StoreError> {
        row.get::<String>(i)
            .map_err(|e| StoreError::Query(format!("rating column {i}: {e}")))
    };
    let score = |i: i32| -> Result<u8, StoreError> {
        Ok(row
            .get::<i64>(i)
            .map_err(|e| StoreError::Query(format!("rating column {i}: {e}")))? as u8)
    };

    Ok(BookingRating {
        id: Uuid::parse_str(&text(0)?)
            .map_err(|e| StoreError::Serialization(format!("rating id: {e}")))?,
        booking_id: Uuid::parse_str(&text(1)?)
            .map_err(|e| StoreError::Serialization(format!("rating booking_id: {e}")))?,
        user_email: text(2)?,
        user_display_name: text(3)?,
        professional_id: text(4)?,
        professional_name: text(5)?,
        scores: RatingScores {
            overall: score(6)?,
            service_quality: score(7)?,
            value_for_money: score(8)?,
        },
        would_recommend: row
            .get::<i64>(9)
            .map_err(|e| StoreError::Query(format!("rating column 9: {e}")))?
            != 0,
        comments: row.get::<String>(10).ok(),
        is_anonymous: row
            .get::<i64>(11)
            .map_err(|e| StoreError::Query(format!("rating column 11: {e}")))?
            != 0,
        created_at: parse_datetime(&text(12)?),
    })
}

/// Map a libsql Row to a RatingSummary.
///
/// Column order matches SUMMARY_COLUMNS.
fn row_to_summary(row: &libsql::Row) -> Result<RatingSummary, StoreError> {
    let text = |i: i32| -> Result<String, StoreError> {
        row.get::<String>(i)
            .map_err(|e| StoreError::Query(format!("summary column {i}: {e}")))
    };
    let decimal = |i: i32| -> Result<Decimal, StoreError> {
        text(i)?
            .parse()
            .map_err(|e| StoreError::Serialization(format!("summary column {i}: {e}")))
    };

    let distribution: [u32; 5] = serde_json::from_str(&text(6)?)
        .map_err(|e| StoreError::Serialization(format!("distribution: {e}")))?;

    Ok(RatingSummary {
        professional_id: text(0)?,
        average_overall: decimal(1)?,
        average_service_quality: decimal(2)?,
        average_value_for_money: decimal(3)?,
        total_ratings: row
            .get::<i64>(4)
            .map_err(|e| StoreError::Query(format!("summary column 4: {e}")))? as u32,
        recommendation_percentage: decimal(5)?,
        distribution,
        last_update: parse_datetime(&text(7)?),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const BOOKING_COLUMNS: &str = "id, user_name, user_email, phone, user_issues, selected_issue, \
     professional_id, professional_name, professional_kind, session_type, session_date, \
     session_time, duration_minutes, price, previous_therapy, current_medication, urgency, \
     additional_notes, has_rated, rating_id, rating_reminder_sent, last_reminder_date, \
     created_at, updated_at";

const RATING_COLUMNS: &str = "id, booking_id, user_email, user_display_name, professional_id, \
     professional_name, overall, service_quality, value_for_money, would_recommend, comments, \
     is_anonymous, created_at";

const SUMMARY_COLUMNS: &str = "professional_id, average_overall, average_service_quality, \
     average_value_for_money, total_ratings, recommendation_percentage, distribution, last_update";

#[async_trait]
impl BookingStore for LibSqlStore {
    async fn run_migrations(&self) -> Result<(), StoreError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Bookings ────────────────────────────────────────────────────

    async fn create_booking(&self, booking: &BookingRecord) -> Result<(), StoreError> {
        let request = &booking.request;
        let issues_json = serde_json::to_string(&request.user_issues)
            .map_err(|e| StoreError::Serialization(format!("user_issues: {e}")))?;

        self.conn()
            .execute(
                &format!(
                    "INSERT INTO bookings ({BOOKING_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, \
                     ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, \
                     ?22, ?23, ?24)"
                ),
                params![
                    booking.id.to_string(),
                    request.user_name.clone(),
                    request.user_email.clone(),
                    request.phone.clone(),
                    issues_json,
                    request.selected_issue.clone(),
                    request.professional_id.clone(),
                    request.professional_name.clone(),
                    request.professional_kind.to_string(),
                    request.session_type.to_string(),
                    request.date.to_string(),
                    request.time.to_string(),
                    opt_int(request.duration_minutes.map(i64::from)),
                    request.price.to_string(),
                    request.previous_therapy.clone(),
                    request.current_medication.clone(),
                    opt_text(request.urgency.map(|u| u.to_string())),
                    request.additional_notes.clone(),
                    i64::from(booking.has_rated),
                    opt_text(booking.rating_id.map(|id| id.to_string())),
                    i64::from(booking.rating_reminder_sent),
                    opt_text(booking.last_reminder_date.map(|d| d.to_rfc3339())),
                    booking.created_at.to_rfc3339(),
                    booking.updated_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("create_booking: {e}")))?;

        debug!(booking_id = %booking.id, "Booking inserted into DB");
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<BookingRecord>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get_booking: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_booking(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get_booking: {e}"))),
        }
    }

    async fn bookings_for_user(
        &self,
        email: &str,
        limit: usize,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_email = ?1 \
                     ORDER BY created_at DESC LIMIT ?2"
                ),
                params![email, limit as i64],
            )
            .await
            .map_err(|e| StoreError::Query(format!("bookings_for_user: {e}")))?;

        let mut bookings = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_booking(&row) {
                Ok(booking) => bookings.push(booking),
                Err(e) => tracing::warn!("Skipping booking row: {e}"),
            }
        }
        Ok(bookings)
    }

    async fn mark_booking_rated(&self, id: Uuid, rating_id: Uuid) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let affected = self
            .conn()
            .execute(
                "UPDATE bookings SET has_rated = 1, rating_id = ?1, updated_at = ?2 WHERE id = ?3",
                params![rating_id.to_string(), now, id.to_string()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("mark_booking_rated: {e}")))?;

        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "booking".to_string(),
                id: id.to_string(),
            });
        }
        debug!(booking_id = %id, "Booking marked rated");
        Ok(())
    }

    // ── Ratings ─────────────────────────────────────────────────────

    async fn insert_rating(&self, rating: &BookingRating) -> Result<(), StoreError> {
        self.conn()
            .execute(
                &format!(
                    "INSERT INTO ratings ({RATING_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, \
                     ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                params![
                    rating.id.to_string(),
                    rating.booking_id.to_string(),
                    rating.user_email.clone(),
                    rating.user_display_name.clone(),
                    rating.professional_id.clone(),
                    rating.professional_name.clone(),
                    i64::from(rating.scores.overall),
                    i64::from(rating.scores.service_quality),
                    i64::from(rating.scores.value_for_money),
                    i64::from(rating.would_recommend),
                    opt_text(rating.comments.clone()),
                    i64::from(rating.is_anonymous),
                    rating.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("insert_rating: {e}")))?;

        debug!(rating_id = %rating.id, booking_id = %rating.booking_id, "Rating inserted into DB");
        Ok(())
    }

    async fn ratings_for_professional(
        &self,
        professional_id: &str,
    ) -> Result<Vec<BookingRating>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {RATING_COLUMNS} FROM ratings WHERE professional_id = ?1 \
                     ORDER BY created_at DESC"
                ),
                params![professional_id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("ratings_for_professional: {e}")))?;

        let mut ratings = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_rating(&row) {
                Ok(rating) => ratings.push(rating),
                Err(e) => tracing::warn!("Skipping rating row: {e}"),
            }
        }
        Ok(ratings)
    }

    async fn upsert_rating_summary(&self, summary: &RatingSummary) -> Result<(), StoreError> {
        let distribution_json = serde_json::to_string(&summary.distribution)
            .map_err(|e| StoreError::Serialization(format!("distribution: {e}")))?;

        self.conn()
            .execute(
                &format!(
                    "INSERT OR REPLACE INTO rating_summaries ({SUMMARY_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                params![
                    summary.professional_id.clone(),
                    summary.average_overall.to_string(),
                    summary.average_service_quality.to_string(),
                    summary.average_value_for_money.to_string(),
                    i64::from(summary.total_ratings),
                    summary.recommendation_percentage.to_string(),
                    distribution_json,
                    summary.last_update.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| StoreError::Query(format!("upsert_rating_summary: {e}")))?;

        debug!(professional_id = %summary.professional_id, "Rating summary upserted");
        Ok(())
    }

    async fn get_rating_summary(
        &self,
        professional_id: &str,
    ) -> Result<Option<RatingSummary>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {SUMMARY_COLUMNS} FROM rating_summaries WHERE professional_id = ?1"
                ),
                params![professional_id],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get_rating_summary: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_summary(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get_rating_summary: {e}"))),
        }
    }

    // ── Rating reminders ────────────────────────────────────────────

    async fn bookings_needing_reminder(
        &self,
        older_than: DateTime<Utc>,
        resend_before: DateTime<Utc>,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings WHERE has_rated = 0 \
                     AND created_at <= ?1 \
                     AND (last_reminder_date IS NULL OR last_reminder_date <= ?2) \
                     ORDER BY created_at ASC"
                ),
                params![older_than.to_rfc3339(), resend_before.to_rfc3339()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("bookings_needing_reminder: {e}")))?;

        let mut bookings = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            match row_to_booking(&row) {
                Ok(booking) => bookings.push(booking),
                Err(e) => tracing::warn!("Skipping booking row: {e}"),
            }
        }
        Ok(bookings)
    }

    async fn mark_reminder_sent(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let affected = self
            .conn()
            .execute(
                "UPDATE bookings SET rating_reminder_sent = 1, last_reminder_date = ?1, \
                 updated_at = ?2 WHERE id = ?3",
                params![at.to_rfc3339(), Utc::now().to_rfc3339(), id.to_string()],
            )
            .await
            .map_err(|e| StoreError::Query(format!("mark_reminder_sent: {e}")))?;

        if affected == 0 {
            return Err(StoreError::NotFound {
                entity: "booking".to_string(),
                id: id.to_string(),
            });
        }
        debug!(booking_id = %id, "Reminder recorded");
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::model::SessionType;
    use crate::directory::ProfessionalKind;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    async fn test_db() -> LibSqlStore {
        LibSqlStore::new_memory().await.unwrap()
    }

    fn make_booking(email: &str) -> BookingRecord {
        BookingRecord::new(BookingRequest {
            user_name: "Maya".to_string(),
            user_email: email.to_string(),
            phone: "+91 98765 43210".to_string(),
            user_issues: vec!["Anxiety".to_string(), "Sleep".to_string()],
            selected_issue: "Anxiety".to_string(),
            professional_id: "cns-1".to_string(),
            professional_name: "Priya Sharma".to_string(),
            professional_kind: ProfessionalKind::Counsellor,
            session_type: SessionType::Video,
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            duration_minutes: Some(50),
            price: dec!(120),
            previous_therapy: "no".to_string(),
            current_medication: "no".to_string(),
            urgency: None,
            additional_notes: String::new(),
        })
    }

    fn make_rating(booking: &BookingRecord, overall: u8, recommend: bool) -> BookingRating {
        BookingRating::new(
            booking,
            RatingScores::new(overall, 4, 4).unwrap(),
            recommend,
            Some("helpful".to_string()),
            false,
        )
    }

    // ── Booking tests ───────────────────────────────────────────────

    #[tokio::test]
    async fn insert_and_get_booking() {
        let db = test_db().await;
        let booking = make_booking("maya@rkgit.edu.in");

        db.create_booking(&booking).await.unwrap();

        let fetched = db.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, booking.id);
        assert_eq!(fetched.request.user_issues, vec!["Anxiety", "Sleep"]);
        assert_eq!(fetched.request.selected_issue, "Anxiety");
        assert_eq!(fetched.request.professional_kind, ProfessionalKind::Counsellor);
        assert_eq!(fetched.request.price, dec!(120));
        assert_eq!(fetched.request.date, booking.request.date);
        assert_eq!(fetched.request.time, booking.request.time);
        assert!(!fetched.has_rated);
        assert!(fetched.rating_id.is_none());
    }

    #[tokio::test]
    async fn get_booking_not_found() {
        let db = test_db().await;
        let result = db.get_booking(Uuid::new_v4()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn local_database_file_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("manobal.db");

        {
            let db = LibSqlStore::new_local(&path).await.unwrap();
            db.create_booking(&make_booking("maya@rkgit.edu.in"))
                .await
                .unwrap();
        }

        let reopened = LibSqlStore::new_local(&path).await.unwrap();
        let found = reopened
            .bookings_for_user("maya@rkgit.edu.in", 10)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn bookings_for_user_filters_and_orders() {
        let db = test_db().await;

        let mut older = make_booking("maya@rkgit.edu.in");
        older.created_at = Utc::now() - Duration::days(3);
        let newer = make_booking("maya@rkgit.edu.in");
        let other = make_booking("arjun@abes.ac.in");

        db.create_booking(&older).await.unwrap();
        db.create_booking(&newer).await.unwrap();
        db.create_booking(&other).await.unwrap();

        let found = db
            .bookings_for_user("maya@rkgit.edu.in", 10)
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, newer.id);
        assert_eq!(found[1].id, older.id);

        let limited = db.bookings_for_user("maya@rkgit.edu.in", 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn mark_booking_rated_sets_flags() {
        let db = test_db().await;
        let booking = make_booking("maya@rkgit.edu.in");
        db.create_booking(&booking).await.unwrap();

        let rating_id = Uuid::new_v4();
        db.mark_booking_rated(booking.id, rating_id).await.unwrap();

        let fetched = db.get_booking(booking.id).await.unwrap().unwrap();
        assert!(fetched.has_rated);
        assert_eq!(fetched.rating_id, Some(rating_id));
    }

    #[tokio::test]
    async fn mark_missing_booking_is_not_found() {
        let db = test_db().await;
        let err = db
            .mark_booking_rated(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    // ── Rating tests ────────────────────────────────────────────────

    #[tokio::test]
    async fn insert_and_list_ratings() {
        let db = test_db().await;
        let booking = make_booking("maya@rkgit.edu.in");
        db.create_booking(&booking).await.unwrap();

        let rating = make_rating(&booking, 5, true);
        db.insert_rating(&rating).await.unwrap();

        let found = db.ratings_for_professional("cns-1").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, rating.id);
        assert_eq!(found[0].scores.overall, 5);
        assert_eq!(found[0].comments.as_deref(), Some("helpful"));
        assert!(found[0].would_recommend);
    }

    #[tokio::test]
    async fn second_rating_for_same_booking_is_rejected() {
        let db = test_db().await;
        let booking = make_booking("maya@rkgit.edu.in");
        db.create_booking(&booking).await.unwrap();

        db.insert_rating(&make_rating(&booking, 5, true))
            .await
            .unwrap();
        let err = db
            .insert_rating(&make_rating(&booking, 3, false))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
    }

    #[tokio::test]
    async fn summary_upsert_replaces_previous() {
        let db = test_db().await;

        let first = RatingSummary {
            professional_id: "cns-1".to_string(),
            average_overall: dec!(4.0),
            average_service_quality: dec!(4.0),
            average_value_for_money: dec!(4.0),
            total_ratings: 1,
            recommendation_percentage: dec!(100),
            distribution: [0, 0, 0, 1, 0],
            last_update: Utc::now(),
        };
        db.upsert_rating_summary(&first).await.unwrap();

        let second = RatingSummary {
            average_overall: dec!(4.5),
            total_ratings: 2,
            distribution: [0, 0, 0, 1, 1],
            ..first.clone()
        };
        db.upsert_rating_summary(&second).await.unwrap();

        let fetched = db.get_rating_summary("cns-1").await.unwrap().unwrap();
        assert_eq!(fetched.total_ratings, 2);
        assert_eq!(fetched.average_overall, dec!(4.5));
        assert_eq!(fetched.distribution, [0, 0, 0, 1, 1]);

        assert!(db.get_rating_summary("doc-9").await.unwrap().is_none());
    }

    // ── Reminder tests ──────────────────────────────────────────────

    #[tokio::test]
    async fn reminder_query_skips_rated_recent_and_already_reminded() {
        let db = test_db().await;
        let now = Utc::now();

        let mut due = make_booking("due@rkgit.edu.in");
        due.created_at = now - Duration::days(3);
        db.create_booking(&due).await.unwrap();

        let mut rated = make_booking("rated@rkgit.edu.in");
        rated.created_at = now - Duration::days(3);
        db.create_booking(&rated).await.unwrap();
        db.mark_booking_rated(rated.id, Uuid::new_v4()).await.unwrap();

        let mut reminded = make_booking("reminded@rkgit.edu.in");
        reminded.created_at = now - Duration::days(3);
        db.create_booking(&reminded).await.unwrap();
        db.mark_reminder_sent(reminded.id, now - Duration::days(1))
            .await
            .unwrap();

        let fresh = make_booking("fresh@rkgit.edu.in");
        db.create_booking(&fresh).await.unwrap();

        // Older than a day, not reminded in the last two days.
        let found = db
            .bookings_needing_reminder(now - Duration::days(1), now - Duration::days(2))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, due.id);

        // A wider resend window picks the reminded one back up.
        let found = db
            .bookings_needing_reminder(now - Duration::days(1), now)
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn reminder_fields_round_trip() {
        let db = test_db().await;
        let booking = make_booking("maya@rkgit.edu.in");
        db.create_booking(&booking).await.unwrap();

        let at = Utc::now();
        db.mark_reminder_sent(booking.id, at).await.unwrap();

        let fetched = db.get_booking(booking.id).await.unwrap().unwrap();
        assert!(fetched.rating_reminder_sent);
        let recorded = fetched.last_reminder_date.unwrap();
        assert!((recorded - at).num_seconds().abs() < 2);
    }
}
