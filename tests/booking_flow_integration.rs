//! End-to-end booking flow tests.
//!
//! Each test wires a real wizard to the seeded in-memory directory and an
//! in-memory libSQL store, walks the user-visible flow, and checks what
//! actually got persisted.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal_macros::dec;
use tokio::time::timeout;
use uuid::Uuid;

use manobal_booking::booking::{BookingRecord, SessionType, UserIdentity};
use manobal_booking::config::{ReminderConfig, WizardConfig};
use manobal_booking::directory::{MemoryDirectory, ProfessionalKind};
use manobal_booking::error::{Error, NotifyError, RatingError};
use manobal_booking::notify::Notifier;
use manobal_booking::ratings::{RatingScores, RatingsService};
use manobal_booking::reminders::ReminderSweeper;
use manobal_booking::store::{BookingStore, LibSqlStore};
use manobal_booking::wizard::{BookingWizard, Step};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Records every email instead of sending it.
#[derive(Default)]
struct RecordingNotifier {
    confirmations: Mutex<Vec<Uuid>>,
    reminders: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn booking_confirmed(&self, booking: &BookingRecord) -> Result<(), NotifyError> {
        self.confirmations.lock().unwrap().push(booking.id);
        Ok(())
    }

    async fn rating_reminder(&self, booking: &BookingRecord) -> Result<(), NotifyError> {
        self.reminders.lock().unwrap().push(booking.id);
        Ok(())
    }
}

fn identity() -> UserIdentity {
    UserIdentity {
        display_name: "Maya".to_string(),
        email: "maya@rkgit.edu.in".to_string(),
    }
}

async fn wired_wizard() -> (Arc<BookingWizard>, Arc<LibSqlStore>, Arc<RecordingNotifier>) {
    let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
    let notifier = Arc::new(RecordingNotifier::default());
    let wizard = BookingWizard::with_notifier(
        identity(),
        Arc::new(MemoryDirectory::with_sample_data()),
        store.clone(),
        notifier.clone(),
        WizardConfig::default(),
    );
    (wizard, store, notifier)
}

/// Wait for the in-flight directory fetch to land.
async fn settle(wizard: &BookingWizard) {
    for _ in 0..200 {
        if !wizard.roster().await.loading {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("directory fetch never settled");
}

/// Walk the counsellor flow up to a complete intake, ready to submit.
async fn fill_counsellor_flow(wizard: &BookingWizard) {
    wizard.toggle_issue("Anxiety").await;
    wizard.toggle_issue("Academic Stress").await;
    assert!(wizard.advance().await);

    // Kind selection commits the step; college choice triggers the fetch.
    wizard
        .choose_professional_kind(ProfessionalKind::Counsellor)
        .await;
    assert_eq!(wizard.current_step().await, Step::Professional);
    wizard.select_college("RKGIT").await;
    settle(wizard).await;

    assert!(wizard.select_professional("cns-1").await);
    assert_eq!(wizard.current_step().await, Step::SessionType);

    wizard.choose_session_type(SessionType::Video).await;
    assert!(wizard.advance().await);

    let slot = NaiveDate::from_ymd_opt(2025, 3, 14)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();
    wizard.pick_slot(slot).await.unwrap();
    assert!(wizard.advance().await);

    assert_eq!(wizard.current_step().await, Step::Intake);
    wizard.set_phone("+91 98765 43210").await;
}

// ── Booking flow ─────────────────────────────────────────────────────

#[tokio::test]
async fn full_counsellor_booking_round_trip() {
    timeout(TEST_TIMEOUT, async {
        let (wizard, store, notifier) = wired_wizard().await;
        fill_counsellor_flow(&wizard).await;

        let record = wizard.submit().await.unwrap();

        // The returned record carries the assembled payload.
        assert_eq!(record.request.user_name, "Maya");
        assert_eq!(record.request.user_email, "maya@rkgit.edu.in");
        assert_eq!(record.request.user_issues, vec!["Anxiety", "Academic Stress"]);
        assert_eq!(record.request.selected_issue, "Anxiety");
        assert_eq!(record.request.professional_id, "cns-1");
        assert_eq!(record.request.professional_name, "Priya Sharma");
        assert_eq!(record.request.professional_kind, ProfessionalKind::Counsellor);
        assert_eq!(record.request.session_type, SessionType::Video);
        assert_eq!(record.request.price, dec!(120));
        assert_eq!(record.request.duration_minutes, Some(50));
        assert_eq!(record.request.date, NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert_eq!(record.request.time, NaiveTime::from_hms_opt(10, 30, 0).unwrap());

        // The same record is in the store.
        let stored = store.get_booking(record.id).await.unwrap().unwrap();
        assert_eq!(stored.request.professional_name, "Priya Sharma");
        assert_eq!(stored.request.phone, "+91 98765 43210");
        assert!(!stored.has_rated);

        let mine = store
            .bookings_for_user("maya@rkgit.edu.in", 10)
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);

        // Confirmation email went out, wizard landed on the final step
        // with a clean draft.
        assert_eq!(*notifier.confirmations.lock().unwrap(), vec![record.id]);
        assert_eq!(wizard.current_step().await, Step::Confirmation);
        assert!(wizard.draft().await.issues.is_empty());
    })
    .await
    .expect("test timed out");
}

// ── Ratings ──────────────────────────────────────────────────────────

#[tokio::test]
async fn rating_a_booking_updates_the_professional_summary() {
    timeout(TEST_TIMEOUT, async {
        let (wizard, store, _notifier) = wired_wizard().await;
        fill_counsellor_flow(&wizard).await;
        let record = wizard.submit().await.unwrap();

        let service = RatingsService::new(store.clone());
        let scores = RatingScores::new(5, 4, 5).unwrap();
        let rating = service
            .submit_rating(record.id, scores, true, Some("Very helpful".to_string()), false)
            .await
            .unwrap();
        assert_eq!(rating.professional_id, "cns-1");

        let booked = store.get_booking(record.id).await.unwrap().unwrap();
        assert!(booked.has_rated);
        assert_eq!(booked.rating_id, Some(rating.id));

        let summary = store.get_rating_summary("cns-1").await.unwrap().unwrap();
        assert_eq!(summary.total_ratings, 1);
        assert_eq!(summary.average_overall, dec!(5.0));
        assert_eq!(summary.average_service_quality, dec!(4.0));
        assert_eq!(summary.recommendation_percentage, dec!(100));
        assert_eq!(summary.distribution[4], 1);

        // One rating per booking.
        let again = service
            .submit_rating(record.id, RatingScores::new(3, 3, 3).unwrap(), false, None, false)
            .await;
        assert!(matches!(
            again,
            Err(Error::Rating(RatingError::AlreadyRated { .. }))
        ));
    })
    .await
    .expect("test timed out");
}

// ── Reminders ────────────────────────────────────────────────────────

#[tokio::test]
async fn reminder_sweep_nudges_until_the_booking_is_rated() {
    timeout(TEST_TIMEOUT, async {
        let (wizard, store, notifier) = wired_wizard().await;
        fill_counsellor_flow(&wizard).await;
        let record = wizard.submit().await.unwrap();

        // Zero-width windows make the fresh booking immediately eligible.
        let config = ReminderConfig {
            enabled: true,
            min_age_hours: 0,
            resend_after_days: 0,
            ..ReminderConfig::default()
        };
        let sweeper = ReminderSweeper::new(store.clone(), notifier.clone(), config);

        sweeper.sweep().await;
        assert_eq!(*notifier.reminders.lock().unwrap(), vec![record.id]);

        let reminded = store.get_booking(record.id).await.unwrap().unwrap();
        assert!(reminded.rating_reminder_sent);

        // Once rated, the sweep leaves the booking alone.
        RatingsService::new(store.clone())
            .submit_rating(record.id, RatingScores::new(4, 4, 4).unwrap(), true, None, false)
            .await
            .unwrap();

        sweeper.sweep().await;
        assert_eq!(notifier.reminders.lock().unwrap().len(), 1);
    })
    .await
    .expect("test timed out");
}
