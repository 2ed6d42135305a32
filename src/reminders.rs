//! Rating reminder sweeps.
//!
//! Users who never rated a past session get a follow-up email nudging them
//! to do so. A background task wakes on a cron schedule, queries the store
//! for eligible bookings, and sends one reminder per booking.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ReminderConfig;
use crate::error::ConfigError;
use crate::notify::Notifier;
use crate::store::BookingStore;

/// Parse a cron expression and compute the next fire time from now.
pub fn next_fire(schedule: &str) -> Result<Option<DateTime<Utc>>, ConfigError> {
    let parsed = cron::Schedule::from_str(schedule).map_err(|e| ConfigError::InvalidValue {
        key: "MANOBAL_REMINDER_CRON".to_string(),
        message: e.to_string(),
    })?;
    Ok(parsed.upcoming(Utc).next())
}

/// Runs reminder sweeps against the store.
pub struct ReminderSweeper {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    config: ReminderConfig,
}

impl ReminderSweeper {
    pub fn new(
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        config: ReminderConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Single sweep: find unrated bookings due for a nudge and email each one.
    ///
    /// A booking is marked only after its reminder goes out, so send
    /// failures are retried on the next sweep.
    pub async fn sweep(&self) {
        let now = Utc::now();
        let older_than = now - Duration::hours(self.config.min_age_hours as i64);
        let resend_before = now - Duration::days(self.config.resend_after_days as i64);

        let due = match self
            .store
            .bookings_needing_reminder(older_than, resend_before)
            .await
        {
            Ok(bookings) => bookings,
            Err(e) => {
                warn!(error = %e, "Failed to query bookings for reminders");
                return;
            }
        };

        if due.is_empty() {
            debug!("No bookings due for a rating reminder");
            return;
        }

        let mut sent = 0usize;
        for booking in &due {
            if let Err(e) = self.notifier.rating_reminder(booking).await {
                warn!(booking_id = %booking.id, error = %e, "Reminder send failed");
                continue;
            }
            if let Err(e) = self.store.mark_reminder_sent(booking.id, now).await {
                warn!(booking_id = %booking.id, error = %e, "Failed to record reminder send");
                continue;
            }
            sent += 1;
        }

        info!("Sent {sent} of {} due rating reminders", due.len());
    }
}

/// Spawn the reminder sweep background task.
///
/// Sleeps until the schedule's next fire time, sweeps, and repeats. Exits
/// if the schedule stops producing fire times or fails to parse.
pub fn spawn_reminder_task(sweeper: Arc<ReminderSweeper>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(schedule = %sweeper.config.schedule, "Rating reminder task started");

        loop {
            let fire_at = match next_fire(&sweeper.config.schedule) {
                Ok(Some(at)) => at,
                Ok(None) => {
                    warn!("Reminder schedule has no upcoming fire time, stopping");
                    return;
                }
                Err(e) => {
                    warn!(error = %e, "Reminder schedule rejected, stopping");
                    return;
                }
            };

            let wait = (fire_at - Utc::now()).to_std().unwrap_or_default();
            debug!(fire_at = %fire_at, "Next reminder sweep scheduled");
            tokio::time::sleep(wait).await;

            sweeper.sweep().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::booking::model::{BookingRecord, BookingRequest, SessionType};
    use crate::directory::ProfessionalKind;
    use crate::error::NotifyError;
    use crate::store::LibSqlStore;

    struct RecordingNotifier {
        reminders: Mutex<Vec<Uuid>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                reminders: Mutex::new(Vec::new()),
                fail,
            })
        }

        fn sent(&self) -> Vec<Uuid> {
            self.reminders.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn booking_confirmed(&self, _booking: &BookingRecord) -> Result<(), NotifyError> {
            Ok(())
        }

        async fn rating_reminder(&self, booking: &BookingRecord) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::SendFailed("stub outage".to_string()));
            }
            self.reminders.lock().unwrap().push(booking.id);
            Ok(())
        }
    }

    fn make_booking(age_hours: i64) -> BookingRecord {
        let mut booking = BookingRecord::new(BookingRequest {
            user_name: "Maya".to_string(),
            user_email: "maya@rkgit.edu.in".to_string(),
            phone: "+91 98765 43210".to_string(),
            user_issues: vec!["Anxiety".to_string()],
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
        });
        booking.created_at = Utc::now() - Duration::hours(age_hours);
        booking
    }

    async fn sweeper_with(
        notifier: Arc<RecordingNotifier>,
    ) -> (ReminderSweeper, Arc<LibSqlStore>) {
        let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
        let sweeper = ReminderSweeper::new(store.clone(), notifier, ReminderConfig::default());
        (sweeper, store)
    }

    #[tokio::test]
    async fn sweep_reminds_old_unrated_bookings_once() {
        let notifier = RecordingNotifier::new(false);
        let (sweeper, store) = sweeper_with(notifier.clone()).await;

        let due = make_booking(48);
        let fresh = make_booking(1);
        store.create_booking(&due).await.unwrap();
        store.create_booking(&fresh).await.unwrap();

        sweeper.sweep().await;

        assert_eq!(notifier.sent(), vec![due.id]);

        let marked = store.get_booking(due.id).await.unwrap().unwrap();
        assert!(marked.rating_reminder_sent);
        assert!(marked.last_reminder_date.is_some());

        // Just reminded, so the second sweep skips it.
        sweeper.sweep().await;
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn failed_send_keeps_the_booking_eligible() {
        let failing = RecordingNotifier::new(true);
        let (sweeper, store) = sweeper_with(failing.clone()).await;

        let due = make_booking(48);
        store.create_booking(&due).await.unwrap();

        sweeper.sweep().await;

        assert!(failing.sent().is_empty());
        let untouched = store.get_booking(due.id).await.unwrap().unwrap();
        assert!(!untouched.rating_reminder_sent);
        assert!(untouched.last_reminder_date.is_none());

        // A working notifier picks it up on the next sweep.
        let notifier = RecordingNotifier::new(false);
        let retry =
            ReminderSweeper::new(store.clone(), notifier.clone(), ReminderConfig::default());
        retry.sweep().await;
        assert_eq!(notifier.sent(), vec![due.id]);
    }

    #[test]
    fn next_fire_accepts_the_default_schedule() {
        let next = next_fire(&ReminderConfig::default().schedule).unwrap();
        assert!(next.is_some());
    }

    #[test]
    fn next_fire_rejects_garbage() {
        assert!(next_fire("not a cron").is_err());
    }
}
