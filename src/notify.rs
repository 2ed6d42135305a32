//! Outbound email notifications, SMTP via lettre.
//!
//! Sends are best effort: the booking flow never fails because a
//! confirmation mail could not go out.

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::booking::model::BookingRecord;
use crate::config::NotifyConfig;
use crate::error::NotifyError;

// ── Notifier trait ──────────────────────────────────────────────────

/// Sink for booking lifecycle notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell the user their booking went through.
    async fn booking_confirmed(&self, booking: &BookingRecord) -> Result<(), NotifyError>;

    /// Nudge the user to rate a past session.
    async fn rating_reminder(&self, booking: &BookingRecord) -> Result<(), NotifyError>;
}

// ── Message rendering (public for testing) ──────────────────────────

pub fn confirmation_subject(booking: &BookingRecord) -> String {
    format!(
        "Your session with {} is confirmed",
        booking.request.professional_name
    )
}

pub fn confirmation_body(booking: &BookingRecord) -> String {
    let request = &booking.request;
    format!(
        "Hi {name},\n\n\
         Your session is booked.\n\n\
         Professional: {professional}\n\
         Session: {session} ({duration})\n\
         Date: {date}\n\
         Time: {time}\n\
         Price: Rs. {price}\n\n\
         Booking reference: {reference}\n\n\
         Take care,\n\
         Manobal",
        name = request.user_name,
        professional = request.professional_name,
        session = request.session_type.label(),
        duration = request.session_type.duration_label(),
        date = request.date.format("%A, %-d %B %Y"),
        time = request.time.format("%H:%M"),
        price = request.price,
        reference = booking.id,
    )
}

pub fn reminder_subject(booking: &BookingRecord) -> String {
    format!(
        "How was your session with {}?",
        booking.request.professional_name
    )
}

pub fn reminder_body(booking: &BookingRecord) -> String {
    let request = &booking.request;
    format!(
        "Hi {name},\n\n\
         You had a {session} with {professional} on {date}. A short rating\n\
         from you helps other students pick the right person to talk to.\n\n\
         Booking reference: {reference}\n\n\
         Take care,\n\
         Manobal",
        name = request.user_name,
        session = request.session_type.label().to_lowercase(),
        professional = request.professional_name,
        date = request.date.format("%-d %B %Y"),
        reference = booking.id,
    )
}

// ── SMTP notifier ───────────────────────────────────────────────────

/// Sends notifications over an authenticated SMTP relay.
pub struct SmtpNotifier {
    config: NotifyConfig,
    transport: SmtpTransport,
}

impl SmtpNotifier {
    pub fn new(config: NotifyConfig) -> Result<Self, NotifyError> {
        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );
        let transport = SmtpTransport::relay(&config.smtp_host)
            .map_err(|e| NotifyError::BuildFailed(format!("SMTP relay error: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();
        Ok(Self { config, transport })
    }

    fn send(&self, to: &str, subject: &str, body: String) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(
                self.config
                    .from_address
                    .parse()
                    .map_err(|e| NotifyError::InvalidAddress(format!("from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| NotifyError::InvalidAddress(format!("to address: {e}")))?)
            .subject(subject)
            .body(body)
            .map_err(|e| NotifyError::BuildFailed(e.to_string()))?;

        self.transport
            .send(&email)
            .map_err(|e| NotifyError::SendFailed(e.to_string()))?;

        info!("Email sent to {to}");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn booking_confirmed(&self, booking: &BookingRecord) -> Result<(), NotifyError> {
        self.send(
            &booking.request.user_email,
            &confirmation_subject(booking),
            confirmation_body(booking),
        )
    }

    async fn rating_reminder(&self, booking: &BookingRecord) -> Result<(), NotifyError> {
        self.send(
            &booking.request.user_email,
            &reminder_subject(booking),
            reminder_body(booking),
        )
    }
}

// ── Noop notifier ───────────────────────────────────────────────────

/// Used when SMTP is not configured; logs instead of sending.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn booking_confirmed(&self, booking: &BookingRecord) -> Result<(), NotifyError> {
        debug!(booking_id = %booking.id, "Confirmation notification skipped, SMTP not configured");
        Ok(())
    }

    async fn rating_reminder(&self, booking: &BookingRecord) -> Result<(), NotifyError> {
        debug!(booking_id = %booking.id, "Rating reminder skipped, SMTP not configured");
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
