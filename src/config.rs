//! Configuration types.

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Wizard engine configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Budget for one directory fetch before it is reported as timed out.
    pub directory_timeout: Duration,
    /// Budget for the final submission call.
    pub submit_timeout: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            directory_timeout: Duration::from_secs(10),
            submit_timeout: Duration::from_secs(15),
        }
    }
}

impl WizardConfig {
    /// Build from environment, falling back to defaults for unset values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            directory_timeout: env_secs("MANOBAL_DIRECTORY_TIMEOUT_SECS")
                .unwrap_or(defaults.directory_timeout),
            submit_timeout: env_secs("MANOBAL_SUBMIT_TIMEOUT_SECS")
                .unwrap_or(defaults.submit_timeout),
        }
    }
}

/// SMTP notification configuration.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl NotifyConfig {
    /// Build from environment. Returns `None` (notifications disabled)
    /// when `MANOBAL_SMTP_HOST` is not set.
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("MANOBAL_SMTP_HOST").ok()?;

        let smtp_port: u16 = std::env::var("MANOBAL_SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("MANOBAL_SMTP_USERNAME").unwrap_or_default();
        let password = std::env::var("MANOBAL_SMTP_PASSWORD").unwrap_or_default();
        let from_address =
            std::env::var("MANOBAL_FROM_ADDRESS").unwrap_or_else(|_| username.clone());

        Some(Self {
            smtp_host,
            smtp_port,
            username,
            password: SecretString::from(password),
            from_address,
        })
    }
}

/// Rating-reminder sweep configuration.
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// Whether the background sweep runs at all.
    pub enabled: bool,
    /// Cron expression (with seconds field) for sweep firing times.
    pub schedule: String,
    /// A booking must be at least this old before the first reminder.
    pub min_age_hours: u64,
    /// Minimum gap between reminders for the same booking.
    pub resend_after_days: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // Daily at 09:00
            schedule: "0 0 9 * * *".to_string(),
            min_age_hours: 24,
            resend_after_days: 7,
        }
    }
}

impl ReminderConfig {
    /// Build from environment, falling back to defaults for unset values.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let enabled = std::env::var("MANOBAL_REMINDERS_ENABLED")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.enabled);

        let schedule =
            std::env::var("MANOBAL_REMINDER_CRON").unwrap_or_else(|_| defaults.schedule.clone());

        let min_age_hours = std::env::var("MANOBAL_REMINDER_MIN_AGE_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.min_age_hours);

        let resend_after_days = std::env::var("MANOBAL_REMINDER_RESEND_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.resend_after_days);

        Self {
            enabled,
            schedule,
            min_age_hours,
            resend_after_days,
        }
    }

    /// Check that the cron expression parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        cron::Schedule::from_str(&self.schedule).map_err(|e| ConfigError::InvalidValue {
            key: "MANOBAL_REMINDER_CRON".to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

/// Parse an environment variable holding whole seconds into a Duration.
fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}
