//! Booking domain records: session catalog, submission payload, persisted
//! booking.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::slots::SessionSlot;
use crate::directory::model::ProfessionalKind;
use crate::wizard::intake::Urgency;

/// The authenticated user on whose behalf the wizard runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub display_name: String,
    pub email: String,
}

/// How the session is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Video,
    Audio,
    Chat,
}

impl SessionType {
    pub const ALL: [SessionType; 3] = [SessionType::Video, SessionType::Audio, SessionType::Chat];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Video => "Video Session",
            Self::Audio => "Audio Session",
            Self::Chat => "Chat Session",
        }
    }

    /// Session length in minutes; chat sessions are ongoing and have none.
    pub fn duration_minutes(&self) -> Option<u32> {
        match self {
            Self::Video | Self::Audio => Some(50),
            Self::Chat => None,
        }
    }

    pub fn duration_label(&self) -> &'static str {
        match self {
            Self::Video | Self::Audio => "50 min",
            Self::Chat => "Ongoing",
        }
    }

    pub fn price(&self) -> Decimal {
        match self {
            Self::Video => dec!(120),
            Self::Audio => dec!(100),
            Self::Chat => dec!(80),
        }
    }
}

impl std::fmt::Display for SessionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Chat => "chat",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "audio" => Ok(Self::Audio),
            "chat" => Ok(Self::Chat),
            other => Err(format!("Unknown session type: {other}")),
        }
    }
}

/// The assembled payload handed to the booking store.
///
/// Serialized with the legacy camelCase keys the downstream service
/// expects; `selected_issue` duplicates the first issue for consumers that
/// predate multi-issue selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub user_name: String,
    pub user_email: String,
    pub phone: String,
    pub user_issues: Vec<String>,
    pub selected_issue: String,
    pub professional_id: String,
    pub professional_name: String,
    pub professional_kind: ProfessionalKind,
    pub session_type: SessionType,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: Option<u32>,
    pub price: Decimal,
    pub previous_therapy: String,
    pub current_medication: String,
    pub urgency: Option<Urgency>,
    pub additional_notes: String,
}

impl BookingRequest {
    pub fn slot(&self) -> SessionSlot {
        SessionSlot {
            date: self.date,
            time: self.time,
        }
    }
}

/// A persisted booking with its post-submission lifecycle flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub request: BookingRequest,
    pub has_rated: bool,
    pub rating_id: Option<Uuid>,
    pub rating_reminder_sent: bool,
    pub last_reminder_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRecord {
    pub fn new(request: BookingRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            request,
            has_rated: false,
            rating_id: None,
            rating_reminder_sent: false,
            last_reminder_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}
