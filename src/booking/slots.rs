//! The published appointment grid.
//!
//! Sessions run every day from 09:00 to 17:00 on half-hour boundaries,
//! 17:00 being the last bookable start. One combined picker value is split
//! into the stored date and time; times off the grid are rejected.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::BookingError;

/// First bookable hour of the day.
pub const OPENING_HOUR: u32 = 9;
/// Last bookable hour of the day (a slot starts at this hour, none after).
pub const CLOSING_HOUR: u32 = 17;

/// A chosen appointment: one date plus one grid time, always set together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSlot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl SessionSlot {
    /// Split a combined picker value into a slot, rejecting off-grid times.
    pub fn from_datetime(value: NaiveDateTime) -> Result<Self, BookingError> {
        let time = value.time();
        if !is_on_grid(time) {
            return Err(BookingError::OffGridSlot {
                time: time.format("%H:%M").to_string(),
            });
        }
        Ok(Self {
            date: value.date(),
            time,
        })
    }
}

impl std::fmt::Display for SessionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.date, self.time.format("%H:%M"))
    }
}

/// All bookable start times for one day, in order.
pub fn day_slots() -> Vec<NaiveTime> {
    let mut slots = Vec::new();
    for hour in OPENING_HOUR..=CLOSING_HOUR {
        slots.push(NaiveTime::from_hms_opt(hour, 0, 0).unwrap());
        if hour < CLOSING_HOUR {
            slots.push(NaiveTime::from_hms_opt(hour, 30, 0).unwrap());
        }
    }
    slots
}

/// Whether a time sits on the published grid.
pub fn is_on_grid(time: NaiveTime) -> bool {
    time.second() == 0
        && time.nanosecond() == 0
        && (OPENING_HOUR..=CLOSING_HOUR).contains(&time.hour())
        && (time.minute() == 0 || (time.minute() == 30 && time.hour() < CLOSING_HOUR))
}
