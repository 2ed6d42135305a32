//! Booking domain — session catalog, appointment grid, payload and record.

pub mod model;
pub mod slots;

pub use model::{BookingRecord, BookingRequest, SessionType, UserIdentity};
pub use slots::{SessionSlot, day_slots, is_on_grid};
