//! Manobal booking core — wizard state machine, directory, storage, ratings.

pub mod booking;
pub mod config;
pub mod directory;
pub mod error;
pub mod notify;
pub mod ratings;
pub mod reminders;
pub mod store;
pub mod wizard;
