//! Professional directory — colleges, counsellors and doctors.
//!
//! The wizard only sees the [`ProfessionalDirectory`] trait; the in-memory
//! roster and the REST client are interchangeable implementations of it.

pub mod memory;
pub mod model;
pub mod provider;
pub mod rest;

pub use memory::MemoryDirectory;
pub use model::{College, Professional, ProfessionalKind, sort_by_rating_desc};
pub use provider::ProfessionalDirectory;
pub use rest::RestDirectory;
