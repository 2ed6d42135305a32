//! The booking wizard — draft state, the step table, and the engine that
//! ties them to the directory and the store.

pub mod draft;
pub mod engine;
pub mod intake;
pub mod step;

pub use draft::{Draft, DraftAction, FetchCriteria};
pub use engine::{BookingWizard, Roster, WizardEvent};
pub use intake::{ContactRules, IntakeForm, Urgency};
pub use step::{Step, StepInfo};
