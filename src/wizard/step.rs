//! Booking wizard steps — the fixed linear sequence and per-step metadata.

use serde::{Deserialize, Serialize};

/// The steps of the booking wizard.
///
/// Progresses linearly: Issues → ProfessionalType → Professional →
/// SessionType → Schedule → Intake → Confirmation. There is no branching;
/// navigation is clamped at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Issues,
    ProfessionalType,
    Professional,
    SessionType,
    Schedule,
    Intake,
    Confirmation,
}

/// Static metadata for one step.
///
/// `auto_advance` marks selection-as-commitment steps: making the step's
/// primary selection moves the wizard forward without a separate continue
/// action. Steps without it hold their selection until an explicit advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    pub title: &'static str,
    pub description: &'static str,
    pub auto_advance: bool,
}

impl Step {
    /// All steps in wizard order.
    pub const ALL: [Step; 7] = [
        Step::Issues,
        Step::ProfessionalType,
        Step::Professional,
        Step::SessionType,
        Step::Schedule,
        Step::Intake,
        Step::Confirmation,
    ];

    /// Zero-based position in the sequence.
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    /// Step at a given position, if in range.
    pub fn from_index(index: usize) -> Option<Step> {
        Self::ALL.get(index).copied()
    }

    /// The next step in the sequence, if any.
    pub fn next(&self) -> Option<Step> {
        Self::from_index(self.index() + 1)
    }

    /// The previous step in the sequence, if any.
    pub fn prev(&self) -> Option<Step> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_first(&self) -> bool {
        *self == Step::Issues
    }

    pub fn is_last(&self) -> bool {
        *self == Step::Confirmation
    }

    /// Static metadata for this step.
    pub fn info(&self) -> &'static StepInfo {
        match self {
            Step::Issues => &StepInfo {
                title: "What's troubling you?",
                description: "Select everything you would like to talk about",
                auto_advance: false,
            },
            Step::ProfessionalType => &StepInfo {
                title: "Who would you like to see?",
                description: "Choose between a counsellor and a doctor",
                auto_advance: true,
            },
            Step::Professional => &StepInfo {
                title: "Choose your professional",
                description: "Pick from the available professionals",
                auto_advance: true,
            },
            Step::SessionType => &StepInfo {
                title: "Session type",
                description: "How would you like to meet?",
                auto_advance: false,
            },
            Step::Schedule => &StepInfo {
                title: "Pick a time",
                description: "Choose a date and time that works for you",
                auto_advance: false,
            },
            Step::Intake => &StepInfo {
                title: "About you",
                description: "Contact details and a little background",
                auto_advance: false,
            },
            Step::Confirmation => &StepInfo {
                title: "All set",
                description: "Your booking is confirmed",
                auto_advance: false,
            },
        }
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::Issues
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Issues => "issues",
            Self::ProfessionalType => "professional_type",
            Self::Professional => "professional",
            Self::SessionType => "session_type",
            Self::Schedule => "schedule",
            Self::Intake => "intake",
            Self::Confirmation => "confirmation",
        };
        write!(f, "{s}")
    }
}
