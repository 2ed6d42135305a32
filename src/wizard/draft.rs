//! The wizard's aggregate draft and its reducer.
//!
//! Every selection the user makes lands in one `Draft` record, mutated
//! only through [`Draft::apply`]. Keeping the whole draft in one structure
//! makes reset and deep-equality checks trivial and keeps the per-step
//! completeness rules next to the data they inspect.

use serde::{Deserialize, Serialize};

use crate::booking::model::{BookingRequest, SessionType, UserIdentity};
use crate::booking::slots::SessionSlot;
use crate::directory::model::{Professional, ProfessionalKind};
use crate::error::BookingError;
use crate::wizard::intake::{IntakeForm, Urgency};
use crate::wizard::step::Step;

/// Which directory query the current selections call for.
///
/// `None` from [`Draft::fetch_criteria`] means no query should run yet
/// (no professional kind chosen, or a counsellor without a college).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCriteria {
    Doctors,
    CounsellorsAt(String),
}

impl std::fmt::Display for FetchCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Doctors => write!(f, "doctors"),
            Self::CounsellorsAt(college) => write!(f, "counsellors at {college}"),
        }
    }
}

/// Every draft mutation, applied through the single reducer.
///
/// There is deliberately no action that edits the email: it comes from the
/// authenticated identity and stays whatever the identity says.
#[derive(Debug, Clone)]
pub enum DraftAction {
    ToggleIssue(String),
    ChooseProfessionalKind(ProfessionalKind),
    SelectCollege(String),
    SelectProfessional(Professional),
    ChooseSessionType(SessionType),
    PickSlot(SessionSlot),
    ClearSlot,
    SetName(String),
    SetPhone(String),
    SetPreviousTherapy(String),
    SetCurrentMedication(String),
    SetUrgency(Urgency),
    SetAdditionalNotes(String),
    GoTo(Step),
}

/// The accumulated, not-yet-submitted booking selections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub step: Step,
    /// Issue labels in the order they were first selected; the first one
    /// doubles as the singular legacy field on submission.
    pub issues: Vec<String>,
    pub professional_kind: Option<ProfessionalKind>,
    pub college: Option<String>,
    /// Snapshot of the chosen directory entry. Cleared whenever the fetch
    /// criteria change, so it can never reference a stale result set.
    pub professional: Option<Professional>,
    pub session_type: Option<SessionType>,
    pub slot: Option<SessionSlot>,
    pub intake: IntakeForm,
}

impl Draft {
    /// The initial draft for an authenticated user: everything empty except
    /// the identity-seeded intake fields.
    pub fn for_identity(identity: &UserIdentity) -> Self {
        Self {
            intake: IntakeForm::for_identity(identity),
            ..Self::default()
        }
    }

    /// Apply one action. Criteria-changing actions also clear whatever the
    /// change invalidates.
    pub fn apply(&mut self, action: DraftAction) {
        match action {
            DraftAction::ToggleIssue(issue) => {
                if let Some(pos) = self.issues.iter().position(|i| *i == issue) {
                    self.issues.remove(pos);
                } else {
                    self.issues.push(issue);
                }
            }
            DraftAction::ChooseProfessionalKind(kind) => {
                if self.professional_kind != Some(kind) {
                    self.college = None;
                    self.professional = None;
                }
                self.professional_kind = Some(kind);
            }
            DraftAction::SelectCollege(name) => {
                self.college = Some(name);
                self.professional = None;
            }
            DraftAction::SelectProfessional(professional) => {
                self.professional = Some(professional);
            }
            DraftAction::ChooseSessionType(session_type) => {
                self.session_type = Some(session_type);
            }
            DraftAction::PickSlot(slot) => self.slot = Some(slot),
            DraftAction::ClearSlot => self.slot = None,
            DraftAction::SetName(name) => self.intake.name = name,
            DraftAction::SetPhone(phone) => self.intake.phone = phone,
            DraftAction::SetPreviousTherapy(value) => self.intake.previous_therapy = value,
            DraftAction::SetCurrentMedication(value) => self.intake.current_medication = value,
            DraftAction::SetUrgency(urgency) => self.intake.urgency = Some(urgency),
            DraftAction::SetAdditionalNotes(notes) => self.intake.additional_notes = notes,
            DraftAction::GoTo(step) => self.step = step,
        }
    }

    /// Whether the draft data satisfies a step's required-field rule.
    ///
    /// This is the data half of the gate; the engine additionally refuses
    /// to leave the professional step while a fetch is in flight.
    pub fn step_data_complete(&self, step: Step) -> bool {
        match step {
            Step::Issues => !self.issues.is_empty(),
            Step::ProfessionalType => self.professional_kind.is_some(),
            Step::Professional => self.professional.is_some(),
            Step::SessionType => self.session_type.is_some(),
            Step::Schedule => self.slot.is_some(),
            Step::Intake => self.intake.contact_complete(),
            Step::Confirmation => true,
        }
    }

    /// The directory query the current selections call for, if any.
    pub fn fetch_criteria(&self) -> Option<FetchCriteria> {
        match self.professional_kind? {
            ProfessionalKind::Doctor => Some(FetchCriteria::Doctors),
            ProfessionalKind::Counsellor => {
                self.college.clone().map(FetchCriteria::CounsellorsAt)
            }
        }
    }

    /// Names of required fields (across all gated steps) still missing.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.issues.is_empty() {
            missing.push("issues".to_string());
        }
        match self.professional_kind {
            None => missing.push("professional kind".to_string()),
            Some(ProfessionalKind::Counsellor) if self.college.is_none() => {
                missing.push("college".to_string());
            }
            Some(_) => {}
        }
        if self.professional.is_none() {
            missing.push("professional".to_string());
        }
        if self.session_type.is_none() {
            missing.push("session type".to_string());
        }
        if self.slot.is_none() {
            missing.push("date and time".to_string());
        }
        for field in self.intake.missing_contact_fields() {
            missing.push(field.to_string());
        }
        missing
    }

    /// Assemble the submission payload from a complete draft.
    pub fn assemble_request(&self) -> Result<BookingRequest, BookingError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(BookingError::DraftIncomplete { missing });
        }

        let (Some(professional), Some(session_type), Some(slot)) =
            (self.professional.as_ref(), self.session_type, self.slot)
        else {
            // Unreachable after the missing-fields check; kept as a guard
            // rather than an unwrap.
            return Err(BookingError::DraftIncomplete {
                missing: vec!["selection".to_string()],
            });
        };

        let selected_issue = self.issues.first().cloned().unwrap_or_default();

        Ok(BookingRequest {
            user_name: self.intake.name.trim().to_string(),
            user_email: self.intake.email.trim().to_string(),
            phone: self.intake.phone.trim().to_string(),
            user_issues: self.issues.clone(),
            selected_issue,
            professional_id: professional.id().to_string(),
            professional_name: professional.name().to_string(),
            professional_kind: professional.kind(),
            session_type,
            date: slot.date,
            time: slot.time,
            duration_minutes: session_type.duration_minutes(),
            price: session_type.price(),
            previous_therapy: self.intake.previous_therapy.clone(),
            current_medication: self.intake.current_medication.clone(),
            urgency: self.intake.urgency,
            additional_notes: self.intake.additional_notes.clone(),
        })
    }
}
