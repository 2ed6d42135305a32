//! The booking wizard engine — step navigation, the reactive directory
//! fetch, and final submission.
//!
//! One `BookingWizard` owns one draft. Every mutation goes through the
//! draft reducer under a write lock, and every observable change is
//! broadcast to subscribers, so a frontend can stay a thin renderer.
//!
//! Directory fetches are fire-and-forget with a generation guard: each
//! criteria change bumps the generation, and a resolving fetch applies its
//! result only if its generation is still current. A slow stale response
//! can therefore never overwrite a newer one (last criteria wins).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::booking::model::{BookingRecord, SessionType, UserIdentity};
use crate::booking::slots::SessionSlot;
use crate::config::WizardConfig;
use crate::directory::{Professional, ProfessionalDirectory, ProfessionalKind};
use crate::error::{BookingError, DirectoryError, Error};
use crate::notify::Notifier;
use crate::store::BookingStore;
use crate::wizard::draft::{Draft, DraftAction, FetchCriteria};
use crate::wizard::intake::{ContactRules, Urgency};
use crate::wizard::step::Step;

/// Events broadcast to wizard subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WizardEvent {
    StepChanged { step: Step },
    DirectoryLoading { criteria: String },
    DirectoryLoaded { count: usize },
    DirectoryFailed { message: String },
    BookingSubmitted { booking_id: Uuid },
    SubmissionFailed { message: String },
    DraftReset,
}

/// The professional list for the current fetch criteria.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub professionals: Vec<Professional>,
    pub loading: bool,
    pub error: Option<String>,
}

/// The wizard engine. Construct with [`BookingWizard::new`] and share the
/// returned `Arc` between the driver and any subscribers.
pub struct BookingWizard {
    identity: UserIdentity,
    config: WizardConfig,
    directory: Arc<dyn ProfessionalDirectory>,
    store: Arc<dyn BookingStore>,
    notifier: Option<Arc<dyn Notifier>>,
    contact_rules: ContactRules,
    draft: RwLock<Draft>,
    roster: Arc<RwLock<Roster>>,
    generation: Arc<AtomicU64>,
    tx: broadcast::Sender<WizardEvent>,
}

impl BookingWizard {
    pub fn new(
        identity: UserIdentity,
        directory: Arc<dyn ProfessionalDirectory>,
        store: Arc<dyn BookingStore>,
        config: WizardConfig,
    ) -> Arc<Self> {
        Self::build(identity, directory, store, None, config)
    }

    pub fn with_notifier(
        identity: UserIdentity,
        directory: Arc<dyn ProfessionalDirectory>,
        store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        config: WizardConfig,
    ) -> Arc<Self> {
        Self::build(identity, directory, store, Some(notifier), config)
    }

    fn build(
        identity: UserIdentity,
        directory: Arc<dyn ProfessionalDirectory>,
        store: Arc<dyn BookingStore>,
        notifier: Option<Arc<dyn Notifier>>,
        config: WizardConfig,
    ) -> Arc<Self> {
        let (tx, _) = broadcast::channel(256);
        let draft = Draft::for_identity(&identity);
        Arc::new(Self {
            identity,
            config,
            directory,
            store,
            notifier,
            contact_rules: ContactRules::new(),
            draft: RwLock::new(draft),
            roster: Arc::new(RwLock::new(Roster::default())),
            generation: Arc::new(AtomicU64::new(0)),
            tx,
        })
    }

    /// Subscribe to wizard events.
    pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
        self.tx.subscribe()
    }

    /// Wizard events as an async stream. Lagged subscribers skip ahead.
    pub fn event_stream(&self) -> impl futures::Stream<Item = WizardEvent> {
        let rx = self.subscribe();
        futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }

    // ── Snapshots ───────────────────────────────────────────────────

    pub async fn current_step(&self) -> Step {
        self.draft.read().await.step
    }

    /// Snapshot of the current draft.
    pub async fn draft(&self) -> Draft {
        self.draft.read().await.clone()
    }

    /// Snapshot of the current professional roster.
    pub async fn roster(&self) -> Roster {
        self.roster.read().await.clone()
    }

    /// Whether the current step's gate would let [`advance`](Self::advance)
    /// through. Drivers use this to enable or disable their continue control.
    pub async fn can_advance(&self) -> bool {
        let draft = self.draft.read().await;
        let roster = self.roster.read().await;
        Self::step_gate(&draft, &roster)
    }

    /// The forward gate for the draft's current step. On the professional
    /// step the draft data alone is not enough: an in-flight fetch or a
    /// fetch error also holds the user at the step.
    fn step_gate(draft: &Draft, roster: &Roster) -> bool {
        if !draft.step_data_complete(draft.step) {
            return false;
        }
        if draft.step == Step::Professional && (roster.loading || roster.error.is_some()) {
            return false;
        }
        true
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Move forward one step. Returns `false`, with no state change, when
    /// the current step's gate is unmet or the wizard is already on the
    /// last step.
    pub async fn advance(&self) -> bool {
        let mut draft = self.draft.write().await;
        let roster = self.roster.read().await;
        if !Self::step_gate(&draft, &roster) {
            debug!(step = %draft.step, "Advance blocked by step gate");
            return false;
        }
        drop(roster);
        let Some(next) = draft.step.next() else {
            return false;
        };
        draft.apply(DraftAction::GoTo(next));
        debug!(step = %next, "Step advanced");
        let _ = self.tx.send(WizardEvent::StepChanged { step: next });
        true
    }

    /// Move back one step. Never gated; returns `false` only on the first
    /// step, where there is nowhere to go.
    pub async fn retreat(&self) -> bool {
        let mut draft = self.draft.write().await;
        let Some(prev) = draft.step.prev() else {
            return false;
        };
        draft.apply(DraftAction::GoTo(prev));
        debug!(step = %prev, "Step retreated");
        let _ = self.tx.send(WizardEvent::StepChanged { step: prev });
        true
    }

    /// Advance past every already-satisfied step up to `target`. Used by
    /// the auto-advancing selections, so committing a choice on an earlier
    /// step carries the user forward as far as their data allows.
    fn advance_through(&self, draft: &mut Draft, target: Step) {
        while draft.step.index() < target.index() {
            if !draft.step_data_complete(draft.step) {
                break;
            }
            let Some(next) = draft.step.next() else {
                break;
            };
            draft.apply(DraftAction::GoTo(next));
            debug!(step = %next, "Auto-advanced");
            let _ = self.tx.send(WizardEvent::StepChanged { step: next });
        }
    }

    // ── Selections ──────────────────────────────────────────────────

    /// Toggle an issue in or out of the selected set.
    pub async fn toggle_issue(&self, issue: impl Into<String>) {
        let mut draft = self.draft.write().await;
        draft.apply(DraftAction::ToggleIssue(issue.into()));
    }

    /// Commit a professional kind. Auto-advances to the professional step
    /// and starts the matching directory fetch.
    pub async fn choose_professional_kind(&self, kind: ProfessionalKind) {
        {
            let mut draft = self.draft.write().await;
            draft.apply(DraftAction::ChooseProfessionalKind(kind));
            info!(%kind, "Professional kind chosen");
            if Step::ProfessionalType.info().auto_advance {
                self.advance_through(&mut draft, Step::Professional);
            }
        }
        self.refresh_directory().await;
    }

    /// Set the college filter for counsellor lookup. Always drops the
    /// fetched list and any selected professional, then refetches.
    pub async fn select_college(&self, name: impl Into<String>) {
        let name = name.into();
        {
            let mut draft = self.draft.write().await;
            info!(college = %name, "College selected");
            draft.apply(DraftAction::SelectCollege(name));
        }
        self.refresh_directory().await;
    }

    /// Commit a professional from the current roster by id, then
    /// auto-advance. Returns `false` when the roster is still loading or
    /// the id is not in the current list, so a selection can never
    /// reference a stale result set.
    pub async fn select_professional(&self, id: &str) -> bool {
        let mut draft = self.draft.write().await;
        let roster = self.roster.read().await;
        if roster.loading {
            debug!(professional_id = %id, "Selection refused, fetch in flight");
            return false;
        }
        let Some(professional) = roster.professionals.iter().find(|p| p.id() == id).cloned()
        else {
            debug!(professional_id = %id, "Selection refused, not in the current list");
            return false;
        };
        drop(roster);
        info!(professional_id = %id, name = %professional.name(), "Professional selected");
        draft.apply(DraftAction::SelectProfessional(professional));
        if Step::Professional.info().auto_advance {
            self.advance_through(&mut draft, Step::SessionType);
        }
        true
    }

    /// Set the session modality. No auto-advance; the user confirms the
    /// price card with an explicit continue.
    pub async fn choose_session_type(&self, session_type: SessionType) {
        let mut draft = self.draft.write().await;
        debug!(%session_type, "Session type chosen");
        draft.apply(DraftAction::ChooseSessionType(session_type));
    }

    /// Set the appointment slot from a combined date-time value.
    pub async fn pick_slot(&self, value: NaiveDateTime) -> Result<(), BookingError> {
        let slot = SessionSlot::from_datetime(value)?;
        let mut draft = self.draft.write().await;
        debug!(%slot, "Slot picked");
        draft.apply(DraftAction::PickSlot(slot));
        Ok(())
    }

    pub async fn clear_slot(&self) {
        let mut draft = self.draft.write().await;
        draft.apply(DraftAction::ClearSlot);
    }

    // ── Intake fields ───────────────────────────────────────────────

    pub async fn set_name(&self, name: impl Into<String>) {
        self.draft.write().await.apply(DraftAction::SetName(name.into()));
    }

    pub async fn set_phone(&self, phone: impl Into<String>) {
        self.draft.write().await.apply(DraftAction::SetPhone(phone.into()));
    }

    pub async fn set_previous_therapy(&self, answer: impl Into<String>) {
        self.draft
            .write()
            .await
            .apply(DraftAction::SetPreviousTherapy(answer.into()));
    }

    pub async fn set_current_medication(&self, answer: impl Into<String>) {
        self.draft
            .write()
            .await
            .apply(DraftAction::SetCurrentMedication(answer.into()));
    }

    pub async fn set_urgency(&self, urgency: Urgency) {
        self.draft.write().await.apply(DraftAction::SetUrgency(urgency));
    }

    pub async fn set_additional_notes(&self, notes: impl Into<String>) {
        self.draft
            .write()
            .await
            .apply(DraftAction::SetAdditionalNotes(notes.into()));
    }

    // ── Directory fetch ─────────────────────────────────────────────

    /// Re-run the directory query for the draft's current criteria.
    ///
    /// Bumps the fetch generation, clears the roster, then resolves the
    /// query on a background task. The task applies its result only if no
    /// newer fetch has started since. With no criteria yet (no kind, or a
    /// counsellor without a college) this just clears the roster.
    pub async fn refresh_directory(&self) {
        let criteria = self.draft.read().await.fetch_criteria();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut roster = self.roster.write().await;
            roster.professionals.clear();
            roster.error = None;
            roster.loading = criteria.is_some();
        }

        let Some(criteria) = criteria else {
            return;
        };

        info!(%criteria, generation, "Directory fetch started");
        let _ = self.tx.send(WizardEvent::DirectoryLoading {
            criteria: criteria.to_string(),
        });

        let directory = Arc::clone(&self.directory);
        let roster = Arc::clone(&self.roster);
        let counter = Arc::clone(&self.generation);
        let tx = self.tx.clone();
        let wait = self.config.directory_timeout;

        tokio::spawn(async move {
            let fetched = tokio::time::timeout(wait, fetch(directory, &criteria)).await;
            let outcome = match fetched {
                Ok(result) => result,
                Err(_) => Err(DirectoryError::Timeout { waited: wait }),
            };

            let mut roster = roster.write().await;
            // A newer fetch owns the roster now; this result is stale.
            if counter.load(Ordering::SeqCst) != generation {
                debug!(generation, "Stale directory response dropped");
                return;
            }

            roster.loading = false;
            match outcome {
                Ok(list) => {
                    info!(count = list.len(), %criteria, "Directory fetch resolved");
                    let _ = tx.send(WizardEvent::DirectoryLoaded { count: list.len() });
                    roster.professionals = list;
                }
                Err(e) => {
                    warn!(error = %e, %criteria, "Directory fetch failed");
                    roster.error = Some(e.to_string());
                    let _ = tx.send(WizardEvent::DirectoryFailed {
                        message: e.to_string(),
                    });
                }
            }
        });
    }

    // ── Submission and reset ────────────────────────────────────────

    /// Validate the whole draft, persist the booking, and on success reset
    /// the draft and land on the confirmation step. On failure the draft
    /// is left untouched so the user can retry.
    pub async fn submit(&self) -> Result<BookingRecord, Error> {
        let request = {
            let draft = self.draft.read().await;
            let request = draft.assemble_request()?;
            self.contact_rules.check(&draft.intake)?;
            request
        };

        let record = BookingRecord::new(request);
        info!(
            booking_id = %record.id,
            professional = %record.request.professional_name,
            "Submitting booking"
        );

        match tokio::time::timeout(self.config.submit_timeout, self.store.create_booking(&record))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(error = %e, "Booking submission failed");
                let _ = self.tx.send(WizardEvent::SubmissionFailed {
                    message: e.to_string(),
                });
                return Err(e.into());
            }
            Err(_) => {
                let waited = self.config.submit_timeout;
                warn!(?waited, "Booking submission timed out");
                let err = BookingError::Timeout { waited };
                let _ = self.tx.send(WizardEvent::SubmissionFailed {
                    message: err.to_string(),
                });
                return Err(err.into());
            }
        }

        {
            let mut draft = self.draft.write().await;
            *draft = Draft::for_identity(&self.identity);
            draft.apply(DraftAction::GoTo(Step::Confirmation));
        }
        self.invalidate_roster().await;
        let _ = self.tx.send(WizardEvent::StepChanged {
            step: Step::Confirmation,
        });
        let _ = self.tx.send(WizardEvent::BookingSubmitted {
            booking_id: record.id,
        });
        info!(booking_id = %record.id, "Booking submitted");

        if let Some(notifier) = &self.notifier {
            // Best effort; the booking already went through.
            if let Err(e) = notifier.booking_confirmed(&record).await {
                warn!(error = %e, "Confirmation notification failed");
            }
        }

        Ok(record)
    }

    /// Restore the draft to its initial state and return to the first step.
    pub async fn reset(&self) {
        {
            let mut draft = self.draft.write().await;
            *draft = Draft::for_identity(&self.identity);
        }
        self.invalidate_roster().await;
        info!("Wizard reset");
        let _ = self.tx.send(WizardEvent::DraftReset);
        let _ = self.tx.send(WizardEvent::StepChanged { step: Step::Issues });
    }

    /// Clear the roster and orphan any in-flight fetch.
    async fn invalidate_roster(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut roster = self.roster.write().await;
        roster.professionals.clear();
        roster.loading = false;
        roster.error = None;
    }
}

/// Run the directory query matching the criteria.
async fn fetch(
    directory: Arc<dyn ProfessionalDirectory>,
    criteria: &FetchCriteria,
) -> Result<Vec<Professional>, DirectoryError> {
    match criteria {
        FetchCriteria::Doctors => directory.list_doctors().await,
        FetchCriteria::CounsellorsAt(college) => directory.counsellors_by_college(college).await,
    }
}
