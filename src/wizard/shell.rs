//! Wizard shell: lifecycle around the state machine.
//!
//! The shell owns the draft prompt on mount, autosave of every edit, routing
//! of the primary action to next-or-submit, the abandonment guard and the
//! terminal success state. Rendering lives in `ui`; this type is the
//! headless controller the screen drives.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{StepTransition, SubmitOutcome, SubmitStart, WizardState};
use super::step::StepList;
use super::submit::{FormSubmitter, SubmitError, Submission};
use crate::drafts::{DraftAutosave, DraftKey, Drafts};
use crate::form_data::FormData;

type DataCallback = Box<dyn FnMut(&FormData) + Send>;

/// Caller-supplied identity of one wizard run
#[derive(Debug, Clone, Default)]
pub struct WizardOptions {
    /// Draft namespace, e.g. `event`
    pub form_type: String,
    /// Opaque owner identity, scopes the draft
    pub owner_id: String,
    pub initial_data: Option<FormData>,
}

impl WizardOptions {
    pub fn new(form_type: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            form_type: form_type.into(),
            owner_id: owner_id.into(),
            initial_data: None,
        }
    }

    pub fn initial_data(mut self, data: FormData) -> Self {
        self.initial_data = Some(data);
        self
    }
}

/// What a success call-to-action does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuccessAction {
    /// Start another form of the same type
    Restart,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToAction {
    pub label: String,
    pub action: SuccessAction,
}

/// Terminal view shown after a successful submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessView {
    pub title: String,
    pub message: String,
    pub primary: CallToAction,
    #[serde(default)]
    pub secondary: Option<CallToAction>,
}

impl Default for SuccessView {
    fn default() -> Self {
        Self {
            title: "Submitted".to_string(),
            message: "Your form has been submitted.".to_string(),
            primary: CallToAction {
                label: "Done".to_string(),
                action: SuccessAction::Exit,
            },
            secondary: Some(CallToAction {
                label: "Start another".to_string(),
                action: SuccessAction::Restart,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellPhase {
    /// A saved draft exists; waiting for resume or start fresh
    DraftPrompt { saved_at: Option<DateTime<Utc>> },
    Active,
    Submitting,
    /// Terminal
    Success,
}

/// Result of the primary (Enter / Next / Submit) action
#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryAction {
    Advanced { from: usize, to: usize },
    /// Validation failed on the current step
    Blocked,
    /// Last step validated; run this through the submitter and report back
    Submit(Submission),
    /// Not accepting the action in the current phase
    Ignored,
}

pub struct WizardShell {
    options: WizardOptions,
    state: WizardState,
    autosave: DraftAutosave,
    submitter: Arc<dyn FormSubmitter>,
    success_view: SuccessView,
    phase: ShellPhase,
    on_success: Option<DataCallback>,
    last_submission: Option<Submission>,
}

impl WizardShell {
    /// Build the shell and check for a saved draft before any step is shown
    pub fn mount(
        steps: StepList,
        options: WizardOptions,
        drafts: Drafts,
        submitter: Arc<dyn FormSubmitter>,
        autosave_debounce: Duration,
    ) -> Self {
        let key = DraftKey::new(&options.form_type, &options.owner_id);
        let phase = if drafts.has_draft(&key.form_type, &key.owner_id) {
            ShellPhase::DraftPrompt {
                saved_at: drafts.draft_timestamp(&key.form_type, &key.owner_id),
            }
        } else {
            ShellPhase::Active
        };

        tracing::info!(
            form = %options.form_type,
            steps = steps.len(),
            draft = matches!(phase, ShellPhase::DraftPrompt { .. }),
            "Wizard mounted"
        );

        Self {
            state: WizardState::new(steps, options.initial_data.clone()),
            autosave: DraftAutosave::new(drafts, key, autosave_debounce),
            options,
            submitter,
            success_view: SuccessView::default(),
            phase,
            on_success: None,
            last_submission: None,
        }
    }

    pub fn with_success_view(mut self, view: SuccessView) -> Self {
        self.success_view = view;
        self
    }

    /// Called with the snapshot after every draft write
    pub fn on_save_draft(&mut self, callback: DataCallback) {
        self.autosave.set_on_save(callback);
    }

    /// Called once per successful submit, after the draft is cleared
    pub fn on_success(&mut self, callback: DataCallback) {
        self.on_success = Some(callback);
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn options(&self) -> &WizardOptions {
        &self.options
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn phase(&self) -> ShellPhase {
        self.phase
    }

    pub fn success_view(&self) -> &SuccessView {
        &self.success_view
    }

    pub fn submitter(&self) -> Arc<dyn FormSubmitter> {
        Arc::clone(&self.submitter)
    }

    pub fn last_submission(&self) -> Option<&Submission> {
        self.last_submission.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.phase == ShellPhase::Success
    }

    /// Leaving now loses nothing the user would miss
    pub fn can_leave(&self) -> bool {
        self.is_success() || !self.state.is_dirty()
    }

    fn drafts(&self) -> &Drafts {
        self.autosave.drafts()
    }

    // ─── Draft prompt ───────────────────────────────────────────────────────

    /// Load the saved draft and start from the first step
    pub fn resume_draft(&mut self) {
        if !matches!(self.phase, ShellPhase::DraftPrompt { .. }) {
            return;
        }

        let (form_type, owner_id) = (&self.options.form_type, &self.options.owner_id);
        if let Some(data) = self.drafts().load_draft(form_type, owner_id) {
            tracing::info!(form = %form_type, fields = data.len(), "Resuming draft");
            self.state.hydrate(&data);
        }
        self.phase = ShellPhase::Active;
    }

    /// Throw the saved draft away and start from the initial data
    pub fn start_fresh(&mut self) {
        if !matches!(self.phase, ShellPhase::DraftPrompt { .. }) {
            return;
        }

        self.drafts()
            .clear_draft(&self.options.form_type, &self.options.owner_id);
        self.state.reset_form();
        self.phase = ShellPhase::Active;
        tracing::info!(form = %self.options.form_type, "Draft discarded, starting fresh");
    }

    // ─── Active ─────────────────────────────────────────────────────────────

    /// Apply a field patch and push the full snapshot to the draft store
    pub fn update_form_data(&mut self, patch: &FormData) -> bool {
        if self.phase != ShellPhase::Active {
            return false;
        }

        let changed = self.state.update_form_data(patch);
        if changed {
            self.autosave.record(self.state.form_data());
        }
        changed
    }

    /// Next on every step but the last; submit on the last
    pub fn primary_action(&mut self) -> PrimaryAction {
        if self.phase != ShellPhase::Active {
            return PrimaryAction::Ignored;
        }

        if self.state.is_last_step() {
            return match self.begin_submit() {
                Ok(submission) => PrimaryAction::Submit(submission),
                Err(SubmitOutcome::Invalid) => PrimaryAction::Blocked,
                Err(_) => PrimaryAction::Ignored,
            };
        }

        match self.state.next_step() {
            StepTransition::Advanced { from, to } => PrimaryAction::Advanced { from, to },
            StepTransition::Blocked => PrimaryAction::Blocked,
            StepTransition::Completed | StepTransition::Ignored => PrimaryAction::Ignored,
        }
    }

    pub fn previous_step(&mut self) -> StepTransition {
        if self.phase != ShellPhase::Active {
            return StepTransition::Ignored;
        }
        self.state.previous_step()
    }

    pub fn skip_step(&mut self) -> StepTransition {
        if self.phase != ShellPhase::Active {
            return StepTransition::Ignored;
        }
        self.state.skip_step()
    }

    pub fn jump_to(&mut self, index: usize) -> StepTransition {
        if self.phase != ShellPhase::Active {
            return StepTransition::Ignored;
        }
        self.state.jump_to(index)
    }

    // ─── Submission ─────────────────────────────────────────────────────────

    /// Validate the current step and latch into `Submitting`
    pub fn begin_submit(&mut self) -> Result<Submission, SubmitOutcome> {
        match self.phase {
            ShellPhase::Active => {}
            ShellPhase::Submitting => return Err(SubmitOutcome::AlreadySubmitting),
            ShellPhase::DraftPrompt { .. } | ShellPhase::Success => {
                return Err(SubmitOutcome::Ignored)
            }
        }

        match self.state.begin_submit() {
            SubmitStart::Started(data) => {
                self.phase = ShellPhase::Submitting;
                let submission =
                    Submission::new(&self.options.form_type, &self.options.owner_id, data);
                tracing::info!(
                    form = %submission.form_type,
                    id = %submission.id,
                    submitter = self.submitter.name(),
                    "Submitting"
                );
                Ok(submission)
            }
            SubmitStart::AlreadySubmitting => Err(SubmitOutcome::AlreadySubmitting),
            SubmitStart::Invalid => Err(SubmitOutcome::Invalid),
        }
    }

    /// Record the submitter's result for the submission in flight
    pub fn complete_submit(
        &mut self,
        submission: Submission,
        result: Result<(), SubmitError>,
    ) -> SubmitOutcome {
        if self.phase != ShellPhase::Submitting {
            tracing::debug!(id = %submission.id, "Discarding stale submit result");
            return SubmitOutcome::Ignored;
        }

        let outcome = self.state.complete_submit(result);
        match &outcome {
            SubmitOutcome::Succeeded => {
                self.autosave.discard();
                self.drafts()
                    .clear_draft(&self.options.form_type, &self.options.owner_id);
                if let Some(callback) = self.on_success.as_mut() {
                    callback(&submission.data);
                }
                tracing::info!(form = %submission.form_type, id = %submission.id, "Submission succeeded");
                self.last_submission = Some(submission);
                self.phase = ShellPhase::Success;
            }
            SubmitOutcome::Failed(message) => {
                tracing::warn!(form = %submission.form_type, error = %message, "Submission failed");
                self.phase = ShellPhase::Active;
            }
            _ => self.phase = ShellPhase::Active,
        }
        outcome
    }

    /// Validate, submit through the configured submitter, and record the result
    pub async fn submit(&mut self) -> SubmitOutcome {
        let submission = match self.begin_submit() {
            Ok(submission) => submission,
            Err(outcome) => return outcome,
        };

        let submitter = self.submitter();
        let result = submitter.submit(&submission).await;
        self.complete_submit(submission, result)
    }

    /// Leave the success view for a new, empty run of the same form
    pub fn restart(&mut self) {
        if self.phase != ShellPhase::Success {
            return;
        }
        self.state.reset_form();
        self.last_submission = None;
        self.phase = ShellPhase::Active;
    }

    // ─── Autosave ───────────────────────────────────────────────────────────

    /// Periodic hook from the event loop
    pub fn tick(&mut self) {
        self.autosave.tick();
    }

    /// Write any held draft snapshot now
    pub fn flush(&mut self) {
        if !self.is_success() {
            self.autosave.flush();
        }
    }
}

impl Drop for WizardShell {
    fn drop(&mut self) {
        self.flush();
    }
}
