//! The wizard state machine

use std::collections::BTreeSet;
use std::future::Future;

use super::step::{StepConfig, StepList};
use super::submit::SubmitError;
use crate::form_data::{ErrorMap, FormData};

/// Result of a step transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepTransition {
    /// Moved from one step to another
    Advanced { from: usize, to: usize },
    /// The last step passed; there is nowhere further to go
    Completed,
    /// Validation failed, `errors` now holds the validator's map
    Blocked,
    /// Request not permitted in the current state, nothing changed
    Ignored,
}

/// Result of trying to start a submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitStart {
    /// Validation passed and the latch is set; hand this data to the submitter
    Started(FormData),
    /// A submission is already in flight
    AlreadySubmitting,
    /// The current step failed validation
    Invalid,
}

/// Final result of a submission attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded,
    Failed(String),
    Invalid,
    AlreadySubmitting,
    /// Nothing was in flight, or the wizard was not accepting input
    Ignored,
}

/// Mutable wizard session state over an immutable step list
#[derive(Debug, Clone)]
pub struct WizardState {
    steps: StepList,
    initial_data: FormData,
    current_step: usize,
    form_data: FormData,
    completed_steps: BTreeSet<usize>,
    errors: ErrorMap,
    submit_error: Option<String>,
    is_submitting: bool,
    is_dirty: bool,
}

impl WizardState {
    pub fn new(steps: StepList, initial_data: Option<FormData>) -> Self {
        let initial_data = initial_data.unwrap_or_default();
        Self {
            steps,
            form_data: initial_data.clone(),
            initial_data,
            current_step: 0,
            completed_steps: BTreeSet::new(),
            errors: ErrorMap::new(),
            submit_error: None,
            is_submitting: false,
            is_dirty: false,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn steps(&self) -> &StepList {
        &self.steps
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn current(&self) -> &StepConfig {
        &self.steps[self.current_step]
    }

    pub fn form_data(&self) -> &FormData {
        &self.form_data
    }

    pub fn completed_steps(&self) -> &BTreeSet<usize> {
        &self.completed_steps
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step == self.steps.last_index()
    }

    pub fn can_go_back(&self) -> bool {
        self.current_step > 0
    }

    pub fn can_skip(&self) -> bool {
        self.current().can_skip
    }

    /// Preview whether the primary action would pass validation right now
    pub fn can_go_next(&self) -> bool {
        self.current().run_validation(&self.form_data).is_empty()
    }

    /// Whether the progress indicator may jump to `index`
    pub fn can_jump_to(&self, index: usize) -> bool {
        index < self.steps.len()
            && (index == self.current_step || self.completed_steps.contains(&index))
    }

    // ─── Data ───────────────────────────────────────────────────────────────

    /// Merge a field patch into the form data.
    ///
    /// Errors for every key named in the patch are dropped straight away; the
    /// validator gets the final word on the next forward transition. Returns
    /// true if any stored value changed.
    pub fn update_form_data(&mut self, patch: &FormData) -> bool {
        if patch.is_empty() {
            return false;
        }

        for key in patch.keys() {
            self.errors.remove(key);
        }

        let changed = self.form_data.merge(patch);
        if changed.is_empty() {
            return false;
        }

        tracing::trace!(fields = ?changed, "Form data updated");
        self.is_dirty = true;
        true
    }

    /// Load resumed draft data over the initial data without marking the form dirty
    pub fn hydrate(&mut self, data: &FormData) {
        self.form_data.merge(data);
        self.errors.clear();
    }

    // ─── Transitions ────────────────────────────────────────────────────────

    /// Validate the current step and advance on success
    pub fn next_step(&mut self) -> StepTransition {
        if self.is_submitting {
            return StepTransition::Ignored;
        }

        let errors = self.current().run_validation(&self.form_data);
        if !errors.is_empty() {
            tracing::debug!(
                step = %self.current().id,
                errors = errors.len(),
                "Step validation failed"
            );
            self.errors = errors;
            return StepTransition::Blocked;
        }

        self.pass_current_step()
    }

    /// Bypass the current step without validation, if it is skippable
    pub fn skip_step(&mut self) -> StepTransition {
        if self.is_submitting || !self.can_skip() {
            return StepTransition::Ignored;
        }

        tracing::debug!(step = %self.current().id, "Step skipped");
        self.pass_current_step()
    }

    fn pass_current_step(&mut self) -> StepTransition {
        self.errors.clear();
        self.completed_steps.insert(self.current_step);

        if self.is_last_step() {
            return StepTransition::Completed;
        }

        let from = self.current_step;
        self.current_step += 1;
        tracing::debug!(from, to = self.current_step, "Advanced to next step");
        StepTransition::Advanced {
            from,
            to: self.current_step,
        }
    }

    /// Go back one step without validating
    pub fn previous_step(&mut self) -> StepTransition {
        if self.is_submitting || self.current_step == 0 {
            return StepTransition::Ignored;
        }

        let from = self.current_step;
        self.current_step -= 1;
        self.errors.clear();
        StepTransition::Advanced {
            from,
            to: self.current_step,
        }
    }

    /// Jump to a step already reached; anything else is ignored
    pub fn jump_to(&mut self, index: usize) -> StepTransition {
        if self.is_submitting || !self.can_jump_to(index) || index == self.current_step {
            return StepTransition::Ignored;
        }

        let from = self.current_step;
        self.current_step = index;
        self.errors.clear();
        tracing::debug!(from, to = index, "Jumped to step");
        StepTransition::Advanced { from, to: index }
    }

    /// Restore the state exactly as constructed
    pub fn reset_form(&mut self) {
        self.current_step = 0;
        self.form_data = self.initial_data.clone();
        self.completed_steps.clear();
        self.errors.clear();
        self.submit_error = None;
        self.is_submitting = false;
        self.is_dirty = false;
    }

    // ─── Submission ─────────────────────────────────────────────────────────

    /// Validate the current step and set the in-flight latch.
    ///
    /// Callers run the returned data through their submitter and report back
    /// with [`complete_submit`](Self::complete_submit).
    pub fn begin_submit(&mut self) -> SubmitStart {
        if self.is_submitting {
            return SubmitStart::AlreadySubmitting;
        }

        let errors = self.current().run_validation(&self.form_data);
        if !errors.is_empty() {
            self.errors = errors;
            return SubmitStart::Invalid;
        }

        self.errors.clear();
        self.completed_steps.insert(self.current_step);
        self.submit_error = None;
        self.is_submitting = true;
        SubmitStart::Started(self.form_data.clone())
    }

    /// Release the latch with the submitter's result
    pub fn complete_submit(&mut self, result: Result<(), SubmitError>) -> SubmitOutcome {
        if !self.is_submitting {
            return SubmitOutcome::Ignored;
        }
        self.is_submitting = false;

        match result {
            Ok(()) => {
                self.is_dirty = false;
                SubmitOutcome::Succeeded
            }
            Err(e) => {
                let message = e.to_string();
                self.submit_error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// Validate, run `on_submit`, and record its result
    pub async fn submit<F, Fut>(&mut self, on_submit: F) -> SubmitOutcome
    where
        F: FnOnce(FormData) -> Fut,
        Fut: Future<Output = Result<(), SubmitError>>,
    {
        match self.begin_submit() {
            SubmitStart::Started(data) => {
                let result = on_submit(data).await;
                self.complete_submit(result)
            }
            SubmitStart::AlreadySubmitting => SubmitOutcome::AlreadySubmitting,
            SubmitStart::Invalid => SubmitOutcome::Invalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form_data::ErrorMap;

    fn title_min_three(data: &FormData) -> ErrorMap {
        let mut errors = ErrorMap::new();
        if data.get_str("title").map(str::len).unwrap_or(0) < 3 {
            errors.insert(
                "title".to_string(),
                "Title must be at least 3 characters".to_string(),
            );
        }
        errors
    }

    /// details (validated) -> media (optional) -> review
    fn three_steps() -> StepList {
        StepList::new(vec![
            StepConfig::new("details", "Details").validator(title_min_three),
            StepConfig::new("media", "Media").skippable(true),
            StepConfig::new("review", "Review"),
        ])
        .unwrap()
    }

    fn valid_state() -> WizardState {
        WizardState::new(three_steps(), Some(FormData::with("title", "Jazz night")))
    }

    #[test]
    fn test_initial_state() {
        let state = WizardState::new(three_steps(), None);

        assert_eq!(state.current_step(), 0);
        assert!(state.form_data().is_empty());
        assert!(state.completed_steps().is_empty());
        assert!(state.errors().is_empty());
        assert!(!state.is_submitting());
        assert!(!state.is_dirty());
        assert!(!state.can_go_back());
        assert!(!state.is_last_step());
        assert!(!state.can_skip());
    }

    #[test]
    fn test_next_step_never_passes_last_index() {
        let mut state = valid_state();

        for _ in 0..10 {
            state.next_step();
            assert!(state.current_step() <= 2);
        }
        assert_eq!(state.current_step(), 2);
        assert_eq!(state.next_step(), StepTransition::Completed);
        assert_eq!(state.current_step(), 2);
    }

    #[test]
    fn test_previous_step_never_goes_below_zero() {
        let mut state = valid_state();

        assert_eq!(state.previous_step(), StepTransition::Ignored);
        assert_eq!(state.current_step(), 0);

        state.next_step();
        assert_eq!(
            state.previous_step(),
            StepTransition::Advanced { from: 1, to: 0 }
        );
        assert_eq!(state.previous_step(), StepTransition::Ignored);
        assert_eq!(state.current_step(), 0);
    }

    #[test]
    fn test_failed_validation_keeps_step_and_sets_exact_errors() {
        let mut state = WizardState::new(three_steps(), Some(FormData::with("title", "a")));

        assert_eq!(state.next_step(), StepTransition::Blocked);

        assert_eq!(state.current_step(), 0);
        assert_eq!(state.errors(), &title_min_three(state.form_data()));
        assert!(state.completed_steps().is_empty());
    }

    #[test]
    fn test_validation_failure_then_fix() {
        let mut state = WizardState::new(three_steps(), None);
        state.update_form_data(&FormData::with("title", "a"));

        state.next_step();
        assert!(state.errors().contains_key("title"));
        assert_eq!(state.current_step(), 0);

        state.update_form_data(&FormData::with("title", "abc"));
        assert_eq!(
            state.next_step(),
            StepTransition::Advanced { from: 0, to: 1 }
        );
        assert!(state.errors().is_empty());
    }

    #[test]
    fn test_edit_clears_errors_for_patched_keys_only() {
        let mut state = WizardState::new(
            StepList::new(vec![StepConfig::new("details", "Details").validator(|_| {
                ErrorMap::from([
                    ("title".to_string(), "required".to_string()),
                    ("city".to_string(), "required".to_string()),
                ])
            })])
            .unwrap(),
            None,
        );
        state.next_step();
        assert_eq!(state.errors().len(), 2);

        state.update_form_data(&FormData::with("title", "x"));

        assert!(!state.errors().contains_key("title"));
        assert!(state.errors().contains_key("city"));
    }

    #[test]
    fn test_skip_optional_step_scenario() {
        let mut state = WizardState::new(three_steps(), None);
        state.update_form_data(&FormData::with("title", "Jazz night"));
        let before_skip = state.form_data().clone();

        state.next_step();
        assert_eq!(state.current_step(), 1);
        assert_eq!(
            state.skip_step(),
            StepTransition::Advanced { from: 1, to: 2 }
        );

        assert_eq!(state.current_step(), 2);
        assert_eq!(
            state.completed_steps().iter().copied().collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert_eq!(state.form_data(), &before_skip);
    }

    #[test]
    fn test_skip_on_unskippable_step_is_noop() {
        let mut state = WizardState::new(three_steps(), None);
        let before = format!("{state:?}");

        assert_eq!(state.skip_step(), StepTransition::Ignored);

        assert_eq!(state.current_step(), 0);
        assert_eq!(format!("{state:?}"), before);
    }

    #[test]
    fn test_skip_does_not_run_validator() {
        let steps = StepList::new(vec![
            StepConfig::new("extras", "Extras")
                .skippable(true)
                .validator(|_| panic!("validator must not run on skip")),
            StepConfig::new("review", "Review"),
        ])
        .unwrap();
        let mut state = WizardState::new(steps, None);

        assert_eq!(
            state.skip_step(),
            StepTransition::Advanced { from: 0, to: 1 }
        );
    }

    #[test]
    fn test_jump_only_to_reached_steps() {
        let mut state = valid_state();
        state.next_step();
        state.next_step();
        assert_eq!(state.current_step(), 2);

        assert_eq!(
            state.jump_to(0),
            StepTransition::Advanced { from: 2, to: 0 }
        );
        assert_eq!(state.jump_to(1), StepTransition::Advanced { from: 0, to: 1 });
        assert_eq!(state.jump_to(99), StepTransition::Ignored);
        assert_eq!(state.current_step(), 1);
    }

    #[test]
    fn test_jump_ahead_of_progress_is_ignored() {
        let mut state = valid_state();

        assert_eq!(state.jump_to(2), StepTransition::Ignored);
        assert_eq!(state.current_step(), 0);
    }

    #[test]
    fn test_backward_moves_clear_errors_without_validation() {
        let mut state = valid_state();
        state.next_step();
        state.update_form_data(&FormData::with("title", ""));

        assert!(matches!(
            state.previous_step(),
            StepTransition::Advanced { .. }
        ));
        assert!(state.errors().is_empty());
    }

    #[test]
    fn test_dirty_tracking() {
        let mut state = valid_state();
        assert!(!state.is_dirty());

        assert!(!state.update_form_data(&FormData::new()));
        assert!(!state.is_dirty());

        assert!(!state.update_form_data(&FormData::with("title", "Jazz night")));
        assert!(!state.is_dirty());

        assert!(state.update_form_data(&FormData::with("title", "Blues night")));
        assert!(state.is_dirty());
    }

    #[test]
    fn test_hydrate_does_not_mark_dirty_or_move() {
        let mut state = WizardState::new(three_steps(), Some(FormData::with("city", "Oslo")));

        state.hydrate(&FormData::with("title", "X"));

        assert_eq!(state.form_data().get_str("title"), Some("X"));
        assert_eq!(state.form_data().get_str("city"), Some("Oslo"));
        assert!(!state.is_dirty());
        assert_eq!(state.current_step(), 0);
    }

    #[test]
    fn test_reset_restores_constructed_state() {
        let mut state = valid_state();
        state.update_form_data(&FormData::with("city", "Oslo"));
        state.next_step();
        state.next_step();

        state.reset_form();

        assert_eq!(state.current_step(), 0);
        assert_eq!(state.form_data(), &FormData::with("title", "Jazz night"));
        assert!(state.completed_steps().is_empty());
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_derived_flags_follow_current_step() {
        let mut state = valid_state();
        state.next_step();

        assert!(state.can_go_back());
        assert!(state.can_skip());
        assert!(!state.is_last_step());

        state.skip_step();
        assert!(state.is_last_step());
        assert!(!state.can_skip());
    }

    #[test]
    fn test_can_go_next_preview_does_not_mutate() {
        let state = WizardState::new(three_steps(), Some(FormData::with("title", "a")));

        assert!(!state.can_go_next());
        assert!(!state.can_go_next());
        assert!(state.errors().is_empty());
    }

    #[test]
    fn test_begin_submit_latches() {
        let mut state = valid_state();
        state.next_step();
        state.next_step();

        assert!(matches!(state.begin_submit(), SubmitStart::Started(_)));
        assert!(state.is_submitting());
        assert_eq!(state.begin_submit(), SubmitStart::AlreadySubmitting);
        assert_eq!(state.next_step(), StepTransition::Ignored);
        assert_eq!(state.previous_step(), StepTransition::Ignored);
    }

    #[test]
    fn test_submit_revalidates_current_step() {
        let steps = StepList::new(vec![
            StepConfig::new("details", "Details").validator(title_min_three)
        ])
        .unwrap();
        let mut state = WizardState::new(steps, None);

        assert_eq!(state.begin_submit(), SubmitStart::Invalid);
        assert!(!state.is_submitting());
        assert!(state.errors().contains_key("title"));
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut state = valid_state();

        assert_eq!(state.complete_submit(Ok(())), SubmitOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_data_and_releases_latch() {
        let mut state = valid_state();
        state.update_form_data(&FormData::with("city", "Oslo"));
        state.next_step();
        state.next_step();

        let outcome = state
            .submit(|_| async { Err(SubmitError::Rejected("backend down".into())) })
            .await;

        assert!(matches!(outcome, SubmitOutcome::Failed(_)));
        assert!(!state.is_submitting());
        assert!(state.is_dirty());
        assert_eq!(state.current_step(), 2);
        assert_eq!(state.form_data().get_str("city"), Some("Oslo"));
        assert!(state.submit_error().unwrap().contains("backend down"));
    }

    #[tokio::test]
    async fn test_submit_success_clears_dirty() {
        let mut state = valid_state();
        state.update_form_data(&FormData::with("city", "Oslo"));
        state.next_step();
        state.next_step();

        let outcome = state.submit(|_| async { Ok(()) }).await;

        assert_eq!(outcome, SubmitOutcome::Succeeded);
        assert!(!state.is_dirty());
        assert!(state.submit_error().is_none());
    }
}
