//! Multi-step wizard engine.
//!
//! [`StepList`] describes the steps, [`WizardState`] is the pure state
//! machine over them, and [`WizardShell`] adds drafts, submission and the
//! success state on top. None of these types know how a step is drawn.

mod shell;
mod state;
mod step;
mod submit;

pub use shell::{
    CallToAction, PrimaryAction, ShellPhase, SuccessAction, SuccessView, WizardOptions,
    WizardShell,
};
pub use state::{StepTransition, SubmitOutcome, SubmitStart, WizardState};
pub use step::{StepConfig, StepConfigError, StepList, Validator};
pub use submit::{FileSubmitter, FormSubmitter, HttpSubmitter, SubmitError, Submission};
