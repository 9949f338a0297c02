pub mod dialogs;
mod fields_step;
pub mod form_field;
pub mod keybindings;
mod review_step;
pub mod step_view;
mod success;
pub mod terminal;
pub mod wizard_screen;

pub use fields_step::FieldsStep;
pub use review_step::ReviewStep;
pub use step_view::{StepInput, StepRegistry, StepView};
pub use success::SuccessPanel;
pub use terminal::TerminalSession;
pub use wizard_screen::{ScreenEvent, WizardScreen};
