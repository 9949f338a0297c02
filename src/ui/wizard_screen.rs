//! Full-screen wizard: header, progress, error summary, step body, footer

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::dialogs::{
    render_instructions, DraftPromptDialog, DraftPromptSelection, HelpDialog, LeaveConfirmDialog,
    LeaveSelection,
};
use super::keybindings::ShortcutContext;
use super::step_view::{StepInput, StepRegistry, StepView};
use super::success::SuccessPanel;
use crate::wizard::{
    PrimaryAction, ShellPhase, StepTransition, SubmitError, SubmitOutcome, SuccessAction,
    Submission, WizardShell,
};

/// What the event loop should do after a key
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenEvent {
    None,
    /// Run this through the submitter and call [`WizardScreen::finish_submit`]
    Submit(Submission),
    Quit,
}

pub struct WizardScreen {
    shell: WizardShell,
    registry: StepRegistry,
    form_name: String,
    draft_prompt: Option<DraftPromptDialog>,
    leave_confirm: LeaveConfirmDialog,
    help: HelpDialog,
    success: SuccessPanel,
}

impl WizardScreen {
    pub fn new(shell: WizardShell, registry: StepRegistry, form_name: impl Into<String>) -> Self {
        let form_name = form_name.into();

        for step in shell.state().steps().iter() {
            if !registry.contains(&step.id) {
                tracing::warn!(step = %step.id, "No view registered for step");
            }
        }

        let draft_prompt = match shell.phase() {
            ShellPhase::DraftPrompt { saved_at } => {
                Some(DraftPromptDialog::new(form_name.as_str(), saved_at))
            }
            _ => None,
        };

        let mut screen = Self {
            shell,
            registry,
            form_name,
            draft_prompt,
            leave_confirm: LeaveConfirmDialog::new(),
            help: HelpDialog::new(),
            success: SuccessPanel::new(),
        };
        screen.sync_view();
        screen
    }

    pub fn shell(&self) -> &WizardShell {
        &self.shell
    }

    /// Periodic hook from the event loop
    pub fn tick(&mut self) {
        self.shell.tick();
    }

    /// Persist any held draft snapshot
    pub fn flush(&mut self) {
        self.shell.flush();
    }

    fn current_view(&mut self) -> Option<&mut (dyn StepView + 'static)> {
        let id = &self.shell.state().current().id;
        self.registry.get_mut(id)
    }

    /// Reload the current step's widgets from the form data
    fn sync_view(&mut self) {
        let state = self.shell.state();
        if let Some(view) = self.registry.get_mut(&state.current().id) {
            view.sync(state.form_data());
        }
    }

    fn after_transition(&mut self, transition: StepTransition) {
        if matches!(transition, StepTransition::Advanced { .. }) {
            self.sync_view();
        }
    }

    fn request_quit(&mut self) -> ScreenEvent {
        if self.shell.can_leave() {
            ScreenEvent::Quit
        } else {
            self.leave_confirm.show();
            ScreenEvent::None
        }
    }

    // ─── Input ──────────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) -> ScreenEvent {
        if key.kind != KeyEventKind::Press {
            return ScreenEvent::None;
        }

        if self.help.visible {
            self.help.toggle();
            return ScreenEvent::None;
        }

        if self.leave_confirm.visible {
            return match self.leave_confirm.handle_key(key.code) {
                Some(LeaveSelection::Leave) => ScreenEvent::Quit,
                _ => ScreenEvent::None,
            };
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c' | 'q')) {
            return self.request_quit();
        }
        if key.code == KeyCode::F(1) {
            self.help.toggle();
            return ScreenEvent::None;
        }

        match self.shell.phase() {
            ShellPhase::DraftPrompt { .. } => self.handle_draft_prompt(key.code),
            ShellPhase::Active => self.handle_active(key),
            ShellPhase::Submitting => ScreenEvent::None,
            ShellPhase::Success => self.handle_success(key.code),
        }
    }

    fn handle_draft_prompt(&mut self, code: KeyCode) -> ScreenEvent {
        let Some(dialog) = self.draft_prompt.as_mut() else {
            return ScreenEvent::None;
        };
        match dialog.handle_key(code) {
            Some(DraftPromptSelection::Resume) => self.shell.resume_draft(),
            Some(DraftPromptSelection::StartFresh) => self.shell.start_fresh(),
            None => return ScreenEvent::None,
        }
        self.draft_prompt = None;
        self.sync_view();
        ScreenEvent::None
    }

    fn handle_active(&mut self, key: KeyEvent) -> ScreenEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        let view_owns_enter = self.current_view().is_some_and(|view| view.consumes_enter());

        match key.code {
            KeyCode::Enter if !ctrl && !alt && !view_owns_enter => return self.primary(),
            KeyCode::Char('n') if ctrl => return self.primary(),
            KeyCode::Char('s') if ctrl => {
                let transition = self.shell.skip_step();
                self.after_transition(transition);
                return ScreenEvent::None;
            }
            KeyCode::Char(c @ '1'..='9') if alt => {
                let index = (c as usize) - ('1' as usize);
                let transition = self.shell.jump_to(index);
                self.after_transition(transition);
                return ScreenEvent::None;
            }
            KeyCode::Esc => {
                if !self.shell.state().can_go_back() {
                    return self.request_quit();
                }
                let transition = self.shell.previous_step();
                self.after_transition(transition);
                return ScreenEvent::None;
            }
            _ => {}
        }

        let state = self.shell.state();
        let input = match self.registry.get_mut(&state.current().id) {
            Some(view) => view.handle_key(key, state.form_data()),
            None => StepInput::Ignored,
        };
        if let StepInput::Update(patch) = input {
            self.shell.update_form_data(&patch);
        }
        ScreenEvent::None
    }

    fn primary(&mut self) -> ScreenEvent {
        match self.shell.primary_action() {
            PrimaryAction::Advanced { .. } => {
                self.sync_view();
                ScreenEvent::None
            }
            PrimaryAction::Blocked => {
                let state = self.shell.state();
                if let Some(view) = self.registry.get_mut(&state.current().id) {
                    view.focus_first_error(state.errors());
                }
                ScreenEvent::None
            }
            PrimaryAction::Submit(submission) => ScreenEvent::Submit(submission),
            PrimaryAction::Ignored => ScreenEvent::None,
        }
    }

    fn handle_success(&mut self, code: KeyCode) -> ScreenEvent {
        match self.success.handle_key(code, self.shell.success_view()) {
            Some(SuccessAction::Exit) => ScreenEvent::Quit,
            Some(SuccessAction::Restart) => {
                self.shell.restart();
                self.success.reset();
                self.sync_view();
                ScreenEvent::None
            }
            None => ScreenEvent::None,
        }
    }

    /// Report the submitter's result for a [`ScreenEvent::Submit`]
    pub fn finish_submit(
        &mut self,
        submission: Submission,
        result: Result<(), SubmitError>,
    ) -> SubmitOutcome {
        let outcome = self.shell.complete_submit(submission, result);
        if outcome == SubmitOutcome::Succeeded {
            self.success.reset();
        }
        outcome
    }

    // ─── Rendering ──────────────────────────────────────────────────────────

    pub fn render(&mut self, frame: &mut Frame) {
        let phase = self.shell.phase();
        let error_lines = self.error_lines();
        let error_height = if error_lines.is_empty() {
            0
        } else {
            u16::try_from(error_lines.len()).unwrap_or(u16::MAX).min(6) + 2
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),            // Header
                Constraint::Length(1),            // Progress
                Constraint::Length(error_height), // Error summary
                Constraint::Min(3),               // Body
                Constraint::Length(1),            // Footer
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        if phase != ShellPhase::Success {
            self.render_progress(frame, chunks[1]);
        }
        if !error_lines.is_empty() {
            frame.render_widget(
                Paragraph::new(error_lines)
                    .wrap(Wrap { trim: true })
                    .block(
                        Block::default()
                            .title(" Please fix ")
                            .borders(Borders::ALL)
                            .border_style(Style::default().fg(Color::Red)),
                    ),
                chunks[2],
            );
        }

        match phase {
            ShellPhase::DraftPrompt { .. } => {}
            ShellPhase::Success => self.success.render(
                frame,
                chunks[3],
                self.shell.success_view(),
                self.shell.last_submission(),
            ),
            ShellPhase::Active | ShellPhase::Submitting => self.render_body(frame, chunks[3]),
        }

        match phase {
            ShellPhase::Submitting => frame.render_widget(
                Paragraph::new(Span::styled(
                    "Submitting...",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )),
                chunks[4],
            ),
            ShellPhase::Success => {
                render_instructions(frame, chunks[4], ShortcutContext::Success);
            }
            _ => render_instructions(frame, chunks[4], ShortcutContext::Wizard),
        }

        if let Some(dialog) = &self.draft_prompt {
            dialog.render(frame);
        }
        self.leave_confirm.render(frame);
        self.help.render(frame);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let state = self.shell.state();
        let step = state.current();

        let lines = if self.shell.is_success() {
            vec![Line::from(Span::styled(
                "Complete",
                Style::default().fg(Color::Green),
            ))]
        } else {
            let mut heading = vec![
                Span::styled(
                    format!("Step {}/{}  ", state.current_step() + 1, state.steps().len()),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(
                    step.title.clone(),
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
            ];
            if step.can_skip {
                heading.push(Span::styled(
                    " (optional)",
                    Style::default().fg(Color::DarkGray),
                ));
            }
            vec![
                Line::from(heading),
                Line::from(Span::styled(
                    step.description.clone().unwrap_or_default(),
                    Style::default().fg(Color::DarkGray),
                )),
            ]
        };

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(format!(" {} ", self.form_name))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            area,
        );
    }

    fn render_progress(&self, frame: &mut Frame, area: Rect) {
        let state = self.shell.state();
        let mut spans = Vec::new();

        for (index, step) in state.steps().iter().enumerate() {
            if index > 0 {
                spans.push(Span::styled(" › ", Style::default().fg(Color::DarkGray)));
            }
            let (marker, style) = if index == state.current_step() {
                (
                    "●".to_string(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
            } else if state.completed_steps().contains(&index) {
                ("✓".to_string(), Style::default().fg(Color::Green))
            } else {
                (
                    step.icon.clone().unwrap_or_else(|| "○".to_string()),
                    Style::default().fg(Color::DarkGray),
                )
            };
            spans.push(Span::styled(format!("{marker} {}", step.title), style));
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_body(&mut self, frame: &mut Frame, area: Rect) {
        let inner = Rect {
            x: area.x + 1,
            width: area.width.saturating_sub(2),
            y: area.y + 1,
            height: area.height.saturating_sub(1),
        };
        let state = self.shell.state();
        let step_id = &state.current().id;

        match self.registry.get_mut(step_id) {
            Some(view) => view.render(frame, inner, state.form_data(), state.errors()),
            None => frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("No view registered for step '{step_id}'"),
                    Style::default().fg(Color::Red),
                )),
                inner,
            ),
        }
    }

    /// Submit error first, then field errors in the step's own field order
    fn error_lines(&mut self) -> Vec<Line<'static>> {
        if self.shell.is_success() {
            return Vec::new();
        }

        let state = self.shell.state();
        let mut lines = Vec::new();
        if let Some(message) = state.submit_error() {
            lines.push(Line::from(Span::styled(
                format!("Submission failed: {message}"),
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD),
            )));
        }

        let errors = state.errors();
        if errors.is_empty() {
            return lines;
        }

        let mut ordered: Vec<&str> = self
            .registry
            .get_mut(&state.current().id)
            .map(|view| view.field_order())
            .unwrap_or_default()
            .into_iter()
            .filter(|name| errors.contains_key(*name))
            .collect();
        let rest: Vec<&str> = errors
            .keys()
            .map(String::as_str)
            .filter(|name| !ordered.contains(name))
            .collect();
        ordered.extend(rest);

        for name in ordered {
            if let Some(message) = errors.get(name) {
                lines.push(Line::from(Span::styled(
                    format!("• {message}"),
                    Style::default().fg(Color::Red),
                )));
            }
        }
        lines
    }
}
