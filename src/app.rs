use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::config::Config;
use crate::forms::schema::FormDefinition;
use crate::ui::terminal::{self, TerminalSession};
use crate::ui::{ScreenEvent, StepRegistry, WizardScreen};
use crate::wizard::{SubmitError, SubmitOutcome, Submission, WizardOptions, WizardShell};

/// A submit running on the runtime, result pending
struct PendingSubmit {
    submission: Submission,
    result_rx: oneshot::Receiver<Result<(), SubmitError>>,
}

pub struct App {
    config: Config,
    screen: WizardScreen,
    pending: Option<PendingSubmit>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, form: &FormDefinition, owner_id: &str) -> Result<Self> {
        let steps = form
            .to_steps()
            .with_context(|| format!("Form '{}' has an invalid step list", form.key))?;
        let submitter = config.build_submitter()?;
        tracing::info!(
            form = %form.key,
            owner = %owner_id,
            submitter = submitter.name(),
            "Starting wizard"
        );

        let shell = WizardShell::mount(
            steps,
            WizardOptions::new(&form.key, owner_id).initial_data(form.initial_data()),
            config.drafts(),
            submitter,
            config.autosave_debounce(),
        )
        .with_success_view(form.success.clone());

        let screen = WizardScreen::new(shell, StepRegistry::for_form(form), &form.name);

        Ok(Self {
            config,
            screen,
            pending: None,
            should_quit: false,
        })
    }

    /// Submission accepted during this run, if the wizard ended on success
    pub fn last_submission(&self) -> Option<&Submission> {
        self.screen.shell().last_submission()
    }

    pub async fn run(&mut self) -> Result<()> {
        terminal::install_panic_hook();
        let mut session = TerminalSession::start().context("Failed to start terminal UI")?;
        let tick_rate = self.config.tick_rate();
        let shutdown = listen_for_shutdown().context("Failed to install signal handlers")?;

        while !self.should_quit {
            session
                .terminal()
                .draw(|frame| self.screen.render(frame))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }

            self.poll_submit();
            self.screen.tick();
            self.check_shutdown(&shutdown);
        }

        self.screen.flush();
        Ok(())
    }

    /// End the loop and write any held-back draft once a shutdown signal arrived
    fn check_shutdown(&mut self, shutdown: &AtomicBool) -> bool {
        if !shutdown.load(Ordering::SeqCst) {
            return false;
        }
        tracing::info!("Shutdown signal received, saving draft");
        self.should_quit = true;
        self.screen.flush();
        true
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match self.screen.handle_key(key) {
            ScreenEvent::None => {}
            ScreenEvent::Submit(submission) => self.spawn_submit(submission),
            ScreenEvent::Quit => self.should_quit = true,
        }
    }

    /// Run the submitter off the UI loop; the result comes back on a oneshot
    fn spawn_submit(&mut self, submission: Submission) {
        let submitter = self.screen.shell().submitter();
        let (result_tx, result_rx) = oneshot::channel();
        let payload = submission.clone();

        tokio::spawn(async move {
            let result = submitter.submit(&payload).await;
            // Receiver is gone when the app quit mid-submit
            let _ = result_tx.send(result);
        });

        self.pending = Some(PendingSubmit {
            submission,
            result_rx,
        });
    }

    /// Deliver a finished submit result to the screen, if one is ready
    fn poll_submit(&mut self) -> Option<SubmitOutcome> {
        let pending = self.pending.as_mut()?;
        let result = match pending.result_rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Closed) => Err(SubmitError::Rejected(
                "submit task ended without a result".to_string(),
            )),
        };

        let pending = self.pending.take()?;
        Some(self.screen.finish_submit(pending.submission, result))
    }
}

/// Flag raised on SIGHUP (terminal closed) or SIGTERM
#[cfg(unix)]
fn listen_for_shutdown() -> std::io::Result<Arc<AtomicBool>> {
    use tokio::signal::unix::{signal, SignalKind};

    let flag = Arc::new(AtomicBool::new(false));
    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let raised = Arc::clone(&flag);

    tokio::spawn(async move {
        tokio::select! {
            _ = hangup.recv() => tracing::info!("Received SIGHUP"),
            _ = terminate.recv() => tracing::info!("Received SIGTERM"),
        }
        raised.store(true, Ordering::SeqCst);
    });
    Ok(flag)
}

#[cfg(not(unix))]
fn listen_for_shutdown() -> std::io::Result<Arc<AtomicBool>> {
    Ok(Arc::new(AtomicBool::new(false)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormCatalog;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        let mut config = Config::default();
        let root = temp_dir.path();
        config.paths.drafts = root.join("drafts").to_string_lossy().to_string();
        config.paths.submissions = root.join("submissions").to_string_lossy().to_string();
        config.drafts.autosave_debounce_ms = 0;
        config
    }

    fn key(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            key(app, KeyCode::Char(c));
        }
    }

    fn note_form() -> FormDefinition {
        FormDefinition::from_json(
            r#"{"key": "note", "name": "Note", "steps": [
                {"id": "body", "title": "Body", "fields": [
                    {"name": "subject", "type": "string", "required": true}
                ]}
            ]}"#,
        )
        .unwrap()
    }

    async fn wait_for_outcome(app: &mut App) -> SubmitOutcome {
        for _ in 0..200 {
            if let Some(outcome) = app.poll_submit() {
                return outcome;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("submit did not finish");
    }

    #[tokio::test]
    async fn test_submit_runs_off_loop_and_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = App::new(test_config(&temp_dir), &note_form(), "u1").unwrap();

        type_text(&mut app, "Hello");
        assert!(temp_dir.path().join("drafts").exists());

        key(&mut app, KeyCode::Enter);
        assert!(app.pending.is_some());
        // Second press while in flight does not start another submit
        key(&mut app, KeyCode::Enter);

        assert_eq!(wait_for_outcome(&mut app).await, SubmitOutcome::Succeeded);
        let id = app.last_submission().unwrap().id;

        let written = temp_dir
            .path()
            .join("submissions")
            .join(format!("note-{id}.json"));
        assert!(written.exists());
        assert!(app.config.drafts().load_draft("note", "u1").is_none());
    }

    #[tokio::test]
    async fn test_quit_without_changes() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = FormCatalog::builtin();
        let form = catalog.get("event").unwrap();
        let mut app = App::new(test_config(&temp_dir), form, "u1").unwrap();
        assert!(app.poll_submit().is_none());

        app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL));

        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_shutdown_flag_saves_debounced_edit() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.drafts.autosave_debounce_ms = 60_000;
        let mut app = App::new(config, &note_form(), "u1").unwrap();

        // First edit is written at once, the second waits out the debounce
        type_text(&mut app, "A");
        type_text(&mut app, "B");
        let saved = app.config.drafts().load_draft("note", "u1").unwrap();
        assert_eq!(saved.get_str("subject"), Some("A"));

        let shutdown = AtomicBool::new(false);
        assert!(!app.check_shutdown(&shutdown));
        assert!(!app.should_quit);

        shutdown.store(true, Ordering::SeqCst);
        assert!(app.check_shutdown(&shutdown));

        assert!(app.should_quit);
        let saved = app.config.drafts().load_draft("note", "u1").unwrap();
        assert_eq!(saved.get_str("subject"), Some("AB"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sighup_raises_shutdown_flag() {
        let shutdown = listen_for_shutdown().unwrap();
        assert!(!shutdown.load(Ordering::SeqCst));

        let status = std::process::Command::new("kill")
            .args(["-HUP", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        for _ in 0..200 {
            if shutdown.load(Ordering::SeqCst) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("SIGHUP did not raise the shutdown flag");
    }

    #[test]
    fn test_http_mode_without_endpoint_fails_to_start() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir);
        config.submit.mode = crate::config::SubmitMode::Http;
        let catalog = FormCatalog::builtin();

        assert!(App::new(config, catalog.get("event").unwrap(), "u1").is_err());
    }
}
