//! End-to-end wizard flows against the file-backed draft store and submitter.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test wizard_flow
//! ```

use formflow::drafts::{Drafts, FileDraftStore};
use formflow::form_data::{ErrorMap, FormData};
use formflow::forms::FormCatalog;
use formflow::wizard::{
    FileSubmitter, ShellPhase, StepConfig, StepList, StepTransition, SubmitOutcome, WizardOptions,
    WizardShell,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn event_steps() -> StepList {
    StepList::new(vec![
        StepConfig::new("details", "Details").validator(|data: &FormData| {
            let mut errors = ErrorMap::new();
            if data.get_str("title").unwrap_or_default().trim().is_empty() {
                errors.insert("title".to_string(), "Title is required".to_string());
            }
            errors
        }),
        StepConfig::new("media", "Media").skippable(true),
        StepConfig::new("review", "Review"),
    ])
    .unwrap()
}

fn file_drafts(dir: &TempDir) -> Drafts {
    Drafts::new(Arc::new(FileDraftStore::new(dir.path().join("drafts"))))
}

fn mount(dir: &TempDir, submissions: std::path::PathBuf) -> WizardShell {
    WizardShell::mount(
        event_steps(),
        WizardOptions::new("event", "u1"),
        file_drafts(dir),
        Arc::new(FileSubmitter::new(submissions)),
        Duration::ZERO,
    )
}

fn submission_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}

// ─── Flows ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fix_errors_skip_optional_and_submit() {
    let dir = TempDir::new().unwrap();
    let submissions = dir.path().join("submissions");
    let mut shell = mount(&dir, submissions.clone());
    let succeeded = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&succeeded);
    shell.on_success(Box::new(move |data: &FormData| {
        sink.lock().unwrap().push(data.clone());
    }));

    assert_eq!(shell.state().current_step(), 0);

    shell.primary_action();
    assert_eq!(
        shell.state().errors().get("title").map(String::as_str),
        Some("Title is required")
    );

    shell.update_form_data(&FormData::with("title", "Jazz night"));
    assert!(shell.state().errors().is_empty());
    assert!(file_drafts(&dir).has_draft("event", "u1"));

    shell.primary_action();
    assert_eq!(shell.skip_step(), StepTransition::Advanced { from: 1, to: 2 });
    assert!(shell.state().completed_steps().contains(&1));

    assert_eq!(shell.submit().await, SubmitOutcome::Succeeded);
    assert_eq!(shell.phase(), ShellPhase::Success);
    assert!(!file_drafts(&dir).has_draft("event", "u1"));

    let files = submission_files(&submissions);
    assert_eq!(files.len(), 1);
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
    assert_eq!(written["data"]["title"], "Jazz night");
    assert_eq!(written["owner_id"], "u1");

    assert_eq!(succeeded.lock().unwrap().len(), 1);
}

#[test]
fn test_draft_survives_restart_and_resumes_at_first_step() {
    let dir = TempDir::new().unwrap();
    {
        let mut shell = mount(&dir, dir.path().join("submissions"));
        shell.update_form_data(&FormData::with("title", "Jazz night"));
        shell.primary_action();
        assert_eq!(shell.state().current_step(), 1);
    }

    let mut shell = mount(&dir, dir.path().join("submissions"));
    assert!(matches!(
        shell.phase(),
        ShellPhase::DraftPrompt { saved_at: Some(_) }
    ));

    shell.resume_draft();

    assert_eq!(shell.phase(), ShellPhase::Active);
    assert_eq!(shell.state().current_step(), 0);
    assert_eq!(shell.state().form_data().get_str("title"), Some("Jazz night"));
    assert!(!shell.state().is_dirty());
}

#[tokio::test]
async fn test_failed_submit_keeps_draft_and_can_retry() {
    let dir = TempDir::new().unwrap();
    // A plain file where the submissions directory should be
    let blocked = dir.path().join("submissions");
    std::fs::write(&blocked, "not a directory").unwrap();

    let mut shell = WizardShell::mount(
        StepList::new(vec![StepConfig::new("only", "Only")]).unwrap(),
        WizardOptions::new("note", "u1"),
        file_drafts(&dir),
        Arc::new(FileSubmitter::new(&blocked)),
        Duration::ZERO,
    );
    shell.update_form_data(&FormData::with("body", "hello"));

    let outcome = shell.submit().await;
    assert!(matches!(outcome, SubmitOutcome::Failed(_)));
    assert!(!shell.state().is_submitting());
    assert!(shell.state().submit_error().is_some());
    assert!(file_drafts(&dir).has_draft("note", "u1"));

    std::fs::remove_file(&blocked).unwrap();

    assert_eq!(shell.submit().await, SubmitOutcome::Succeeded);
    assert!(shell.state().submit_error().is_none());
    assert_eq!(submission_files(&blocked).len(), 1);
}

#[test]
fn test_start_fresh_discards_saved_draft() {
    let dir = TempDir::new().unwrap();
    file_drafts(&dir).save_draft("event", "u1", &FormData::with("title", "Old"));

    let mut shell = mount(&dir, dir.path().join("submissions"));
    shell.start_fresh();

    assert_eq!(shell.phase(), ShellPhase::Active);
    assert!(shell.state().form_data().is_empty());
    assert!(!file_drafts(&dir).has_draft("event", "u1"));
}

#[test]
fn test_user_form_overrides_builtin() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("event.json"),
        r#"{"key": "event", "name": "Team Offsite", "steps": [
            {"id": "where", "title": "Where", "fields": [
                {"name": "city", "type": "string", "required": true}
            ]}
        ]}"#,
    )
    .unwrap();

    let catalog = FormCatalog::load(dir.path());
    let form = catalog.get("event").unwrap();
    assert_eq!(form.name, "Team Offsite");
    assert!(catalog.get("rental").is_some());

    let steps = form.to_steps().unwrap();
    let errors = steps[0].run_validation(&FormData::new());
    assert!(errors.contains_key("city"));
}
