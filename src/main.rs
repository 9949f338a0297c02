use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use formflow::app::App;
use formflow::config::Config;
use formflow::forms::FormCatalog;
use formflow::logging;
use formflow::ui::keybindings;

#[derive(Parser)]
#[command(name = "formflow")]
#[command(about = "Multi-step form wizard for the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Form to fill in (default: `defaults.form` from config)
    #[arg(short, long)]
    form: Option<String>,

    /// Draft owner (default: `defaults.owner` from config, then $USER)
    #[arg(short, long)]
    owner: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available forms
    Forms,

    /// Print the effective configuration as TOML
    Config,

    /// List keyboard shortcuts
    Keys,

    /// Inspect or discard saved drafts
    Drafts {
        #[command(subcommand)]
        action: DraftsAction,
    },
}

#[derive(Subcommand)]
enum DraftsAction {
    /// List every saved draft
    List,

    /// Print a draft's saved values
    Show {
        #[arg(long)]
        form: String,
        #[arg(long)]
        owner: Option<String>,
    },

    /// Delete a draft
    Clear {
        #[arg(long)]
        form: String,
        #[arg(long)]
        owner: Option<String>,
    },
}

/// Owner precedence: flag, then config, then the login name
fn resolve_owner(flag: Option<String>, config: &Config) -> String {
    flag.or_else(|| config.defaults.owner.clone())
        .or_else(|| std::env::var("USER").ok())
        .unwrap_or_else(|| "anonymous".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let is_tui_mode = cli.command.is_none();
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    match cli.command {
        Some(Commands::Forms) => cmd_forms(&config),
        Some(Commands::Config) => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Some(Commands::Keys) => {
            print!("{}", keybindings::listing());
            Ok(())
        }
        Some(Commands::Drafts { action }) => cmd_drafts(&config, action),
        None => {
            let owner = resolve_owner(cli.owner, &config);
            run_tui(config, cli.form, &owner, logging_handle.log_file_path).await
        }
    }
}

async fn run_tui(
    config: Config,
    form_key: Option<String>,
    owner: &str,
    log_file_path: Option<PathBuf>,
) -> Result<()> {
    let catalog = FormCatalog::load(&config.forms_path());
    let form_key = form_key.unwrap_or_else(|| config.defaults.form.clone());
    let Some(form) = catalog.get(&form_key) else {
        let known: Vec<_> = catalog.keys().collect();
        bail!("Unknown form '{}' (available: {})", form_key, known.join(", "));
    };

    let mut app = App::new(config, form, owner)?;
    let result = app.run().await;

    if let Some(submission) = app.last_submission() {
        println!("Submitted {} ({})", form.name, submission.id);
    }

    // Print log file path on exit if logs were written
    if let Some(log_path) = log_file_path {
        if log_path.metadata().is_ok_and(|m| m.len() > 0) {
            eprintln!("Session log: {}", log_path.display());
        }
    }

    result
}

fn cmd_forms(config: &Config) -> Result<()> {
    let catalog = FormCatalog::load(&config.forms_path());

    println!("Forms ({})", catalog.len());
    println!("{}", "─".repeat(60));
    for form in catalog.iter() {
        println!(
            "{:<12} {:<28} {} steps",
            form.key,
            form.name,
            form.steps.len()
        );
        if !form.description.is_empty() {
            println!("{:<12} {}", "", form.description);
        }
    }
    Ok(())
}

fn cmd_drafts(config: &Config, action: DraftsAction) -> Result<()> {
    let drafts = config.drafts();

    match action {
        DraftsAction::List => {
            let records = drafts.list_drafts();
            if records.is_empty() {
                println!("No saved drafts");
                return Ok(());
            }
            println!("Drafts ({})", records.len());
            println!("{}", "─".repeat(60));
            for record in records {
                println!(
                    "{:<12} {:<16} {} fields  saved {}",
                    record.form_type,
                    record.owner_id,
                    record.data.len(),
                    record.saved_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        DraftsAction::Show { form, owner } => {
            let owner = resolve_owner(owner, config);
            let Some(data) = drafts.load_draft(&form, &owner) else {
                bail!("No draft for form '{form}' and owner '{owner}'");
            };
            let json =
                serde_json::to_string_pretty(&data).context("Failed to format draft data")?;
            println!("{json}");
        }
        DraftsAction::Clear { form, owner } => {
            let owner = resolve_owner(owner, config);
            drafts.clear_draft(&form, &owner);
            println!("Cleared draft for {form}/{owner}");
        }
    }
    Ok(())
}
