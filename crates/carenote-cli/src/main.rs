//! carenote CLI - inspect local drafts and talk to the practice server
//!
//! Lists drafts kept on this device after failed saves, fetches forms and
//! notifications, and saves session notes through the autosave path.

mod cli;
mod commands;
mod error;


use std::sync::Arc;

use carenote_core::drafts::DraftStore;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, DraftCommands, NoteCommands};
use crate::commands::common::{build_api, load_config, notice_board, open_draft_store};
use crate::commands::completions::run_completions;
use crate::commands::drafts::{run_clear_draft, run_list_drafts, run_show_draft};
use crate::commands::form::run_form;
use crate::commands::notes::{run_save_notes, run_show_notes};
use crate::commands::notifications::{run_notifications, run_watch_notifications};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = "carenote=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    if let Commands::Completions { shell, output } = &command {
        return run_completions(*shell, output.as_deref());
    }

    let config = load_config(cli.config.as_deref(), cli.data_dir)?;

    match command {
        Commands::Drafts { command } => {
            let store = open_draft_store(&config)?;
            match command.unwrap_or(DraftCommands::List { json: false }) {
                DraftCommands::List { json } => run_list_drafts(&store, json)?,
                DraftCommands::Show { form_type } => run_show_draft(&store, &form_type)?,
                DraftCommands::Clear { form_type } => run_clear_draft(&store, &form_type)?,
            }
        }
        Commands::Form {
            form_type,
            subject_id,
            json,
        } => {
            let api = build_api(&config)?;
            run_form(api, notice_board(&config), &form_type, &subject_id, json).await?;
        }
        Commands::Notes { command } => {
            let api = build_api(&config)?;
            match command {
                NoteCommands::Show { session_id } => run_show_notes(api, &session_id).await?,
                NoteCommands::Save { session_id, text } => {
                    let store: Arc<dyn DraftStore> = Arc::new(open_draft_store(&config)?);
                    run_save_notes(api, store, &session_id, &text, config.autosave_debounce())
                        .await?;
                }
            }
        }
        Commands::Notifications {
            watch,
            mark_all_read,
            json,
        } => {
            let api = build_api(&config)?;
            if watch {
                run_watch_notifications(
                    api,
                    config.notification_page_size,
                    config.notification_poll_interval(),
                    json,
                )
                .await?;
            } else {
                run_notifications(api, config.notification_page_size, mark_all_read, json).await?;
            }
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
