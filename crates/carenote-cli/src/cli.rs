use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "carenote")]
#[command(about = "Inspect carenote drafts, forms and notifications from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to the JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Optional directory holding the local draft database
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect drafts kept on this device after failed or offline saves
    Drafts {
        #[command(subcommand)]
        command: Option<DraftCommands>,
    },
    /// Fetch a form from the server
    Form {
        /// Form type (e.g. ANAMNESE)
        form_type: String,
        /// Patient or subject identifier
        subject_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Read or write clinical session notes
    Notes {
        #[command(subcommand)]
        command: NoteCommands,
    },
    /// List notifications
    Notifications {
        /// Keep polling and print the unread count after every refresh
        #[arg(long)]
        watch: bool,
        /// Mark every listed notification as read
        #[arg(long, conflicts_with = "watch")]
        mark_all_read: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell (bash, zsh, fish, powershell or elvish)
        #[arg(value_enum)]
        shell: Shell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum DraftCommands {
    /// List stored drafts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the payload of one draft
    Show {
        /// Form type the draft was saved for
        form_type: String,
    },
    /// Delete one draft
    Clear {
        /// Form type the draft was saved for
        form_type: String,
    },
}

#[derive(Subcommand)]
pub enum NoteCommands {
    /// Print the notes of a session
    Show {
        /// Session identifier
        session_id: String,
    },
    /// Save session notes, keeping a local draft when the server is unreachable
    Save {
        /// Session identifier
        session_id: String,
        /// Note text (read from stdin when omitted)
        text: Vec<String>,
    },
}

