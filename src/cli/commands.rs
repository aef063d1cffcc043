use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "notekeep")]
#[command(version, about = "Personal notes on a hosted identity and data backend")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Use this config file instead of searching for .notekeep/
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a notekeep project in the current directory
    Init {
        /// Base URL of the backend (e.g. https://abc.example.co)
        #[arg(long)]
        url: String,

        /// Public API key of the backend
        #[arg(long = "api-key")]
        api_key: String,

        /// Table holding the notes
        #[arg(long, default_value = "notes")]
        table: String,

        /// How long the registration message stays up before signing in
        #[arg(long = "registration-delay-ms", default_value_t = 2000)]
        registration_delay_ms: u64,
    },

    /// Create an account. Passwords are read from stdin.
    Register {
        #[arg(long = "first-name")]
        first_name: Option<String>,

        #[arg(long = "last-name")]
        last_name: Option<String>,

        #[arg(long)]
        email: Option<String>,
    },

    /// Sign in. The password is read from stdin.
    Login {
        #[arg(long)]
        email: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// List notes, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show notes whose title or content contains QUERY
    Search {
        query: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a note
    Add {
        title: String,

        /// Note content
        #[arg(long, short = 'c', conflicts_with = "stdin")]
        content: Option<String>,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,
    },

    /// Edit a note
    Edit {
        /// Note ID or a unique prefix of it
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New content
        #[arg(long, short = 'c', conflicts_with = "stdin")]
        content: Option<String>,

        /// Read new content from stdin
        #[arg(long)]
        stdin: bool,
    },

    /// Delete a note
    Delete {
        /// Note ID or a unique prefix of it
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Interactive session with forms and the note editor
    Shell,
}
