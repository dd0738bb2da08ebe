//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cbcimath")]
#[command(about = "Curriculum-based math teaching materials: records, storage and service", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Storage backend (local, remote)
        #[arg(short, long, default_value = "local")]
        backend: String,

        /// Seed the local store with sample records
        #[arg(long)]
        samples: bool,
    },

    /// View or modify configuration
    Config {
        /// Config key to get or set
        key: Option<String>,

        /// Value to set (if provided, sets the key)
        value: Option<String>,

        /// List all configuration
        #[arg(short, long)]
        list: bool,
    },

    /// List records of a kind (newest first)
    List {
        /// notices, lessons, research, evaluations or cbci
        kind: String,

        /// School level filter (middle, high)
        #[arg(long, requires = "grade")]
        school: Option<String>,

        /// Grade filter (1, 2, 3)
        #[arg(long, requires = "school")]
        grade: Option<String>,

        /// Print the records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one record as JSON (opening research counts a view)
    Show { kind: String, id: String },

    /// Create a record
    Create {
        kind: String,

        /// Record fields as JSON, or @path to read them from a file
        #[arg(short, long)]
        data: String,

        /// File to attach
        #[arg(short, long)]
        attach: Option<PathBuf>,
    },

    /// Update fields of a record
    Update {
        kind: String,
        id: String,

        /// Fields to overwrite as JSON, or @path to read them from a file
        #[arg(short, long, default_value = "{}")]
        data: String,

        /// Replace the attached file
        #[arg(short, long)]
        attach: Option<PathBuf>,
    },

    /// Delete a record
    Delete { kind: String, id: String },

    /// Search every kind by title, category and content
    Search {
        /// Empty query lists the most recent records
        query: Option<String>,

        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Register an account through the record service
    Signup {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        name: String,
    },

    /// Log in as the configured administrator or with an account email
    Login {
        user: String,

        #[arg(short, long)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show the current session
    Whoami,

    /// Run the record service
    Serve {
        /// Address to bind (default: server.bind from config)
        #[arg(long)]
        bind: Option<String>,

        /// KV table directory (default: server.data_dir from config)
        #[arg(long)]
        data: Option<PathBuf>,
    },
}
