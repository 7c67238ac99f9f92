use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "taskdash", about = "Personal task board with notes and an action log")]
pub struct Cli {
    /// Path to the SQLite database [default: ~/.taskdash/dashboard.db]
    #[arg(long, env = "TASKDASH_DB", global = true)]
    pub db: Option<PathBuf>,

    /// PostgreSQL connection URL; when set, used instead of SQLite
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create tables and the notes document (idempotent)
    Init,

    /// Serve the JSON API
    Serve {
        /// Address to listen on
        #[arg(long, env = "TASKDASH_BIND", default_value = "127.0.0.1:3000")]
        bind: String,
        /// Directory of static files to serve alongside the API
        #[arg(long, env = "TASKDASH_ASSETS")]
        assets: Option<PathBuf>,
    },

    /// Interactive board in the terminal
    Board {
        /// Base URL of a running `taskdash serve`
        #[arg(long, env = "TASKDASH_URL", default_value = "http://127.0.0.1:3000")]
        url: String,
        /// Action feed refresh interval in milliseconds
        #[arg(long, default_value_t = 30_000)]
        poll_interval: u64,
        /// Append logs to this file
        #[arg(long, env = "TASKDASH_LOG")]
        log: Option<PathBuf>,
    },
}
