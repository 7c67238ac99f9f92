mod cli;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Command};
use taskdash::client::DashboardClient;
use taskdash::server::{self, ServeOptions};
use taskdash::{config, logging, store, tui};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init => {
            logging::init_stderr();
            let backend = config::resolve_backend(cli.db, cli.database_url)?;
            let store = store::open(&backend)
                .await
                .context("failed to open store")?;
            store.init().await.context("failed to initialize store")?;
            eprintln!("Initialized {} store", store.backend());
        }
        Command::Serve { bind, assets } => {
            logging::init_stderr();
            let backend = config::resolve_backend(cli.db, cli.database_url)?;
            let store = store::open(&backend)
                .await
                .context("failed to open store")?;
            store.init().await.context("failed to initialize store")?;
            server::serve(store, ServeOptions { bind, assets }).await?;
        }
        Command::Board {
            url,
            poll_interval,
            log,
        } => {
            logging::init_file(log.as_deref())?;
            let client = DashboardClient::new(&url)?;
            tui::run(client, Duration::from_millis(poll_interval.max(1))).await?;
        }
    }

    Ok(())
}
