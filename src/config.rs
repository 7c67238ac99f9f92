//! Resolution of where the dashboard keeps its data.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::store::Backend;

/// `$HOME/.taskdash/dashboard.db`.
pub fn default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(db_path_under(Path::new(&home)))
}

fn db_path_under(home: &Path) -> PathBuf {
    home.join(".taskdash").join("dashboard.db")
}

/// Pick the store backend. A non-blank database URL selects PostgreSQL;
/// otherwise SQLite at `db` or the default path.
pub fn resolve_backend(db: Option<PathBuf>, database_url: Option<String>) -> Result<Backend> {
    if let Some(url) = database_url.filter(|u| !u.trim().is_empty()) {
        return Ok(Backend::Postgres { url });
    }
    let path = match db {
        Some(path) => path,
        None => default_db_path()?,
    };
    Ok(Backend::Sqlite { path })
}
