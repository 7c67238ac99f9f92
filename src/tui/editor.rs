use std::io::Write as _;
use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};

use super::Tui;

/// Opens the notes in `$EDITOR` (or `vi`) with the board suspended.
/// Returns the new text, or `None` when the notes came back unchanged.
pub fn edit_notes(terminal: &mut Tui, notes: &str) -> Result<Option<String>> {
    let mut draft = tempfile::Builder::new()
        .prefix("taskdash-notes-")
        .suffix(".md")
        .tempfile()
        .context("failed to create notes draft")?;
    draft
        .write_all(notes.as_bytes())
        .and_then(|()| draft.flush())
        .context("failed to write notes draft")?;

    let editor = editor_command(std::env::var("EDITOR").ok());
    suspend(terminal)?;
    let outcome = run_editor(&editor, draft.path());
    resume(terminal)?;
    outcome?;

    let edited =
        std::fs::read_to_string(draft.path()).context("failed to read notes draft")?;
    Ok(changed_notes(notes, &edited))
}

fn run_editor(editor: &str, path: &Path) -> Result<()> {
    let status = Command::new(editor)
        .arg(path)
        .status()
        .with_context(|| format!("failed to run editor '{editor}'"))?;
    if !status.success() {
        bail!("editor exited with status {status}");
    }
    Ok(())
}

fn suspend(terminal: &mut Tui) -> Result<()> {
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    Ok(())
}

fn resume(terminal: &mut Tui) -> Result<()> {
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal::enable_raw_mode()?;
    terminal.clear()?;
    Ok(())
}

/// Editors append a final newline; that alone is not an edit.
fn changed_notes(original: &str, edited: &str) -> Option<String> {
    let edited = edited.trim_end();
    (edited != original).then(|| edited.to_string())
}

fn editor_command(var: Option<String>) -> String {
    var.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "vi".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_falls_back_to_vi() {
        assert_eq!(editor_command(None), "vi");
        assert_eq!(editor_command(Some("  ".into())), "vi");
        assert_eq!(editor_command(Some("nano".into())), "nano");
    }

    #[test]
    fn trailing_newline_is_not_a_change() {
        assert_eq!(changed_notes("buy milk", "buy milk\n"), None);
        assert_eq!(changed_notes("", "\n"), None);
        assert_eq!(
            changed_notes("buy milk", "buy milk\nand eggs\n"),
            Some("buy milk\nand eggs".to_string())
        );
        assert_eq!(changed_notes("draft", ""), Some(String::new()));
    }
}
