use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus, Mode};
use crate::model::{Status, TaskPatch};

/// Result of handling a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Re-fetch tasks, notes and actions.
    Reload,
    Create { title: String, status: Status },
    Delete(String),
    Move { id: String, patch: TaskPatch },
    /// Notes text changed; restart the autosave debounce.
    NotesEdited,
    OpenEditor,
    Continue,
}

/// Handle a key press. Returns an action indicating what the event loop should do.
pub fn handle_key(app: &mut App, key: KeyEvent) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }

    match &app.mode {
        Mode::Help => {
            if matches!(
                key.code,
                KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')
            ) {
                app.mode = Mode::Normal;
            }
            KeyAction::Continue
        }
        Mode::ConfirmDelete(task) => {
            let id = task.id.clone();
            app.mode = Mode::Normal;
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Enter) {
                KeyAction::Delete(id)
            } else {
                KeyAction::Continue
            }
        }
        Mode::Adding(_) => handle_add(app, key),
        Mode::Dragging(_) => handle_drag(app, key),
        Mode::Normal => match app.focus {
            Focus::Board => handle_board(app, key),
            Focus::Notes => handle_notes(app, key),
        },
    }
}

fn handle_board(app: &mut App, key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('e') => KeyAction::OpenEditor,
            _ => KeyAction::Continue,
        };
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
        KeyCode::Char('h') | KeyCode::Left => app.move_left(),
        KeyCode::Char('l') | KeyCode::Right => app.move_right(),
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('a') => app.enter_add_mode(),
        KeyCode::Char('d') | KeyCode::Delete => app.confirm_delete(),
        KeyCode::Char(' ') | KeyCode::Char('m') => app.pick_up(),
        KeyCode::Char('r') => return KeyAction::Reload,
        KeyCode::Char('?') => app.mode = Mode::Help,
        KeyCode::Tab => app.toggle_focus(),
        _ => {}
    }
    KeyAction::Continue
}

fn handle_notes(app: &mut App, key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('e') => KeyAction::OpenEditor,
            _ => KeyAction::Continue,
        };
    }
    match key.code {
        KeyCode::Esc | KeyCode::Tab => {
            app.toggle_focus();
            KeyAction::Continue
        }
        KeyCode::Enter => {
            app.notes_push('\n');
            KeyAction::NotesEdited
        }
        KeyCode::Backspace => {
            if app.notes_backspace() {
                KeyAction::NotesEdited
            } else {
                KeyAction::Continue
            }
        }
        KeyCode::Char(c) => {
            app.notes_push(c);
            KeyAction::NotesEdited
        }
        _ => KeyAction::Continue,
    }
}

fn handle_add(app: &mut App, key: KeyEvent) -> KeyAction {
    let Mode::Adding(form) = &mut app.mode else {
        return KeyAction::Continue;
    };
    match key.code {
        KeyCode::Esc => {
            app.mode = Mode::Normal;
            KeyAction::Continue
        }
        KeyCode::Enter => match form.validate() {
            Some(title) => {
                let status = form.status;
                app.mode = Mode::Normal;
                KeyAction::Create { title, status }
            }
            None => KeyAction::Continue,
        },
        KeyCode::Backspace => {
            form.title.pop();
            form.error = None;
            KeyAction::Continue
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            form.title.clear();
            form.error = None;
            KeyAction::Continue
        }
        KeyCode::Char(c) => {
            form.title.push(c);
            form.error = None;
            KeyAction::Continue
        }
        _ => KeyAction::Continue,
    }
}

fn handle_drag(app: &mut App, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => app.carry(-1, 0),
        KeyCode::Char('l') | KeyCode::Right => app.carry(1, 0),
        KeyCode::Char('k') | KeyCode::Up => app.carry(0, -1),
        KeyCode::Char('j') | KeyCode::Down => app.carry(0, 1),
        KeyCode::Esc => app.cancel_drag(),
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('m') => {
            if let Some((id, patch)) = app.drop_card() {
                return KeyAction::Move { id, patch };
            }
        }
        _ => {}
    }
    KeyAction::Continue
}
