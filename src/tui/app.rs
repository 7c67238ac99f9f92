use chrono::{DateTime, Local};

use crate::model::{Action, Status, Task, TaskPatch};
use crate::ui::{self, Board, Indicator, Location};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Board,
    Notes,
}

pub struct AddForm {
    pub status: Status,
    pub title: String,
    pub error: Option<String>,
}

impl AddForm {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            title: String::new(),
            error: None,
        }
    }

    /// The trimmed title, or `None` (with the form error set) when blank.
    pub fn validate(&mut self) -> Option<String> {
        let title = self.title.trim();
        if title.is_empty() {
            self.error = Some("Title must not be empty".into());
            return None;
        }
        self.error = None;
        Some(title.to_string())
    }
}

/// A card that has been picked up and is being carried around the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drag {
    pub task_id: String,
    pub source: Location,
    pub target: Location,
}

pub enum Mode {
    Normal,
    Help,
    Adding(AddForm),
    Dragging(Drag),
    ConfirmDelete(Task),
}

pub struct App {
    pub tasks: Vec<Task>,
    pub board: Board,
    pub actions: Vec<Action>,
    pub notes: String,
    pub focus: Focus,
    pub column: usize,
    pub row: usize,
    pub mode: Mode,
    pub indicator: Indicator,
    pub last_sync: Option<DateTime<Local>>,
    pub saving: bool,
    pub error: Option<String>,
}

impl App {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            board: Board::default(),
            actions: Vec::new(),
            notes: String::new(),
            focus: Focus::Board,
            column: 0,
            row: 0,
            mode: Mode::Normal,
            indicator: Indicator::default(),
            last_sync: None,
            saving: false,
            error: None,
        }
    }

    // ── Task cache ──

    pub fn set_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.rebuild();
    }

    pub fn insert_task(&mut self, task: Task) {
        self.tasks.push(task);
        self.rebuild();
    }

    pub fn replace_task(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => self.tasks.push(task),
        }
        self.rebuild();
    }

    pub fn remove_task(&mut self, id: &str) {
        self.tasks.retain(|t| t.id != id);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.board = Board::from_tasks(&self.tasks);
        self.clamp_cursor();
    }

    /// Put the cursor on `id` if it is on the board.
    pub fn select_task(&mut self, id: &str) {
        if let Some(at) = self.board.locate(id) {
            self.column = at.status.column();
            self.row = at.index;
        }
    }

    // ── Cursor ──

    pub fn selected_status(&self) -> Status {
        Status::ALL[self.column]
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.board.get(Location::new(self.selected_status(), self.row))
    }

    fn clamp_cursor(&mut self) {
        let len = self.board.column(self.selected_status()).len();
        self.row = self.row.min(len.saturating_sub(1));
    }

    pub fn move_left(&mut self) {
        if self.column > 0 {
            self.column -= 1;
            self.clamp_cursor();
        }
    }

    pub fn move_right(&mut self) {
        if self.column + 1 < Status::ALL.len() {
            self.column += 1;
            self.clamp_cursor();
        }
    }

    pub fn move_up(&mut self) {
        self.row = self.row.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        let len = self.board.column(self.selected_status()).len();
        if self.row + 1 < len {
            self.row += 1;
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Board => Focus::Notes,
            Focus::Notes => Focus::Board,
        };
    }

    // ── Modes ──

    pub fn enter_add_mode(&mut self) {
        self.mode = Mode::Adding(AddForm::new(self.selected_status()));
    }

    pub fn confirm_delete(&mut self) {
        if let Some(task) = self.selected_task().cloned() {
            self.mode = Mode::ConfirmDelete(task);
        }
    }

    // ── Drag and drop ──

    pub fn pick_up(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        let task_id = task.id.clone();
        let source = Location::new(task.status, self.row);
        self.mode = Mode::Dragging(Drag {
            task_id,
            source,
            target: source,
        });
    }

    /// Shift the drop target by `columns` and `rows`, clamped to the slots
    /// the card can land in.
    pub fn carry(&mut self, columns: isize, rows: isize) {
        let Mode::Dragging(drag) = &mut self.mode else {
            return;
        };
        let column = drag
            .target
            .status
            .column()
            .saturating_add_signed(columns)
            .min(Status::ALL.len() - 1);
        let status = Status::ALL[column];
        let last = last_slot(&self.board, drag.source, status);
        let index = drag.target.index.saturating_add_signed(rows).min(last);
        drag.target = Location::new(status, index);
        self.column = column;
        self.row = index;
    }

    /// Drop the carried card. Returns the task id and the update to send,
    /// or `None` when the card went back where it came from.
    pub fn drop_card(&mut self) -> Option<(String, TaskPatch)> {
        let Mode::Dragging(drag) = std::mem::replace(&mut self.mode, Mode::Normal) else {
            return None;
        };
        let patch = ui::resolve_drop(drag.source, Some(drag.target));
        if patch.is_none() {
            self.restore_cursor(drag.source);
        }
        patch.map(|p| (drag.task_id, p))
    }

    pub fn cancel_drag(&mut self) {
        if let Mode::Dragging(drag) = std::mem::replace(&mut self.mode, Mode::Normal) {
            self.restore_cursor(drag.source);
        }
    }

    fn restore_cursor(&mut self, at: Location) {
        self.column = at.status.column();
        self.row = at.index;
        self.clamp_cursor();
    }

    /// Cards of one column as drawn, with a carried card shown at its target.
    pub fn column_view(&self, status: Status) -> Vec<&Task> {
        let mut cards: Vec<&Task> = self.board.column(status).iter().collect();
        if let Mode::Dragging(drag) = &self.mode {
            cards.retain(|t| t.id != drag.task_id);
            if drag.target.status == status {
                if let Some(task) = self.board.get(drag.source) {
                    let at = drag.target.index.min(cards.len());
                    cards.insert(at, task);
                }
            }
        }
        cards
    }

    pub fn dragged_id(&self) -> Option<&str> {
        match &self.mode {
            Mode::Dragging(drag) => Some(&drag.task_id),
            _ => None,
        }
    }

    // ── Notes ──

    pub fn notes_push(&mut self, c: char) {
        self.notes.push(c);
    }

    pub fn notes_backspace(&mut self) -> bool {
        self.notes.pop().is_some()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Highest index a card from `source` may be dropped at in `status`: the end
/// of a foreign column, or the last occupied slot of its own.
fn last_slot(board: &Board, source: Location, status: Status) -> usize {
    let len = board.column(status).len();
    if status == source.status {
        len.saturating_sub(1)
    } else {
        len
    }
}
