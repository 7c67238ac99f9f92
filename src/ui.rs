//! Board layout, drop resolution and display formatting shared by the
//! terminal board. Nothing here touches the network or the terminal.

use chrono::{DateTime, Local, TimeZone, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};

use crate::model::{Status, Task, TaskPatch};

/// Tasks grouped into the four status columns, each sorted by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    columns: [Vec<Task>; 4],
}

/// A slot on the board: a column plus an index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub status: Status,
    pub index: usize,
}

impl Location {
    pub fn new(status: Status, index: usize) -> Self {
        Self { status, index }
    }
}

impl Board {
    /// Group `tasks` by status. The sort is stable, so tasks sharing a
    /// position keep the order they arrived in.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut board = Board::default();
        for task in tasks {
            board.columns[task.status.column()].push(task.clone());
        }
        for column in &mut board.columns {
            column.sort_by_key(|t| t.position);
        }
        board
    }

    pub fn column(&self, status: Status) -> &[Task] {
        &self.columns[status.column()]
    }

    pub fn get(&self, at: Location) -> Option<&Task> {
        self.column(at.status).get(at.index)
    }

    pub fn locate(&self, id: &str) -> Option<Location> {
        Status::ALL.iter().find_map(|&status| {
            self.column(status)
                .iter()
                .position(|t| t.id == id)
                .map(|index| Location::new(status, index))
        })
    }
}

/// The update a drop produces, if any.
///
/// `None` for a canceled drop or one back onto the source slot. Otherwise a
/// single partial update carrying the destination column and index; other
/// cards in either column are left untouched.
pub fn resolve_drop(source: Location, destination: Option<Location>) -> Option<TaskPatch> {
    let destination = destination?;
    if destination == source {
        return None;
    }
    Some(TaskPatch {
        title: None,
        status: Some(destination.status),
        position: Some(destination.index as i64),
    })
}

// ── Time formatting ─────────────────────────────────────────────────

/// Human relative age of `ts` as seen at `now`, using the local zone for
/// anything older than a week.
pub fn relative_time(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    relative_time_in(ts, now, &Local)
}

pub fn relative_time_in<Tz: TimeZone>(ts: DateTime<Utc>, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let minutes = (now - ts).num_minutes();
    let hours = minutes / 60;
    let days = hours / 24;

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        ts.with_timezone(tz).format("%b %-d, %-I:%M %p").to_string()
    }
}

/// Clock time for the "Last sync" header, e.g. `3:04:05 PM`.
pub fn sync_time<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%-I:%M:%S %p").to_string()
}

// ── Status indicator ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indicator {
    #[default]
    Online,
    Thinking,
    Offline,
}

impl Indicator {
    pub fn text(self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Thinking => "Thinking...",
            Self::Offline => "Offline",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            Self::Online => "Ready to help",
            Self::Thinking => "Processing",
            Self::Offline => "Away",
        }
    }

    pub fn style(self) -> Style {
        match self {
            Self::Online => Style::default().fg(Color::Green),
            Self::Thinking => Style::default().fg(Color::Yellow),
            Self::Offline => Style::default().fg(Color::DarkGray),
        }
    }
}

// ── Rendering helpers ───────────────────────────────────────────────

pub fn status_style(status: Status) -> Style {
    match status {
        Status::Todo => Style::default().fg(Color::Gray),
        Status::InProgress => Style::default().fg(Color::Yellow),
        Status::Done => Style::default().fg(Color::Green),
        Status::Archived => Style::default().fg(Color::DarkGray),
    }
}

/// Center a rectangle within an area.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
