use chrono::Utc;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};

use super::app::{App, Focus, Mode};
use crate::model::{Status, Task};
use crate::ui;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(chunks[1]);
    render_board(frame, app, body[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(body[1]);
    render_notes(frame, app, side[0]);
    render_actions(frame, app, side[1]);

    render_footer(frame, app, chunks[2]);

    match &app.mode {
        Mode::Help => render_help(frame),
        Mode::Adding(_) => render_add_dialog(frame, app),
        Mode::ConfirmDelete(task) => render_confirm_delete(frame, task),
        Mode::Normal | Mode::Dragging(_) => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let indicator = app.indicator;
    let sync = match &app.last_sync {
        Some(at) => format!("Last sync: {}", ui::sync_time(at)),
        None => "Last sync: never".to_string(),
    };
    let line = Line::from(vec![
        Span::styled("● ", indicator.style()),
        Span::styled(indicator.text(), indicator.style().bold()),
        Span::styled(
            format!("  {}", indicator.subtitle()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("    "),
        Span::styled(sync, Style::default().fg(Color::DarkGray)),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Task Dashboard ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_board(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (status, column_area) in Status::ALL.into_iter().zip(columns.iter()) {
        render_column(frame, app, status, *column_area);
    }
}

fn render_column(frame: &mut Frame, app: &App, status: Status, area: Rect) {
    let cards = app.column_view(status);
    let focused = app.focus == Focus::Board && app.selected_status() == status;
    let dragged = app.dragged_id();

    let items: Vec<ListItem> = cards
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let mut style = Style::default();
            if focused && i == app.row {
                style = style.bg(Color::DarkGray);
            }
            if dragged == Some(task.id.as_str()) {
                style = style.fg(Color::Cyan).bold();
            }
            ListItem::new(Line::from(vec![
                Span::styled("▌", ui::status_style(task.status)),
                Span::raw(task.title.clone()),
            ]))
            .style(style)
        })
        .collect();

    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        ui::status_style(status)
    };
    let title = format!(" {} ({}) ", status.label(), app.board.column(status).len());
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border),
    );
    frame.render_widget(list, area);
}

fn render_notes(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Notes;
    let title = if app.saving {
        " Notes (Saving...) "
    } else {
        " Notes "
    };
    let cursor = if focused { "_" } else { "" };
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let paragraph = Paragraph::new(format!("{}{cursor}", app.notes))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_actions(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Actions ");
    if app.actions.is_empty() {
        frame.render_widget(
            Paragraph::new("No actions yet")
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let now = Utc::now();
    let items: Vec<ListItem> = app
        .actions
        .iter()
        .map(|action| {
            ListItem::new(vec![
                Line::raw(action.action.clone()),
                Line::styled(
                    format!("  {}", ui::relative_time(action.timestamp, now)),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(err) = &app.error {
        frame.render_widget(
            Paragraph::new(err.as_str()).style(Style::default().fg(Color::Red)),
            area,
        );
        return;
    }
    let hint = match (&app.mode, app.focus) {
        (Mode::Dragging(_), _) => "h/j/k/l: move card  Enter: drop  Esc: cancel",
        (_, Focus::Notes) => "Type to edit  C-e: $EDITOR  Tab/Esc: back to board",
        _ => "a: add  d: delete  Space: pick up  Tab: notes  r: refresh  ?: help  q: quit",
    };
    frame.render_widget(
        Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn render_add_dialog(frame: &mut Frame, app: &App) {
    let Mode::Adding(form) = &app.mode else {
        return;
    };

    let term = frame.area();
    let width = 50.min(term.width.saturating_sub(4));
    let height = (5 + u16::from(form.error.is_some())).min(term.height.saturating_sub(2));
    let area = ui::centered_rect(width, height, term);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" New task in {} ", form.status.label()))
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![Line::from(vec![
        Span::styled("Title: ", Style::default().fg(Color::Cyan).bold()),
        Span::raw(format!("{}_", form.title)),
    ])];
    if let Some(err) = &form.error {
        lines.push(Line::styled(err.clone(), Style::default().fg(Color::Red)));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "Enter: create  Esc: cancel  C-u: clear",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_confirm_delete(frame: &mut Frame, task: &Task) {
    let term = frame.area();
    let width = 50.min(term.width.saturating_sub(4));
    let height = 5.min(term.height.saturating_sub(2));
    let area = ui::centered_rect(width, height, term);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Delete ")
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text = vec![
        Line::from(vec![
            Span::raw("Delete "),
            Span::styled(task.title.clone(), Style::default().bold()),
            Span::raw("?"),
        ]),
        Line::raw(""),
        Line::from(vec![
            Span::raw("Proceed? "),
            Span::styled("y", Style::default().fg(Color::Green).bold()),
            Span::raw("/"),
            Span::styled("n", Style::default().fg(Color::Red).bold()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
}

fn render_help(frame: &mut Frame) {
    let term = frame.area();
    let width = 50.min(term.width.saturating_sub(4));
    let height = 17.min(term.height.saturating_sub(2));
    let area = ui::centered_rect(width, height, term);
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("{k:<10}"), Style::default().fg(Color::Cyan)),
            Span::raw(what),
        ])
    };
    let help_text = vec![
        key("h/l", "Previous/next column"),
        key("j/k", "Move down/up"),
        key("a", "Add task to this column"),
        key("d", "Delete selected task"),
        key("Space/m", "Pick up card"),
        key("r", "Reload everything"),
        key("Tab", "Edit notes"),
        key("C-e", "Open $EDITOR for notes"),
        key("?", "Toggle help"),
        key("q/Esc", "Quit"),
        Line::raw(""),
        Line::from(Span::styled("Carrying a card:", Style::default().bold())),
        key("  h/j/k/l", "Move target"),
        key("  Enter", "Drop"),
        key("  Esc", "Put back"),
    ];
    frame.render_widget(Paragraph::new(help_text), inner);
}
