//! Terminal kanban board backed by the HTTP API.

mod app;
mod board;
mod editor;
mod event;
mod input;
mod session;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::prelude::*;
use tokio::sync::mpsc;

use crate::client::DashboardClient;
use crate::timer;
use crate::ui::Indicator;
use app::App;
use event::KeyAction;
use input::{InputGate, UiEvent};
use session::Session;

/// Idle time after the last notes edit before the notes are saved.
pub const NOTES_DEBOUNCE: Duration = Duration::from_secs(1);
/// How long "Saving..." stays up after a save.
pub const SAVING_INDICATOR: Duration = Duration::from_millis(500);

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

pub async fn run(client: DashboardClient, poll_interval: Duration) -> Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, client, poll_interval).await;

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Tui,
    client: DashboardClient,
    poll_interval: Duration,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let gate = InputGate::spawn(tx.clone());
    let mut poll = timer::poll_interval(poll_interval);
    let mut session = Session::new(client, tx);

    thinking(terminal, &mut session.app)?;
    session.reload().await;

    loop {
        terminal.draw(|frame| board::render(frame, &session.app))?;

        tokio::select! {
            received = rx.recv() => {
                let Some(ui_event) = received else {
                    break;
                };
                match ui_event {
                    UiEvent::Key(key) => {
                        session.app.error = None;
                        match event::handle_key(&mut session.app, key) {
                            KeyAction::Quit => break,
                            KeyAction::Reload => {
                                thinking(terminal, &mut session.app)?;
                                session.reload().await;
                            }
                            KeyAction::Create { title, status } => {
                                thinking(terminal, &mut session.app)?;
                                session.create_task(&title, status).await;
                            }
                            KeyAction::Delete(id) => {
                                thinking(terminal, &mut session.app)?;
                                session.delete_task(&id).await;
                            }
                            KeyAction::Move { id, patch } => {
                                thinking(terminal, &mut session.app)?;
                                session.move_task(&id, &patch).await;
                            }
                            KeyAction::NotesEdited => session.notes_edited(),
                            KeyAction::OpenEditor => {
                                let edited = gate.paused(|| {
                                    tokio::task::block_in_place(|| {
                                        editor::edit_notes(terminal, &session.app.notes)
                                    })
                                });
                                match edited {
                                    Ok(Some(content)) => {
                                        session.app.notes = content;
                                        session.notes_edited();
                                    }
                                    Ok(None) => {}
                                    Err(e) => session.app.error = Some(format!("{e:#}")),
                                }
                            }
                            KeyAction::Continue => {}
                        }
                    }
                    UiEvent::Resize => {}
                    UiEvent::SaveNotes => {
                        thinking(terminal, &mut session.app)?;
                        session.save_notes().await;
                    }
                    UiEvent::SavingDone => session.saving_done(),
                    UiEvent::InputLost(reason) => {
                        anyhow::bail!("terminal input failed: {reason}");
                    }
                }
            }
            _ = poll.tick() => session.refresh_actions().await,
        }
    }

    session.flush().await;
    Ok(())
}

/// Show the busy indicator before a request goes out.
fn thinking(terminal: &mut Tui, app: &mut App) -> Result<()> {
    app.indicator = Indicator::Thinking;
    terminal.draw(|frame| board::render(frame, app))?;
    Ok(())
}
