use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self as ct_event, Event, KeyEvent, KeyEventKind};
use tokio::sync::mpsc::UnboundedSender;

const INPUT_POLL: Duration = Duration::from_millis(100);

/// Everything the board loop reacts to besides the poll timer.
#[derive(Debug)]
pub enum UiEvent {
    Key(KeyEvent),
    Resize,
    /// The notes debounce elapsed.
    SaveNotes,
    /// The "Saving..." indicator has been up long enough.
    SavingDone,
    /// Terminal input failed; the board cannot continue.
    InputLost(String),
}

/// Reads terminal input on a dedicated thread and forwards it to the loop.
/// Reading can be paused while a child process owns the terminal.
pub struct InputGate {
    paused: Arc<AtomicBool>,
}

impl InputGate {
    /// The reader thread exits once the receiving side is gone.
    pub fn spawn(tx: UnboundedSender<UiEvent>) -> Self {
        let paused = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&paused);
        thread::spawn(move || read_input(tx, flag));
        Self { paused }
    }

    /// Run `f` with input reading suspended.
    pub fn paused<T>(&self, f: impl FnOnce() -> T) -> T {
        self.paused.store(true, Ordering::SeqCst);
        // Let an in-flight poll finish before handing the terminal over.
        thread::sleep(INPUT_POLL);
        let out = f();
        self.paused.store(false, Ordering::SeqCst);
        out
    }
}

fn read_input(tx: UnboundedSender<UiEvent>, paused: Arc<AtomicBool>) {
    loop {
        if tx.is_closed() {
            return;
        }
        if paused.load(Ordering::SeqCst) {
            thread::sleep(INPUT_POLL);
            continue;
        }
        match ct_event::poll(INPUT_POLL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                let _ = tx.send(UiEvent::InputLost(e.to_string()));
                return;
            }
        }
        let event = match ct_event::read() {
            Ok(event) => event,
            Err(e) => {
                let _ = tx.send(UiEvent::InputLost(e.to_string()));
                return;
            }
        };
        let forwarded = match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => UiEvent::Key(key),
            Event::Resize(..) => UiEvent::Resize,
            _ => continue,
        };
        if tx.send(forwarded).is_err() {
            return;
        }
    }
}
