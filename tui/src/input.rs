//! Input handling for the Blockfall TUI.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use blockfall_engine::App;

use crate::{BoardView, board_view};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 256;
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Reads terminal events on a blocking thread and hands them to the frame
/// loop through a bounded channel.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = Arc::clone(&stop);
        let join = tokio::task::spawn_blocking(move || input_loop(&stop2, &tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        self.rx.close();
        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: &AtomicBool, tx: &mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain pending input into `app`. `area` is the current terminal size.
pub fn handle_events(app: &mut App, input: &mut InputPump, area: Rect) -> Result<()> {
    let view = board_view(area, app);
    for _ in 0..MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };
        apply_event(app, &ev, &view);
        if app.should_quit() {
            break;
        }
    }
    Ok(())
}

/// Apply one terminal event to `app`.
pub fn apply_event(app: &mut App, ev: &Event, view: &BoardView) {
    match ev {
        Event::Key(key) => apply_key(app, key),
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            ..
        }) => {
            if let Some(target) = view.column_at(*column) {
                debug!(column = target, "Mouse commit");
                app.commit(target);
            }
        }
        _ => {}
    }
}

fn apply_key(app: &mut App, key: &KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.request_quit();
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.request_quit(),
        KeyCode::Left | KeyCode::Char('h') => app.move_cursor(-1),
        KeyCode::Right | KeyCode::Char('l') => app.move_cursor(1),
        KeyCode::Enter | KeyCode::Down | KeyCode::Char(' ') => app.commit_selected(),
        KeyCode::Char(digit @ '1'..='9') => {
            if let Some(number) = digit.to_digit(10) {
                app.commit(number as usize - 1);
            }
        }
        _ => {}
    }
}
