use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::remote::types::{Project, Transition};
use crate::sync::SyncOutcome;

/// Application events.
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for rendering and timer checks
  Tick,
  /// A background task finished
  Task(TaskEvent),
}

/// Completion events delivered by background tasks.
///
/// Tasks never mutate router or view state directly; everything funnels
/// through the loop as one of these.
#[derive(Debug)]
pub enum TaskEvent {
  SyncDone(Result<SyncOutcome, String>),
  TransitionsLoaded {
    transitions: Vec<Transition>,
  },
  MoveDone {
    moved: usize,
    failed: usize,
  },
  AssignDone {
    key: String,
  },
  CommentDone {
    key: String,
  },
  WorkLogged {
    key: String,
  },
  IssueCreated {
    key: String,
  },
  ProjectsLoaded(Vec<Project>),
  FilterApplied {
    keys: Vec<String>,
  },
  /// A task that only has a message to show (usually a failure).
  Status(String),
}

/// Event handler that produces events from terminal input and a tick timer.
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate.
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    let input_tx = tx.clone();
    tokio::spawn(async move {
      loop {
        if event::poll(tick_rate).unwrap_or(false) {
          if let Ok(CrosstermEvent::Key(key)) = event::read() {
            if key.kind == KeyEventKind::Press && input_tx.send(Event::Key(key)).is_err() {
              break;
            }
          }
        } else if input_tx.send(Event::Tick).is_err() {
          break;
        }
      }
    });

    Self { tx, rx }
  }

  /// Sender for background tasks to deliver completion events.
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event.
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
