//! Key events decoded once at the terminal boundary.
//!
//! Everything past the event loop consumes this enum as data; no view or
//! overlay matches on raw crossterm types.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
  Up,
  Down,
  Left,
  Right,
  Enter,
  Esc,
  Tab,
  BackTab,
  Backspace,
  /// Ctrl-S: submit a multi-field form.
  Submit,
  /// Ctrl-C: quit unconditionally, recognized in every mode.
  HardQuit,
  Char(char),
  /// Anything we don't bind.
  Other,
}

impl InputEvent {
  pub fn decode(key: KeyEvent) -> Self {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
      return match key.code {
        KeyCode::Char('c') => InputEvent::HardQuit,
        KeyCode::Char('s') => InputEvent::Submit,
        _ => InputEvent::Other,
      };
    }

    match key.code {
      KeyCode::Up => InputEvent::Up,
      KeyCode::Down => InputEvent::Down,
      KeyCode::Left => InputEvent::Left,
      KeyCode::Right => InputEvent::Right,
      KeyCode::Enter => InputEvent::Enter,
      KeyCode::Esc => InputEvent::Esc,
      KeyCode::Tab => InputEvent::Tab,
      KeyCode::BackTab => InputEvent::BackTab,
      KeyCode::Backspace => InputEvent::Backspace,
      KeyCode::Char(c) => InputEvent::Char(c),
      _ => InputEvent::Other,
    }
  }
}
