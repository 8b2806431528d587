//! Cursor-plus-window scrolling shared by every list in the app.

/// A cursor into a list together with the window of rows currently shown.
///
/// The offset only ever moves when the cursor would leave the window, and
/// then by exactly one row, so scrolling feels anchored.
#[derive(Debug, Clone, Default)]
pub struct Viewport {
  pub cursor: usize,
  offset: usize,
  max_visible: usize,
}

impl Viewport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn offset(&self) -> usize {
    self.offset
  }

  /// Record how many rows fit this frame. Called every render, since the
  /// terminal can resize between frames.
  pub fn resize(&mut self, visible: usize) {
    self.max_visible = visible.max(1);
    if self.cursor < self.offset {
      self.offset = self.cursor;
    } else if self.cursor >= self.offset + self.max_visible {
      self.offset = self.cursor + 1 - self.max_visible;
    }
  }

  pub fn move_up(&mut self) {
    if self.cursor > 0 {
      self.cursor -= 1;
      if self.cursor < self.offset {
        self.offset -= 1;
      }
    }
  }

  pub fn move_down(&mut self, len: usize) {
    if self.cursor + 1 < len {
      self.cursor += 1;
      if self.max_visible > 0 && self.cursor >= self.offset + self.max_visible {
        self.offset += 1;
      }
    }
  }

  /// Pull cursor and offset back in range after the list shrank.
  pub fn clamp(&mut self, len: usize) {
    if len == 0 {
      self.cursor = 0;
      self.offset = 0;
      return;
    }
    if self.cursor >= len {
      self.cursor = len - 1;
    }
    if self.offset > self.cursor {
      self.offset = self.cursor;
    }
  }

  pub fn reset(&mut self) {
    self.cursor = 0;
    self.offset = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn moving_past_bottom_edge_shifts_window_by_one() {
    let mut vp = Viewport::new();
    vp.resize(3);
    for _ in 0..3 {
      vp.move_down(10);
    }
    assert_eq!(vp.cursor, 3);
    assert_eq!(vp.offset(), 1);
  }

  #[test]
  fn moving_past_top_edge_shifts_window_by_one() {
    let mut vp = Viewport::new();
    vp.resize(3);
    for _ in 0..5 {
      vp.move_down(10);
    }
    for _ in 0..5 {
      vp.move_up();
    }
    assert_eq!(vp.cursor, 0);
    assert_eq!(vp.offset(), 0);
  }

  #[test]
  fn cursor_stops_at_list_ends() {
    let mut vp = Viewport::new();
    vp.resize(5);
    vp.move_up();
    assert_eq!(vp.cursor, 0);
    for _ in 0..10 {
      vp.move_down(3);
    }
    assert_eq!(vp.cursor, 2);
  }

  #[test]
  fn clamp_after_shrink() {
    let mut vp = Viewport::new();
    vp.resize(3);
    for _ in 0..7 {
      vp.move_down(10);
    }
    vp.clamp(2);
    assert_eq!(vp.cursor, 1);
    assert!(vp.offset() <= vp.cursor);

    vp.clamp(0);
    assert_eq!(vp.cursor, 0);
    assert_eq!(vp.offset(), 0);
  }
}
