//! Three-column board grouped by workflow stage.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem};

use crate::input::InputEvent;
use crate::remote::types::Issue;
use crate::selection::SelectionSet;
use crate::ui::scroll::Viewport;
use crate::ui::{status_color, truncate, ViewAction};

/// The board's workflow stages, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
  Todo,
  InProgress,
  Done,
}

impl Column {
  pub const ALL: [Column; 3] = [Column::Todo, Column::InProgress, Column::Done];

  pub fn index(self) -> usize {
    match self {
      Column::Todo => 0,
      Column::InProgress => 1,
      Column::Done => 2,
    }
  }

  pub fn title(self) -> &'static str {
    match self {
      Column::Todo => "To Do",
      Column::InProgress => "In Progress",
      Column::Done => "Done",
    }
  }
}

/// Map a raw status name onto a board column.
///
/// Substring match on the lowercased status. Terminal markers win over
/// progress markers, so a status like "Review Done" lands in Done.
pub fn classify(status: &str) -> Column {
  let s = status.to_lowercase();
  if s.contains("done") || s.contains("closed") || s.contains("resolved") {
    Column::Done
  } else if s.contains("progress") || s.contains("review") {
    Column::InProgress
  } else {
    Column::Todo
  }
}

/// Split issues into the three columns, preserving input order.
pub fn group(issues: &[Issue]) -> [Vec<Issue>; 3] {
  let mut columns: [Vec<Issue>; 3] = Default::default();
  for issue in issues {
    columns[classify(&issue.status).index()].push(issue.clone());
  }
  columns
}

/// Navigation state of the board view.
pub struct BoardView {
  pub column: Column,
  pub viewports: [Viewport; 3],
}

impl BoardView {
  pub fn new() -> Self {
    Self {
      column: Column::Todo,
      viewports: [Viewport::new(), Viewport::new(), Viewport::new()],
    }
  }

  fn viewport(&mut self) -> &mut Viewport {
    &mut self.viewports[self.column.index()]
  }

  /// The key under the cursor, if the active column is non-empty.
  pub fn cursor_key(&self, columns: &[Vec<Issue>; 3]) -> Option<String> {
    let col = &columns[self.column.index()];
    col
      .get(self.viewports[self.column.index()].cursor)
      .map(|i| i.key.clone())
  }

  pub fn handle(&mut self, ev: InputEvent, columns: &[Vec<Issue>; 3]) -> ViewAction {
    let len = columns[self.column.index()].len();
    match ev {
      InputEvent::Up | InputEvent::Char('k') => self.viewport().move_up(),
      InputEvent::Down | InputEvent::Char('j') => self.viewport().move_down(len),
      InputEvent::Left | InputEvent::Char('h') => self.shift(-1),
      InputEvent::Right | InputEvent::Char('l') => self.shift(1),
      InputEvent::Enter => {
        if let Some(key) = self.cursor_key(columns) {
          return ViewAction::OpenDetail(key);
        }
      }
      InputEvent::Char('m') => {
        if let Some(key) = self.cursor_key(columns) {
          return ViewAction::OpenTransitions(vec![key]);
        }
      }
      _ => {}
    }
    ViewAction::None
  }

  fn shift(&mut self, dir: i32) {
    let idx = self.column.index() as i32 + dir;
    let idx = idx.rem_euclid(Column::ALL.len() as i32) as usize;
    self.column = Column::ALL[idx];
    // Entering a column always lands at its top.
    self.viewports[idx].reset();
  }

  pub fn render(
    &mut self,
    frame: &mut Frame,
    area: Rect,
    columns: &[Vec<Issue>; 3],
    selection: &SelectionSet,
  ) {
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([
        Constraint::Percentage(33),
        Constraint::Percentage(33),
        Constraint::Percentage(34),
      ])
      .split(area);

    for (i, column) in Column::ALL.into_iter().enumerate() {
      let issues = &columns[i];
      let active = column == self.column;
      let vp = &mut self.viewports[i];
      vp.clamp(issues.len());
      vp.resize(chunks[i].height.saturating_sub(2) as usize);

      let border = if active { Color::Blue } else { Color::DarkGray };
      let block = Block::default()
        .title(format!(" {} ({}) ", column.title(), issues.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

      let width = chunks[i].width.saturating_sub(4) as usize;
      let items: Vec<ListItem> = issues
        .iter()
        .enumerate()
        .skip(vp.offset())
        .map(|(row, issue)| {
          let marker = if selection.contains(&issue.key) { "*" } else { " " };
          let mut style = Style::default().fg(status_color(&issue.status));
          if active && row == vp.cursor {
            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
          }
          let text = format!("{marker}{} {}", issue.key, issue.summary);
          ListItem::new(truncate(&text, width)).style(style)
        })
        .collect();

      frame.render_widget(List::new(items).block(block), chunks[i]);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classify_terminal_statuses() {
    assert_eq!(classify("Done"), Column::Done);
    assert_eq!(classify("Closed"), Column::Done);
    assert_eq!(classify("Resolved"), Column::Done);
    assert_eq!(classify("done"), Column::Done);
  }

  #[test]
  fn classify_progress_statuses() {
    assert_eq!(classify("In Progress"), Column::InProgress);
    assert_eq!(classify("In Review"), Column::InProgress);
    assert_eq!(classify("Code Review"), Column::InProgress);
  }

  #[test]
  fn classify_terminal_wins_over_progress() {
    // Both markers present, the terminal one decides.
    assert_eq!(classify("Review Done"), Column::Done);
  }

  #[test]
  fn classify_defaults_to_todo() {
    assert_eq!(classify("To Do"), Column::Todo);
    assert_eq!(classify("Open"), Column::Todo);
    assert_eq!(classify("Backlog"), Column::Todo);
    assert_eq!(classify("Some Custom Status"), Column::Todo);
  }

  #[test]
  fn switching_columns_resets_cursor() {
    let mut board = BoardView::new();
    let columns = [
      vec![],
      (0..5)
        .map(|n| {
          crate::remote::fake::sample_issue(
            &format!("PROJ-{n}"),
            "In Progress",
            "2026-01-01T10:00:00.000+0000",
          )
        })
        .collect(),
      vec![],
    ];

    board.handle(InputEvent::Right, &columns);
    assert_eq!(board.column, Column::InProgress);
    board.handle(InputEvent::Down, &columns);
    board.handle(InputEvent::Down, &columns);
    assert_eq!(board.viewports[1].cursor, 2);

    board.handle(InputEvent::Right, &columns);
    board.handle(InputEvent::Left, &columns);
    assert_eq!(board.column, Column::InProgress);
    assert_eq!(board.viewports[1].cursor, 0);
  }

  #[test]
  fn columns_wrap_around() {
    let mut board = BoardView::new();
    let columns: [Vec<Issue>; 3] = Default::default();
    board.handle(InputEvent::Left, &columns);
    assert_eq!(board.column, Column::Done);
    board.handle(InputEvent::Right, &columns);
    assert_eq!(board.column, Column::Todo);
  }
}
