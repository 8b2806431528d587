//! Cache-local incremental search.
//!
//! Results come from the store's substring search, refreshed on every
//! keystroke. Never touches the network.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use crate::input::InputEvent;
use crate::remote::types::Issue;
use crate::store::Store;
use crate::ui::scroll::Viewport;
use crate::ui::{status_color, truncate, ViewAction};

pub struct SearchView {
  pub query: String,
  pub results: Vec<Issue>,
  pub viewport: Viewport,
}

impl SearchView {
  pub fn new() -> Self {
    Self {
      query: String::new(),
      results: Vec::new(),
      viewport: Viewport::new(),
    }
  }

  fn refresh(&mut self, store: &Store) {
    self.results = if self.query.is_empty() {
      Vec::new()
    } else {
      store.search_issues(&self.query).unwrap_or_default()
    };
    self.viewport.reset();
  }

  pub fn handle(&mut self, ev: InputEvent, store: &Store) -> ViewAction {
    match ev {
      InputEvent::Char(c) => {
        self.query.push(c);
        self.refresh(store);
      }
      InputEvent::Backspace => {
        self.query.pop();
        self.refresh(store);
      }
      InputEvent::Up => self.viewport.move_up(),
      InputEvent::Down => self.viewport.move_down(self.results.len()),
      InputEvent::Enter => {
        if let Some(issue) = self.results.get(self.viewport.cursor) {
          return ViewAction::OpenDetail(issue.key.clone());
        }
      }
      InputEvent::Esc => return ViewAction::Back,
      _ => {}
    }
    ViewAction::None
  }

  pub fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(3), Constraint::Min(3)])
      .split(area);

    let input = Paragraph::new(self.query.as_str()).block(
      Block::default()
        .title(" Search (Esc to close) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(input, chunks[0]);

    self.viewport.clamp(self.results.len());
    self.viewport.resize(chunks[1].height.saturating_sub(2) as usize);

    let block = Block::default()
      .title(format!(" Results ({}) ", self.results.len()))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let width = chunks[1].width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = self
      .results
      .iter()
      .enumerate()
      .skip(self.viewport.offset())
      .map(|(row, issue)| {
        let line = Line::from(vec![
          Span::styled(format!("{:<12}", issue.key), Style::default().fg(Color::Cyan)),
          Span::styled(
            format!("{:<14}", truncate(&issue.status, 14)),
            Style::default().fg(status_color(&issue.status)),
          ),
          Span::raw(truncate(&issue.summary, width.saturating_sub(27))),
        ]);
        let mut item = ListItem::new(line);
        if row == self.viewport.cursor {
          item = item.style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
        }
        item
      })
      .collect();

    frame.render_widget(List::new(items).block(block), chunks[1]);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::remote::fake::sample_issue;

  fn seeded_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    store
      .upsert_issue(&sample_issue("PROJ-1", "To Do", "2026-01-01T10:00:00.000+0000"))
      .unwrap();
    store
      .upsert_issue(&sample_issue("PROJ-2", "Done", "2026-01-02T10:00:00.000+0000"))
      .unwrap();
    store
  }

  #[test]
  fn typing_refreshes_results_incrementally() {
    let store = seeded_store();
    let mut view = SearchView::new();

    for c in "PROJ".chars() {
      view.handle(InputEvent::Char(c), &store);
    }
    assert_eq!(view.results.len(), 2);

    for c in "-1".chars() {
      view.handle(InputEvent::Char(c), &store);
    }
    assert_eq!(view.results.len(), 1);
    assert_eq!(view.results[0].key, "PROJ-1");
  }

  #[test]
  fn empty_query_shows_nothing() {
    let store = seeded_store();
    let mut view = SearchView::new();
    view.handle(InputEvent::Char('x'), &store);
    view.handle(InputEvent::Backspace, &store);
    assert!(view.results.is_empty());
  }

  #[test]
  fn enter_opens_selected_result() {
    let store = seeded_store();
    let mut view = SearchView::new();
    for c in "PROJ".chars() {
      view.handle(InputEvent::Char(c), &store);
    }
    view.handle(InputEvent::Down, &store);

    match view.handle(InputEvent::Enter, &store) {
      ViewAction::OpenDetail(key) => assert_eq!(key, view.results[1].key),
      other => panic!("expected OpenDetail, got {other:?}"),
    }
  }
}
