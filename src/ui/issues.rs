//! Flat issue list, the default view.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use crate::input::InputEvent;
use crate::remote::types::Issue;
use crate::selection::SelectionSet;
use crate::ui::scroll::Viewport;
use crate::ui::{status_color, truncate, ViewAction};

pub struct IssueListView {
  pub viewport: Viewport,
}

impl IssueListView {
  pub fn new() -> Self {
    Self {
      viewport: Viewport::new(),
    }
  }

  pub fn cursor_key(&self, issues: &[Issue]) -> Option<String> {
    issues.get(self.viewport.cursor).map(|i| i.key.clone())
  }

  pub fn handle(&mut self, ev: InputEvent, issues: &[Issue]) -> ViewAction {
    match ev {
      InputEvent::Up | InputEvent::Char('k') => self.viewport.move_up(),
      InputEvent::Down | InputEvent::Char('j') => self.viewport.move_down(issues.len()),
      InputEvent::Enter => {
        if let Some(key) = self.cursor_key(issues) {
          return ViewAction::OpenDetail(key);
        }
      }
      InputEvent::Char('m') => {
        if let Some(key) = self.cursor_key(issues) {
          return ViewAction::OpenTransitions(vec![key]);
        }
      }
      _ => {}
    }
    ViewAction::None
  }

  pub fn render(
    &mut self,
    frame: &mut Frame,
    area: Rect,
    issues: &[Issue],
    selection: &SelectionSet,
    title: &str,
  ) {
    self.viewport.clamp(issues.len());
    self.viewport.resize(area.height.saturating_sub(2) as usize);

    let block = Block::default()
      .title(format!(" {title} ({}) ", issues.len()))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if issues.is_empty() {
      let empty = Paragraph::new("No issues cached. Press 'r' to sync.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(empty, area);
      return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = issues
      .iter()
      .enumerate()
      .skip(self.viewport.offset())
      .map(|(row, issue)| {
        let marker = if selection.contains(&issue.key) { "*" } else { " " };
        let line = Line::from(vec![
          Span::raw(marker.to_string()),
          Span::styled(format!("{:<12}", issue.key), Style::default().fg(Color::Cyan)),
          Span::styled(
            format!("{:<14}", truncate(&issue.status, 14)),
            Style::default().fg(status_color(&issue.status)),
          ),
          Span::styled(
            format!("{:<12}", truncate(issue.assignee_name(), 12)),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(truncate(&issue.summary, width.saturating_sub(41))),
        ]);
        let mut item = ListItem::new(line);
        if row == self.viewport.cursor {
          item = item.style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
        }
        item
      })
      .collect();

    frame.render_widget(List::new(items).block(block), area);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::remote::fake::sample_issue;

  fn issues(n: u32) -> Vec<Issue> {
    (0..n)
      .map(|i| sample_issue(&format!("PROJ-{i}"), "To Do", "2026-01-01T10:00:00.000+0000"))
      .collect()
  }

  #[test]
  fn enter_opens_detail_for_cursor_row() {
    let mut view = IssueListView::new();
    let issues = issues(3);
    view.handle(InputEvent::Down, &issues);

    match view.handle(InputEvent::Enter, &issues) {
      ViewAction::OpenDetail(key) => assert_eq!(key, "PROJ-1"),
      other => panic!("expected OpenDetail, got {other:?}"),
    }
  }

  #[test]
  fn enter_on_empty_list_does_nothing() {
    let mut view = IssueListView::new();
    assert!(matches!(view.handle(InputEvent::Enter, &[]), ViewAction::None));
  }

  #[test]
  fn transition_key_targets_cursor_row() {
    let mut view = IssueListView::new();
    let issues = issues(2);
    match view.handle(InputEvent::Char('m'), &issues) {
      ViewAction::OpenTransitions(keys) => assert_eq!(keys, vec!["PROJ-0".to_string()]),
      other => panic!("expected OpenTransitions, got {other:?}"),
    }
  }
}
