//! Single-issue detail view with comment and worklog compose.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::input::InputEvent;
use crate::remote::types::Issue;
use crate::ui::{status_color, ViewAction};

/// An in-progress text entry at the bottom of the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compose {
  Comment(String),
  Worklog(String),
}

pub struct DetailView {
  pub key: String,
  pub scroll: u16,
  pub compose: Option<Compose>,
}

impl DetailView {
  pub fn new(key: String) -> Self {
    Self {
      key,
      scroll: 0,
      compose: None,
    }
  }

  pub fn in_text_entry(&self) -> bool {
    self.compose.is_some()
  }

  pub fn handle(&mut self, ev: InputEvent) -> ViewAction {
    if let Some(compose) = &mut self.compose {
      let buffer = match compose {
        Compose::Comment(b) | Compose::Worklog(b) => b,
      };
      match ev {
        InputEvent::Char(c) => buffer.push(c),
        InputEvent::Backspace => {
          buffer.pop();
        }
        InputEvent::Esc => self.compose = None,
        InputEvent::Enter => {
          let text = buffer.trim().to_string();
          if text.is_empty() {
            return ViewAction::None;
          }
          let action = match compose {
            Compose::Comment(_) => ViewAction::SubmitComment {
              key: self.key.clone(),
              body: text,
            },
            Compose::Worklog(_) => ViewAction::SubmitWorklog {
              key: self.key.clone(),
              time_spent: text,
            },
          };
          self.compose = None;
          return action;
        }
        _ => {}
      }
      return ViewAction::None;
    }

    match ev {
      InputEvent::Up | InputEvent::Char('k') => self.scroll = self.scroll.saturating_sub(1),
      InputEvent::Down | InputEvent::Char('j') => self.scroll = self.scroll.saturating_add(1),
      InputEvent::Char('c') => self.compose = Some(Compose::Comment(String::new())),
      InputEvent::Char('t') => self.compose = Some(Compose::Worklog(String::new())),
      InputEvent::Char('m') => return ViewAction::OpenTransitions(vec![self.key.clone()]),
      InputEvent::Esc => return ViewAction::Back,
      _ => {}
    }
    ViewAction::None
  }

  pub fn render(&mut self, frame: &mut Frame, area: Rect, issue: Option<&Issue>) {
    let compose_height = if self.compose.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Min(3), Constraint::Length(compose_height)])
      .split(area);

    let block = Block::default()
      .title(format!(" {} ", self.key))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let Some(issue) = issue else {
      let missing = Paragraph::new("Issue not in cache.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(missing, chunks[0]);
      return;
    };

    let mut lines = vec![
      Line::from(Span::styled(
        issue.summary.clone(),
        Style::default().add_modifier(Modifier::BOLD),
      )),
      Line::default(),
      Line::from(vec![
        Span::styled("Status:   ", Style::default().fg(Color::DarkGray)),
        Span::styled(issue.status.clone(), Style::default().fg(status_color(&issue.status))),
      ]),
      Line::from(vec![
        Span::styled("Type:     ", Style::default().fg(Color::DarkGray)),
        Span::raw(issue.issue_type.clone()),
      ]),
      Line::from(vec![
        Span::styled("Priority: ", Style::default().fg(Color::DarkGray)),
        Span::raw(issue.priority.clone()),
      ]),
      Line::from(vec![
        Span::styled("Assignee: ", Style::default().fg(Color::DarkGray)),
        Span::raw(issue.assignee_name().to_string()),
      ]),
      Line::from(vec![
        Span::styled("Updated:  ", Style::default().fg(Color::DarkGray)),
        Span::raw(issue.updated.clone()),
      ]),
      Line::default(),
    ];

    if let Some(desc) = &issue.description {
      for l in desc.lines() {
        lines.push(Line::raw(l.to_string()));
      }
      lines.push(Line::default());
    }

    if !issue.comments.is_empty() {
      lines.push(Line::from(Span::styled(
        format!("Comments ({})", issue.comments.len()),
        Style::default().add_modifier(Modifier::BOLD),
      )));
      for comment in &issue.comments {
        lines.push(Line::from(vec![
          Span::styled(comment.author.clone(), Style::default().fg(Color::Cyan)),
          Span::styled(format!("  {}", comment.created), Style::default().fg(Color::DarkGray)),
        ]));
        for l in comment.body.lines() {
          lines.push(Line::raw(format!("  {l}")));
        }
        lines.push(Line::default());
      }
    }

    let body = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(body, chunks[0]);

    if let Some(compose) = &self.compose {
      let (title, buffer) = match compose {
        Compose::Comment(b) => (" Comment (Enter to post, Esc to cancel) ", b),
        Compose::Worklog(b) => (" Log work, e.g. 1h 30m (Enter to post, Esc to cancel) ", b),
      };
      let input = Paragraph::new(buffer.as_str()).block(
        Block::default()
          .title(title)
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::Yellow)),
      );
      frame.render_widget(input, chunks[1]);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compose_captures_text_and_submits_on_enter() {
    let mut view = DetailView::new("PROJ-1".into());
    view.handle(InputEvent::Char('c'));
    assert!(view.in_text_entry());

    for c in "looks good".chars() {
      view.handle(InputEvent::Char(c));
    }
    view.handle(InputEvent::Backspace);

    match view.handle(InputEvent::Enter) {
      ViewAction::SubmitComment { key, body } => {
        assert_eq!(key, "PROJ-1");
        assert_eq!(body, "looks goo");
      }
      other => panic!("expected SubmitComment, got {other:?}"),
    }
    assert!(!view.in_text_entry());
  }

  #[test]
  fn empty_compose_does_not_submit() {
    let mut view = DetailView::new("PROJ-1".into());
    view.handle(InputEvent::Char('t'));
    assert!(matches!(view.handle(InputEvent::Enter), ViewAction::None));
    assert!(view.in_text_entry());
  }

  #[test]
  fn esc_cancels_compose_before_leaving_view() {
    let mut view = DetailView::new("PROJ-1".into());
    view.handle(InputEvent::Char('c'));
    assert!(matches!(view.handle(InputEvent::Esc), ViewAction::None));
    assert!(!view.in_text_entry());
    assert!(matches!(view.handle(InputEvent::Esc), ViewAction::Back));
  }

  #[test]
  fn worklog_compose_submits_time_spent() {
    let mut view = DetailView::new("PROJ-2".into());
    view.handle(InputEvent::Char('t'));
    for c in "1h 30m".chars() {
      view.handle(InputEvent::Char(c));
    }
    match view.handle(InputEvent::Enter) {
      ViewAction::SubmitWorklog { key, time_spent } => {
        assert_eq!(key, "PROJ-2");
        assert_eq!(time_spent, "1h 30m");
      }
      other => panic!("expected SubmitWorklog, got {other:?}"),
    }
  }
}
