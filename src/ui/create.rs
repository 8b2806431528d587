//! Multi-field form for creating a new issue.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::input::InputEvent;
use crate::remote::types::NewIssue;
use crate::ui::ViewAction;

const ISSUE_TYPES: [&str; 3] = ["Task", "Bug", "Story"];
const PRIORITIES: [&str; 5] = ["Highest", "High", "Medium", "Low", "Lowest"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Summary,
  IssueType,
  Priority,
  Description,
}

const FIELDS: [Field; 4] = [Field::Summary, Field::IssueType, Field::Priority, Field::Description];

pub struct CreateForm {
  project: String,
  pub summary: String,
  pub description: String,
  type_idx: usize,
  priority_idx: usize,
  focus: usize,
  pub error: Option<String>,
}

impl CreateForm {
  pub fn new(project: String) -> Self {
    Self {
      project,
      summary: String::new(),
      description: String::new(),
      type_idx: 0,
      // Medium
      priority_idx: 2,
      focus: 0,
      error: None,
    }
  }

  pub fn issue_type(&self) -> &str {
    ISSUE_TYPES[self.type_idx]
  }

  pub fn priority(&self) -> &str {
    PRIORITIES[self.priority_idx]
  }

  pub fn handle(&mut self, ev: InputEvent) -> ViewAction {
    match ev {
      InputEvent::Tab => self.focus = (self.focus + 1) % FIELDS.len(),
      InputEvent::BackTab => self.focus = (self.focus + FIELDS.len() - 1) % FIELDS.len(),
      InputEvent::Esc => return ViewAction::CloseOverlay,
      InputEvent::Submit => {
        if self.summary.trim().is_empty() {
          self.error = Some("Summary is required".into());
          return ViewAction::None;
        }
        return ViewAction::SubmitCreate(NewIssue {
          project: self.project.clone(),
          summary: self.summary.trim().to_string(),
          issue_type: self.issue_type().to_string(),
          priority: self.priority().to_string(),
          description: self.description.clone(),
        });
      }
      InputEvent::Left => match FIELDS[self.focus] {
        Field::IssueType => self.type_idx = (self.type_idx + ISSUE_TYPES.len() - 1) % ISSUE_TYPES.len(),
        Field::Priority => {
          self.priority_idx = (self.priority_idx + PRIORITIES.len() - 1) % PRIORITIES.len()
        }
        _ => {}
      },
      InputEvent::Right => match FIELDS[self.focus] {
        Field::IssueType => self.type_idx = (self.type_idx + 1) % ISSUE_TYPES.len(),
        Field::Priority => self.priority_idx = (self.priority_idx + 1) % PRIORITIES.len(),
        _ => {}
      },
      InputEvent::Char(c) => match FIELDS[self.focus] {
        Field::Summary => {
          self.summary.push(c);
          self.error = None;
        }
        Field::Description => self.description.push(c),
        _ => {}
      },
      InputEvent::Backspace => match FIELDS[self.focus] {
        Field::Summary => {
          self.summary.pop();
        }
        Field::Description => {
          self.description.pop();
        }
        _ => {}
      },
      _ => {}
    }
    ViewAction::None
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let outer = Block::default()
      .title(format!(" New issue in {} (Ctrl-S to create, Esc to cancel) ", self.project))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(1),
      ])
      .split(inner);

    let field_block = |label: &str, focused: bool| {
      let color = if focused { Color::Yellow } else { Color::DarkGray };
      Block::default()
        .title(format!(" {label} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
    };

    frame.render_widget(
      Paragraph::new(self.summary.as_str())
        .block(field_block("Summary", FIELDS[self.focus] == Field::Summary)),
      chunks[0],
    );
    frame.render_widget(
      Paragraph::new(format!("< {} >", self.issue_type()))
        .block(field_block("Type", FIELDS[self.focus] == Field::IssueType)),
      chunks[1],
    );
    frame.render_widget(
      Paragraph::new(format!("< {} >", self.priority()))
        .block(field_block("Priority", FIELDS[self.focus] == Field::Priority)),
      chunks[2],
    );
    frame.render_widget(
      Paragraph::new(self.description.as_str())
        .block(field_block("Description", FIELDS[self.focus] == Field::Description)),
      chunks[3],
    );

    if let Some(error) = &self.error {
      frame.render_widget(
        Paragraph::new(error.as_str()).style(Style::default().fg(Color::Red)),
        chunks[4],
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn submit_requires_summary() {
    let mut form = CreateForm::new("PROJ".into());
    assert!(matches!(form.handle(InputEvent::Submit), ViewAction::None));
    assert!(form.error.is_some());
  }

  #[test]
  fn submit_collects_all_fields() {
    let mut form = CreateForm::new("PROJ".into());
    for c in "Fix the flaky test".chars() {
      form.handle(InputEvent::Char(c));
    }
    // Type field: Task -> Bug
    form.handle(InputEvent::Tab);
    form.handle(InputEvent::Right);
    // Priority field: Medium -> High
    form.handle(InputEvent::Tab);
    form.handle(InputEvent::Left);
    // Description
    form.handle(InputEvent::Tab);
    for c in "Seen on CI".chars() {
      form.handle(InputEvent::Char(c));
    }

    match form.handle(InputEvent::Submit) {
      ViewAction::SubmitCreate(fields) => {
        assert_eq!(fields.project, "PROJ");
        assert_eq!(fields.summary, "Fix the flaky test");
        assert_eq!(fields.issue_type, "Bug");
        assert_eq!(fields.priority, "High");
        assert_eq!(fields.description, "Seen on CI");
      }
      other => panic!("expected SubmitCreate, got {other:?}"),
    }
  }

  #[test]
  fn defaults_are_task_and_medium() {
    let form = CreateForm::new("PROJ".into());
    assert_eq!(form.issue_type(), "Task");
    assert_eq!(form.priority(), "Medium");
  }

  #[test]
  fn typed_text_is_never_a_command() {
    let mut form = CreateForm::new("PROJ".into());
    // 'q' and 'r' are global keys elsewhere; here they are just text.
    for c in "qr".chars() {
      assert!(matches!(form.handle(InputEvent::Char(c)), ViewAction::None));
    }
    assert_eq!(form.summary, "qr");
  }

  #[test]
  fn esc_cancels() {
    let mut form = CreateForm::new("PROJ".into());
    assert!(matches!(form.handle(InputEvent::Esc), ViewAction::CloseOverlay));
  }
}
