//! JQL filter entry with recent-filter history.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use crate::input::InputEvent;
use crate::ui::ViewAction;

pub struct FilterForm {
  pub input: String,
  history: Vec<String>,
  /// Index into `history` while browsing with Up/Down, `None` when typing.
  browse: Option<usize>,
}

impl FilterForm {
  pub fn new(history: Vec<String>) -> Self {
    Self {
      input: String::new(),
      history,
      browse: None,
    }
  }

  pub fn handle(&mut self, ev: InputEvent) -> ViewAction {
    match ev {
      InputEvent::Char(c) => {
        self.input.push(c);
        self.browse = None;
      }
      InputEvent::Backspace => {
        self.input.pop();
        self.browse = None;
      }
      InputEvent::Up => {
        if self.history.is_empty() {
          return ViewAction::None;
        }
        let next = match self.browse {
          None => 0,
          Some(i) => (i + 1).min(self.history.len() - 1),
        };
        self.browse = Some(next);
        self.input = self.history[next].clone();
      }
      InputEvent::Down => match self.browse {
        Some(0) | None => {
          self.browse = None;
          self.input.clear();
        }
        Some(i) => {
          self.browse = Some(i - 1);
          self.input = self.history[i - 1].clone();
        }
      },
      InputEvent::Enter => {
        let jql = self.input.trim().to_string();
        if !jql.is_empty() {
          return ViewAction::ApplyFilter(jql);
        }
      }
      InputEvent::Esc => return ViewAction::CloseOverlay,
      _ => {}
    }
    ViewAction::None
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let outer = Block::default()
      .title(" Filter by JQL (Enter to apply, Esc to cancel) ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(3), Constraint::Min(1)])
      .split(inner);

    frame.render_widget(
      Paragraph::new(self.input.as_str()).block(
        Block::default()
          .title(" JQL ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::Yellow)),
      ),
      chunks[0],
    );

    let items: Vec<ListItem> = self
      .history
      .iter()
      .enumerate()
      .map(|(i, jql)| {
        let mut item = ListItem::new(jql.as_str());
        if self.browse == Some(i) {
          item = item.style(Style::default().bg(Color::DarkGray));
        }
        item
      })
      .collect();
    frame.render_widget(
      List::new(items).block(
        Block::default()
          .title(" Recent (Up/Down) ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::DarkGray)),
      ),
      chunks[1],
    );
  }
}
