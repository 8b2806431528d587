//! Modal pickers: status transitions and project switching.
//!
//! While a picker is open it captures every key; nothing falls through to
//! global bindings or the view underneath.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use crate::input::InputEvent;
use crate::remote::types::{Project, Transition};
use crate::ui::ViewAction;

/// Picker over the transitions shared by the targeted issue keys.
pub struct TransitionPicker {
  pub keys: Vec<String>,
  pub transitions: Vec<Transition>,
  pub loading: bool,
  cursor: usize,
}

impl TransitionPicker {
  pub fn new(keys: Vec<String>) -> Self {
    Self {
      keys,
      transitions: Vec::new(),
      loading: true,
      cursor: 0,
    }
  }

  pub fn loaded(&mut self, transitions: Vec<Transition>) {
    self.transitions = transitions;
    self.loading = false;
    self.cursor = 0;
  }

  pub fn handle(&mut self, ev: InputEvent) -> ViewAction {
    match ev {
      InputEvent::Up | InputEvent::Char('k') => self.cursor = self.cursor.saturating_sub(1),
      InputEvent::Down | InputEvent::Char('j') => {
        if self.cursor + 1 < self.transitions.len() {
          self.cursor += 1;
        }
      }
      InputEvent::Enter => {
        if let Some(t) = self.transitions.get(self.cursor) {
          return ViewAction::ApplyTransition {
            keys: self.keys.clone(),
            transition_id: t.id.clone(),
          };
        }
      }
      InputEvent::Esc | InputEvent::Char('q') => return ViewAction::CloseOverlay,
      _ => {}
    }
    ViewAction::None
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let title = if self.keys.len() == 1 {
      format!(" Move {} ", self.keys[0])
    } else {
      format!(" Move {} issues ", self.keys.len())
    };
    let block = Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));

    if self.loading {
      frame.render_widget(
        Paragraph::new("Loading transitions...")
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    }
    if self.transitions.is_empty() {
      frame.render_widget(
        Paragraph::new("No transitions available.")
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    }

    let items: Vec<ListItem> = self
      .transitions
      .iter()
      .enumerate()
      .map(|(i, t)| {
        let mut item = ListItem::new(format!("{} -> {}", t.name, t.to_status));
        if i == self.cursor {
          item = item.style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
        }
        item
      })
      .collect();
    frame.render_widget(List::new(items).block(block), area);
  }
}

/// Picker over the projects visible to the user.
pub struct ProjectPicker {
  pub projects: Vec<Project>,
  pub loading: bool,
  cursor: usize,
}

impl ProjectPicker {
  pub fn new() -> Self {
    Self {
      projects: Vec::new(),
      loading: true,
      cursor: 0,
    }
  }

  pub fn loaded(&mut self, projects: Vec<Project>) {
    self.projects = projects;
    self.loading = false;
    self.cursor = 0;
  }

  pub fn handle(&mut self, ev: InputEvent) -> ViewAction {
    match ev {
      InputEvent::Up | InputEvent::Char('k') => self.cursor = self.cursor.saturating_sub(1),
      InputEvent::Down | InputEvent::Char('j') => {
        if self.cursor + 1 < self.projects.len() {
          self.cursor += 1;
        }
      }
      InputEvent::Enter => {
        if let Some(p) = self.projects.get(self.cursor) {
          return ViewAction::SwitchProject(p.key.clone());
        }
      }
      InputEvent::Esc | InputEvent::Char('q') => return ViewAction::CloseOverlay,
      _ => {}
    }
    ViewAction::None
  }

  pub fn render(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Switch project ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow));

    if self.loading {
      frame.render_widget(
        Paragraph::new("Loading projects...")
          .block(block)
          .style(Style::default().fg(Color::DarkGray)),
        area,
      );
      return;
    }

    let items: Vec<ListItem> = self
      .projects
      .iter()
      .enumerate()
      .map(|(i, p)| {
        let mut item = ListItem::new(format!("{:<10} {}", p.key, p.name));
        if i == self.cursor {
          item = item.style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
        }
        item
      })
      .collect();
    frame.render_widget(List::new(items).block(block), area);
  }
}
