//! Rendering and the shared view-support pieces.

pub mod board;
pub mod create;
pub mod detail;
pub mod filter;
pub mod help;
pub mod issues;
pub mod pickers;
pub mod scroll;
pub mod search;

use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

use crate::app::{App, Overlay, ViewKind};
use crate::remote::types::NewIssue;

/// What a view asks the router to do after handling an event.
#[derive(Debug)]
pub enum ViewAction {
  None,
  OpenDetail(String),
  OpenTransitions(Vec<String>),
  SubmitComment { key: String, body: String },
  SubmitWorklog { key: String, time_spent: String },
  SubmitCreate(NewIssue),
  ApplyFilter(String),
  ApplyTransition { keys: Vec<String>, transition_id: String },
  SwitchProject(String),
  CloseOverlay,
  Back,
}

/// Truncate a string to a maximum width, adding "..." if truncated.
/// The result never exceeds `max_len`, even below ellipsis width.
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else if max_len <= 3 {
    s.chars().take(max_len).collect()
  } else {
    let cut: String = s.chars().take(max_len - 3).collect();
    format!("{cut}...")
  }
}

/// Display color for an issue status, following board classification.
pub fn status_color(status: &str) -> Color {
  match board::classify(status) {
    board::Column::Done => Color::Green,
    board::Column::InProgress => Color::Yellow,
    board::Column::Todo => Color::White,
  }
}

/// A centered rectangle taking the given percentage of the area.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
  let vertical = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Percentage((100 - percent_y) / 2),
      Constraint::Percentage(percent_y),
      Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);
  Layout::default()
    .direction(Direction::Horizontal)
    .constraints([
      Constraint::Percentage((100 - percent_x) / 2),
      Constraint::Percentage(percent_x),
      Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(vertical[1])[1]
}

pub fn draw(app: &mut App, frame: &mut Frame) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)])
    .split(frame.area());

  render_header(app, frame, chunks[0]);

  match app.view {
    ViewKind::List => {
      let title = match &app.project {
        Some(p) => format!("Issues [{p}]"),
        None => "Issues".to_string(),
      };
      app
        .issue_list
        .render(frame, chunks[1], &app.issues, &app.selection, &title);
    }
    ViewKind::Board => app.board.render(frame, chunks[1], &app.columns, &app.selection),
    ViewKind::Detail => {
      if let Some(detail) = &mut app.detail {
        let issue = app.store.get_issue(&detail.key).ok().flatten();
        detail.render(frame, chunks[1], issue.as_ref());
      }
    }
    ViewKind::Search => app.search.render(frame, chunks[1]),
  }

  render_status(app, frame, chunks[2]);

  for overlay in &mut app.overlays {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);
    match overlay {
      Overlay::Transitions(picker) => picker.render(frame, area),
      Overlay::Projects(picker) => picker.render(frame, area),
      Overlay::Create(form) => form.render(frame, area),
      Overlay::Filter(form) => form.render(frame, area),
      Overlay::Help => help::render(frame, area),
    }
  }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
  let view = match app.view {
    ViewKind::List => "List",
    ViewKind::Board => "Board",
    ViewKind::Detail => "Detail",
    ViewKind::Search => "Search",
  };
  let mut spans = vec![
    Span::styled(" densha ", Style::default().fg(Color::Black).bg(Color::Blue)),
    Span::raw(format!(" {view}")),
  ];
  if let Some(project) = &app.project {
    spans.push(Span::styled(format!("  {project}"), Style::default().fg(Color::Cyan)));
  }
  if app.filter_keys.is_some() {
    spans.push(Span::styled("  [filtered]", Style::default().fg(Color::Magenta)));
  }
  if !app.selection.is_empty() {
    spans.push(Span::styled(
      format!("  {} selected", app.selection.len()),
      Style::default().fg(Color::Yellow),
    ));
  }
  frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
  let text = if let Some(flash) = app.flash_text() {
    flash.to_string()
  } else if app.syncing {
    "Syncing...".to_string()
  } else {
    match app.store.last_sync().ok().flatten() {
      Some(ts) => format!("Last sync {}  ('?' for help)", ts.format("%H:%M:%S")),
      None => "Not synced yet  ('?' for help)".to_string(),
    }
  };
  frame.render_widget(
    Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
    area,
  );
}
