//! Key binding reference overlay.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

const BINDINGS: &[(&str, &str)] = &[
  ("j/k, arrows", "Move cursor"),
  ("h/l, arrows", "Switch board column"),
  ("Tab", "Toggle list/board"),
  ("Enter", "Open issue"),
  ("Space", "Toggle selection"),
  ("Esc", "Back / clear selection"),
  ("m", "Change status"),
  ("a", "Assign to me"),
  ("c", "Comment (in detail)"),
  ("t", "Log work (in detail)"),
  ("n", "New issue"),
  ("/", "Search cache"),
  ("f", "Filter by JQL"),
  ("p", "Switch project"),
  ("o", "Open in browser"),
  ("r", "Sync now"),
  ("?", "Toggle this help"),
  ("q", "Quit"),
];

pub fn render(frame: &mut Frame, area: Rect) {
  let lines: Vec<Line> = BINDINGS
    .iter()
    .map(|(key, what)| {
      Line::from(vec![
        Span::styled(format!("  {key:<14}"), Style::default().fg(Color::Cyan)),
        Span::raw(*what),
      ])
    })
    .collect();

  let help = Paragraph::new(lines).block(
    Block::default()
      .title(" Help ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow)),
  );
  frame.render_widget(help, area);
}
