//! Top-level router: owns the active view, the overlay stack and the shared
//! fields views communicate through, dispatches input by priority, spawns
//! background tasks and merges their completions.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::config::Config;
use crate::event::{Event, TaskEvent};
use crate::input::InputEvent;
use crate::remote::types::Issue;
use crate::remote::IssueService;
use crate::selection::SelectionSet;
use crate::store::Store;
use crate::tasks;
use crate::ui::board::{self, BoardView};
use crate::ui::create::CreateForm;
use crate::ui::detail::DetailView;
use crate::ui::filter::FilterForm;
use crate::ui::issues::IssueListView;
use crate::ui::pickers::{ProjectPicker, TransitionPicker};
use crate::ui::search::SearchView;
use crate::ui::ViewAction;

const FLASH_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
  List,
  Board,
  Detail,
  Search,
}

/// One entry of the modal stack. Pickers and help capture every key;
/// forms are text-entry surfaces.
pub enum Overlay {
  Transitions(TransitionPicker),
  Projects(ProjectPicker),
  Create(CreateForm),
  Filter(FilterForm),
  Help,
}

pub struct App {
  service: Arc<dyn IssueService>,
  pub store: Arc<Store>,
  config: Config,
  events: UnboundedSender<Event>,

  pub view: ViewKind,
  view_stack: Vec<ViewKind>,
  pub overlays: Vec<Overlay>,

  pub issue_list: IssueListView,
  pub board: BoardView,
  pub detail: Option<DetailView>,
  pub search: SearchView,

  pub issues: Vec<Issue>,
  pub columns: [Vec<Issue>; 3],
  pub selection: SelectionSet,
  /// Keys matched by the last applied JQL filter, `None` when unfiltered.
  pub filter_keys: Option<Vec<String>>,
  pub project: Option<String>,

  flash: Option<(String, Instant)>,
  pub syncing: bool,
  last_periodic: Instant,
  pub should_quit: bool,
}

impl App {
  pub fn new(
    service: Arc<dyn IssueService>,
    store: Arc<Store>,
    config: Config,
    events: UnboundedSender<Event>,
  ) -> Self {
    let project = config.default_project.clone();
    let mut app = Self {
      service,
      store,
      config,
      events,
      view: ViewKind::List,
      view_stack: Vec::new(),
      overlays: Vec::new(),
      issue_list: IssueListView::new(),
      board: BoardView::new(),
      detail: None,
      search: SearchView::new(),
      issues: Vec::new(),
      columns: Default::default(),
      selection: SelectionSet::new(),
      filter_keys: None,
      project,
      flash: None,
      syncing: false,
      last_periodic: Instant::now(),
      should_quit: false,
    };
    app.load_from_cache();
    app
  }

  /// Rebuild the render-ready issue list and board columns from the store,
  /// honoring the project scope and any applied filter.
  pub fn load_from_cache(&mut self) {
    let mut issues = self.store.get_all_issues().unwrap_or_default();
    if let Some(project) = &self.project {
      issues.retain(|i| &i.project_key == project);
    }
    if let Some(keys) = &self.filter_keys {
      issues.retain(|i| keys.contains(&i.key));
    }
    self.columns = board::group(&issues);
    self.issues = issues;
  }

  pub fn flash_text(&self) -> Option<&str> {
    self.flash.as_ref().map(|(text, _)| text.as_str())
  }

  fn set_flash(&mut self, text: impl Into<String>) {
    self.flash = Some((text.into(), Instant::now()));
  }

  pub fn on_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.on_key(key),
      Event::Tick => self.on_tick(),
      Event::Task(task) => self.on_task(task),
    }
  }

  /// Input dispatch, in priority order: hard-quit, then the top of the
  /// modal stack, then text-entry mode, then global bindings, then the
  /// active view.
  pub fn on_key(&mut self, key: KeyEvent) {
    let ev = InputEvent::decode(key);
    if ev == InputEvent::HardQuit {
      self.should_quit = true;
      return;
    }

    if !self.overlays.is_empty() {
      self.handle_overlay(ev);
      return;
    }

    if self.in_text_entry() {
      let action = self.delegate(ev);
      self.apply_action(action);
      return;
    }

    match ev {
      InputEvent::Char('q') => self.should_quit = true,
      InputEvent::Char('?') => self.overlays.push(Overlay::Help),
      InputEvent::Char('r') => self.spawn_sync(),
      InputEvent::Char('/') => {
        self.view_stack.push(self.view);
        self.search = SearchView::new();
        self.view = ViewKind::Search;
      }
      InputEvent::Char('f') => {
        let history = self.store.recent_filters().unwrap_or_default();
        self.overlays.push(Overlay::Filter(FilterForm::new(history)));
      }
      InputEvent::Char('n') => match self.project.clone() {
        Some(project) => self.overlays.push(Overlay::Create(CreateForm::new(project))),
        None => self.set_flash("No project selected; press 'p' to pick one"),
      },
      InputEvent::Char('p') => {
        self.overlays.push(Overlay::Projects(ProjectPicker::new()));
        let service = self.service.clone();
        self.spawn(tasks::load_projects(service));
      }
      InputEvent::Char('o') => {
        if let Some(key) = self.cursor_key() {
          let url = self.config.browse_url(&key);
          if let Err(err) = open_in_browser(&url) {
            self.set_flash(format!("Could not open browser: {err}"));
          }
        }
      }
      InputEvent::Char('a') => self.assign_to_self(),
      InputEvent::Char(' ') => {
        if let Some(key) = self.cursor_key() {
          self.selection.toggle(&key);
        }
      }
      InputEvent::Esc => {
        if !self.selection.is_empty() {
          self.selection.clear();
        } else if self.filter_keys.is_some() && matches!(self.view, ViewKind::List | ViewKind::Board)
        {
          self.filter_keys = None;
          self.load_from_cache();
        } else {
          self.apply_action(ViewAction::Back);
        }
      }
      InputEvent::Tab => {
        self.view = match self.view {
          ViewKind::List => ViewKind::Board,
          ViewKind::Board => ViewKind::List,
          other => other,
        };
      }
      _ => {
        let action = self.delegate(ev);
        self.apply_action(action);
      }
    }
  }

  fn handle_overlay(&mut self, ev: InputEvent) {
    let action = match self.overlays.last_mut() {
      Some(Overlay::Help) => ViewAction::CloseOverlay,
      Some(Overlay::Transitions(picker)) => picker.handle(ev),
      Some(Overlay::Projects(picker)) => picker.handle(ev),
      Some(Overlay::Create(form)) => form.handle(ev),
      Some(Overlay::Filter(form)) => form.handle(ev),
      None => ViewAction::None,
    };
    self.apply_action(action);
  }

  /// Text-entry surfaces outside the overlay stack: the search view and an
  /// active compose field in the detail view.
  fn in_text_entry(&self) -> bool {
    match self.view {
      ViewKind::Search => true,
      ViewKind::Detail => self.detail.as_ref().is_some_and(|d| d.in_text_entry()),
      _ => false,
    }
  }

  fn delegate(&mut self, ev: InputEvent) -> ViewAction {
    match self.view {
      ViewKind::List => self.issue_list.handle(ev, &self.issues),
      ViewKind::Board => self.board.handle(ev, &self.columns),
      ViewKind::Detail => match &mut self.detail {
        Some(detail) => detail.handle(ev),
        None => ViewAction::None,
      },
      ViewKind::Search => self.search.handle(ev, &self.store),
    }
  }

  fn apply_action(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::OpenDetail(key) => {
        self.view_stack.push(self.view);
        self.detail = Some(DetailView::new(key));
        self.view = ViewKind::Detail;
      }
      ViewAction::OpenTransitions(keys) => {
        // A non-empty selection overrides the cursor target.
        let keys = if self.selection.is_empty() {
          keys
        } else {
          self.selection.keys()
        };
        let Some(first) = keys.first().cloned() else {
          return;
        };
        self.overlays.push(Overlay::Transitions(TransitionPicker::new(keys)));
        let service = self.service.clone();
        let store = self.store.clone();
        self.spawn(tasks::load_transitions(service, store, first));
      }
      ViewAction::SubmitComment { key, body } => {
        self.set_flash(format!("Posting comment on {key}..."));
        let service = self.service.clone();
        self.spawn(tasks::add_comment(service, key, body));
      }
      ViewAction::SubmitWorklog { key, time_spent } => {
        self.set_flash(format!("Logging work on {key}..."));
        let service = self.service.clone();
        self.spawn(tasks::log_work(service, key, time_spent));
      }
      ViewAction::SubmitCreate(fields) => {
        self.overlays.pop();
        self.set_flash(format!("Creating issue in {}...", fields.project));
        let service = self.service.clone();
        let board = self.config.default_board;
        self.spawn(tasks::create_issue(service, fields, board));
      }
      ViewAction::ApplyFilter(jql) => {
        self.overlays.pop();
        if let Err(err) = self.store.save_filter(&jql) {
          info!("failed to save filter history: {err}");
        }
        self.set_flash("Applying filter...");
        let service = self.service.clone();
        let store = self.store.clone();
        self.spawn(tasks::apply_filter(service, store, jql));
      }
      ViewAction::ApplyTransition { keys, transition_id } => {
        self.overlays.pop();
        self.set_flash(format!("Moving {} issue(s)...", keys.len()));
        let service = self.service.clone();
        self.spawn(tasks::apply_transition(service, keys, transition_id));
      }
      ViewAction::SwitchProject(project) => {
        self.overlays.pop();
        self.project = Some(project);
        self.filter_keys = None;
        self.selection.clear();
        self.load_from_cache();
        self.spawn_sync();
      }
      ViewAction::CloseOverlay => {
        self.overlays.pop();
      }
      ViewAction::Back => {
        if self.view == ViewKind::Detail {
          self.detail = None;
        }
        self.view = self.view_stack.pop().unwrap_or(ViewKind::List);
      }
    }
  }

  /// The issue key under the cursor of whatever view is active.
  fn cursor_key(&self) -> Option<String> {
    match self.view {
      ViewKind::List => self.issue_list.cursor_key(&self.issues),
      ViewKind::Board => self.board.cursor_key(&self.columns),
      ViewKind::Detail => self.detail.as_ref().map(|d| d.key.clone()),
      ViewKind::Search => self
        .search
        .results
        .get(self.search.viewport.cursor)
        .map(|i| i.key.clone()),
    }
  }

  fn assign_to_self(&mut self) {
    let Some(account_id) = self.config.account_id.clone() else {
      self.set_flash("Set account_id in config to assign issues");
      return;
    };
    let Some(key) = self.cursor_key() else {
      return;
    };
    self.set_flash(format!("Assigning {key}..."));
    let service = self.service.clone();
    self.spawn(tasks::assign(service, key, account_id));
  }

  fn on_tick(&mut self) {
    if let Some((_, since)) = &self.flash {
      if since.elapsed() >= FLASH_TTL {
        self.flash = None;
      }
    }
    if self.last_periodic.elapsed() >= Duration::from_secs(self.config.sync_interval_secs) {
      self.spawn_sync();
    }
  }

  fn on_task(&mut self, task: TaskEvent) {
    match task {
      TaskEvent::SyncDone(Ok(outcome)) => {
        self.syncing = false;
        self.load_from_cache();
        if outcome.failed > 0 {
          self.set_flash(format!(
            "Synced {} issues, {} failed",
            outcome.items_synced, outcome.failed
          ));
        } else {
          self.flash = None;
        }
      }
      TaskEvent::SyncDone(Err(err)) => {
        self.syncing = false;
        self.set_flash(format!("Sync failed: {err}"));
      }
      TaskEvent::TransitionsLoaded { transitions } => {
        if let Some(Overlay::Transitions(picker)) = self.overlays.last_mut() {
          picker.loaded(transitions);
        }
      }
      TaskEvent::MoveDone { moved, failed } => {
        // Cleared regardless of per-key outcomes.
        self.selection.clear();
        if failed > 0 {
          self.set_flash(format!("Moved {moved}, {failed} failed"));
        } else {
          self.set_flash(format!("Moved {moved} issue(s)"));
        }
        self.spawn_sync();
      }
      TaskEvent::AssignDone { key } => {
        self.set_flash(format!("Assigned {key}"));
        self.spawn_sync();
      }
      TaskEvent::CommentDone { key } => {
        self.set_flash(format!("Comment posted on {key}"));
        self.spawn_sync();
      }
      TaskEvent::WorkLogged { key } => {
        self.set_flash(format!("Work logged on {key}"));
        self.spawn_sync();
      }
      TaskEvent::IssueCreated { key } => {
        self.set_flash(format!("Created {key}"));
        self.spawn_sync();
      }
      TaskEvent::ProjectsLoaded(projects) => {
        if let Some(Overlay::Projects(picker)) = self.overlays.last_mut() {
          picker.loaded(projects);
        }
      }
      TaskEvent::FilterApplied { keys } => {
        self.set_flash(format!("Filter matched {} issue(s)", keys.len()));
        self.filter_keys = Some(keys);
        self.load_from_cache();
      }
      TaskEvent::Status(message) => self.set_flash(message),
    }
  }

  pub fn spawn_sync(&mut self) {
    self.syncing = true;
    self.last_periodic = Instant::now();
    let service = self.service.clone();
    let store = self.store.clone();
    let project = self.project.clone();
    let window = self.config.resolved_window_days;
    self.spawn(tasks::run_sync(service, store, project, window));
  }

  fn spawn(&self, task: impl Future<Output = TaskEvent> + Send + 'static) {
    let tx = self.events.clone();
    tokio::spawn(async move {
      let _ = tx.send(Event::Task(task.await));
    });
  }
}

fn open_in_browser(url: &str) -> std::io::Result<()> {
  #[cfg(target_os = "macos")]
  let opener = "open";
  #[cfg(not(target_os = "macos"))]
  let opener = "xdg-open";
  let mut child = std::process::Command::new(opener).arg(url).spawn()?;
  // Reap the opener off-thread so it never lingers as a zombie.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::JiraConfig;
  use crate::remote::fake::{sample_issue, Call, FakeService};
  use crate::remote::types::Transition;
  use crossterm::event::{KeyCode, KeyModifiers};
  use tokio::sync::mpsc;

  fn test_config() -> Config {
    Config {
      jira: JiraConfig {
        url: "https://example.atlassian.net".into(),
        email: "me@example.com".into(),
      },
      default_project: Some("PROJ".into()),
      account_id: Some("acct-1".into()),
      default_board: None,
      sync_interval_secs: 60,
      resolved_window_days: 14,
    }
  }

  fn test_app(service: Arc<FakeService>) -> (App, mpsc::UnboundedReceiver<Event>) {
    let store = Arc::new(Store::open_in_memory().unwrap());
    for n in 1..4 {
      store
        .upsert_issue(&sample_issue(
          &format!("PROJ-{n}"),
          "To Do",
          "2026-01-01T10:00:00.000+0000",
        ))
        .unwrap();
    }
    let (tx, rx) = mpsc::unbounded_channel();
    (App::new(service, store, test_config(), tx), rx)
  }

  fn press(app: &mut App, code: KeyCode) {
    app.on_key(KeyEvent::new(code, KeyModifiers::NONE));
  }

  /// Let spawned tasks run to completion, then merge their completion
  /// events into the app, as the real loop would.
  async fn pump(app: &mut App, rx: &mut mpsc::UnboundedReceiver<Event>) {
    for _ in 0..20 {
      tokio::task::yield_now().await;
    }
    while let Ok(event) = rx.try_recv() {
      app.on_event(event);
    }
  }

  #[tokio::test]
  async fn text_entry_swallows_global_sync_key() {
    let service = Arc::new(FakeService::new());
    let (mut app, mut rx) = test_app(service.clone());

    press(&mut app, KeyCode::Char('f'));
    press(&mut app, KeyCode::Char('r'));
    pump(&mut app, &mut rx).await;

    assert!(service.search_calls().is_empty(), "'r' must not reach the sync binding");
    match app.overlays.last() {
      Some(Overlay::Filter(form)) => assert_eq!(form.input, "r"),
      _ => panic!("filter form should still be open"),
    }
  }

  #[tokio::test]
  async fn modal_picker_captures_all_input() {
    let service = Arc::new(FakeService::new());
    let (mut app, mut rx) = test_app(service.clone());

    press(&mut app, KeyCode::Char('m'));
    pump(&mut app, &mut rx).await;
    assert!(matches!(app.overlays.last(), Some(Overlay::Transitions(_))));
    let calls_before = service.search_calls().len();

    press(&mut app, KeyCode::Char('r'));
    press(&mut app, KeyCode::Char('n'));
    pump(&mut app, &mut rx).await;

    assert_eq!(service.search_calls().len(), calls_before);
    assert_eq!(app.overlays.len(), 1, "picker keys must not open further overlays");
  }

  #[tokio::test]
  async fn hard_quit_wins_over_modal() {
    let service = Arc::new(FakeService::new());
    let (mut app, _rx) = test_app(service);

    press(&mut app, KeyCode::Char('m'));
    app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn bulk_transition_targets_selection_and_clears_it() {
    let service = Arc::new(FakeService::new());
    service.fail_move("PROJ-2");
    service.set_transitions(
      "PROJ-1",
      vec![Transition { id: "21".into(), name: "Close".into(), to_status: "Done".into() }],
    );
    let (mut app, mut rx) = test_app(service.clone());

    // Select all three rows.
    for _ in 0..3 {
      press(&mut app, KeyCode::Char(' '));
      press(&mut app, KeyCode::Down);
    }
    assert_eq!(app.selection.len(), 3);

    press(&mut app, KeyCode::Char('m'));
    pump(&mut app, &mut rx).await;
    press(&mut app, KeyCode::Enter);
    pump(&mut app, &mut rx).await;

    // One apply per selected key, the failing one not short-circuiting.
    let applied: Vec<_> = service
      .calls()
      .into_iter()
      .filter(|c| matches!(c, Call::ApplyTransition { .. }))
      .collect();
    assert_eq!(applied.len(), 3);

    assert!(app.selection.is_empty(), "selection clears regardless of outcome");
    assert!(app.syncing, "completion re-invokes the sync engine");
  }

  #[tokio::test]
  async fn mutation_completion_triggers_resync() {
    let service = Arc::new(FakeService::new());
    let (mut app, mut rx) = test_app(service.clone());

    app.on_task(TaskEvent::CommentDone { key: "PROJ-1".into() });
    pump(&mut app, &mut rx).await;

    assert_eq!(service.search_calls().len(), 1);
  }

  #[tokio::test]
  async fn filter_completion_scopes_views_to_matched_keys() {
    let service = Arc::new(FakeService::new());
    let (mut app, _rx) = test_app(service);
    assert_eq!(app.issues.len(), 3);

    app.on_task(TaskEvent::FilterApplied {
      keys: vec!["PROJ-2".into()],
    });
    assert_eq!(app.issues.len(), 1);
    assert_eq!(app.issues[0].key, "PROJ-2");

    // Esc drops the filter before anything else.
    press(&mut app, KeyCode::Esc);
    assert!(app.filter_keys.is_none());
    assert_eq!(app.issues.len(), 3);
  }

  #[tokio::test]
  async fn detail_compose_keeps_chars_out_of_global_bindings() {
    let service = Arc::new(FakeService::new());
    let (mut app, mut rx) = test_app(service.clone());
    let first_key = app.issues[0].key.clone();

    press(&mut app, KeyCode::Enter);
    assert_eq!(app.view, ViewKind::Detail);
    press(&mut app, KeyCode::Char('c'));
    press(&mut app, KeyCode::Char('q'));
    assert!(!app.should_quit, "'q' is text while composing");

    press(&mut app, KeyCode::Enter);
    pump(&mut app, &mut rx).await;
    assert!(service.calls().iter().any(|c| matches!(
      c,
      Call::AddComment { key, body } if key == &first_key && body == "q"
    )));
  }

  #[tokio::test]
  async fn tab_toggles_list_and_board() {
    let service = Arc::new(FakeService::new());
    let (mut app, _rx) = test_app(service);
    assert_eq!(app.view, ViewKind::List);
    press(&mut app, KeyCode::Tab);
    assert_eq!(app.view, ViewKind::Board);
    press(&mut app, KeyCode::Tab);
    assert_eq!(app.view, ViewKind::List);
  }

  #[tokio::test]
  async fn back_returns_along_the_view_stack() {
    let service = Arc::new(FakeService::new());
    let (mut app, _rx) = test_app(service);

    press(&mut app, KeyCode::Char('/'));
    assert_eq!(app.view, ViewKind::Search);
    for c in "PROJ-1".chars() {
      press(&mut app, KeyCode::Char(c));
    }
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.view, ViewKind::Detail);

    press(&mut app, KeyCode::Esc);
    assert_eq!(app.view, ViewKind::Search);
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.view, ViewKind::List);
  }
}
