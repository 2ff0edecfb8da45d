//! Console application state.
//!
//! [`ConsoleApp`] owns the tab [`Shell`], a keep-alive cache of page views
//! keyed by tab, and an outbox of remote [`Job`]s. The event loop executes
//! jobs on worker threads and feeds each [`JobResult`] back through
//! [`ConsoleApp::apply`], which routes it to the view that issued it.

use crate::api::{value_text, ApiMessage, CrudApi, FormData, PageResult};
use crate::config::Config;
use crate::error::Result;
use crate::keepalive::ViewCache;
use crate::location::{History, Location};
use crate::menu::{visible_entries, MenuEntry, ARTICLE_OPTION_ROUTE, ARTICLE_ROUTE, DASHBOARD_ROUTE};
use crate::pages::article::ARTICLE_PAGE;
use crate::pages::{
    DeleteRequest, DetailPage, ListPage, ListRequest, LoadRequest, SubmitRequest,
};
use crate::permissions::PermissionSet;
use crate::shell::{Shell, ShellOptions, LOADING_ROUTE};
use crate::store::Action;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

/// Terminal width below which the console switches to the phone layout.
pub const PHONE_WIDTH: u16 = 80;

// ============================================================================
// Remote jobs
// ============================================================================

/// A remote call issued by a view, tagged with the view's tab key.
#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    List { view: String, req: ListRequest },
    Delete { view: String, req: DeleteRequest },
    Load { view: String, req: LoadRequest },
    Submit { view: String, req: SubmitRequest },
}

impl Job {
    pub fn view(&self) -> &str {
        match self {
            Job::List { view, .. }
            | Job::Delete { view, .. }
            | Job::Load { view, .. }
            | Job::Submit { view, .. } => view,
        }
    }

    pub fn run<A: CrudApi + ?Sized>(self, api: &A) -> JobResult {
        match self {
            Job::List { view, req } => JobResult::List {
                view,
                token: req.token,
                result: req.send(api),
            },
            Job::Delete { view, req } => JobResult::Delete {
                view,
                token: req.token,
                result: req.send(api),
            },
            Job::Load { view, req } => JobResult::Load {
                view,
                token: req.token,
                result: req.send(api),
            },
            Job::Submit { view, req } => JobResult::Submit {
                view,
                token: req.token,
                result: req.send(api),
            },
        }
    }
}

#[derive(Debug)]
pub enum JobResult {
    List {
        view: String,
        token: u64,
        result: Result<PageResult>,
    },
    Delete {
        view: String,
        token: u64,
        result: Result<ApiMessage>,
    },
    Load {
        view: String,
        token: u64,
        result: Result<FormData>,
    },
    Submit {
        view: String,
        token: u64,
        result: Result<ApiMessage>,
    },
}

// ============================================================================
// Views
// ============================================================================

#[derive(Debug)]
pub struct ListView {
    pub page: ListPage,
    pub selected: usize,
}

impl ListView {
    fn selected_id(&self) -> Option<String> {
        self.page
            .rows()
            .get(self.selected)
            .and_then(|row| row.get("id"))
            .map(value_text)
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.page.rows().len().saturating_sub(1));
    }
}

#[derive(Debug)]
pub struct DetailView {
    pub page: DetailPage,
    pub field: usize,
}

impl DetailView {
    pub fn field_text(&self, name: &str) -> String {
        self.page.data().get(name).map(value_text).unwrap_or_default()
    }
}

/// A cached page view.
#[derive(Debug)]
pub enum View {
    Dashboard,
    List(ListView),
    Detail(DetailView),
    NotFound,
}

impl View {
    fn build(key: &str, permissions: &PermissionSet, page_size: u32) -> Self {
        let location = Location::parse(key);
        let path = location.path.clone();
        match path.as_str() {
            DASHBOARD_ROUTE => View::Dashboard,
            ARTICLE_ROUTE => View::List(ListView {
                page: ListPage::new(&ARTICLE_PAGE, permissions).with_page_size(page_size),
                selected: 0,
            }),
            ARTICLE_OPTION_ROUTE => View::Detail(DetailView {
                page: DetailPage::new(&ARTICLE_PAGE, location, permissions),
                field: 0,
            }),
            _ => View::NotFound,
        }
    }

    fn unmount(&mut self) {
        match self {
            View::List(v) => v.page.unmount(),
            View::Detail(v) => v.page.unmount(),
            View::Dashboard | View::NotFound => {}
        }
    }
}

// ============================================================================
// Input
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Content,
    Sidebar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
    /// A search field of a list view, by index into its `search_fields`.
    Filter(usize),
    /// A detail form field.
    Field(&'static str),
}

/// A line being edited, bound to the view it was started in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub view: String,
    pub target: InputTarget,
    pub buffer: String,
    /// Search values entered so far, including fields not being edited.
    pub draft: FormData,
}

impl Input {
    fn draft_text(&self, name: &str) -> String {
        self.draft.get(name).map(value_text).unwrap_or_default()
    }
}

// ============================================================================
// Application
// ============================================================================

pub struct ConsoleApp {
    shell: Shell<History>,
    views: ViewCache<View>,
    jobs: Vec<Job>,
    page_size: u32,
    api_base: String,
    focus: Focus,
    sidebar_index: usize,
    input: Option<Input>,
    last_active: String,
    should_quit: bool,
}

impl ConsoleApp {
    pub fn new(config: &Config) -> Self {
        let options = ShellOptions {
            home: config.home_route.clone(),
            refresh_delay: config.refresh_delay(),
        };
        let mut shell = Shell::new(History::new(&config.home_route), options);
        shell.set_permissions(PermissionSet::new(config.permissions.iter().cloned()));

        let mut app = Self {
            shell,
            views: ViewCache::new(),
            jobs: Vec::new(),
            page_size: config.page_size,
            api_base: config.api_base_url.clone(),
            focus: Focus::Content,
            sidebar_index: 0,
            input: None,
            last_active: String::new(),
            should_quit: false,
        };
        app.reconcile();
        app
    }

    pub fn shell(&self) -> &Shell<History> {
        &self.shell
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn input(&self) -> Option<&Input> {
        self.input.as_ref()
    }

    pub fn sidebar_index(&self) -> usize {
        self.sidebar_index
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// The view of the active tab, if one is built.
    pub fn active_view(&self) -> Option<&View> {
        self.views.get(self.shell.active_key())
    }

    pub fn is_loading_route(&self) -> bool {
        self.shell.location().path == LOADING_ROUTE
    }

    pub fn cached_views(&self) -> usize {
        self.views.len()
    }

    pub fn sidebar_entries(&self) -> Vec<MenuEntry> {
        visible_entries(self.shell.menus(), self.shell.permissions())
    }

    /// Whether the sidebar takes screen space.
    pub fn sidebar_visible(&self) -> bool {
        let state = self.shell.state();
        !(state.tabs.is_maximize || state.menu.is_collapsed || state.menu.is_phone)
    }

    /// Jobs issued since the last call.
    pub fn take_jobs(&mut self) -> Vec<Job> {
        std::mem::take(&mut self.jobs)
    }

    pub fn set_viewport_width(&mut self, width: u16) {
        let phone = width < PHONE_WIDTH;
        if phone != self.shell.state().menu.is_phone {
            self.shell.store_mut().dispatch(Action::SetPhone(phone));
            if phone && self.focus == Focus::Sidebar {
                self.focus = Focus::Content;
            }
        }
    }

    /// Advance timers; finishes a due refresh.
    pub fn tick(&mut self, now: Instant) {
        if self.shell.tick(now) {
            self.reconcile();
        }
    }

    /// Bring the view cache in line with the tab list and mount the active
    /// tab's view if it is not cached.
    fn reconcile(&mut self) {
        for key in self.shell.take_discarded() {
            if let Some(mut view) = self.views.invalidate(&key) {
                view.unmount();
            }
        }
        let open: Vec<String> = self.shell.tabs().iter().map(|t| t.key.clone()).collect();
        for mut view in self.views.retain_keys(open.iter().map(String::as_str)) {
            view.unmount();
        }

        let active = self.shell.active_key().to_string();
        if active != self.last_active {
            let path = Location::parse(&active).path;
            if path != LOADING_ROUTE {
                self.shell.expand_menu_for(&path);
            }
            if let Some(input) = &self.input {
                if input.view != active {
                    self.input = None;
                }
            }
            self.last_active = active.clone();
        }
        if !self.shell.state().tabs.contains(&active) {
            return;
        }

        let permissions = self.shell.permissions().clone();
        let (view, built) = self
            .views
            .get_or_build(&active, || View::build(&active, &permissions, self.page_size));
        if !built {
            return;
        }
        match view {
            View::List(v) => {
                if let Some(req) = v.page.mount() {
                    self.jobs.push(Job::List { view: active, req });
                }
            }
            View::Detail(v) => {
                if let Some(req) = v.page.mount(&mut self.shell) {
                    self.jobs.push(Job::Load { view: active, req });
                }
            }
            View::Dashboard | View::NotFound => {}
        }
    }

    /// Route a finished job to the view that issued it. Results for views
    /// that were closed or rebuilt meanwhile are dropped.
    pub fn apply(&mut self, result: JobResult) {
        match result {
            JobResult::List {
                view,
                token,
                result,
            } => match self.views.get_mut(&view) {
                Some(View::List(v)) => {
                    v.page.apply_list(token, result, self.shell.notices_mut());
                    v.clamp_selection();
                }
                _ => debug!(view = %view, "list result for a closed view dropped"),
            },
            JobResult::Delete {
                view,
                token,
                result,
            } => match self.views.get_mut(&view) {
                Some(View::List(v)) => {
                    if let Some(req) = v.page.apply_delete(token, result, self.shell.notices_mut()) {
                        self.jobs.push(Job::List {
                            view: view.clone(),
                            req,
                        });
                    }
                }
                _ => debug!(view = %view, "delete result for a closed view dropped"),
            },
            JobResult::Load {
                view,
                token,
                result,
            } => match self.views.get_mut(&view) {
                Some(View::Detail(v)) => {
                    v.page.apply_load(token, result, self.shell.notices_mut());
                }
                _ => debug!(view = %view, "load result for a closed view dropped"),
            },
            JobResult::Submit {
                view,
                token,
                result,
            } => match self.views.get_mut(&view) {
                Some(View::Detail(v)) => {
                    v.page.apply_submit(token, result, &mut self.shell);
                }
                _ => debug!(view = %view, "submit result for a closed view dropped"),
            },
        }
        self.reconcile();
    }

    // ========================================================================
    // Keys
    // ========================================================================

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.input.is_some() {
            self.handle_input_key(key.code);
        } else if self.focus == Focus::Sidebar {
            self.handle_sidebar_key(key.code);
        } else if ctrl {
            self.handle_view_ctrl_key(key.code);
        } else if !self.handle_shell_key(key.code, now) {
            self.handle_view_key(key.code);
        }
        self.reconcile();
    }

    /// Keys that act on the tab session. Returns false when unhandled.
    fn handle_shell_key(&mut self, code: KeyCode, now: Instant) -> bool {
        let active = self.shell.active_key().to_string();
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.cycle_tab(true),
            KeyCode::BackTab => self.cycle_tab(false),
            KeyCode::Char('w') => self.shell.close_tab(&active),
            KeyCode::Char('o') => self.shell.close_other_tabs(&active),
            KeyCode::Char('<') => self.shell.close_left_tabs(&active),
            KeyCode::Char('>') => self.shell.close_right_tabs(&active),
            KeyCode::Char('X') => self.shell.close_all_tabs(),
            KeyCode::Char('r') => {
                self.shell.refresh(None, now);
            }
            KeyCode::Char('m') => self.shell.toggle_maximize(),
            KeyCode::Char('b') => self.shell.toggle_collapsed(),
            KeyCode::Char('s') if self.sidebar_visible() => self.focus = Focus::Sidebar,
            _ => return false,
        }
        true
    }

    fn cycle_tab(&mut self, forward: bool) {
        let tabs = self.shell.tabs();
        if tabs.is_empty() {
            return;
        }
        let len = tabs.len();
        let current = self
            .shell
            .state()
            .tabs
            .position(self.shell.active_key())
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else {
            (current + len - 1) % len
        };
        let key = tabs[next].key.clone();
        self.shell.navigate(&key);
    }

    fn handle_sidebar_key(&mut self, code: KeyCode) {
        let entries = self.sidebar_entries();
        match code {
            KeyCode::Up => self.sidebar_index = self.sidebar_index.saturating_sub(1),
            KeyCode::Down => {
                if self.sidebar_index + 1 < entries.len() {
                    self.sidebar_index += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(entry) = entries.get(self.sidebar_index).filter(|e| !e.is_group) {
                    self.shell.navigate(entry.key);
                    self.focus = Focus::Content;
                }
            }
            KeyCode::Esc | KeyCode::Char('s') => self.focus = Focus::Content,
            KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_view_key(&mut self, code: KeyCode) {
        let key = self.shell.active_key().to_string();
        match self.views.get_mut(&key) {
            Some(View::List(v)) => match code {
                KeyCode::Up => v.selected = v.selected.saturating_sub(1),
                KeyCode::Down => {
                    if v.selected + 1 < v.page.rows().len() {
                        v.selected += 1;
                    }
                }
                KeyCode::Char('n') => {
                    v.page.on_create(&mut self.shell);
                }
                KeyCode::Char('e') => {
                    if let Some(id) = v.selected_id() {
                        v.page.on_update(&mut self.shell, &id);
                    }
                }
                KeyCode::Char('d') => {
                    if let Some(req) = v.selected_id().and_then(|id| v.page.delete(&id)) {
                        self.jobs.push(Job::Delete { view: key, req });
                    }
                }
                KeyCode::Char('[') if v.page.page() > 1 => {
                    let (page, size) = (v.page.page() - 1, v.page.page_size());
                    if let Some(req) = v.page.change_page(page, size) {
                        self.jobs.push(Job::List { view: key, req });
                    }
                }
                KeyCode::Char(']') if v.page.page() < v.page.page_count() => {
                    let (page, size) = (v.page.page() + 1, v.page.page_size());
                    if let Some(req) = v.page.change_page(page, size) {
                        self.jobs.push(Job::List { view: key, req });
                    }
                }
                KeyCode::Char('g') => {
                    if let Some(req) = v.page.reload() {
                        self.jobs.push(Job::List { view: key, req });
                    }
                }
                KeyCode::Char('/') if v.page.permission().page => {
                    let fields = v.page.def().search_fields;
                    let Some(first) = fields.first() else {
                        return;
                    };
                    let draft: FormData = v
                        .page
                        .filters()
                        .iter()
                        .filter(|(k, _)| fields.iter().any(|f| f.name == k.as_str()))
                        .map(|(k, val)| (k.clone(), val.clone()))
                        .collect();
                    let mut input = Input {
                        view: key,
                        target: InputTarget::Filter(0),
                        buffer: String::new(),
                        draft,
                    };
                    input.buffer = input.draft_text(first.name);
                    self.input = Some(input);
                }
                _ => {}
            },
            Some(View::Detail(v)) => {
                let fields = v.page.def().form_fields;
                match code {
                    KeyCode::Up => v.field = v.field.saturating_sub(1),
                    KeyCode::Down => {
                        if v.field + 1 < fields.len() {
                            v.field += 1;
                        }
                    }
                    KeyCode::Enter if v.page.is_allowed() && !v.page.is_loading() => {
                        if let Some(field) = fields.get(v.field) {
                            self.input = Some(Input {
                                view: key,
                                target: InputTarget::Field(field.name),
                                buffer: v.field_text(field.name),
                                draft: FormData::new(),
                            });
                        }
                    }
                    KeyCode::Esc => v.page.go_back(&mut self.shell),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn handle_view_ctrl_key(&mut self, code: KeyCode) {
        let key = self.shell.active_key().to_string();
        if let Some(View::Detail(v)) = self.views.get_mut(&key) {
            match code {
                KeyCode::Char('s') => {
                    if let Some(req) = v.page.submit(self.shell.notices_mut()) {
                        self.jobs.push(Job::Submit { view: key, req });
                    }
                }
                KeyCode::Char('r') => v.page.reset(),
                _ => {}
            }
        }
    }

    fn handle_input_key(&mut self, code: KeyCode) {
        if code == KeyCode::Tab {
            self.next_search_field();
            return;
        }
        let Some(input) = self.input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Char(c) => input.buffer.push(c),
            KeyCode::Backspace => {
                input.buffer.pop();
            }
            KeyCode::Esc => self.input = None,
            KeyCode::Enter => {
                if let Some(input) = self.input.take() {
                    self.commit_input(input);
                }
            }
            _ => {}
        }
    }

    /// Move a search input to the next search field, keeping what was typed.
    fn next_search_field(&mut self) {
        let Some(input) = self.input.as_mut() else {
            return;
        };
        let InputTarget::Filter(index) = input.target else {
            return;
        };
        let Some(View::List(v)) = self.views.get(&input.view) else {
            return;
        };
        let fields = v.page.def().search_fields;
        if let Some(current) = fields.get(index) {
            let text = std::mem::take(&mut input.buffer);
            input
                .draft
                .insert(current.name.to_string(), Value::String(text));
        }
        let next = (index + 1) % fields.len().max(1);
        input.target = InputTarget::Filter(next);
        if let Some(field) = fields.get(next) {
            input.buffer = input.draft_text(field.name);
        }
    }

    fn commit_input(&mut self, input: Input) {
        match (self.views.get_mut(&input.view), input.target) {
            (Some(View::List(v)), InputTarget::Filter(index)) => {
                let fields = v.page.def().search_fields;
                let mut draft = input.draft;
                if let Some(field) = fields.get(index) {
                    draft.insert(field.name.to_string(), Value::String(input.buffer));
                }
                let values: FormData = fields
                    .iter()
                    .filter_map(|f| {
                        let text = draft.get(f.name).map(value_text)?;
                        let text = text.trim();
                        (!text.is_empty())
                            .then(|| (f.name.to_string(), Value::String(text.to_string())))
                    })
                    .collect();
                if let Some(req) = v.page.search(values) {
                    v.selected = 0;
                    self.jobs.push(Job::List {
                        view: input.view,
                        req,
                    });
                }
            }
            (Some(View::Detail(v)), InputTarget::Field(name)) => {
                v.page.set_field(name, input.buffer);
            }
            _ => debug!(view = %input.view, "input target gone; edit discarded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{full_permissions, FakeArticleApi};
    use std::time::Duration;

    fn config() -> Config {
        Config {
            permissions: full_permissions()
                .sorted()
                .into_iter()
                .map(str::to_string)
                .collect(),
            ..Default::default()
        }
    }

    fn press(app: &mut ConsoleApp, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE), Instant::now());
    }

    fn ctrl(app: &mut ConsoleApp, c: char) {
        app.handle_key(
            KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL),
            Instant::now(),
        );
    }

    fn type_text(app: &mut ConsoleApp, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    /// Run every queued job against `api` until none remain.
    fn pump(app: &mut ConsoleApp, api: &FakeArticleApi) {
        loop {
            let jobs = app.take_jobs();
            if jobs.is_empty() {
                break;
            }
            for job in jobs {
                let result = job.run(api);
                app.apply(result);
            }
        }
    }

    fn open_article_list(api: &FakeArticleApi) -> ConsoleApp {
        let mut app = ConsoleApp::new(&config());
        app.shell.navigate(ARTICLE_ROUTE);
        app.reconcile();
        pump(&mut app, api);
        app
    }

    fn list_view(app: &ConsoleApp) -> &ListView {
        match app.active_view() {
            Some(View::List(v)) => v,
            other => panic!("expected list view, got {:?}", other),
        }
    }

    #[test]
    fn test_new_app_opens_home_tab() {
        let mut app = ConsoleApp::new(&config());
        assert_eq!(app.shell().active_key(), DASHBOARD_ROUTE);
        assert_eq!(app.shell().tabs().len(), 1);
        assert!(matches!(app.active_view(), Some(View::Dashboard)));
        assert!(app.take_jobs().is_empty());
    }

    #[test]
    fn test_without_permissions_no_tab_or_view() {
        let mut app = ConsoleApp::new(&Config::default());
        assert!(app.shell().tabs().is_empty());
        assert!(app.active_view().is_none());
        assert!(app.take_jobs().is_empty());
    }

    #[test]
    fn test_sidebar_navigation_mounts_list() {
        let api = FakeArticleApi::with_rows(25);
        let mut app = ConsoleApp::new(&config());
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.focus(), Focus::Sidebar);

        let target = app
            .sidebar_entries()
            .iter()
            .position(|e| e.key == ARTICLE_ROUTE)
            .unwrap();
        for _ in 0..target {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.focus(), Focus::Content);
        assert_eq!(app.shell().active_key(), ARTICLE_ROUTE);

        pump(&mut app, &api);
        let view = list_view(&app);
        assert_eq!(view.page.rows().len(), 20);
        assert_eq!(view.page.total(), 25);
        assert_eq!(api.list_calls().len(), 1);
    }

    #[test]
    fn test_tab_switch_keeps_view_alive() {
        let api = FakeArticleApi::with_rows(25);
        let mut app = open_article_list(&api);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.shell().active_key(), DASHBOARD_ROUTE);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.shell().active_key(), ARTICLE_ROUTE);
        pump(&mut app, &api);
        assert_eq!(api.list_calls().len(), 1);
        assert_eq!(app.cached_views(), 2);
    }

    #[test]
    fn test_paging_and_filter() {
        let api = FakeArticleApi::with_rows(45);
        let mut app = open_article_list(&api);

        press(&mut app, KeyCode::Char(']'));
        pump(&mut app, &api);
        assert_eq!(list_view(&app).page.page(), 2);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "文章 4");
        press(&mut app, KeyCode::Enter);
        assert!(app.input().is_none());
        pump(&mut app, &api);

        let last = api.list_calls().pop().unwrap();
        assert_eq!(last["title"], "文章 4");
        assert_eq!(last["page"], 1);
        // 4, 40..45
        assert_eq!(list_view(&app).page.total(), 7);
    }

    #[test]
    fn test_search_covers_every_search_field() {
        let api = FakeArticleApi::with_rows(12);
        let mut app = open_article_list(&api);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "文章 1");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.shell().active_key(), ARTICLE_ROUTE);
        type_text(&mut app, "nobody");
        press(&mut app, KeyCode::Enter);
        pump(&mut app, &api);

        let last = api.list_calls().pop().unwrap();
        assert_eq!(last["title"], "文章 1");
        assert_eq!(last["author"], "nobody");
        assert_eq!(list_view(&app).page.total(), 0);

        // Reopening starts from the applied filters; Tab wraps back to title.
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input().unwrap().buffer, "文章 1");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.input().unwrap().buffer, "nobody");
        for _ in 0.."nobody".chars().count() {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "admin");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.input().unwrap().buffer, "文章 1");
        press(&mut app, KeyCode::Enter);
        pump(&mut app, &api);

        let last = api.list_calls().pop().unwrap();
        assert_eq!(last["author"], "admin");
        // 1, 10..12
        assert_eq!(list_view(&app).page.total(), 4);
    }

    #[test]
    fn test_delete_selected_row_refetches() {
        let api = FakeArticleApi::with_rows(3);
        let mut app = open_article_list(&api);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('d'));
        pump(&mut app, &api);

        assert_eq!(api.deleted(), vec!["2"]);
        assert_eq!(list_view(&app).page.total(), 2);
        assert_eq!(app.shell().notices().latest().unwrap().content, "删除成功");
    }

    #[test]
    fn test_create_flow_returns_to_refetched_list() {
        let api = FakeArticleApi::with_rows(2);
        let mut app = open_article_list(&api);

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.shell().active_key(), ARTICLE_OPTION_ROUTE);
        assert!(matches!(app.active_view(), Some(View::Detail(_))));

        // First field is the title.
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "Hello");
        press(&mut app, KeyCode::Enter);
        ctrl(&mut app, 's');
        pump(&mut app, &api);

        assert_eq!(api.created()[0]["title"], "Hello");
        assert_eq!(app.shell().active_key(), ARTICLE_ROUTE);
        assert!(!app.shell().tabs().iter().any(|t| t.key == ARTICLE_OPTION_ROUTE));
        assert_eq!(api.list_calls().len(), 2);
        assert_eq!(list_view(&app).page.total(), 3);
    }

    #[test]
    fn test_edit_flow_loads_record() {
        let api = FakeArticleApi::with_rows(2);
        let mut app = open_article_list(&api);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('e'));
        pump(&mut app, &api);

        assert_eq!(app.shell().active_key(), "/content/article/option?id=2");
        assert_eq!(api.get_calls(), vec!["2"]);
        match app.active_view() {
            Some(View::Detail(v)) => assert_eq!(v.field_text("title"), "文章 2"),
            other => panic!("expected detail view, got {:?}", other),
        }

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.shell().active_key(), ARTICLE_ROUTE);
    }

    #[test]
    fn test_refresh_cycles_through_loading() {
        let api = FakeArticleApi::with_rows(5);
        let mut app = open_article_list(&api);
        let start = Instant::now();

        app.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE), start);
        assert!(app.is_loading_route());
        assert!(app.shell().is_refreshing());
        assert!(app.active_view().is_none());

        app.tick(start + Duration::from_millis(500));
        assert!(app.is_loading_route());

        app.tick(start + Duration::from_millis(1000));
        assert_eq!(app.shell().active_key(), ARTICLE_ROUTE);
        assert_eq!(app.shell().notices().latest().unwrap().content, "刷新成功");
        pump(&mut app, &api);
        assert_eq!(api.list_calls().len(), 2);
    }

    #[test]
    fn test_result_for_closed_view_is_dropped() {
        let api = FakeArticleApi::with_rows(5);
        let mut app = ConsoleApp::new(&config());
        app.shell.navigate(ARTICLE_ROUTE);
        app.reconcile();
        let jobs = app.take_jobs();
        assert_eq!(jobs.len(), 1);

        press(&mut app, KeyCode::Char('w'));
        assert_eq!(app.shell().active_key(), DASHBOARD_ROUTE);
        assert_eq!(app.cached_views(), 1);

        for job in jobs {
            app.apply(job.run(&api));
        }
        assert!(app.views.get(ARTICLE_ROUTE).is_none());
    }

    #[test]
    fn test_stale_result_after_refresh_rebuild_is_ignored() {
        let api = FakeArticleApi::with_rows(5);
        let mut app = ConsoleApp::new(&config());
        app.shell.navigate(ARTICLE_ROUTE);
        app.reconcile();
        let stale = app.take_jobs();

        let start = Instant::now();
        app.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE), start);
        app.tick(start + Duration::from_secs(2));
        let fresh = app.take_jobs();
        assert_eq!(fresh.len(), 1);

        for job in stale {
            app.apply(job.run(&api));
        }
        assert!(list_view(&app).page.is_loading());
        for job in fresh {
            app.apply(job.run(&api));
        }
        assert!(!list_view(&app).page.is_loading());
    }

    #[test]
    fn test_close_keys() {
        let api = FakeArticleApi::with_rows(1);
        let mut app = open_article_list(&api);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.shell().tabs().len(), 3);

        press(&mut app, KeyCode::Char('<'));
        assert_eq!(app.shell().tabs().len(), 1);
        assert_eq!(app.cached_views(), 1);

        press(&mut app, KeyCode::Char('X'));
        assert_eq!(app.shell().active_key(), DASHBOARD_ROUTE);
    }

    #[test]
    fn test_chrome_toggles_and_phone_layout() {
        let mut app = ConsoleApp::new(&config());
        assert!(app.sidebar_visible());
        press(&mut app, KeyCode::Char('m'));
        assert!(!app.sidebar_visible());
        press(&mut app, KeyCode::Char('m'));
        press(&mut app, KeyCode::Char('b'));
        assert!(!app.sidebar_visible());
        press(&mut app, KeyCode::Char('b'));

        app.set_viewport_width(60);
        assert!(app.shell().state().menu.is_phone);
        assert!(!app.sidebar_visible());
        app.set_viewport_width(120);
        assert!(app.sidebar_visible());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = ConsoleApp::new(&config());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());

        let mut app = ConsoleApp::new(&config());
        ctrl(&mut app, 'c');
        assert!(app.should_quit());
    }
}
