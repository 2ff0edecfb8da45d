//! Application-state container.
//!
//! All session state (tabs, permissions, sidebar menu) lives in one
//! [`AppState`] owned by a [`Store`]. The only way to change it is
//! [`Store::dispatch`]; every dispatch settles before the next one starts and
//! subscribers are notified after each settled update.

pub mod tabs;

pub use tabs::{Tab, TabsState};

use crate::permissions::PermissionSet;
use std::fmt;

/// The signed-in user's session data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserState {
    pub permissions: PermissionSet,
}

/// Sidebar menu state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuState {
    /// Keys of expanded groups.
    pub open_keys: Vec<String>,
    /// Key of the highlighted entry.
    pub selected_key: String,
    pub is_collapsed: bool,
    /// Narrow layout; the sidebar is drawn as an overlay and never auto-expands.
    pub is_phone: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub tabs: TabsState,
    pub user: UserState,
    pub menu: MenuState,
}

impl AppState {
    pub fn new(home: impl Into<String>) -> Self {
        Self {
            tabs: TabsState::new(home),
            user: UserState::default(),
            menu: MenuState::default(),
        }
    }
}

/// Every state transition the console performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetActiveKey(String),
    SetNav(Vec<String>),
    AddTab(Tab),
    CloseTab(String),
    CloseTabGoNext { key: String, next_path: String },
    CloseOtherTabs(String),
    CloseLeftTabs(String),
    CloseRightTabs(String),
    CloseAllTabs,
    ToggleLock(bool),
    ToggleMaximize(bool),
    SetPermissions(PermissionSet),
    SetOpenKeys(Vec<String>),
    SetSelectedKey(String),
    ToggleCollapsed(bool),
    SetPhone(bool),
}

fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::SetActiveKey(key) => state.tabs.active_key = key,
        Action::SetNav(nav) => state.tabs.nav = nav,
        Action::AddTab(tab) => {
            state.tabs.add(tab);
        }
        Action::CloseTab(key) => {
            state.tabs.close(&key);
        }
        Action::CloseTabGoNext { key, next_path } => state.tabs.close_go_next(&key, &next_path),
        Action::CloseOtherTabs(key) => {
            state.tabs.close_others(&key);
        }
        Action::CloseLeftTabs(key) => {
            state.tabs.close_left(&key);
        }
        Action::CloseRightTabs(key) => {
            state.tabs.close_right(&key);
        }
        Action::CloseAllTabs => {
            state.tabs.close_all();
        }
        Action::ToggleLock(lock) => state.tabs.is_lock = lock,
        Action::ToggleMaximize(max) => state.tabs.is_maximize = max,
        Action::SetPermissions(permissions) => state.user.permissions = permissions,
        Action::SetOpenKeys(keys) => state.menu.open_keys = keys,
        Action::SetSelectedKey(key) => state.menu.selected_key = key,
        Action::ToggleCollapsed(collapsed) => state.menu.is_collapsed = collapsed,
        Action::SetPhone(phone) => state.menu.is_phone = phone,
    }
}

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&AppState, &Action)>;

pub struct Store {
    state: AppState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Read a derived value out of the current state.
    pub fn select<T>(&self, selector: impl FnOnce(&AppState) -> T) -> T {
        selector(&self.state)
    }

    /// Apply `action` and notify subscribers with the settled state.
    pub fn dispatch(&mut self, action: Action) {
        tracing::trace!(?action, "dispatch");
        reduce(&mut self.state, action.clone());
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.state, &action);
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&AppState, &Action) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        before != self.listeners.len()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
