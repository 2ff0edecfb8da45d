//! Tab session manager.
//!
//! The [`Shell`] ties the tab slice of the [`Store`] to the [`Navigator`]:
//! every location change is reconciled into the tab list, programmatic tab
//! activations go through the lock flag so they turn into exactly one
//! navigation, and a refresh discards a route's cached view and walks through
//! the loading route before coming back.

use crate::location::{Location, Navigator};
use crate::menu::{fallback_tab, open_keys_for, resolve_tab, MenuItem, DEFAULT_MENUS};
use crate::notice::{NoticeLevel, Notices};
use crate::permissions::PermissionSet;
use crate::store::{Action, AppState, Store, Tab};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Transient route shown while a tab refreshes. Never becomes a tab.
pub const LOADING_ROUTE: &str = "/loading";

/// Default delay between starting a refresh and returning to the route.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct ShellOptions {
    /// Route activated when no tab remains.
    pub home: String,
    /// How long a refresh stays on the loading route.
    pub refresh_delay: Duration,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            home: crate::menu::DASHBOARD_ROUTE.to_string(),
            refresh_delay: DEFAULT_REFRESH_DELAY,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingRefresh {
    key: String,
    started: Instant,
}

#[derive(Debug)]
pub struct Shell<N: Navigator> {
    store: Store,
    navigator: N,
    menus: &'static [MenuItem],
    notices: Notices,
    refresh_delay: Duration,
    refreshing: Option<PendingRefresh>,
    /// Route keys whose cached views must be discarded by the host.
    discarded: Vec<String>,
}

impl<N: Navigator> Shell<N> {
    pub fn new(navigator: N, options: ShellOptions) -> Self {
        Self {
            store: Store::new(AppState::new(options.home)),
            navigator,
            menus: DEFAULT_MENUS,
            notices: Notices::new(),
            refresh_delay: options.refresh_delay,
            refreshing: None,
            discarded: Vec::new(),
        }
    }

    /// Replace the menu table.
    pub fn with_menus(mut self, menus: &'static [MenuItem]) -> Self {
        self.menus = menus;
        self
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn menus(&self) -> &'static [MenuItem] {
        self.menus
    }

    pub fn location(&self) -> &Location {
        self.navigator.location()
    }

    pub fn permissions(&self) -> &PermissionSet {
        &self.store.state().user.permissions
    }

    pub fn active_key(&self) -> &str {
        &self.store.state().tabs.active_key
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.store.state().tabs.tabs
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    // ========================================================================
    // Location reconciliation
    // ========================================================================

    /// Load the session's permission set and materialise the current location.
    pub fn set_permissions(&mut self, permissions: PermissionSet) {
        self.store.dispatch(Action::SetPermissions(permissions));
        let uri = self.navigator.uri();
        self.materialize(&uri);
    }

    /// Navigate to `to` and reconcile the tab list with the new location.
    pub fn navigate(&mut self, to: &str) {
        self.navigator.navigate(to);
        self.sync_location();
    }

    /// Reconcile the active tab with the current location.
    ///
    /// Without the lock the location wins: it is resolved into a tab that
    /// becomes active. With the lock the active key wins: the shell navigates
    /// there once and clears the lock.
    ///
    /// The lock is consumed even when the location already equals the active
    /// key, so it never outlives the change that set it.
    pub fn sync_location(&mut self) {
        let uri = self.navigator.uri();
        let tabs = &self.store.state().tabs;
        if tabs.is_lock {
            let key = tabs.active_key.clone();
            self.materialize(&key);
            if key != uri {
                self.navigator.navigate(&key);
            }
            self.store.dispatch(Action::ToggleLock(false));
            debug!(key = %key, "lock consumed");
        } else if tabs.active_key != uri {
            self.materialize(&uri);
        }
    }

    /// Resolve `path` into a tab, append it if new and mark it active.
    fn materialize(&mut self, path: &str) {
        let permissions = &self.store.state().user.permissions;
        if permissions.is_empty() || path == "/" {
            return;
        }
        if path == LOADING_ROUTE {
            self.store.dispatch(Action::SetActiveKey(path.to_string()));
            return;
        }

        let location = Location::parse(path);
        let tab = resolve_tab(self.menus, &location, permissions).unwrap_or_else(|| {
            debug!(route = %location, "route not in menu table; using fallback tab");
            fallback_tab(&location)
        });
        self.open_tab(tab);
    }

    /// Make `tab` active and append it if it is not open yet. Does not navigate.
    pub fn open_tab(&mut self, tab: Tab) {
        let added = !self.store.state().tabs.contains(&tab.key);
        self.store.dispatch(Action::SetActiveKey(tab.key.clone()));
        self.store.dispatch(Action::SetNav(tab.nav.clone()));
        if added {
            info!(key = %tab.key, label = %tab.label, "tab opened");
        }
        self.store.dispatch(Action::AddTab(tab));
    }

    // ========================================================================
    // Closing tabs
    // ========================================================================

    /// Close the tab at `key`. Closing the active tab moves to a neighbour.
    pub fn close_tab(&mut self, key: &str) {
        self.close_with(Action::CloseTab(key.to_string()));
    }

    /// Close the tab at `key` and go to `next_path`.
    pub fn close_tab_go_next(&mut self, key: &str, next_path: &str) {
        self.close_with(Action::CloseTabGoNext {
            key: key.to_string(),
            next_path: next_path.to_string(),
        });
    }

    pub fn close_other_tabs(&mut self, key: &str) {
        self.close_with(Action::CloseOtherTabs(key.to_string()));
    }

    pub fn close_left_tabs(&mut self, key: &str) {
        self.close_with(Action::CloseLeftTabs(key.to_string()));
    }

    pub fn close_right_tabs(&mut self, key: &str) {
        self.close_with(Action::CloseRightTabs(key.to_string()));
    }

    pub fn close_all_tabs(&mut self) {
        self.close_with(Action::CloseAllTabs);
    }

    fn close_with(&mut self, action: Action) {
        let before: Vec<String> = self.tabs().iter().map(|t| t.key.clone()).collect();
        self.store.dispatch(action);
        let after = &self.store.state().tabs;
        for key in before.into_iter().filter(|k| !after.contains(k)) {
            info!(key = %key, "tab closed");
            self.discarded.push(key);
        }
        self.sync_location();
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Start refreshing `key` (the active tab when `None`).
    ///
    /// Single-flight: returns false and does nothing while another refresh is
    /// still pending. The cached view is discarded immediately and the shell
    /// moves to [`LOADING_ROUTE`]; [`Shell::tick`] finishes the cycle.
    pub fn refresh(&mut self, key: Option<&str>, now: Instant) -> bool {
        if self.refreshing.is_some() {
            debug!("refresh already in flight; ignored");
            return false;
        }
        let key = key
            .map(str::to_string)
            .unwrap_or_else(|| self.active_key().to_string());
        if key.is_empty() || key == LOADING_ROUTE {
            return false;
        }

        info!(key = %key, "refresh started");
        self.drop_view(&key);
        self.refreshing = Some(PendingRefresh { key, started: now });
        self.navigate(LOADING_ROUTE);
        true
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.is_some()
    }

    /// Advance timers. Completes a pending refresh once its delay elapsed;
    /// returns true when it did.
    pub fn tick(&mut self, now: Instant) -> bool {
        let due = self
            .refreshing
            .as_ref()
            .is_some_and(|p| now.saturating_duration_since(p.started) >= self.refresh_delay);
        if !due {
            return false;
        }
        let Some(pending) = self.refreshing.take() else {
            return false;
        };

        self.navigate(&pending.key);
        self.notices
            .push(NoticeLevel::Success, "刷新成功", Some("refresh"));
        info!(key = %pending.key, "refresh finished");
        true
    }

    // ========================================================================
    // Views and chrome
    // ========================================================================

    /// Ask the host to discard the cached view at `key`.
    pub fn drop_view(&mut self, key: &str) {
        if !self.discarded.iter().any(|k| k == key) {
            self.discarded.push(key.to_string());
        }
    }

    /// Route keys whose views were discarded since the last call.
    pub fn take_discarded(&mut self) -> Vec<String> {
        std::mem::take(&mut self.discarded)
    }

    pub fn toggle_maximize(&mut self) {
        let max = self.store.state().tabs.is_maximize;
        self.store.dispatch(Action::ToggleMaximize(!max));
    }

    pub fn toggle_collapsed(&mut self) {
        let collapsed = self.store.state().menu.is_collapsed;
        self.store.dispatch(Action::ToggleCollapsed(!collapsed));
    }

    /// Expand the sidebar groups around `route` and select it, unless the
    /// sidebar is collapsed or in phone layout.
    pub fn expand_menu_for(&mut self, route: &str) {
        let menu = &self.store.state().menu;
        if menu.is_phone || menu.is_collapsed {
            return;
        }
        let open = open_keys_for(self.menus, route);
        self.store.dispatch(Action::SetOpenKeys(open));
        self.store
            .dispatch(Action::SetSelectedKey(route.to_string()));
    }
}
