//! Tab slice of the application state.
//!
//! Tabs are only ever appended or removed, never relabelled or reordered.
//! Every removal that takes away the active tab picks a neighbour and sets
//! the lock so the shell navigates there on its next reconciliation.

use serde::Serialize;

/// An open page in the console: route key, display label and breadcrumb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub key: String,
    pub label: String,
    pub nav: Vec<String>,
}

impl Tab {
    pub fn new(key: impl Into<String>, label: impl Into<String>, nav: Vec<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            nav,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabsState {
    /// Open tabs in insertion order.
    pub tabs: Vec<Tab>,
    /// Key of the active tab. May name a route with no tab (e.g. `/loading`).
    pub active_key: String,
    /// Breadcrumb of the active tab.
    pub nav: Vec<String>,
    /// Set when the active key was changed programmatically and the shell
    /// still has to navigate to it.
    pub is_lock: bool,
    pub is_maximize: bool,
    /// Route activated when the last tab goes away.
    pub home: String,
}

impl TabsState {
    pub fn new(home: impl Into<String>) -> Self {
        Self {
            tabs: Vec::new(),
            active_key: String::new(),
            nav: Vec::new(),
            is_lock: false,
            is_maximize: false,
            home: home.into(),
        }
    }

    pub fn position(&self, key: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.key == self.active_key)
    }

    /// Append `tab` unless a tab with the same key is already open.
    pub fn add(&mut self, tab: Tab) -> bool {
        if self.contains(&tab.key) {
            return false;
        }
        self.tabs.push(tab);
        true
    }

    /// Remove the tab at `key`. When it was active, the tab now at its index
    /// (the next one) becomes active, else the previous one, else home.
    pub fn close(&mut self, key: &str) -> bool {
        let Some(index) = self.position(key) else {
            return false;
        };
        self.tabs.remove(index);

        if self.active_key == key {
            let next = self
                .tabs
                .get(index)
                .or_else(|| index.checked_sub(1).and_then(|i| self.tabs.get(i)))
                .map(|t| t.key.clone())
                .unwrap_or_else(|| self.home.clone());
            self.activate_locked(next);
        }
        true
    }

    /// Remove `key` (if open) and activate `next_path`.
    pub fn close_go_next(&mut self, key: &str, next_path: &str) {
        if let Some(index) = self.position(key) {
            self.tabs.remove(index);
        }
        self.activate_locked(next_path.to_string());
    }

    /// Keep only the tab at `key`.
    pub fn close_others(&mut self, key: &str) -> usize {
        let before = self.tabs.len();
        self.tabs.retain(|t| t.key == key);
        self.ensure_active_open(key);
        before - self.tabs.len()
    }

    /// Remove every tab before `key`.
    pub fn close_left(&mut self, key: &str) -> usize {
        let Some(index) = self.position(key) else {
            return 0;
        };
        self.tabs.drain(..index);
        self.ensure_active_open(key);
        index
    }

    /// Remove every tab after `key`.
    pub fn close_right(&mut self, key: &str) -> usize {
        let Some(index) = self.position(key) else {
            return 0;
        };
        let removed = self.tabs.len() - index - 1;
        self.tabs.truncate(index + 1);
        self.ensure_active_open(key);
        removed
    }

    /// Remove every tab and go home.
    pub fn close_all(&mut self) -> usize {
        let removed = self.tabs.len();
        self.tabs.clear();
        let home = self.home.clone();
        self.activate_locked(home);
        removed
    }

    fn ensure_active_open(&mut self, fallback: &str) {
        if !self.contains(&self.active_key) && self.contains(fallback) {
            self.activate_locked(fallback.to_string());
        }
    }

    fn activate_locked(&mut self, key: String) {
        if let Some(tab) = self.tabs.iter().find(|t| t.key == key) {
            self.nav = tab.nav.clone();
        }
        self.active_key = key;
        self.is_lock = true;
    }
}
