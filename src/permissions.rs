//! Permission set and derived page capability flags.
//!
//! The session layer supplies a flat list of permission strings. Pages never
//! store capability booleans on their own; they derive a [`PagePermission`]
//! from the set once per page load.

use std::collections::HashSet;

/// Immutable set of permission strings for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    keys: HashSet<String>,
}

impl PermissionSet {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Sorted copy of the keys, for display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Whether `key` is granted by `set`.
pub fn has_permission(key: &str, set: &PermissionSet) -> bool {
    set.contains(key)
}

/// Capability flags for one CRUD page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagePermission {
    pub page: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

impl PagePermission {
    /// Derive flags from `<prefix>/index`, `<prefix>/create`, `<prefix>/update`
    /// and `<prefix>/delete`.
    pub fn derive(prefix: &str, set: &PermissionSet) -> Self {
        let check = |action: &str| has_permission(&format!("{prefix}/{action}"), set);
        Self {
            page: check("index"),
            create: check("create"),
            update: check("update"),
            delete: check("delete"),
        }
    }
}
