//! Keep-alive view cache.
//!
//! Page controllers survive tab switches: the console keeps one view per
//! route key and reuses it when the route is shown again. Refreshing a route
//! or closing its tab discards the view so the next visit rebuilds it.

use std::collections::HashMap;

#[derive(Debug)]
pub struct ViewCache<V> {
    views: HashMap<String, V>,
}

impl<V> Default for ViewCache<V> {
    fn default() -> Self {
        Self {
            views: HashMap::new(),
        }
    }
}

impl<V> ViewCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.views.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.views.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.views.get_mut(key)
    }

    /// Cached view for `key`, building it with `build` on a miss.
    /// The flag is true when the view was freshly built (a "mount").
    pub fn get_or_build(&mut self, key: &str, build: impl FnOnce() -> V) -> (&mut V, bool) {
        let mut built = false;
        let view = self.views.entry(key.to_string()).or_insert_with(|| {
            built = true;
            build()
        });
        (view, built)
    }

    /// Discard the cached view for `key`, returning it so the caller can
    /// unmount it.
    pub fn invalidate(&mut self, key: &str) -> Option<V> {
        let dropped = self.views.remove(key);
        if dropped.is_some() {
            tracing::debug!(key, "discarded cached view");
        }
        dropped
    }

    /// Drop every view whose key is not in `keep`.
    pub fn retain_keys<'a>(&mut self, keep: impl IntoIterator<Item = &'a str>) -> Vec<V> {
        let keep: std::collections::HashSet<&str> = keep.into_iter().collect();
        let stale: Vec<String> = self
            .views
            .keys()
            .filter(|k| !keep.contains(k.as_str()))
            .cloned()
            .collect();
        stale
            .into_iter()
            .filter_map(|k| self.views.remove(&k))
            .collect()
    }
}
