//! Route locations and the navigation provider.
//!
//! A [`Location`] is a path plus an optional query string. The [`Navigator`]
//! trait is the sole source of truth for "where the console currently is";
//! [`History`] is the in-memory implementation used by the CLI, the terminal
//! console and the tests.

use std::fmt;
use url::form_urlencoded;

/// A route location: path and raw query (without the leading `?`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Location {
    pub path: String,
    pub query: String,
}

impl Location {
    /// Parse a route string such as `/content/article/option?id=3`.
    ///
    /// Missing leading slashes are added; a trailing `?` with no query is dropped.
    pub fn parse(uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((p, q)) => (p, q),
            None => (uri, ""),
        };
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self {
            path,
            query: query.to_string(),
        }
    }

    /// Build a location from a path and query pairs.
    pub fn with_query<'a, I>(path: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        Self {
            path: path.to_string(),
            query,
        }
    }

    /// Path and query joined back into a route key.
    pub fn uri(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }

    /// First value of a query parameter, if present and non-empty.
    pub fn param(&self, name: &str) -> Option<String> {
        form_urlencoded::parse(self.query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .filter(|v| !v.is_empty())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri())
    }
}

/// Navigation provider: reports the current location and accepts "go to" requests.
pub trait Navigator {
    fn location(&self) -> &Location;

    fn navigate(&mut self, to: &str);

    /// Current location as a route key.
    fn uri(&self) -> String {
        self.location().uri()
    }
}

/// In-memory navigation history.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Location>,
}

impl History {
    pub fn new(start: &str) -> Self {
        Self {
            entries: vec![Location::parse(start)],
        }
    }

    /// Every location visited, oldest first.
    pub fn entries(&self) -> &[Location] {
        &self.entries
    }

    /// Step back one entry. Returns false when already at the first entry.
    pub fn back(&mut self) -> bool {
        if self.entries.len() > 1 {
            self.entries.pop();
            true
        } else {
            false
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for History {
    fn location(&self) -> &Location {
        // `entries` is never empty: `new` seeds it and `back` keeps one entry.
        &self.entries[self.entries.len() - 1]
    }

    fn navigate(&mut self, to: &str) {
        let next = Location::parse(to);
        if *self.location() != next {
            self.entries.push(next);
        }
    }
}
