//! CRUD page controllers.
//!
//! Controllers are sans-IO: an operation that needs the remote API returns a
//! request value carrying a generation token; the host executes it (inline or
//! on a worker thread) and hands the result back to the matching `apply_*`
//! method. A result whose token is no longer current is dropped, so a
//! response that lands after unmount or after a newer request never touches
//! page state.

pub mod article;
pub mod detail;
pub mod list;

pub use detail::{DetailPage, LoadRequest, SubmitRequest};
pub use list::{DeleteRequest, ListPage, ListRequest};

use crate::api::FormData;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Input,
    TextArea,
    /// Rich-text body; edited as raw HTML.
    Editor,
}

/// One form or search field.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// One list column.
#[derive(Debug)]
pub struct ColumnSpec {
    pub title: &'static str,
    pub data_index: &'static str,
    pub width: u16,
}

/// Everything that distinguishes one entity's CRUD pages from another's.
#[derive(Debug)]
pub struct PageDef {
    /// Entity title, used for the detail tab label.
    pub title: &'static str,
    /// Permission prefix; flags are `<prefix>/index|create|update|delete`.
    pub permission_prefix: &'static str,
    pub list_route: &'static str,
    pub option_route: &'static str,
    /// Breadcrumb above the detail page title.
    pub nav_prefix: &'static [&'static str],
    pub search_fields: &'static [FieldSpec],
    pub columns: &'static [ColumnSpec],
    pub form_fields: &'static [FieldSpec],
    /// Initial values of the create form.
    pub create_template: &'static [(&'static str, &'static str)],
    pub default_page_size: u32,
}

impl PageDef {
    pub fn create_template(&self) -> FormData {
        self.create_template
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    /// Form fields that are required but missing or blank in `record`.
    pub fn missing_required(&self, record: &FormData) -> Vec<&'static str> {
        self.form_fields
            .iter()
            .filter(|f| f.required)
            .filter(|f| match record.get(f.name) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .map(|f| f.label)
            .collect()
    }
}

/// Process-wide token source. Tokens never repeat, so a view rebuilt under
/// the same route key cannot settle a request issued by its predecessor.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Tracks the one request a controller has in flight.
#[derive(Debug, Default)]
pub(crate) struct Generation {
    in_flight: Option<u64>,
}

impl Generation {
    /// Start a request and return its token.
    pub(crate) fn issue(&mut self) -> u64 {
        let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
        self.in_flight = Some(token);
        token
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Settle `token`. False when it is stale.
    pub(crate) fn settle(&mut self, token: u64) -> bool {
        if self.in_flight == Some(token) {
            self.in_flight = None;
            true
        } else {
            tracing::debug!(token, in_flight = ?self.in_flight, "dropping stale response");
            false
        }
    }

    /// Invalidate anything in flight.
    pub(crate) fn reset(&mut self) {
        self.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generation_settles_only_current_token() {
        let mut gen = Generation::default();
        let first = gen.issue();
        assert!(gen.is_busy());
        assert!(gen.settle(first));
        assert!(!gen.is_busy());
        assert!(!gen.settle(first));

        let second = gen.issue();
        gen.reset();
        assert!(!gen.settle(second));
    }

    #[test]
    fn test_tokens_are_unique_across_controllers() {
        let mut old = Generation::default();
        let mut new = Generation::default();
        let stale = old.issue();
        let fresh = new.issue();
        assert_ne!(stale, fresh);
        assert!(!new.settle(stale));
        assert!(new.settle(fresh));
    }

    #[test]
    fn test_missing_required_fields() {
        let def = &article::ARTICLE_PAGE;
        let record = json!({ "title": "  ", "content": "<p>x</p>" });
        assert_eq!(def.missing_required(record.as_object().unwrap()), vec!["标题"]);

        let record = json!({ "title": "t", "content": "<p>x</p>" });
        assert!(def.missing_required(record.as_object().unwrap()).is_empty());
    }

    #[test]
    fn test_create_template() {
        let template = article::ARTICLE_PAGE.create_template();
        assert_eq!(template["content"], "<h4>初始化内容</h4>");
    }
}
