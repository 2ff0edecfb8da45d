//! Test utilities shared across modules.
//!
//! Provides an in-memory article backend that records every call and a
//! helper for building a [`Shell`] with every console permission granted.

use crate::api::{ApiMessage, CrudApi, FormData, PageResult};
use crate::error::{BackstageError, Result};
use crate::location::History;
use crate::pages::article::ARTICLE_PAGE;
use crate::permissions::PermissionSet;
use crate::shell::{Shell, ShellOptions};
use serde_json::{json, Value};
use std::cell::RefCell;

/// Every permission the built-in pages check.
pub fn full_permissions() -> PermissionSet {
    PermissionSet::new([
        "/dashboard",
        "/content/article/index",
        "/content/article/create",
        "/content/article/update",
        "/content/article/delete",
    ])
}

/// A shell at `route` with [`full_permissions`] loaded.
pub fn shell_at(route: &str) -> Shell<History> {
    let mut shell = Shell::new(History::new(route), ShellOptions::default());
    shell.set_permissions(full_permissions());
    shell
}

#[derive(Debug, Default)]
struct FakeState {
    rows: Vec<FormData>,
    next_id: u64,
    fail_next: Option<String>,
    list_calls: Vec<FormData>,
    get_calls: Vec<String>,
    created: Vec<FormData>,
    updated: Vec<(String, FormData)>,
    deleted: Vec<String>,
}

/// In-memory article backend.
///
/// Rows have string ids `"1"..="n"`, titles `文章 <id>` and a body in
/// `content`. `list` honours `page`, `pageSize` and substring filters on
/// the article search fields; other entries are accepted and ignored.
#[derive(Debug, Default)]
pub struct FakeArticleApi {
    state: RefCell<FakeState>,
}

impl FakeArticleApi {
    pub fn with_rows(n: u64) -> Self {
        let rows = (1..=n)
            .map(|i| {
                json!({
                    "id": i.to_string(),
                    "title": format!("文章 {i}"),
                    "author": "admin",
                    "content": format!("<p>正文 {i}</p>"),
                })
                    .as_object()
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        Self {
            state: RefCell::new(FakeState {
                rows,
                next_id: n + 1,
                ..FakeState::default()
            }),
        }
    }

    /// Make the next call fail with an API error carrying `message`.
    pub fn fail_next(&self, message: &str) {
        self.state.borrow_mut().fail_next = Some(message.to_string());
    }

    pub fn list_calls(&self) -> Vec<FormData> {
        self.state.borrow().list_calls.clone()
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.state.borrow().get_calls.clone()
    }

    pub fn created(&self) -> Vec<FormData> {
        self.state.borrow().created.clone()
    }

    pub fn updated(&self) -> Vec<(String, FormData)> {
        self.state.borrow().updated.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.borrow().deleted.clone()
    }

    fn check_failure(&self) -> Result<()> {
        match self.state.borrow_mut().fail_next.take() {
            Some(message) => Err(BackstageError::Api { code: 500, message }),
            None => Ok(()),
        }
    }
}

fn as_u64(value: Option<&Value>, default: u64) -> u64 {
    value.and_then(Value::as_u64).unwrap_or(default)
}

impl CrudApi for FakeArticleApi {
    fn list(&self, query: &FormData) -> Result<PageResult> {
        self.state.borrow_mut().list_calls.push(query.clone());
        self.check_failure()?;

        let state = self.state.borrow();
        let filters: Vec<(&String, &str)> = query
            .iter()
            .filter(|(k, _)| ARTICLE_PAGE.search_fields.iter().any(|f| f.name == k.as_str()))
            .filter_map(|(k, v)| v.as_str().map(|text| (k, text)))
            .collect();
        let matching: Vec<&FormData> = state
            .rows
            .iter()
            .filter(|r| {
                filters.iter().all(|(k, text)| {
                    r.get(k.as_str())
                        .and_then(Value::as_str)
                        .is_some_and(|v| v.contains(text))
                })
            })
            .collect();
        let page = as_u64(query.get("page"), 1).max(1);
        let size = as_u64(query.get("pageSize"), 20).max(1);
        let items = matching
            .iter()
            .skip(((page - 1) * size) as usize)
            .take(size as usize)
            .map(|r| (*r).clone())
            .collect();
        Ok(PageResult {
            items,
            total: matching.len() as u64,
        })
    }

    fn get_by_id(&self, id: &str) -> Result<FormData> {
        self.state.borrow_mut().get_calls.push(id.to_string());
        self.check_failure()?;
        self.state
            .borrow()
            .rows
            .iter()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
            .cloned()
            .ok_or_else(|| BackstageError::NotFound(id.to_string()))
    }

    fn create(&self, record: &FormData) -> Result<ApiMessage> {
        self.check_failure()?;
        let mut state = self.state.borrow_mut();
        let mut row = record.clone();
        row.insert("id".to_string(), Value::String(state.next_id.to_string()));
        state.next_id += 1;
        state.rows.push(row);
        state.created.push(record.clone());
        Ok(ApiMessage::ok(""))
    }

    fn update(&self, id: &str, record: &FormData) -> Result<ApiMessage> {
        self.check_failure()?;
        let mut state = self.state.borrow_mut();
        if let Some(row) = state
            .rows
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id))
        {
            row.extend(record.clone());
        }
        state.updated.push((id.to_string(), record.clone()));
        Ok(ApiMessage::ok(""))
    }

    fn delete(&self, id: &str) -> Result<ApiMessage> {
        self.check_failure()?;
        let mut state = self.state.borrow_mut();
        state
            .rows
            .retain(|r| r.get("id").and_then(Value::as_str) != Some(id));
        state.deleted.push(id.to_string());
        Ok(ApiMessage::ok(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_list_paging_and_filter() {
        let api = FakeArticleApi::with_rows(12);
        let query = json!({ "page": 2, "pageSize": 5 }).as_object().cloned().unwrap();
        let page = api.list(&query).unwrap();
        assert_eq!(page.total, 12);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items[0]["id"], "6");

        let query = json!({ "title": "文章 1" }).as_object().cloned().unwrap();
        let page = api.list(&query).unwrap();
        // 1, 10, 11, 12
        assert_eq!(page.total, 4);

        let query = json!({ "title": "文章 1", "author": "nobody" })
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(api.list(&query).unwrap().total, 0);
    }

    #[test]
    fn test_fake_rows_fill_required_form_fields() {
        let api = FakeArticleApi::with_rows(3);
        for id in ["1", "2", "3"] {
            let record = api.get_by_id(id).unwrap();
            assert!(ARTICLE_PAGE.missing_required(&record).is_empty());
        }
    }

    #[test]
    fn test_fake_fail_next_is_one_shot() {
        let api = FakeArticleApi::with_rows(1);
        api.fail_next("boom");
        assert!(api.delete("1").is_err());
        assert!(api.delete("1").is_ok());
        assert_eq!(api.deleted(), vec!["1"]);
    }

    #[test]
    fn test_shell_at_loads_permissions() {
        let shell = shell_at("/dashboard");
        assert_eq!(shell.tabs().len(), 1);
        assert!(!shell.permissions().is_empty());
    }
}
