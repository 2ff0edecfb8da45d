//! Article commands.
//!
//! Each command drives the same list and detail page controllers the
//! console uses, on a headless [`Shell`] over an in-memory [`History`], so
//! permission flags, required-field checks and notices behave identically.

use crate::api::{CrudApi, FormData, HttpClient, ResourceApi};
use crate::config::Config;
use crate::error::{BackstageError, Result};
use crate::location::History;
use crate::menu::ARTICLE_ROUTE;
use crate::notice::{Notice, NoticeLevel};
use crate::output::{print_notices, print_page_summary, print_record, print_rows, Spinner};
use crate::pages::article::ARTICLE_PAGE;
use crate::pages::{DetailPage, ListPage, ListRequest};
use crate::permissions::{PagePermission, PermissionSet};
use crate::shell::{Shell, ShellOptions};
use serde_json::Value;
use std::fs;
use tracing::debug;

/// A headless console session: shell, API and paging defaults.
pub struct Session<A: CrudApi> {
    shell: Shell<History>,
    api: A,
    page_size: u32,
}

impl Session<ResourceApi> {
    /// Connect to the configured API.
    pub fn connect(config: &Config) -> Result<Self> {
        let http = HttpClient::new(&config.api_base_url, config.token(), config.timeout())?;
        Ok(Self::new(config, ResourceApi::article(http)))
    }
}

impl<A: CrudApi> Session<A> {
    pub fn new(config: &Config, api: A) -> Self {
        let options = ShellOptions {
            home: config.home_route.clone(),
            refresh_delay: config.refresh_delay(),
        };
        let mut shell = Shell::new(History::new("/"), options);
        shell.set_permissions(PermissionSet::new(config.permissions.iter().cloned()));
        Self {
            shell,
            api,
            page_size: config.page_size,
        }
    }

    pub fn shell(&self) -> &Shell<History> {
        &self.shell
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.shell.notices_mut().drain()
    }

    fn permission(&self) -> PagePermission {
        PagePermission::derive(ARTICLE_PAGE.permission_prefix, self.shell.permissions())
    }

    fn denied(action: &str) -> BackstageError {
        BackstageError::PermissionDenied(format!("{}/{}", ARTICLE_PAGE.permission_prefix, action))
    }

    /// The latest error or warning notice, as a command error.
    fn failure(&self, fallback: &str) -> BackstageError {
        let text = self
            .shell
            .notices()
            .iter()
            .filter(|n| is_problem(n))
            .last()
            .map(|n| n.content.clone())
            .unwrap_or_else(|| fallback.to_string());
        BackstageError::Failed(text)
    }

    fn fetch(&mut self, list: &mut ListPage, req: ListRequest) -> Result<()> {
        let result = remote("Loading articles", || req.send(&self.api));
        let failed = result.is_err();
        list.apply_list(req.token, result, self.shell.notices_mut());
        if failed {
            return Err(self.failure("list fetch failed"));
        }
        Ok(())
    }

    fn open_list(&mut self, page_size: Option<u32>) -> ListPage {
        self.shell.navigate(ARTICLE_ROUTE);
        ListPage::new(&ARTICLE_PAGE, self.shell.permissions())
            .with_page_size(page_size.unwrap_or(self.page_size))
    }

    /// Fetch one page of articles matching `filters`.
    pub fn list(&mut self, page: u32, page_size: Option<u32>, filters: FormData) -> Result<ListPage> {
        let mut list = self.open_list(page_size);
        let req = list
            .mount_with_query(filters, page)
            .ok_or_else(|| Self::denied("index"))?;
        self.fetch(&mut list, req)?;
        Ok(list)
    }

    pub fn show(&mut self, id: &str) -> Result<FormData> {
        if !self.permission().page {
            return Err(Self::denied("index"));
        }
        remote("Loading article", || self.api.get_by_id(id))
    }

    pub fn create(&mut self, fields: FormData) -> Result<()> {
        let list = self.open_list(None);
        if !list.on_create(&mut self.shell) {
            return Err(Self::denied("create"));
        }
        self.submit_form(fields)
    }

    pub fn update(&mut self, id: &str, fields: FormData) -> Result<()> {
        let list = self.open_list(None);
        if !list.on_update(&mut self.shell, id) {
            return Err(Self::denied("update"));
        }
        self.submit_form(fields)
    }

    /// Mount the detail page at the current location, apply `fields` over
    /// the loaded record (or the create template) and submit.
    fn submit_form(&mut self, fields: FormData) -> Result<()> {
        let location = self.shell.location().clone();
        let mut detail = DetailPage::new(&ARTICLE_PAGE, location, self.shell.permissions());

        if let Some(req) = detail.mount(&mut self.shell) {
            let result = remote("Loading article", || req.send(&self.api));
            let failed = result.is_err();
            detail.apply_load(req.token, result, self.shell.notices_mut());
            if failed {
                return Err(self.failure("record load failed"));
            }
        }
        for (name, value) in fields {
            detail.set_field(&name, value);
        }

        let Some(req) = detail.submit(self.shell.notices_mut()) else {
            return Err(self.failure("form not submitted"));
        };
        debug!(id = ?req.id, "submitting article");
        let result = remote("Saving article", || req.send(&self.api));
        if detail.apply_submit(req.token, result, &mut self.shell) {
            Ok(())
        } else {
            Err(self.failure("save failed"))
        }
    }

    /// Delete `id` and return the re-fetched first page.
    pub fn delete(&mut self, id: &str) -> Result<ListPage> {
        let mut list = self.open_list(None);
        if !list.permission().delete {
            return Err(Self::denied("delete"));
        }
        let req = list.mount().ok_or_else(|| Self::denied("index"))?;
        self.fetch(&mut list, req)?;

        let req = list
            .delete(id)
            .ok_or_else(|| BackstageError::Failed("delete not allowed right now".to_string()))?;
        let result = remote("Deleting article", || req.send(&self.api));
        match list.apply_delete(req.token, result, self.shell.notices_mut()) {
            Some(refetch) => self.fetch(&mut list, refetch)?,
            None => return Err(self.failure("delete failed")),
        }
        Ok(list)
    }
}

fn is_problem(notice: &Notice) -> bool {
    matches!(notice.level, NoticeLevel::Error | NoticeLevel::Warning)
}

fn remote<T>(message: &str, call: impl FnOnce() -> Result<T>) -> Result<T> {
    let spinner = Spinner::new(message);
    let result = call();
    spinner.clear();
    result
}

/// Print the session's queued notices, minus the failures that the
/// command's error already reports, and pass `outcome` through.
fn finish<A: CrudApi, T>(session: &mut Session<A>, outcome: Result<T>) -> Result<T> {
    let notices: Vec<Notice> = session
        .drain_notices()
        .into_iter()
        .filter(|n| !is_problem(n))
        .collect();
    print_notices(&notices);
    outcome
}

/// Parse `key=value` pairs. A value of `@path` is read from the file.
pub fn parse_fields(pairs: &[String]) -> Result<FormData> {
    let mut data = FormData::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            BackstageError::InvalidField(format!("expected key=value, got `{}`", pair))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(BackstageError::InvalidField(format!(
                "missing field name in `{}`",
                pair
            )));
        }
        let value = match value.strip_prefix('@') {
            Some(path) => fs::read_to_string(path)?,
            None => value.to_string(),
        };
        data.insert(key.to_string(), Value::String(value));
    }
    Ok(data)
}

fn print_list(list: &ListPage) {
    print_rows(list.def().columns, list.rows());
    print_page_summary(list.page(), list.page_count(), list.total());
}

pub fn articles_list_command(
    config: &Config,
    page: u32,
    page_size: Option<u32>,
    filters: &[String],
) -> Result<()> {
    let filters = parse_fields(filters)?;
    let mut session = Session::connect(config)?;
    let outcome = session.list(page, page_size, filters);
    if let Ok(list) = &outcome {
        print_list(list);
    }
    finish(&mut session, outcome).map(|_| ())
}

pub fn articles_show_command(config: &Config, id: &str) -> Result<()> {
    let mut session = Session::connect(config)?;
    let outcome = session.show(id);
    if let Ok(record) = &outcome {
        print_record(ARTICLE_PAGE.form_fields, record);
    }
    finish(&mut session, outcome).map(|_| ())
}

pub fn articles_create_command(config: &Config, fields: &[String]) -> Result<()> {
    let fields = parse_fields(fields)?;
    let mut session = Session::connect(config)?;
    let outcome = session.create(fields);
    finish(&mut session, outcome)
}

pub fn articles_update_command(config: &Config, id: &str, fields: &[String]) -> Result<()> {
    let fields = parse_fields(fields)?;
    let mut session = Session::connect(config)?;
    let outcome = session.update(id, fields);
    finish(&mut session, outcome)
}

pub fn articles_delete_command(config: &Config, id: &str) -> Result<()> {
    let mut session = Session::connect(config)?;
    let outcome = session.delete(id);
    if let Ok(list) = &outcome {
        print_list(list);
    }
    finish(&mut session, outcome).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{full_permissions, FakeArticleApi};
    use serde_json::json;
    use tempfile::TempDir;

    fn config_with(permissions: &[&str]) -> Config {
        Config {
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    fn full_session(rows: u64) -> Session<FakeArticleApi> {
        let perms = full_permissions();
        let config = config_with(&perms.sorted());
        Session::new(&config, FakeArticleApi::with_rows(rows))
    }

    fn fields(value: serde_json::Value) -> FormData {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_parse_fields() {
        let data = parse_fields(&["title=Hello".to_string(), "author = a=b".to_string()]).unwrap();
        assert_eq!(data["title"], "Hello");
        assert_eq!(data["author"], " a=b");

        assert!(parse_fields(&["novalue".to_string()]).is_err());
        assert!(parse_fields(&["=x".to_string()]).is_err());
    }

    #[test]
    fn test_parse_fields_reads_file_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("body.html");
        fs::write(&path, "<p>body</p>").unwrap();

        let pair = format!("content=@{}", path.display());
        let data = parse_fields(&[pair]).unwrap();
        assert_eq!(data["content"], "<p>body</p>");
    }

    #[test]
    fn test_list_uses_config_page_size_and_filters() {
        let mut session = full_session(30);
        let list = session
            .list(2, None, fields(json!({ "title": "文章" })))
            .unwrap();
        assert_eq!(list.page(), 2);
        assert_eq!(list.rows().len(), 10);
        assert_eq!(list.total(), 30);

        let calls = session.api.list_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["pageSize"], 20);
        assert_eq!(calls[0]["title"], "文章");
        assert_eq!(session.shell().active_key(), ARTICLE_ROUTE);
    }

    #[test]
    fn test_list_without_permission_is_denied() {
        let config = config_with(&["/dashboard"]);
        let mut session = Session::new(&config, FakeArticleApi::with_rows(3));
        let err = session.list(1, None, FormData::new()).unwrap_err();
        assert!(matches!(err, BackstageError::PermissionDenied(_)));
        assert!(session.api.list_calls().is_empty());
    }

    #[test]
    fn test_list_failure_reports_server_message() {
        let mut session = full_session(3);
        session.api.fail_next("服务器错误");
        let err = session.list(1, None, FormData::new()).unwrap_err();
        assert_eq!(err.to_string(), "服务器错误");
    }

    #[test]
    fn test_create_fills_template_and_returns_to_list() {
        let mut session = full_session(0);
        session
            .create(fields(json!({ "title": "新文章" })))
            .unwrap();

        let created = session.api.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0]["title"], "新文章");
        assert_eq!(created[0]["content"], "<h4>初始化内容</h4>");
        assert_eq!(session.shell().active_key(), ARTICLE_ROUTE);

        let notices = session.drain_notices();
        assert_eq!(notices.last().unwrap().content, "操作成功");
    }

    #[test]
    fn test_create_missing_required_field_fails() {
        let mut session = full_session(0);
        let err = session.create(FormData::new()).unwrap_err();
        assert_eq!(err.to_string(), "请填写: 标题");
        assert!(session.api.created().is_empty());
    }

    #[test]
    fn test_update_merges_fields_over_loaded_record() {
        let mut session = full_session(3);
        session
            .update("2", fields(json!({ "author": "editor" })))
            .unwrap();

        assert_eq!(session.api.get_calls(), vec!["2"]);
        let updated = session.api.updated();
        assert_eq!(updated[0].0, "2");
        assert_eq!(updated[0].1["title"], "文章 2");
        assert_eq!(updated[0].1["author"], "editor");
    }

    #[test]
    fn test_update_without_permission_is_denied() {
        let config = config_with(&["/content/article/index", "/content/article/create"]);
        let mut session = Session::new(&config, FakeArticleApi::with_rows(3));
        let err = session.update("1", FormData::new()).unwrap_err();
        assert!(matches!(err, BackstageError::PermissionDenied(_)));
    }

    #[test]
    fn test_delete_refetches_list() {
        let mut session = full_session(5);
        let list = session.delete("3").unwrap();
        assert_eq!(session.api.deleted(), vec!["3"]);
        assert_eq!(list.total(), 4);
        assert_eq!(session.api.list_calls().len(), 2);
        assert_eq!(session.drain_notices().last().unwrap().content, "删除成功");
    }

    #[test]
    fn test_show_requires_view_permission() {
        let mut session = full_session(2);
        assert_eq!(session.show("1").unwrap()["title"], "文章 1");

        let config = config_with(&["/dashboard"]);
        let mut session = Session::new(&config, FakeArticleApi::with_rows(2));
        assert!(session.show("1").is_err());
    }
}
