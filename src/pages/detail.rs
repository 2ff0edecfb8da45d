//! CRUD detail page controller (create / edit form).

use super::{Generation, PageDef};
use crate::api::{ApiMessage, CrudApi, FormData};
use crate::error::Result;
use crate::location::{Location, Navigator};
use crate::menu::form_title;
use crate::notice::Notices;
use crate::permissions::{PagePermission, PermissionSet};
use crate::shell::Shell;
use crate::store::Tab;
use serde_json::Value;
use tracing::{debug, info, warn};

/// A pending record load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub token: u64,
    pub id: String,
}

impl LoadRequest {
    pub fn send<A: CrudApi + ?Sized>(&self, api: &A) -> Result<FormData> {
        api.get_by_id(&self.id)
    }
}

/// A pending create (no id) or update.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub token: u64,
    pub id: Option<String>,
    pub record: FormData,
}

impl SubmitRequest {
    pub fn send<A: CrudApi + ?Sized>(&self, api: &A) -> Result<ApiMessage> {
        match &self.id {
            Some(id) => api.update(id, &self.record),
            None => api.create(&self.record),
        }
    }
}

#[derive(Debug)]
pub struct DetailPage {
    def: &'static PageDef,
    location: Location,
    id: Option<String>,
    permission: PagePermission,
    /// Values the form resets to.
    initial: FormData,
    data: FormData,
    requests: Generation,
    mounted: bool,
}

impl DetailPage {
    /// Build the page for `location`; the record id comes from its `id`
    /// query parameter.
    pub fn new(def: &'static PageDef, location: Location, permissions: &PermissionSet) -> Self {
        let id = location.param("id");
        Self {
            def,
            id,
            location,
            permission: PagePermission::derive(def.permission_prefix, permissions),
            initial: FormData::new(),
            data: FormData::new(),
            requests: Generation::default(),
            mounted: false,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_update(&self) -> bool {
        self.id.is_some()
    }

    /// Update flag when editing, create flag when creating.
    pub fn is_allowed(&self) -> bool {
        if self.is_update() {
            self.permission.update
        } else {
            self.permission.create
        }
    }

    pub fn is_loading(&self) -> bool {
        self.requests.is_busy()
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn def(&self) -> &'static PageDef {
        self.def
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Tab for this page: `新增<title>` or `编辑<title>(<id>)`.
    pub fn tab(&self) -> Tab {
        let title = form_title(self.def.title, self.id.as_deref());
        let mut nav: Vec<String> = self.def.nav_prefix.iter().map(|s| s.to_string()).collect();
        nav.push(title.clone());
        Tab::new(self.location.uri(), title, nav)
    }

    /// Mount: register the tab, expand the parent menu, then either request
    /// the record (edit) or start from the create template.
    pub fn mount<N: Navigator>(&mut self, shell: &mut Shell<N>) -> Option<LoadRequest> {
        self.mounted = true;
        shell.expand_menu_for(self.def.list_route);
        shell.open_tab(self.tab());

        if !self.is_allowed() {
            debug!(route = %self.location, "detail page not permitted");
            return None;
        }
        match self.id.clone() {
            Some(id) => {
                let token = self.requests.issue();
                Some(LoadRequest { token, id })
            }
            None => {
                self.initial = self.def.create_template();
                self.data = self.initial.clone();
                None
            }
        }
    }

    pub fn apply_load(&mut self, token: u64, result: Result<FormData>, notices: &mut Notices) -> bool {
        if !self.requests.settle(token) {
            return false;
        }
        match result {
            Ok(record) => {
                self.initial = record;
                self.data = self.initial.clone();
            }
            Err(e) => {
                warn!(error = %e, "record load failed");
                notices.error(e.notice_text());
            }
        }
        true
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) {
        self.data.insert(name.to_string(), value.into());
    }

    /// Restore the form to its initial values.
    pub fn reset(&mut self) {
        self.data = self.initial.clone();
    }

    /// Validate and submit the form. Returns `None` without the matching
    /// permission, while a request is outstanding, or when required fields
    /// are blank (a warning notice is raised).
    pub fn submit(&mut self, notices: &mut Notices) -> Option<SubmitRequest> {
        if !self.mounted || !self.is_allowed() || self.is_loading() {
            return None;
        }
        let missing = self.def.missing_required(&self.data);
        if !missing.is_empty() {
            notices.warning(format!("请填写: {}", missing.join(", ")));
            return None;
        }
        let token = self.requests.issue();
        Some(SubmitRequest {
            token,
            id: self.id.clone(),
            record: self.data.clone(),
        })
    }

    /// Apply a submit result. On success: notice, form reset, the list
    /// route's cached view is discarded and the detail tab closes back to the
    /// list. On failure the form keeps its values and nothing navigates.
    pub fn apply_submit<N: Navigator>(
        &mut self,
        token: u64,
        result: Result<ApiMessage>,
        shell: &mut Shell<N>,
    ) -> bool {
        if !self.requests.settle(token) {
            return false;
        }
        match result {
            Ok(msg) => {
                shell.notices_mut().success(msg.text_or("操作成功"));
                info!(route = %self.location, "record saved");
                shell.drop_view(self.def.list_route);
                self.go_back(shell);
                true
            }
            Err(e) => {
                warn!(error = %e, "submit failed");
                shell.notices_mut().error(e.notice_text());
                false
            }
        }
    }

    /// Reset the form and close this tab, returning to the list route.
    pub fn go_back<N: Navigator>(&mut self, shell: &mut Shell<N>) {
        self.reset();
        self.unmount();
        shell.close_tab_go_next(&self.location.uri(), self.def.list_route);
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
        self.requests.reset();
    }

    /// Mount and load against `api` right away.
    pub fn mount_now<N: Navigator, A: CrudApi + ?Sized>(&mut self, shell: &mut Shell<N>, api: &A) {
        if let Some(req) = self.mount(shell) {
            let result = req.send(api);
            self.apply_load(req.token, result, shell.notices_mut());
        }
    }

    /// Submit against `api` right away. True when the record was saved.
    pub fn submit_now<N: Navigator, A: CrudApi + ?Sized>(&mut self, shell: &mut Shell<N>, api: &A) -> bool {
        let Some(req) = self.submit(shell.notices_mut()) else {
            return false;
        };
        let result = req.send(api);
        self.apply_submit(req.token, result, shell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::article::ARTICLE_PAGE;
    use crate::test_utils::{full_permissions, shell_at, FakeArticleApi};
    use serde_json::json;

    fn page_at(route: &str, perms: &PermissionSet) -> DetailPage {
        DetailPage::new(&ARTICLE_PAGE, Location::parse(route), perms)
    }

    #[test]
    fn test_create_mount_uses_template() {
        let mut shell = shell_at("/content/article/option");
        let api = FakeArticleApi::with_rows(1);
        let mut page = page_at("/content/article/option", &full_permissions());
        page.mount_now(&mut shell, &api);

        assert!(!page.is_update());
        assert_eq!(page.data()["content"], "<h4>初始化内容</h4>");
        assert_eq!(api.get_calls().len(), 0);
        let tab = page.tab();
        assert_eq!(tab.label, "新增文章管理");
        assert_eq!(tab.nav, vec!["内容管理", "文章管理", "新增文章管理"]);
    }

    #[test]
    fn test_edit_mount_loads_record() {
        let mut shell = shell_at("/content/article/option?id=3");
        let api = FakeArticleApi::with_rows(5);
        let mut page = page_at("/content/article/option?id=3", &full_permissions());
        page.mount_now(&mut shell, &api);

        assert_eq!(page.id(), Some("3"));
        assert_eq!(api.get_calls(), vec!["3"]);
        assert_eq!(page.data()["title"], "文章 3");
        assert_eq!(page.tab().label, "编辑文章管理(3)");
        assert_eq!(
            shell.state().menu.open_keys,
            vec!["/content", "/content/article-manage"]
        );
    }

    #[test]
    fn test_mount_without_permission_loads_nothing() {
        let mut shell = shell_at("/content/article/option?id=3");
        let api = FakeArticleApi::with_rows(5);
        let perms = PermissionSet::new(["/content/article/index", "/content/article/create"]);
        let mut page = page_at("/content/article/option?id=3", &perms);
        page.mount_now(&mut shell, &api);

        assert!(!page.is_allowed());
        assert!(api.get_calls().is_empty());
        assert!(page.submit(shell.notices_mut()).is_none());
    }

    #[test]
    fn test_create_submit_navigates_back_and_invalidates_list() {
        let mut shell = shell_at("/content/article");
        let api = FakeArticleApi::with_rows(2);
        shell.navigate("/content/article/option");
        shell.take_discarded();

        let mut page = page_at("/content/article/option", &full_permissions());
        page.mount_now(&mut shell, &api);
        page.set_field("title", "新文章");
        assert!(page.submit_now(&mut shell, &api));

        assert_eq!(api.created().len(), 1);
        assert_eq!(api.created()[0]["title"], "新文章");
        assert_eq!(shell.navigator().uri(), "/content/article");
        assert_eq!(shell.active_key(), "/content/article");
        assert!(!shell.tabs().iter().any(|t| t.key == "/content/article/option"));
        let discarded = shell.take_discarded();
        assert!(discarded.contains(&"/content/article".to_string()));
        assert_eq!(shell.notices().latest().unwrap().content, "操作成功");
    }

    #[test]
    fn test_update_submit_dispatches_update() {
        let mut shell = shell_at("/content/article/option?id=2");
        let api = FakeArticleApi::with_rows(2);
        let mut page = page_at("/content/article/option?id=2", &full_permissions());
        page.mount_now(&mut shell, &api);
        page.set_field("title", "改过的");
        assert!(page.submit_now(&mut shell, &api));

        assert!(api.created().is_empty());
        let updated = api.updated();
        assert_eq!(updated[0].0, "2");
        assert_eq!(updated[0].1["title"], "改过的");
    }

    #[test]
    fn test_submit_failure_keeps_form_and_location() {
        let mut shell = shell_at("/content/article/option");
        let api = FakeArticleApi::with_rows(0);
        let mut page = page_at("/content/article/option", &full_permissions());
        page.mount_now(&mut shell, &api);
        page.set_field("title", "draft");

        api.fail_next("标题重复");
        assert!(!page.submit_now(&mut shell, &api));
        assert_eq!(page.data()["title"], "draft");
        assert!(!page.is_loading());
        assert_eq!(shell.navigator().uri(), "/content/article/option");
        assert_eq!(shell.notices().latest().unwrap().content, "标题重复");

        assert!(page.submit_now(&mut shell, &api));
    }

    #[test]
    fn test_submit_requires_fields() {
        let mut shell = shell_at("/content/article/option");
        let api = FakeArticleApi::with_rows(0);
        let mut page = page_at("/content/article/option", &full_permissions());
        page.mount_now(&mut shell, &api);

        assert!(page.submit(shell.notices_mut()).is_none());
        assert_eq!(shell.notices().latest().unwrap().content, "请填写: 标题");
        assert!(api.created().is_empty());
    }

    #[test]
    fn test_stale_load_after_unmount() {
        let mut shell = shell_at("/content/article/option?id=1");
        let mut page = page_at("/content/article/option?id=1", &full_permissions());
        let req = page.mount(&mut shell).unwrap();
        page.unmount();

        let record = json!({ "title": "late" }).as_object().cloned().unwrap();
        assert!(!page.apply_load(req.token, Ok(record), shell.notices_mut()));
        assert!(page.data().is_empty());
    }

    #[test]
    fn test_go_back_resets_and_closes_tab() {
        let mut shell = shell_at("/content/article");
        let api = FakeArticleApi::with_rows(1);
        shell.navigate("/content/article/option?id=1");
        let mut page = page_at("/content/article/option?id=1", &full_permissions());
        page.mount_now(&mut shell, &api);
        page.set_field("title", "changed");

        page.go_back(&mut shell);
        assert_eq!(page.data()["title"], "文章 1");
        assert_eq!(shell.navigator().uri(), "/content/article");
        assert_eq!(shell.tabs().len(), 1);
    }
}
