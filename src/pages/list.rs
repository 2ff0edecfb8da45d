//! CRUD list page controller.
//!
//! Holds the list query state (page, page size, filters, total, rows) and
//! the permission flags of one entity page. A fetch always replaces rows and
//! total together; a delete never edits rows locally but re-issues the
//! current query.

use super::{Generation, PageDef};
use crate::api::{ApiMessage, CrudApi, FormData, PageResult};
use crate::error::Result;
use crate::location::{Location, Navigator};
use crate::notice::Notices;
use crate::permissions::{PagePermission, PermissionSet};
use crate::shell::Shell;
use serde_json::Value;
use tracing::{debug, warn};

/// A pending collection fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub token: u64,
    pub query: FormData,
}

impl ListRequest {
    pub fn send<A: CrudApi + ?Sized>(&self, api: &A) -> Result<PageResult> {
        api.list(&self.query)
    }
}

/// A pending delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub token: u64,
    pub id: String,
}

impl DeleteRequest {
    pub fn send<A: CrudApi + ?Sized>(&self, api: &A) -> Result<ApiMessage> {
        api.delete(&self.id)
    }
}

#[derive(Debug)]
pub struct ListPage {
    def: &'static PageDef,
    permission: PagePermission,
    page: u32,
    page_size: u32,
    total: u64,
    rows: Vec<FormData>,
    filters: FormData,
    requests: Generation,
    mounted: bool,
}

impl ListPage {
    /// Build the page for `def`, deriving its flags from `permissions`.
    pub fn new(def: &'static PageDef, permissions: &PermissionSet) -> Self {
        Self {
            def,
            permission: PagePermission::derive(def.permission_prefix, permissions),
            page: 1,
            page_size: def.default_page_size,
            total: 0,
            rows: Vec::new(),
            filters: FormData::new(),
            requests: Generation::default(),
            mounted: false,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn def(&self) -> &'static PageDef {
        self.def
    }

    pub fn permission(&self) -> PagePermission {
        self.permission
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn rows(&self) -> &[FormData] {
        &self.rows
    }

    pub fn filters(&self) -> &FormData {
        &self.filters
    }

    /// True while a fetch or delete is outstanding; search, pagination and
    /// row actions are disabled meanwhile.
    pub fn is_loading(&self) -> bool {
        self.requests.is_busy()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Number of pages for the current total, at least 1.
    pub fn page_count(&self) -> u32 {
        let size = u64::from(self.page_size.max(1));
        u32::try_from(self.total.div_ceil(size).max(1)).unwrap_or(u32::MAX)
    }

    // ========================================================================
    // Fetching
    // ========================================================================

    /// Mount the page: without the view flag nothing is fetched, otherwise
    /// the first page is requested with default paging.
    pub fn mount(&mut self) -> Option<ListRequest> {
        self.mounted = true;
        if !self.permission.page {
            debug!(prefix = self.def.permission_prefix, "list page not permitted");
            return None;
        }
        self.page = 1;
        Some(self.issue())
    }

    /// Mount with an initial query instead of the default first page.
    pub fn mount_with_query(&mut self, filters: FormData, page: u32) -> Option<ListRequest> {
        self.mounted = true;
        if !self.permission.page {
            return None;
        }
        self.filters = filters;
        self.page = page.max(1);
        Some(self.issue())
    }

    /// Submit the search form: back to page 1, same page size.
    pub fn search(&mut self, values: FormData) -> Option<ListRequest> {
        if !self.can_fetch() {
            return None;
        }
        self.filters = values;
        self.page = 1;
        Some(self.issue())
    }

    /// Move to `page` with `page_size`, keeping the current filters.
    pub fn change_page(&mut self, page: u32, page_size: u32) -> Option<ListRequest> {
        if !self.can_fetch() {
            return None;
        }
        self.page = page.max(1);
        self.page_size = page_size.max(1);
        Some(self.issue())
    }

    /// Re-issue the current query.
    pub fn reload(&mut self) -> Option<ListRequest> {
        if !self.can_fetch() {
            return None;
        }
        Some(self.issue())
    }

    fn can_fetch(&self) -> bool {
        if !self.mounted || !self.permission.page {
            return false;
        }
        if self.is_loading() {
            debug!("list request already in flight; ignored");
            return false;
        }
        true
    }

    fn issue(&mut self) -> ListRequest {
        let mut query = self.filters.clone();
        query.insert("page".to_string(), Value::from(self.page));
        query.insert("pageSize".to_string(), Value::from(self.page_size));
        let token = self.requests.issue();
        debug!(token, page = self.page, page_size = self.page_size, "list fetch issued");
        ListRequest { token, query }
    }

    /// Apply a fetch result. Rows and total are replaced together on success;
    /// a failure leaves them untouched and raises an error notice.
    pub fn apply_list(
        &mut self,
        token: u64,
        result: Result<PageResult>,
        notices: &mut Notices,
    ) -> bool {
        if !self.requests.settle(token) {
            return false;
        }
        match result {
            Ok(page) => {
                self.rows = page.items;
                self.total = page.total;
            }
            Err(e) => {
                warn!(error = %e, "list fetch failed");
                notices.error(e.notice_text());
            }
        }
        true
    }

    /// Run `request` against `api` right away and apply the result.
    pub fn fetch_now<A: CrudApi + ?Sized>(
        &mut self,
        api: &A,
        request: Option<ListRequest>,
        notices: &mut Notices,
    ) -> bool {
        match request {
            Some(req) => {
                let result = req.send(api);
                self.apply_list(req.token, result, notices)
            }
            None => false,
        }
    }

    // ========================================================================
    // Row actions
    // ========================================================================

    /// Delete the record `id`. Requires the delete flag and an idle page.
    pub fn delete(&mut self, id: &str) -> Option<DeleteRequest> {
        if !self.permission.delete || !self.can_fetch() {
            return None;
        }
        let token = self.requests.issue();
        Some(DeleteRequest {
            token,
            id: id.to_string(),
        })
    }

    /// Apply a delete result. On success a notice is raised and the current
    /// query is re-issued; the returned request must be executed by the host.
    pub fn apply_delete(
        &mut self,
        token: u64,
        result: Result<ApiMessage>,
        notices: &mut Notices,
    ) -> Option<ListRequest> {
        if !self.requests.settle(token) {
            return None;
        }
        match result {
            Ok(msg) if msg.is_success() => {
                notices.success(msg.text_or("删除成功"));
                self.reload()
            }
            Ok(msg) => {
                notices.error(msg.text_or("删除失败"));
                None
            }
            Err(e) => {
                warn!(error = %e, "delete failed");
                notices.error(e.notice_text());
                None
            }
        }
    }

    /// Delete `id` against `api` right away, then re-fetch on success.
    pub fn delete_now<A: CrudApi + ?Sized>(&mut self, api: &A, id: &str, notices: &mut Notices) -> bool {
        let Some(req) = self.delete(id) else {
            return false;
        };
        let result = req.send(api);
        let refetch = self.apply_delete(req.token, result, notices);
        let deleted = refetch.is_some();
        self.fetch_now(api, refetch, notices);
        deleted
    }

    /// Route of the create form.
    pub fn create_route(&self) -> String {
        self.def.option_route.to_string()
    }

    /// Route of the edit form for `id`.
    pub fn update_route(&self, id: &str) -> String {
        Location::with_query(self.def.option_route, [("id", id)]).uri()
    }

    /// Open the create form. No-op without the create flag.
    pub fn on_create<N: Navigator>(&self, shell: &mut Shell<N>) -> bool {
        if !self.permission.create {
            return false;
        }
        shell.navigate(&self.create_route());
        true
    }

    /// Open the edit form for `id`. No-op without the update flag.
    pub fn on_update<N: Navigator>(&self, shell: &mut Shell<N>, id: &str) -> bool {
        if !self.permission.update {
            return false;
        }
        shell.navigate(&self.update_route(id));
        true
    }

    /// Unmount: anything still in flight becomes stale.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.requests.reset();
    }
}
