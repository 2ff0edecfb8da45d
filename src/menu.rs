//! Static menu and route table.
//!
//! The table drives three things: resolving a location into a [`Tab`] (label
//! and breadcrumb), the sidebar entries visible to a permission set, and the
//! group keys to expand for a given route.

use crate::location::Location;
use crate::permissions::{has_permission, PermissionSet};
use crate::store::Tab;

/// What a menu entry is.
#[derive(Debug)]
pub enum MenuKind {
    /// Expandable group of child entries.
    Group(&'static [MenuItem]),
    /// Routable page shown in the sidebar.
    Page,
    /// Hidden create/edit form route. The title is derived from the `id` query
    /// parameter: `新增<noun>` without it, `编辑<noun>(<id>)` with it.
    Form { noun: &'static str },
}

#[derive(Debug)]
pub struct MenuItem {
    pub key: &'static str,
    pub label: &'static str,
    /// Permission required to see the entry. `None` means always visible.
    pub rule: Option<&'static str>,
    pub kind: MenuKind,
}

/// Route of the dashboard page.
pub const DASHBOARD_ROUTE: &str = "/dashboard";
/// Route of the article list page.
pub const ARTICLE_ROUTE: &str = "/content/article";
/// Route of the article create/edit page.
pub const ARTICLE_OPTION_ROUTE: &str = "/content/article/option";

static ARTICLE_MENUS: &[MenuItem] = &[
    MenuItem {
        key: ARTICLE_ROUTE,
        label: "文章列表",
        rule: Some("/content/article/index"),
        kind: MenuKind::Page,
    },
    MenuItem {
        key: ARTICLE_OPTION_ROUTE,
        label: "文章管理",
        rule: None,
        kind: MenuKind::Form { noun: "文章管理" },
    },
];

static CONTENT_MENUS: &[MenuItem] = &[MenuItem {
    key: "/content/article-manage",
    label: "文章管理",
    rule: None,
    kind: MenuKind::Group(ARTICLE_MENUS),
}];

/// The console's menu table.
pub static DEFAULT_MENUS: &[MenuItem] = &[
    MenuItem {
        key: DASHBOARD_ROUTE,
        label: "仪表盘",
        rule: Some("/dashboard"),
        kind: MenuKind::Page,
    },
    MenuItem {
        key: "/content",
        label: "内容管理",
        rule: None,
        kind: MenuKind::Group(CONTENT_MENUS),
    },
];

fn permitted(item: &MenuItem, permissions: &PermissionSet) -> bool {
    item.rule.is_none_or(|rule| has_permission(rule, permissions))
}

/// Resolve a location against the menu table.
///
/// Returns `None` for unknown routes and for pages the permission set does not
/// grant; callers fall back to [`fallback_tab`].
pub fn resolve_tab(
    menus: &[MenuItem],
    location: &Location,
    permissions: &PermissionSet,
) -> Option<Tab> {
    let mut trail = Vec::new();
    resolve_in(menus, location, permissions, &mut trail)
}

fn resolve_in(
    menus: &[MenuItem],
    location: &Location,
    permissions: &PermissionSet,
    trail: &mut Vec<String>,
) -> Option<Tab> {
    for item in menus {
        if !permitted(item, permissions) {
            continue;
        }
        match &item.kind {
            MenuKind::Group(children) => {
                trail.push(item.label.to_string());
                if let Some(tab) = resolve_in(children, location, permissions, trail) {
                    return Some(tab);
                }
                trail.pop();
            }
            MenuKind::Page if item.key == location.path => {
                let mut nav = trail.clone();
                nav.push(item.label.to_string());
                return Some(Tab::new(location.uri(), item.label, nav));
            }
            MenuKind::Form { noun } if item.key == location.path => {
                let title = form_title(noun, location.param("id").as_deref());
                let mut nav = trail.clone();
                nav.push(title.clone());
                return Some(Tab::new(location.uri(), title, nav));
            }
            _ => {}
        }
    }
    None
}

/// Title of a create/edit form page.
pub fn form_title(noun: &str, id: Option<&str>) -> String {
    match id {
        Some(id) => format!("编辑{noun}({id})"),
        None => format!("新增{noun}"),
    }
}

/// Tab used when a location does not resolve: keyed and labelled by the
/// location itself, no breadcrumb.
pub fn fallback_tab(location: &Location) -> Tab {
    let uri = location.uri();
    Tab::new(uri.clone(), uri, Vec::new())
}

/// Keys of the groups enclosing `route`, outermost first. Empty when the
/// route is top-level or unknown.
pub fn open_keys_for(menus: &[MenuItem], route: &str) -> Vec<String> {
    fn walk(menus: &[MenuItem], route: &str, trail: &mut Vec<String>) -> bool {
        for item in menus {
            match &item.kind {
                MenuKind::Group(children) => {
                    trail.push(item.key.to_string());
                    if walk(children, route, trail) {
                        return true;
                    }
                    trail.pop();
                }
                _ if item.key == route => return true,
                _ => {}
            }
        }
        false
    }

    let mut trail = Vec::new();
    if walk(menus, route, &mut trail) {
        trail
    } else {
        Vec::new()
    }
}

/// A flattened sidebar row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub depth: usize,
    pub key: &'static str,
    pub label: &'static str,
    pub is_group: bool,
}

/// Sidebar rows visible to `permissions`, depth-first. Hidden form routes are
/// skipped, and so are groups with nothing visible inside.
pub fn visible_entries(menus: &[MenuItem], permissions: &PermissionSet) -> Vec<MenuEntry> {
    fn walk(
        menus: &[MenuItem],
        permissions: &PermissionSet,
        depth: usize,
        out: &mut Vec<MenuEntry>,
    ) {
        for item in menus {
            if !permitted(item, permissions) {
                continue;
            }
            match &item.kind {
                MenuKind::Group(children) => {
                    let mut inner = Vec::new();
                    walk(children, permissions, depth + 1, &mut inner);
                    if !inner.is_empty() {
                        out.push(MenuEntry {
                            depth,
                            key: item.key,
                            label: item.label,
                            is_group: true,
                        });
                        out.extend(inner);
                    }
                }
                MenuKind::Page => out.push(MenuEntry {
                    depth,
                    key: item.key,
                    label: item.label,
                    is_group: false,
                }),
                MenuKind::Form { .. } => {}
            }
        }
    }

    let mut out = Vec::new();
    walk(menus, permissions, 0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_permissions() -> PermissionSet {
        PermissionSet::new([
            "/dashboard",
            "/content/article/index",
            "/content/article/create",
            "/content/article/update",
            "/content/article/delete",
        ])
    }

    #[test]
    fn test_resolve_article_list() {
        let tab = resolve_tab(
            DEFAULT_MENUS,
            &Location::parse("/content/article"),
            &all_permissions(),
        )
        .unwrap();
        assert_eq!(tab.key, "/content/article");
        assert_eq!(tab.label, "文章列表");
        assert_eq!(tab.nav, vec!["内容管理", "文章管理", "文章列表"]);
    }

    #[test]
    fn test_resolve_requires_permission() {
        let perms = PermissionSet::new(["/dashboard"]);
        assert!(resolve_tab(DEFAULT_MENUS, &Location::parse("/content/article"), &perms).is_none());
        assert!(resolve_tab(DEFAULT_MENUS, &Location::parse("/dashboard"), &perms).is_some());
    }

    #[test]
    fn test_resolve_form_titles() {
        let perms = all_permissions();
        let create = resolve_tab(
            DEFAULT_MENUS,
            &Location::parse("/content/article/option"),
            &perms,
        )
        .unwrap();
        assert_eq!(create.label, "新增文章管理");
        assert_eq!(create.nav, vec!["内容管理", "文章管理", "新增文章管理"]);

        let edit = resolve_tab(
            DEFAULT_MENUS,
            &Location::parse("/content/article/option?id=7"),
            &perms,
        )
        .unwrap();
        assert_eq!(edit.key, "/content/article/option?id=7");
        assert_eq!(edit.label, "编辑文章管理(7)");
    }

    #[test]
    fn test_resolve_unknown_route() {
        let loc = Location::parse("/nowhere?x=1");
        assert!(resolve_tab(DEFAULT_MENUS, &loc, &all_permissions()).is_none());
        let tab = fallback_tab(&loc);
        assert_eq!(tab.key, "/nowhere?x=1");
        assert_eq!(tab.label, "/nowhere?x=1");
        assert!(tab.nav.is_empty());
    }

    #[test]
    fn test_open_keys_for_nested_route() {
        assert_eq!(
            open_keys_for(DEFAULT_MENUS, ARTICLE_ROUTE),
            vec!["/content", "/content/article-manage"]
        );
        assert!(open_keys_for(DEFAULT_MENUS, DASHBOARD_ROUTE).is_empty());
        assert!(open_keys_for(DEFAULT_MENUS, "/missing").is_empty());
    }

    #[test]
    fn test_visible_entries_hide_empty_groups_and_forms() {
        let entries = visible_entries(DEFAULT_MENUS, &PermissionSet::new(["/dashboard"]));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, DASHBOARD_ROUTE);

        let entries = visible_entries(DEFAULT_MENUS, &all_permissions());
        let keys: Vec<_> = entries.iter().map(|e| e.key).collect();
        assert_eq!(
            keys,
            vec![
                DASHBOARD_ROUTE,
                "/content",
                "/content/article-manage",
                ARTICLE_ROUTE
            ]
        );
        assert_eq!(entries[3].depth, 2);
    }
}
