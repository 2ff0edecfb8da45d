pub mod api;
pub mod commands;
pub mod completion;
pub mod config;
pub mod error;
pub mod keepalive;
pub mod location;
pub mod logging;
pub mod menu;
pub mod notice;
pub mod output;
pub mod pages;
pub mod permissions;
pub mod shell;
pub mod store;
pub mod tui;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::{ApiMessage, CrudApi, FormData, HttpClient, PageResult, ResourceApi};
pub use config::Config;
pub use error::{BackstageError, Result};
pub use keepalive::ViewCache;
pub use location::{History, Location, Navigator};
pub use notice::{Notice, Notices};
pub use pages::{DetailPage, ListPage};
pub use permissions::{PagePermission, PermissionSet};
pub use shell::{Shell, ShellOptions};
pub use store::{Action, AppState, Store, Tab};
