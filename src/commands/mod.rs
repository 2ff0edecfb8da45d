//! CLI command handlers.
//!
//! - [`articles`] - List, show, create, update and delete articles
//! - [`config`] - Show, set and reset configuration
//! - [`routes`] - Print the menu tree visible to the configured permissions
//! - [`console`] - Interactive terminal console

mod articles;
mod config;
mod console;
mod routes;

pub use articles::{
    articles_create_command, articles_delete_command, articles_list_command,
    articles_show_command, articles_update_command, parse_fields, Session,
};
pub use config::{config_display_command, config_reset_command, config_set_command};
pub use console::console_command;
pub use routes::routes_command;
