use crate::config::{log_path, Config};
use crate::error::Result;
use crate::logging;
use crate::output::print_warning;
use crate::tui;

/// Open the interactive console. Logs go to a file while the console owns
/// the terminal.
pub fn console_command(config: &Config, verbose: bool) -> Result<()> {
    let path = log_path()?;
    logging::init_file(&path, verbose)?;
    if config.permissions.is_empty() {
        print_warning("No permissions configured; set some with `backstage config set permissions ...`");
    }
    tui::run_console(config)
}
