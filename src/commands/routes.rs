use crate::config::Config;
use crate::error::Result;
use crate::menu::{visible_entries, MenuEntry, DEFAULT_MENUS};
use crate::output::{print_warning, BOLD, GRAY, RESET};
use crate::permissions::PermissionSet;

/// Print the sidebar tree visible to the configured permissions.
pub fn routes_command(config: &Config) -> Result<()> {
    let permissions = PermissionSet::new(config.permissions.iter().cloned());
    if permissions.is_empty() {
        print_warning("No permissions configured; the console opens no tabs until some are set.");
        return Ok(());
    }
    for line in render_entries(&visible_entries(DEFAULT_MENUS, &permissions)) {
        println!("{}", line);
    }
    Ok(())
}

fn render_entries(entries: &[MenuEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| {
            let indent = "  ".repeat(e.depth);
            if e.is_group {
                format!("{}{BOLD}{}{RESET}", indent, e.label)
            } else {
                format!("{}{}  {GRAY}{}{RESET}", indent, e.label, e.key)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::full_permissions;

    #[test]
    fn test_render_entries_indents_by_depth() {
        let lines = render_entries(&visible_entries(DEFAULT_MENUS, &full_permissions()));
        assert!(lines[0].starts_with("仪表盘"));
        assert!(lines.iter().any(|l| l.starts_with("    文章列表") && l.contains("/content/article")));
    }

    #[test]
    fn test_routes_command_without_permissions() {
        routes_command(&Config::default()).unwrap();
    }
}
