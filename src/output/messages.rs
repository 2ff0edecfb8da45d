//! Basic message output functions.

use super::colors::*;
use crate::notice::{Notice, NoticeLevel};

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{RED}{BOLD}Error:{RESET} {}", msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    println!("{YELLOW}Warning:{RESET} {}", msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{CYAN}Info:{RESET} {}", msg);
}

pub fn print_success(msg: &str) {
    println!("{GREEN}\u{2714} {}{RESET}", msg);
}

fn format_notice(notice: &Notice) -> String {
    let color = match notice.level {
        NoticeLevel::Success => GREEN,
        NoticeLevel::Info => CYAN,
        NoticeLevel::Warning => YELLOW,
        NoticeLevel::Error => RED,
    };
    format!(
        "{GRAY}{}{RESET} {color}{}{RESET}",
        notice.at.format("%H:%M:%S"),
        notice.content
    )
}

/// Print drained session notices, oldest first.
pub fn print_notices(notices: &[Notice]) {
    for notice in notices {
        println!("{}", format_notice(notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::Notices;

    #[test]
    fn test_format_notice_colors_by_level() {
        let mut notices = Notices::new();
        notices.success("删除成功");
        notices.error("服务器错误");
        let drained = notices.drain();

        let ok = format_notice(&drained[0]);
        assert!(ok.contains(GREEN));
        assert!(ok.contains("删除成功"));
        let err = format_notice(&drained[1]);
        assert!(err.contains(RED));
    }

    #[test]
    fn test_print_notices_smoke() {
        let mut notices = Notices::new();
        notices.warning("请填写: 标题");
        print_notices(&notices.drain());
        print_notices(&[]);
    }
}
