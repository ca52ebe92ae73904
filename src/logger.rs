//! Terminal logging with colored module prefixes.
//!
//! ```ignore
//! log!("query"; "blog: {} of {} nodes", kept, total);
//! // [query] blog: 12 of 14 nodes
//! ```
//!
//! Messages go to stderr so that command output on stdout (e.g. `folio query`)
//! stays pipeable. Single-line messages are truncated to the terminal width.

use colored::{ColoredString, Colorize};
use crossterm::terminal::size;
use std::{
    io::{Write, stderr},
    sync::OnceLock,
};

static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// `[` and `]`
const BRACKET_LEN: usize = 2;
const SPACE_AFTER_PREFIX: usize = 1;

/// Display length of `[module] ` for a module name of `module_len` bytes.
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Columns available for a log line; 120 when stderr is not a terminal.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

/// `log!("module"; "format", args..)` writes `[module] message` to stderr.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Write one log line to stderr.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let width = get_terminal_width() as usize;
    let message = fit_message(module, message, width);

    let mut stderr = stderr().lock();
    writeln!(stderr, "{prefix} {message}").ok();
    stderr.flush().ok();
}

/// Truncate single-line messages so prefix and message fit in `width`.
///
/// Multiline messages (diagnostics) are never truncated.
fn fit_message<'a>(module: &str, message: &'a str, width: usize) -> &'a str {
    if message.contains('\n') {
        return message;
    }
    let max_len = width.saturating_sub(calc_prefix_len(module.len()));
    truncate_str(message, max_len)
}

/// Failures red, warnings magenta, build results green.
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.bright_magenta().bold(),
        "build" | "emit" => prefix.bright_green().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes on a char boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_prefix_len() {
        // "query" -> "[query] " = 5 + 2 + 1
        assert_eq!(calc_prefix_len(5), 8);
        assert_eq!(calc_prefix_len(0), 3);
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 5), "hello");
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("", 0), "");
    }

    #[test]
    fn test_truncate_str_unicode_boundary() {
        // "€" is 3 bytes; cutting at 4 must back off to 3
        assert_eq!(truncate_str("€€", 4), "€");
        assert_eq!(truncate_str("€€", 2), "");
    }

    #[test]
    fn test_fit_message_respects_width() {
        // "[bind] " takes 7 columns, leaving 5
        assert_eq!(fit_message("bind", "blog: skipped", 12), "blog:");
        assert_eq!(fit_message("bind", "ok", 12), "ok");
    }

    #[test]
    fn test_fit_message_keeps_multiline() {
        let message = "build failed\ncollection `blog`";
        assert_eq!(fit_message("error", message, 10), message);
    }

    #[test]
    fn test_colorize_prefix_contains_module() {
        assert!(colorize_prefix("warn").to_string().contains("[warn]"));
        assert!(colorize_prefix("Query").to_string().contains("[Query]"));
    }
}
