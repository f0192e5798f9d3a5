//! ANSI color helpers for terminal output

use colored::Colorize;

/// Get colored file path
pub fn colored_path(path: &str) -> String {
    path.cyan().to_string()
}

/// Get colored line number
pub fn colored_line_num(num: i64) -> String {
    format!("{:>5}", num).white().dimmed().to_string()
}

/// Get colored header
pub fn header(text: &str) -> String {
    text.bold().underline().to_string()
}

/// Get colored label
pub fn label(text: &str) -> String {
    text.white().dimmed().to_string()
}

/// Get colored value
pub fn value(text: &str) -> String {
    text.white().to_string()
}

/// Get colored progress message
pub fn progress(text: &str) -> String {
    text.dimmed().to_string()
}

/// Get highlighted match text
pub fn highlight(text: &str) -> String {
    text.black().on_yellow().to_string()
}

/// Get colored success message
pub fn success(text: &str) -> String {
    format!("{} {}", "✓".green(), text)
}

/// Get colored warning message
pub fn warning(text: &str) -> String {
    format!("{} {}", "⚠".yellow(), text)
}

/// Get colored error message
pub fn error(text: &str) -> String {
    format!("{} {}", "✗".red(), text)
}

/// Format count with comma separators
pub fn format_count(n: i64) -> String {
    let s = n.unsigned_abs().to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3 + 1);
    if n < 0 {
        result.push('-');
    }

    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result
}
