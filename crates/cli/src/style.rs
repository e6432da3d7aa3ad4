//! Terminal styling for CLI output.

use console::Style;

fn marked(mark: &str, style: Style, msg: &str) -> String {
    format!("{} {}", style.apply_to(mark), msg)
}

/// Green check mark prefix.
pub fn success(msg: &str) -> String {
    marked("✓", Style::new().green(), msg)
}

/// Red cross prefix.
pub fn error(msg: &str) -> String {
    marked("✗", Style::new().red(), msg)
}

/// Yellow warning prefix.
pub fn warn(msg: &str) -> String {
    marked("⚠", Style::new().yellow(), msg)
}

pub fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

pub fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}
