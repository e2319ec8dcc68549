//! Console helpers for the diagnostic binaries

use colored::Colorize;

pub fn print_success(msg: &str) {
    println!("{} {}", "✅".green(), msg);
}

pub fn print_error(msg: &str) {
    println!("{} {}", "❌".red(), msg);
}

pub fn print_warning(msg: &str) {
    println!("{}  {}", "⚠️".yellow(), msg);
}

pub fn print_info(msg: &str) {
    println!("{}  {}", "ℹ️".blue(), msg);
}

/// `label: value` line, indented under a heading
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("   {} {}", format!("{label}:").bold(), value);
}

/// Render a selector probe as `present`/`absent`
pub fn presence(present: bool) -> String {
    if present {
        "present".green().to_string()
    } else {
        "absent".red().to_string()
    }
}
