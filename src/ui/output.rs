//! Themed terminal output
//!
//! Everything except errors is dropped when `KEMIST_QUIET` is set.

use crate::output::is_quiet;
use crate::ui::{Icons, theme};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::FLASK, text.style(theme().header.clone()));
}

pub fn status(icon: &str, label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}: {}", icon, label.style(theme().dim.clone()), value.style(theme().value.clone()));
}

pub fn success(label: &str) {
    if is_quiet() {
        return;
    }
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    if is_quiet() {
        return;
    }
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn section(title: &str) {
    if is_quiet() {
        return;
    }
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn summary_row(label: &str, value: &str) {
    if is_quiet() {
        return;
    }
    println!("  {} {}", label.style(theme().dim.clone()), value.style(theme().value.clone()));
}

/// Print a block produced elsewhere (tables, reports) as is
pub fn block(text: &str) {
    if is_quiet() || text.is_empty() {
        return;
    }
    println!("{}", text.trim_end());
}

pub fn name(text: &str) -> String {
    text.style(theme().name.clone()).to_string()
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

/// One line per skipped or unmatched molecule, under a warning
pub fn name_list(title: &str, names: &[String]) {
    if names.is_empty() {
        return;
    }
    warn(&format!("{} ({})", title, names.len()));
    if is_quiet() {
        return;
    }
    for entry in names {
        println!("  {} {}", dim("-"), name(entry));
    }
}
