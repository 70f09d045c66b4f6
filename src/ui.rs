use colored::{ColoredString, Colorize};
use declarative::{Change, ConditionStatus, ResourceDiff};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Condition status, colored by outcome
pub fn status_badge(status: ConditionStatus) -> ColoredString {
    match status {
        ConditionStatus::True => status.as_str().green(),
        ConditionStatus::False => status.as_str().red(),
        ConditionStatus::Unknown => status.as_str().yellow(),
    }
}

/// One line describing a planned change
pub fn diff_line(diff: &ResourceDiff) -> String {
    match &diff.change {
        Change::Create => format!("{} {}", "+".green(), diff.key),
        Change::Update { fields } => format!(
            "{} {} {}",
            "~".yellow(),
            diff.key,
            format!("({})", fields.join(", ")).dimmed()
        ),
        Change::InSync => format!("{} {}", "=".dimmed(), diff.key.to_string().dimmed()),
    }
}
