//! Terminal Output

use console::style;
use dki_core::{ConnectionState, Notification, NotificationCategory, NotificationPriority};

/// Prints a success line.
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Prints an informational line.
pub fn info(msg: &str) {
    println!("{} {}", style("→").cyan(), msg);
}

/// Prints a warning to stderr.
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("!").yellow().bold(), msg);
}

/// Icon shown next to a notification.
pub fn category_icon(category: Option<&NotificationCategory>) -> &'static str {
    match category {
        Some(NotificationCategory::Watering) => "💧",
        Some(NotificationCategory::Feeding) => "🌱",
        Some(NotificationCategory::Diagnosis) => "🔬",
        _ => "📬",
    }
}

/// Prints one notification.
pub fn notification(n: &Notification) {
    let title = match n.priority() {
        Some(NotificationPriority::High | NotificationPriority::Urgent) => {
            style(n.title()).red().bold()
        }
        _ => style(n.title()).bold(),
    };
    println!("{} {}", category_icon(n.category()), title);

    if let Some(message) = n.message() {
        println!("   {}", message);
    }
    if let Some(link) = n.link() {
        println!("   {}", style(link).dim());
    }
}

/// Prints a connection state change.
pub fn connection_state(state: ConnectionState) {
    match state {
        ConnectionState::Open => success("Connected"),
        ConnectionState::Connecting => info("Connecting..."),
        ConnectionState::Closed => warning("Disconnected"),
        ConnectionState::Idle | ConnectionState::Closing => {}
    }
}
