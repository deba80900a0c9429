//! User-visible notifications.
//!
//! Failures in the cart and checkout flows end here instead of propagating.
//! The sink is a trait so a UI can render toasts while the CLI and tests use
//! [`TracingNotifier`] or their own recorder.

use serde::Serialize;

/// Fallback description when the server did not explain a failure.
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A message for the person using the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: Option<String>,
}

impl Notification {
    #[must_use]
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            description: None,
        }
    }

    /// An error carrying `description`, or [`GENERIC_FAILURE`] when there is none.
    #[must_use]
    pub fn error(title: impl Into<String>, description: Option<&str>) -> Self {
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(GENERIC_FAILURE);
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            description: Some(description.to_string()),
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {description}", self.title),
            None => f.write_str(&self.title),
        }
    }
}

/// Where notifications are delivered.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Logs notifications through `tracing` and records them as Sentry breadcrumbs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => {
                tracing::info!(notification = %notification, "Notify");
            }
            NotificationLevel::Error => {
                tracing::warn!(notification = %notification, "Notify");
            }
        }
        add_breadcrumb(&notification);
    }
}

/// Add a breadcrumb so Sentry reports show what the user was told.
fn add_breadcrumb(notification: &Notification) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some("notification".to_string()),
        message: Some(notification.title.clone()),
        level: match notification.level {
            NotificationLevel::Success => sentry::Level::Info,
            NotificationLevel::Error => sentry::Level::Error,
        },
        ..Default::default()
    };

    if let Some(description) = &notification.description {
        breadcrumb.data.insert(
            "description".to_string(),
            serde_json::Value::String(description.clone()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
