//! User-facing notifications.

use tracing::{error, info, warn};

/// Sink for messages shown to the user outside the surface.
pub trait Notifier: Send + Sync {
	fn info(&self, message: &str);
	fn warn(&self, message: &str);
	fn error(&self, message: &str);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
	fn info(&self, message: &str) {
		info!(target: "ldfx::notify", "{message}");
	}

	fn warn(&self, message: &str) {
		warn!(target: "ldfx::notify", "{message}");
	}

	fn error(&self, message: &str) {
		error!(target: "ldfx::notify", "{message}");
	}
}
