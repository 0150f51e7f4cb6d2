//! Notice delivery.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use storyreel_models::{Notice, Severity};

/// Receives user-facing notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Success | Severity::Info => {
                info!(severity = %notice.severity, "{}: {}", notice.title, notice.description)
            }
            Severity::Warning => warn!("{}: {}", notice.title, notice.description),
            Severity::Error => error!("{}: {}", notice.title, notice.description),
        }
    }
}

/// Forwards notices into a channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(notice);
    }
}
