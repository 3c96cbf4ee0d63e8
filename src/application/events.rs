//! Progress reporters: a channel for headless callers and Tauri events for the desktop shell

use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::events::ProgressReporter;
use crate::domain::reports::ProgressUpdate;

/// Forwards updates into an unbounded channel; a dropped receiver silences it
#[derive(Clone)]
pub struct ChannelReporter {
    sender: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ProgressReporter for ChannelReporter {
    fn report(&self, update: ProgressUpdate) {
        if self.sender.send(update).is_err() {
            debug!("Progress receiver dropped");
        }
    }
}

/// Tauri event names the frontend listens on
pub mod event_names {
    pub const COMPARE_PROGRESS: &str = "compare-progress";
    pub const SYNC_PROGRESS: &str = "sync-progress";
    pub const RECORD_SYNCED: &str = "record-synced";
}

pub fn event_name(update: &ProgressUpdate) -> &'static str {
    match update {
        ProgressUpdate::Compare { .. } => event_names::COMPARE_PROGRESS,
        ProgressUpdate::Sync { .. } => event_names::SYNC_PROGRESS,
        ProgressUpdate::KeySynced { .. } => event_names::RECORD_SYNCED,
    }
}

#[cfg(feature = "desktop")]
pub use desktop::EventEmitter;

#[cfg(feature = "desktop")]
mod desktop {
    use tauri::{AppHandle, Emitter};
    use tracing::{debug, error};

    use super::event_name;
    use crate::domain::events::ProgressReporter;
    use crate::domain::reports::ProgressUpdate;

    /// Emits every update as a Tauri event to the webview
    #[derive(Clone)]
    pub struct EventEmitter {
        app_handle: AppHandle,
    }

    impl EventEmitter {
        pub fn new(app_handle: AppHandle) -> Self {
            Self { app_handle }
        }
    }

    impl ProgressReporter for EventEmitter {
        fn report(&self, update: ProgressUpdate) {
            let name = event_name(&update);
            match self.app_handle.emit(name, &update) {
                Ok(()) => debug!("Emitted event: {}", name),
                Err(e) => error!("Failed to emit event {}: {}", name, e),
            }
        }
    }
}
