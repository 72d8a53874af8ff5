use crate::model::ConfigPublishEvent;

/// Downstream boundary for publish notifications. The orchestrator hands over
/// exactly one event per successful state transition and does not await or
/// observe delivery; transport (push, long-poll fan-out) lives behind this
/// trait.
pub trait NotificationEmitter: Send + Sync {
    fn emit(&self, event: ConfigPublishEvent);
}

/// Default emitter: logs the event. Suitable when an out-of-process relay
/// tails the log, and as a stand-in during local development.
#[derive(Debug, Default)]
pub struct LogEmitter;

impl NotificationEmitter for LogEmitter {
    fn emit(&self, event: ConfigPublishEvent) {
        log::info!(
            "config publish event: kind={:?} namespace={}/{}/{}/{} branch={:?} release={:?} previous={:?}",
            event.kind,
            event.app_id,
            event.env,
            event.cluster_name,
            event.namespace_name,
            event.branch_name,
            event.release_id,
            event.previous_release_id,
        );
    }
}

/// Collects emitted events in memory. Used by tests asserting the
/// one-event-per-transition contract, and by embedders that drain events into
/// their own delivery pipeline.
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    events: parking_lot::Mutex<Vec<ConfigPublishEvent>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ConfigPublishEvent> {
        self.events.lock().clone()
    }

    pub fn drain(&self) -> Vec<ConfigPublishEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl NotificationEmitter for RecordingEmitter {
    fn emit(&self, event: ConfigPublishEvent) {
        self.events.lock().push(event);
    }
}
