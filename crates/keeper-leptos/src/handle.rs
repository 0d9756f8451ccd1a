//! Reactive access to the shared RouteKeeper context.

use std::sync::{Arc, Mutex};

use keeper_core::{
    GuardTrail, KeeperContext, KeeperError, KeyValueStore, RouteTiming, TimingProbe,
};
use leptos::prelude::*;

/// Handle provided by [`RouteKeeper`](crate::RouteKeeper) to its subtree.
///
/// Wraps the host-agnostic [`KeeperContext`] with signals so developer
/// tooling re-renders when issues, timings or testing mode change.
#[derive(Clone)]
pub struct KeeperHandle {
    core: KeeperContext,
    testing_mode: RwSignal<bool>,
    revision: RwSignal<u64>,
    active_probe: Arc<Mutex<Option<TimingProbe>>>,
}

impl KeeperHandle {
    /// Create a handle over a fresh context backed by `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::from_context(KeeperContext::new(store))
    }

    /// Wrap an existing context.
    pub fn from_context(core: KeeperContext) -> Self {
        let testing_mode = RwSignal::new(core.testing_mode());
        Self {
            core,
            testing_mode,
            revision: RwSignal::new(0),
            active_probe: Arc::new(Mutex::new(None)),
        }
    }

    /// The underlying context.
    pub fn core(&self) -> &KeeperContext {
        &self.core
    }

    fn bump(&self) {
        // The owner may already be gone during teardown.
        self.revision.try_update(|r| *r += 1);
    }

    fn track(&self) {
        self.revision.track();
    }

    /// Recorded timings, most recent first. Reactive.
    pub fn timing_records(&self) -> Vec<RouteTiming> {
        self.track();
        self.core.timing_records()
    }

    /// Drop every recorded timing.
    pub fn clear_timings(&self) {
        self.core.set_timing_records(Vec::new());
        self.bump();
    }

    /// Current validation issues. Reactive.
    pub fn issues(&self) -> Vec<String> {
        self.track();
        self.core.issues()
    }

    /// Replace the validation issues.
    pub fn set_issues(&self, issues: Vec<String>) {
        self.core.set_issues(issues);
        self.bump();
    }

    /// Whether testing mode is on. Reactive.
    pub fn testing_mode(&self) -> bool {
        self.testing_mode.get()
    }

    /// Set and persist testing mode.
    pub fn set_testing_mode(&self, enabled: bool) {
        self.core.set_testing_mode(enabled);
        self.testing_mode.set(enabled);
    }

    /// Flip testing mode, returning the new value.
    pub fn toggle_testing_mode(&self) -> bool {
        let enabled = self.core.toggle_testing_mode();
        self.testing_mode.set(enabled);
        enabled
    }

    /// Remember the bookkeeping of a redirect about to navigate to `landing`.
    pub fn note_redirect(&self, landing: &str, trail: GuardTrail) {
        self.core.note_redirect(landing, trail);
    }

    /// Forget a redirect trail whose landing page is not `location`.
    pub fn settle_trail(&self, location: &str) {
        self.core.settle_trail(location);
    }

    /// Start timing `path`.
    pub fn start_probe(&self, path: impl Into<String>) -> TimingProbe {
        self.core.start_probe(path)
    }

    /// Finish and record `probe`.
    pub fn finish_probe(&self, probe: TimingProbe) -> RouteTiming {
        let timing = self.core.finish_probe(probe);
        self.bump();
        timing
    }

    /// Keep one probe running for `path` across re-renders.
    ///
    /// A running probe for another path is finished and recorded first.
    pub fn arm_probe(&self, path: &str) {
        let previous = {
            let mut slot = self.active_probe.lock().unwrap_or_else(|e| e.into_inner());
            match slot.take() {
                Some(probe) if probe.path() == path => {
                    *slot = Some(probe);
                    return;
                }
                previous => {
                    *slot = Some(self.core.start_probe(path));
                    previous
                }
            }
        };
        if let Some(probe) = previous {
            self.finish_probe(probe);
        }
    }

    /// Record the running probe if the location has moved away from it.
    pub fn settle_probe(&self, location: &str) {
        let finished = {
            let mut slot = self.active_probe.lock().unwrap_or_else(|e| e.into_inner());
            if slot.as_ref().is_some_and(|p| p.path() != location) {
                slot.take()
            } else {
                None
            }
        };
        if let Some(probe) = finished {
            self.finish_probe(probe);
        }
    }
}

/// The handle of the enclosing `RouteKeeper`.
pub fn try_use_route_keeper() -> Result<KeeperHandle, KeeperError> {
    use_context::<KeeperHandle>().ok_or(KeeperError::MissingContext)
}

/// The handle of the enclosing `RouteKeeper`.
///
/// # Panics
///
/// Panics when called outside a `RouteKeeper`; that is a wiring defect in
/// the application, not a recoverable condition.
pub fn use_route_keeper() -> KeeperHandle {
    match try_use_route_keeper() {
        Ok(handle) => handle,
        Err(err) => panic!("{err}"),
    }
}
