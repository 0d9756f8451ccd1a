//! Shared state of one mounted RouteKeeper instance.
//!
//! The top-level entry point creates a single [`KeeperContext`] and hands
//! clones of it to the validator, the compiler's instrumentation and any
//! developer tooling. Clones share state.

use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::path::resolve_path;
use crate::redirect::GuardTrail;
use crate::route::RouteNode;
use crate::storage::{read_flag, write_flag, KeyValueStore, TESTING_MODE_KEY};
use crate::timing::{Clock, RouteTiming, SystemClock, TimingProbe};
use crate::validate::validate_tree;

#[derive(Debug, Default)]
struct ContextState {
    timing_records: Vec<RouteTiming>,
    issues: Vec<String>,
    testing_mode: bool,
    pending_trail: Option<PendingTrail>,
}

/// Guard bookkeeping waiting for the landing page of its redirect.
#[derive(Debug, Clone)]
struct PendingTrail {
    landing: String,
    trail: GuardTrail,
}

/// Handle to the shared timings, validation issues and testing mode.
#[derive(Clone)]
pub struct KeeperContext {
    state: Arc<RwLock<ContextState>>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl KeeperContext {
    /// Create the context, reading testing mode from `store`.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create the context with a custom clock.
    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let testing_mode = read_flag(store.as_ref(), TESTING_MODE_KEY);
        Self {
            state: Arc::new(RwLock::new(ContextState {
                testing_mode,
                ..Default::default()
            })),
            store,
            clock,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ContextState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ContextState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Clock used for timings.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Durable store backing testing mode.
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }

    /// Recorded timings, most recent first.
    pub fn timing_records(&self) -> Vec<RouteTiming> {
        self.read().timing_records.clone()
    }

    /// Replace all recorded timings.
    pub fn set_timing_records(&self, records: Vec<RouteTiming>) {
        self.write().timing_records = records;
    }

    /// Prepend one timing.
    pub fn push_timing(&self, timing: RouteTiming) {
        self.write().timing_records.insert(0, timing);
    }

    /// Enrich a raw timing and prepend it.
    ///
    /// The pending guard trail is used, and consumed, only when `timing.path`
    /// is the landing path of that redirect.
    pub fn record_route_timing(&self, timing: RouteTiming) -> RouteTiming {
        let trail = self.claim_trail(&timing.path);
        self.push_enriched(timing, trail.as_ref())
    }

    fn push_enriched(&self, timing: RouteTiming, trail: Option<&GuardTrail>) -> RouteTiming {
        let enriched = timing.enrich(trail, self.clock());
        tracing::debug!(
            path = %enriched.path,
            load_time_ms = enriched.load_time,
            redirected = enriched.redirected.unwrap_or(false),
            "route timing recorded"
        );
        self.push_timing(enriched.clone());
        enriched
    }

    /// Start timing `path` on this context's clock.
    ///
    /// A pending guard trail whose landing path is `path` moves into the probe.
    pub fn start_probe(&self, path: impl Into<String>) -> TimingProbe {
        let path = path.into();
        let trail = self.claim_trail(&path);
        TimingProbe::start(path, self.clock()).with_trail(trail)
    }

    /// Finish `probe` and record it with the trail it was started under.
    pub fn finish_probe(&self, probe: TimingProbe) -> RouteTiming {
        let trail = probe.trail().cloned();
        let raw = probe.finish(self.clock());
        self.push_enriched(raw, trail.as_ref())
    }

    /// Current validation issues.
    pub fn issues(&self) -> Vec<String> {
        self.read().issues.clone()
    }

    /// Replace the validation issues.
    pub fn set_issues(&self, issues: Vec<String>) {
        self.write().issues = issues;
    }

    /// Validate `routes` and replace the issues with the result.
    pub fn revalidate<V>(&self, routes: &[RouteNode<V>]) -> Vec<String> {
        let issues = validate_tree(routes);
        self.set_issues(issues.clone());
        issues
    }

    /// Remember the guard bookkeeping of a redirect to `landing`.
    ///
    /// Replaces any trail still pending.
    pub fn note_redirect(&self, landing: &str, trail: GuardTrail) {
        self.write().pending_trail = Some(PendingTrail {
            landing: resolve_path(Some(landing), false, ""),
            trail,
        });
    }

    /// Guard bookkeeping waiting for its landing page.
    pub fn pending_trail(&self) -> Option<GuardTrail> {
        self.read().pending_trail.as_ref().map(|p| p.trail.clone())
    }

    /// Take the pending trail if `path` is its landing path.
    pub fn claim_trail(&self, path: &str) -> Option<GuardTrail> {
        let mut state = self.write();
        match state.pending_trail.take() {
            Some(pending) if pending.landing == path => Some(pending.trail),
            other => {
                state.pending_trail = other;
                None
            }
        }
    }

    /// Drop the pending trail once the location is somewhere else.
    pub fn settle_trail(&self, location: &str) {
        let location = resolve_path(Some(location), false, "");
        let mut state = self.write();
        if state
            .pending_trail
            .as_ref()
            .is_some_and(|p| p.landing != location)
        {
            state.pending_trail = None;
        }
    }

    /// Whether testing mode is on.
    pub fn testing_mode(&self) -> bool {
        self.read().testing_mode
    }

    /// Set testing mode and persist it.
    ///
    /// A storage failure is logged; the in-memory value still changes.
    pub fn set_testing_mode(&self, enabled: bool) {
        self.write().testing_mode = enabled;
        if let Err(err) = write_flag(self.store.as_ref(), TESTING_MODE_KEY, enabled) {
            tracing::warn!(error = %err, "failed to persist testing mode");
        }
    }

    /// Flip testing mode, returning the new value.
    pub fn toggle_testing_mode(&self) -> bool {
        let enabled = !self.testing_mode();
        self.set_testing_mode(enabled);
        enabled
    }
}

impl fmt::Debug for KeeperContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("KeeperContext")
            .field("timing_records", &state.timing_records.len())
            .field("issues", &state.issues.len())
            .field("testing_mode", &state.testing_mode)
            .finish()
    }
}
