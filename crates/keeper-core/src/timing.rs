//! Route render timing.
//!
//! A [`TimingProbe`] is started when a tracked route mounts and finished
//! when it unmounts, producing a [`RouteTiming`] with the elapsed time.

use std::sync::Mutex;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::redirect::GuardTrail;

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock advanced by hand, for tests and replay.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Start at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance_ms(&self, ms: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += Duration::milliseconds(ms);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::default())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// When a tracked route emits its timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// Once, covering mount to unmount.
    #[default]
    OnUnmount,
    /// When the location changes; the timer survives re-renders of the
    /// same path.
    ///
    /// Kept as a variant until product settles on a single behavior.
    OnChange,
}

/// Guard metadata attached to a timing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimingMetadata {
    /// Guard that redirected to this route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
    /// Why it redirected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// How long a route stayed mounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTiming {
    /// Resolved route path.
    pub path: String,
    /// Elapsed milliseconds.
    pub load_time: u64,
    /// ISO-8601 time the record was created.
    pub timestamp: String,
    /// Path originally requested, when reached through a redirect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intended_path: Option<String>,
    /// Whether the route was reached through a guard redirect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirected: Option<bool>,
    /// Guard metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TimingMetadata>,
}

impl RouteTiming {
    /// Fill in redirect bookkeeping and refresh the timestamp.
    ///
    /// Without a trail the intended path is the route's own path.
    pub fn enrich(mut self, trail: Option<&GuardTrail>, clock: &dyn Clock) -> Self {
        self.intended_path = Some(
            trail
                .and_then(|t| t.intended_path.clone())
                .unwrap_or_else(|| self.path.clone()),
        );
        self.redirected = Some(trail.is_some_and(|t| t.redirected));
        self.timestamp = iso_timestamp(clock.now());
        self.metadata = Some(TimingMetadata {
            guard: trail.and_then(|t| t.guard.clone()),
            reason: trail.and_then(|t| t.reason.clone()),
        });
        self
    }
}

/// Mount timer of one tracked route.
#[derive(Debug, Clone)]
pub struct TimingProbe {
    path: String,
    started: DateTime<Utc>,
    trail: Option<GuardTrail>,
}

impl TimingProbe {
    /// Start timing `path` now.
    pub fn start(path: impl Into<String>, clock: &dyn Clock) -> Self {
        Self {
            path: path.into(),
            started: clock.now(),
            trail: None,
        }
    }

    /// Attach the guard bookkeeping of the navigation that landed here.
    pub fn with_trail(mut self, trail: Option<GuardTrail>) -> Self {
        self.trail = trail;
        self
    }

    /// Path being timed.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Guard bookkeeping captured at mount.
    pub fn trail(&self) -> Option<&GuardTrail> {
        self.trail.as_ref()
    }

    /// Stop and produce the timing.
    pub fn finish(self, clock: &dyn Clock) -> RouteTiming {
        let now = clock.now();
        let elapsed = (now - self.started).num_milliseconds().max(0);
        RouteTiming {
            path: self.path,
            load_time: elapsed as u64,
            timestamp: iso_timestamp(now),
            intended_path: None,
            redirected: None,
            metadata: None,
        }
    }
}

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_measures_elapsed() {
        let clock = ManualClock::default();
        let probe = TimingProbe::start("/dashboard", &clock);
        clock.advance_ms(42);

        let timing = probe.finish(&clock);
        assert_eq!(timing.path, "/dashboard");
        assert_eq!(timing.load_time, 42);
        assert_eq!(timing.timestamp, "1970-01-01T00:00:00.042Z");
    }

    #[test]
    fn test_probe_never_negative() {
        let clock = ManualClock::default();
        clock.advance_ms(100);
        let probe = TimingProbe::start("/a", &clock);
        clock.advance_ms(-50);

        assert_eq!(probe.finish(&clock).load_time, 0);
    }

    #[test]
    fn test_enrich_without_trail() {
        let clock = ManualClock::default();
        let timing = TimingProbe::start("/about", &clock).finish(&clock);
        clock.advance_ms(1_000);

        let enriched = timing.enrich(None, &clock);
        assert_eq!(enriched.intended_path.as_deref(), Some("/about"));
        assert_eq!(enriched.redirected, Some(false));
        assert_eq!(enriched.timestamp, "1970-01-01T00:00:01.000Z");
        assert_eq!(enriched.metadata, Some(TimingMetadata::default()));
    }

    #[test]
    fn test_enrich_with_trail() {
        let clock = ManualClock::default();
        let trail = GuardTrail {
            redirected: true,
            from: Some("/dashboard".into()),
            intended_path: Some("/dashboard".into()),
            guard: Some("RouteKeeper".into()),
            reason: Some("User not authenticated".into()),
        };

        let enriched = TimingProbe::start("/login", &clock)
            .finish(&clock)
            .enrich(Some(&trail), &clock);

        assert_eq!(enriched.path, "/login");
        assert_eq!(enriched.intended_path.as_deref(), Some("/dashboard"));
        assert_eq!(enriched.redirected, Some(true));
        let meta = enriched.metadata.unwrap();
        assert_eq!(meta.guard.as_deref(), Some("RouteKeeper"));
        assert_eq!(meta.reason.as_deref(), Some("User not authenticated"));
    }

    #[test]
    fn test_timing_serializes_camel_case() {
        let clock = ManualClock::default();
        let timing = TimingProbe::start("/a", &clock).finish(&clock);
        let json = serde_json::to_value(&timing).unwrap();

        assert_eq!(json["loadTime"], 0);
        assert!(json.get("intendedPath").is_none());
    }
}
