//! RouteKeeper configuration.

use std::fmt;
use std::sync::Arc;

use crate::redirect::RedirectHook;
use crate::timing::TimingMode;
use crate::validate::WarningPolicy;

const DEFAULT_PRIVATE_REDIRECT: &str = "/login";
const DEFAULT_PUBLIC_REDIRECT: &str = "/";

/// Authentication indicator supplied by the caller.
///
/// Callers holding a string (a token, or `"true"`/`"false"` from storage)
/// can convert it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthState(bool);

impl AuthState {
    /// Whether the user is authenticated.
    pub fn is_authenticated(self) -> bool {
        self.0
    }
}

impl From<bool> for AuthState {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl From<&str> for AuthState {
    fn from(value: &str) -> Self {
        let value = value.trim();
        let falsy = value.is_empty()
            || value.eq_ignore_ascii_case("false")
            || value.eq_ignore_ascii_case("no")
            || value == "0";
        Self(!falsy)
    }
}

impl From<Option<&str>> for AuthState {
    fn from(value: Option<&str>) -> Self {
        value.map(AuthState::from).unwrap_or_default()
    }
}

impl From<AuthState> for bool {
    fn from(state: AuthState) -> Self {
        state.0
    }
}

/// Configuration for a RouteKeeper instance.
#[derive(Debug, Clone)]
pub struct KeeperConfig {
    /// Where unauthenticated users go from private routes.
    pub private_redirect: String,
    /// Where authenticated users go from public routes.
    pub public_redirect: String,
    /// Let rendering errors propagate instead of catching them.
    ///
    /// Also relaxes development warnings from fatal to logged.
    pub disable_error_boundary: bool,
    /// Record route timings (takes effect only in testing mode).
    pub tracking: bool,
    /// When tracked routes emit timings.
    pub timing_mode: TimingMode,
    /// Development build: configuration issues become developer warnings.
    pub dev_build: bool,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            private_redirect: DEFAULT_PRIVATE_REDIRECT.to_string(),
            public_redirect: DEFAULT_PUBLIC_REDIRECT.to_string(),
            disable_error_boundary: false,
            tracking: false,
            timing_mode: TimingMode::default(),
            dev_build: cfg!(debug_assertions),
        }
    }
}

impl KeeperConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the private-route redirect target.
    pub fn with_private_redirect(mut self, path: impl Into<String>) -> Self {
        self.private_redirect = path.into();
        self
    }

    /// Set the public-route redirect target.
    pub fn with_public_redirect(mut self, path: impl Into<String>) -> Self {
        self.public_redirect = path.into();
        self
    }

    /// Disable the error boundary.
    pub fn without_error_boundary(mut self) -> Self {
        self.disable_error_boundary = true;
        self
    }

    /// Enable or disable timing collection.
    pub fn with_tracking(mut self, enabled: bool) -> Self {
        self.tracking = enabled;
        self
    }

    /// Set the timing mode.
    pub fn with_timing_mode(mut self, mode: TimingMode) -> Self {
        self.timing_mode = mode;
        self
    }

    /// Override the build context.
    pub fn with_dev_build(mut self, dev: bool) -> Self {
        self.dev_build = dev;
        self
    }

    /// Private redirect target, `/login` when blank.
    pub fn safe_private_redirect(&self) -> &str {
        non_blank_or(&self.private_redirect, DEFAULT_PRIVATE_REDIRECT)
    }

    /// Public redirect target, `/` when blank.
    pub fn safe_public_redirect(&self) -> &str {
        non_blank_or(&self.public_redirect, DEFAULT_PUBLIC_REDIRECT)
    }

    /// Issues with the redirect targets themselves.
    pub fn redirect_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.private_redirect.trim().is_empty() {
            issues.push(format!(
                "privateRedirect must be a non-empty string. Received \"{}\".",
                self.private_redirect
            ));
        }
        if self.public_redirect.trim().is_empty() {
            issues.push(format!(
                "publicRedirect must be a non-empty string. Received \"{}\".",
                self.public_redirect
            ));
        }
        issues
    }

    /// How configuration issues are surfaced.
    pub fn warning_policy(&self) -> WarningPolicy {
        WarningPolicy::for_build(self.dev_build, self.disable_error_boundary)
    }
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Callback invoked with the new location path.
pub type RouteChangeHook = dyn Fn(&str) + Send + Sync;

/// Caller notifications.
#[derive(Clone, Default)]
pub struct KeeperHooks {
    /// Called whenever the location path changes.
    pub on_route_change: Option<Arc<RouteChangeHook>>,
    /// Called with `(from, to)` whenever a guard redirect renders.
    pub on_redirect: Option<Arc<RedirectHook>>,
}

impl KeeperHooks {
    /// No callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the route-change callback.
    pub fn on_route_change(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_route_change = Some(Arc::new(hook));
        self
    }

    /// Set the redirect callback.
    pub fn on_redirect(mut self, hook: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.on_redirect = Some(Arc::new(hook));
        self
    }

    /// Notify a location change.
    pub fn route_changed(&self, path: &str) {
        if let Some(hook) = &self.on_route_change {
            hook(path);
        }
    }

    /// The redirect callback, if any.
    pub fn redirect_hook(&self) -> Option<&RedirectHook> {
        self.on_redirect.as_deref()
    }
}

impl fmt::Debug for KeeperHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeeperHooks")
            .field("on_route_change", &self.on_route_change.is_some())
            .field("on_redirect", &self.on_redirect.is_some())
            .finish()
    }
}

/// Views the guards fall back to.
#[derive(Debug, Clone)]
pub struct GuardViews<V> {
    /// Shown while auth is loading and as the default suspense fallback.
    pub loading: V,
    /// Shown at `/` to unauthenticated users.
    pub private_fallback: V,
    /// Shown when role checks fail.
    pub unauthorized: V,
    /// Shown when no route matches.
    pub not_found: V,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_config_default() {
        let config = KeeperConfig::default();

        assert_eq!(config.private_redirect, "/login");
        assert_eq!(config.public_redirect, "/");
        assert!(!config.disable_error_boundary);
        assert!(!config.tracking);
        assert_eq!(config.timing_mode, TimingMode::OnUnmount);
    }

    #[test]
    fn test_config_builder_chain() {
        let config = KeeperConfig::new()
            .with_private_redirect("/signin")
            .with_public_redirect("/home")
            .with_tracking(true)
            .with_timing_mode(TimingMode::OnChange)
            .without_error_boundary();

        assert_eq!(config.safe_private_redirect(), "/signin");
        assert_eq!(config.safe_public_redirect(), "/home");
        assert!(config.tracking);
        assert!(config.disable_error_boundary);
        assert_eq!(config.timing_mode, TimingMode::OnChange);
    }

    #[test]
    fn test_blank_redirects_fall_back() {
        let config = KeeperConfig::new()
            .with_private_redirect("  ")
            .with_public_redirect("");

        assert_eq!(config.safe_private_redirect(), "/login");
        assert_eq!(config.safe_public_redirect(), "/");
        assert_eq!(config.redirect_issues().len(), 2);
        assert!(KeeperConfig::default().redirect_issues().is_empty());
    }

    #[test]
    fn test_warning_policy_from_build() {
        let dev = KeeperConfig::new().with_dev_build(true);
        assert_eq!(dev.warning_policy(), WarningPolicy::Strict);
        assert_eq!(
            dev.clone().without_error_boundary().warning_policy(),
            WarningPolicy::Lenient
        );
        assert_eq!(
            KeeperConfig::new().with_dev_build(false).warning_policy(),
            WarningPolicy::Silent
        );
    }

    #[test]
    fn test_auth_state_from_str() {
        assert!(AuthState::from("true").is_authenticated());
        assert!(AuthState::from("1").is_authenticated());
        assert!(AuthState::from("eyJhbGciOi").is_authenticated());
        assert!(!AuthState::from("").is_authenticated());
        assert!(!AuthState::from("false").is_authenticated());
        assert!(!AuthState::from("FALSE").is_authenticated());
        assert!(!AuthState::from("0").is_authenticated());
        assert!(!AuthState::from(None).is_authenticated());
        assert!(bool::from(AuthState::from(true)));
    }

    #[test]
    fn test_hooks_fire() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hooks = KeeperHooks::new().on_route_change(move |p| sink.lock().unwrap().push(p.to_string()));

        hooks.route_changed("/a");
        hooks.route_changed("/b");
        assert_eq!(seen.lock().unwrap().as_slice(), &["/a".to_string(), "/b".to_string()]);
        assert!(hooks.redirect_hook().is_none());
    }
}
