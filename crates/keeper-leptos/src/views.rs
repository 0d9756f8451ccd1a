//! Default presentational views.

use keeper_core::GuardViews;
use leptos::prelude::*;

/// Full-screen spinner shown while auth resolves and while lazy routes load.
#[component]
pub fn LoadingScreen() -> impl IntoView {
    view! {
        <div class="rk-loading-screen" role="status">
            <div class="rk-spinner"></div>
            <p class="rk-loading-text">"Loading, please wait..."</p>
        </div>
    }
}

/// Shown at `/` to visitors who are not signed in.
#[component]
pub fn LandingFallback() -> impl IntoView {
    view! {
        <div class="rk-landing" style="text-align: center; padding: 4rem;">
            <h1>"Welcome"</h1>
            <p>"Sign in to continue."</p>
            <a href="/login">"Sign in"</a>
        </div>
    }
}

/// Shown when the user lacks every role a route allows.
#[component]
pub fn Unauthorized() -> impl IntoView {
    view! {
        <div class="rk-unauthorized" style="text-align: center; padding: 4rem;">
            <h1>"403"</h1>
            <p>"You do not have access to this page."</p>
            <a href="/">"Back to Home"</a>
        </div>
    }
}

/// 404 page.
#[component]
pub fn NotFound() -> impl IntoView {
    view! {
        <div class="rk-not-found" style="text-align: center; padding: 4rem;">
            <h1>"404"</h1>
            <p>"Page not found"</p>
            <a href="/">"Back to Home"</a>
        </div>
    }
}

/// The built-in views.
pub fn default_views() -> GuardViews<ViewFn> {
    GuardViews {
        loading: ViewFn::from(|| view! { <LoadingScreen/> }),
        private_fallback: ViewFn::from(|| view! { <LandingFallback/> }),
        unauthorized: ViewFn::from(|| view! { <Unauthorized/> }),
        not_found: ViewFn::from(|| view! { <NotFound/> }),
    }
}
