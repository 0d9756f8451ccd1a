//! Route timing instrumentation.

use keeper_core::TimingMode;
use leptos::prelude::*;

use crate::handle::use_route_keeper;

/// Times how long the wrapped route stays mounted.
///
/// In [`TimingMode::OnUnmount`] the timer starts when the boundary mounts
/// and the timing is recorded when it unmounts. In [`TimingMode::OnChange`]
/// one timer per path survives re-renders and is recorded when the
/// location moves to another path.
#[component]
pub fn TimingBoundary(
    /// Resolved path being timed.
    #[prop(into)]
    path: String,
    #[prop(optional)] mode: TimingMode,
    children: Children,
) -> impl IntoView {
    let handle = use_route_keeper();

    match mode {
        TimingMode::OnUnmount => {
            let probe = handle.start_probe(path);
            on_cleanup(move || {
                handle.finish_probe(probe);
            });
        }
        TimingMode::OnChange => handle.arm_probe(&path),
    }

    children()
}
