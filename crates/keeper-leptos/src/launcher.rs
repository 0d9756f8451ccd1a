//! Draggable button that opens the inspector.

use keeper_core::{LauncherState, Position, Viewport, BUTTON_SIZE};
use leptos::ev::MouseEvent;
use leptos::prelude::*;

use crate::handle::use_route_keeper;
use crate::inspector::Inspector;

/// Floating launcher for the developer inspector.
///
/// A press that never moves the button toggles the inspector; a press that
/// moves it repositions it. Pointer tracking happens on a full-screen
/// overlay that only exists while a drag is active.
#[component]
pub fn Launcher(
    /// Panel to open instead of the built-in inspector.
    inspector: Option<ViewFn>,
) -> impl IntoView {
    let handle = use_route_keeper();
    let state = StoredValue::new(LauncherState::load(handle.core().store(), current_viewport()));
    let open = RwSignal::new(state.with_value(|s| s.is_open()));
    let position = RwSignal::new(state.with_value(|s| s.position()));
    let dragging = RwSignal::new(false);

    let on_press = move |ev: MouseEvent| {
        ev.prevent_default();
        state.update_value(|s| s.begin_drag(pointer(&ev)));
        dragging.set(true);
    };

    let on_move = move |ev: MouseEvent| {
        let mut at = position.get_untracked();
        state.update_value(|s| at = s.drag_to(pointer(&ev), current_viewport()));
        position.set(at);
    };

    let on_release = move |_: MouseEvent| {
        let mut moved = false;
        state.update_value(|s| moved = s.end_drag());
        dragging.set(false);
        if !moved {
            let mut now_open = false;
            state.update_value(|s| now_open = s.toggle_open());
            open.set(now_open);
        }
    };

    let button_style = move || {
        let at = position.get();
        format!(
            "position: fixed; left: {}px; top: {}px; z-index: 1001; width: {BUTTON_SIZE}px; \
             height: {BUTTON_SIZE}px; border-radius: 50%; cursor: {}; user-select: none;",
            at.x,
            at.y,
            if dragging.get() { "grabbing" } else { "grab" },
        )
    };

    let panel = move || match inspector.clone() {
        Some(custom) => custom.run(),
        None => view! { <Inspector/> }.into_any(),
    };

    view! {
        <button
            class="rk-launcher"
            aria-label="RouteKeeper inspector"
            style=button_style
            on:mousedown=on_press
        ></button>
        <Show when=move || dragging.get()>
            <div
                class="rk-drag-overlay"
                style="position: fixed; inset: 0; z-index: 1002; cursor: grabbing;"
                on:mousemove=on_move
                on:mouseup=on_release
            ></div>
        </Show>
        <Show when=move || open.get()>
            <div
                class="rk-inspector-overlay"
                style="position: fixed; inset: 0; z-index: 1000; background-color: rgba(0, 0, 0, 0.7);"
            >
                {panel.clone()}
            </div>
        </Show>
    }
}

fn pointer(ev: &MouseEvent) -> Position {
    Position::new(f64::from(ev.client_x()), f64::from(ev.client_y()))
}

#[cfg(target_arch = "wasm32")]
fn current_viewport() -> Viewport {
    let size = web_sys::window().map(|w| {
        let width = w.inner_width().ok().and_then(|v| v.as_f64());
        let height = w.inner_height().ok().and_then(|v| v.as_f64());
        (width, height)
    });
    match size {
        Some((Some(width), Some(height))) => Viewport::new(width, height),
        _ => fallback_viewport(),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn current_viewport() -> Viewport {
    fallback_viewport()
}

fn fallback_viewport() -> Viewport {
    Viewport::new(1280.0, 800.0)
}
