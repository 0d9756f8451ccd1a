//! Minimal developer inspector.

use leptos::prelude::*;

use crate::handle::use_route_keeper;

/// Lists validation issues and recorded route timings, and switches
/// testing mode.
#[component]
pub fn Inspector() -> impl IntoView {
    let handle = use_route_keeper();

    let issues = {
        let handle = handle.clone();
        move || handle.issues()
    };
    let timings = {
        let handle = handle.clone();
        move || handle.timing_records()
    };
    let testing = {
        let handle = handle.clone();
        move || handle.testing_mode()
    };
    let toggle = {
        let handle = handle.clone();
        move |_| {
            handle.toggle_testing_mode();
        }
    };
    let clear = move |_| handle.clear_timings();

    view! {
        <section class="rk-inspector" style="margin: 4rem auto; max-width: 720px; background: #141417; color: #e5e5e5; padding: 1.5rem; border-radius: 8px; font-family: monospace;">
            <header style="display: flex; justify-content: space-between; align-items: center;">
                <h2>"RouteKeeper"</h2>
                <label>
                    <input type="checkbox" prop:checked=testing on:change=toggle/>
                    " Testing mode"
                </label>
            </header>

            <h3>"Issues"</h3>
            {move || {
                let issues = issues();
                if issues.is_empty() {
                    view! { <p>"No configuration issues."</p> }.into_any()
                } else {
                    view! {
                        <ul>
                            {issues.into_iter().map(|issue| view! { <li>{issue}</li> }).collect::<Vec<_>>()}
                        </ul>
                    }
                    .into_any()
                }
            }}

            <h3>"Route timings"</h3>
            <button on:click=clear>"Clear"</button>
            <table style="width: 100%;">
                <thead>
                    <tr>
                        <th>"Path"</th>
                        <th>"Load (ms)"</th>
                        <th>"Intended"</th>
                        <th>"Reason"</th>
                        <th>"At"</th>
                    </tr>
                </thead>
                <tbody>
                    {move || {
                        timings()
                            .into_iter()
                            .map(|t| {
                                let reason = t
                                    .metadata
                                    .as_ref()
                                    .and_then(|m| m.reason.clone())
                                    .unwrap_or_default();
                                view! {
                                    <tr>
                                        <td>{t.path}</td>
                                        <td>{t.load_time.to_string()}</td>
                                        <td>{t.intended_path.unwrap_or_default()}</td>
                                        <td>{reason}</td>
                                        <td>{t.timestamp}</td>
                                    </tr>
                                }
                            })
                            .collect::<Vec<_>>()
                    }}
                </tbody>
            </table>
        </section>
    }
}
