use leptos::{
    component, create_action, create_signal, view, IntoView, SignalGet, SignalSet, SignalWith,
};
use shared::error::JsFailure;
use tracing::{debug, warn};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Notification, NotificationPermission};

fn permission_text(permission: NotificationPermission) -> &'static str {
    match permission {
        NotificationPermission::Granted => "granted",
        NotificationPermission::Denied => "denied",
        _ => "not requested",
    }
}

async fn request_permission() -> Result<NotificationPermission, JsFailure> {
    let result = JsFuture::from(Notification::request_permission()?).await?;
    debug!("Notification permission result: {result:?}");
    Ok(Notification::permission())
}

#[component]
pub fn Notifications() -> impl IntoView {
    let (permission, set_permission) = create_signal(Notification::permission());
    let (error, set_error) = create_signal(None::<String>);

    let request = create_action(move |_: &()| async move {
        match request_permission().await {
            Ok(p) => {
                set_permission.set(p);
                set_error.set(None);
            }
            Err(e) => {
                warn!("Notification permission request failed: {e}");
                set_error.set(Some(e.to_string()));
            }
        }
    });

    view! {
        <h2>"Notifications"</h2>
        { move || error.with(|e| e.as_ref().map(|e| view! {
            <p class="error">{e.clone()}</p>
        }))}
        <p>"Permission: " { move || permission_text(permission.get()) }</p>
        <button
            id="notifyBtn"
            prop:disabled=move || request.pending().get() || permission.get() != NotificationPermission::Default
            on:click=move |_| request.dispatch(())
        >
            "Enable notifications"
        </button>
        <p><small>"Push messages show up with their text, or a default message when empty."</small></p>
    }
}
