use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::device::DeviceBindingPolicy;

pub mod handlers;
pub mod types;

use handlers::{
    check_device, current_device, device_id, evaluate_trust, get_binding, register_device,
    unregister_device,
};

#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<DeviceBindingPolicy>,
}

/// Local JSON API used by the app's sign-in and profile screens.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/device/id", get(device_id))
        .route("/api/device/current", get(current_device))
        .route("/api/device/check", post(check_device))
        .route("/api/device/register", post(register_device))
        .route(
            "/api/device/binding/{user_id}",
            get(get_binding).delete(unregister_device),
        )
        .route("/api/trust/evaluate", post(evaluate_trust))
}
