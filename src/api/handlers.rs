use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use tracing::debug;

use crate::{
    api::{
        types::{DeviceIdResponse, DeviceUserRequest},
        AppState,
    },
    device::DeviceCheck,
    model::{DeviceRecord, TrustScore},
    trust::TrustEvaluation,
};

pub async fn device_id(State(state): State<AppState>) -> Json<DeviceIdResponse> {
    Json(DeviceIdResponse {
        device_id: state.policy.get_device_id().await,
    })
}

pub async fn current_device(State(state): State<AppState>) -> Json<DeviceRecord> {
    Json(state.policy.current_device().await)
}

pub async fn check_device(
    State(state): State<AppState>,
    Json(req): Json<DeviceUserRequest>,
) -> Json<DeviceCheck> {
    Json(state.policy.check_device_restriction(&req.user_id).await)
}

pub async fn register_device(
    State(state): State<AppState>,
    Json(req): Json<DeviceUserRequest>,
) -> Json<serde_json::Value> {
    let registered = state.policy.register_user_device(&req.user_id).await;
    let device = state.policy.bound_device(&req.user_id).await;
    Json(json!({
        "user_id": req.user_id,
        "registered": registered,
        "device": device
    }))
}

pub async fn get_binding(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Json<serde_json::Value> {
    let device = state.policy.bound_device(&user_id).await;
    Json(json!({
        "user_id": user_id,
        "device": device
    }))
}

pub async fn unregister_device(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Json<serde_json::Value> {
    let unregistered = state.policy.unregister_user_device(&user_id).await;
    Json(json!({
        "user_id": user_id,
        "unregistered": unregistered
    }))
}

pub async fn evaluate_trust(
    Json(score): Json<TrustScore>,
) -> Result<Json<TrustEvaluation>, (StatusCode, String)> {
    score
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    debug!(level = score.level.as_str(), score = score.score, "evaluating trust score");
    Ok(Json(TrustEvaluation::evaluate(&score)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        device::{platform::HostPlatform, DeviceBindingPolicy},
        model::TrustLevel,
        storage::{testing::FailingStore, MemoryStore},
    };

    fn state(native_id: &str, bindings: Arc<MemoryStore>) -> AppState {
        let platform = HostPlatform {
            native_id: Some(native_id.to_string()),
            ..Default::default()
        };
        let policy = DeviceBindingPolicy::new(Arc::new(MemoryStore::new()), Arc::new(platform))
            .with_binding_store(bindings);
        AppState {
            policy: Arc::new(policy),
        }
    }

    fn user(id: &str) -> Json<DeviceUserRequest> {
        Json(DeviceUserRequest {
            user_id: id.to_string(),
        })
    }

    #[tokio::test]
    async fn register_check_and_unregister_over_http_handlers() {
        let bindings = Arc::new(MemoryStore::new());
        let phone = state("phone", bindings.clone());
        let tablet = state("tablet", bindings);

        let Json(id) = device_id(State(phone.clone())).await;
        assert_eq!(id.device_id, "phone");

        let Json(body) = register_device(State(phone.clone()), user("alice")).await;
        assert_eq!(body["registered"], true);
        assert_eq!(body["device"]["device_id"], "phone");

        let Json(check) = check_device(State(tablet.clone()), user("alice")).await;
        assert!(!check.allowed);
        assert_eq!(check.existing_device.unwrap().device_id, "phone");

        let Json(binding) = get_binding(Path("alice".into()), State(tablet.clone())).await;
        assert_eq!(binding["device"]["device_id"], "phone");

        let Json(body) = unregister_device(Path("alice".into()), State(phone)).await;
        assert_eq!(body["unregistered"], true);
        let Json(check) = check_device(State(tablet), user("alice")).await;
        assert!(check.allowed);
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json, json!({ "allowed": true }));
    }

    #[tokio::test]
    async fn failed_writes_are_reported() {
        let policy = DeviceBindingPolicy::new(
            Arc::new(FailingStore),
            Arc::new(HostPlatform::default()),
        );
        let state = AppState {
            policy: Arc::new(policy),
        };

        let Json(body) = register_device(State(state.clone()), user("alice")).await;
        assert_eq!(body["registered"], false);
        assert_eq!(body["device"], serde_json::Value::Null);

        let Json(body) = unregister_device(Path("alice".into()), State(state)).await;
        assert_eq!(body["unregistered"], false);
    }

    #[tokio::test]
    async fn evaluate_rejects_out_of_range_payload() {
        let score: TrustScore = serde_json::from_value(json!({
            "score": 150.0,
            "level": "verified"
        }))
        .unwrap();
        let err = evaluate_trust(Json(score)).await.unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn evaluate_returns_gates_and_tips() {
        let score: TrustScore = serde_json::from_value(json!({
            "score": 55.0,
            "level": "building",
            "verified_id": true,
            "completed_bookings": 12
        }))
        .unwrap();
        let Json(eval) = evaluate_trust(Json(score)).await.unwrap();
        assert_eq!(eval.level, TrustLevel::Building);
        assert!(eval.can_boost_property);
        assert!(!eval.can_access_premium_features);
        assert_eq!(eval.recommendations, vec!["Verify your business documents"]);
    }
}
