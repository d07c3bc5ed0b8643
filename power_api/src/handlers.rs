//! API request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use power_runtime_interface::{BmcEndpoint, PowerState};

use crate::error::{ApiError, ApiResult};
use crate::state::ApiState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body shared by all three power endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerRequest {
    /// Internal management address of the target server.
    pub ip: String,
}

/// Response for `/on` and `/off`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerActionResponse {
    pub message: String,
    pub internal_ip: String,
    pub bmc_ip: String,
}

/// Response for `/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerStatusResponse {
    pub internal_ip: String,
    pub bmc_ip: String,
    pub status: PowerState,
    pub raw_output: String,
}

/// Response for `/healthz`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub servers: usize,
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse and validate the request body shared by the power endpoints.
///
/// Returns the trimmed internal address, or a 400 for a malformed body or
/// a missing/blank `ip` field.
fn parse_target(payload: Result<Json<PowerRequest>, JsonRejection>) -> ApiResult<String> {
    let Json(request) = payload.map_err(|_| {
        ApiError::validation_error(r#"request body must be JSON: {"ip": "<internal address>"}"#)
    })?;

    let internal_ip = request.ip.trim().to_string();
    if internal_ip.is_empty() {
        return Err(ApiError::validation_error("missing required field: ip"));
    }

    Ok(internal_ip)
}

// ============================================================================
// Power Handlers
// ============================================================================

/// Power a server on.
pub async fn power_on(
    State(state): State<ApiState>,
    payload: Result<Json<PowerRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let internal_ip = parse_target(payload)?;
    let server = state.fleet.lookup(&internal_ip).map_err(ApiError::from)?;

    state
        .runtime
        .power_on(&BmcEndpoint::from(server))
        .await
        .map_err(ApiError::from)?;

    info!("power on issued for {} via {}", internal_ip, server.bmc_ip);

    Ok(Json(PowerActionResponse {
        message: "power on command succeeded".to_string(),
        internal_ip,
        bmc_ip: server.bmc_ip.clone(),
    }))
}

/// Power a server off.
pub async fn power_off(
    State(state): State<ApiState>,
    payload: Result<Json<PowerRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let internal_ip = parse_target(payload)?;
    let server = state.fleet.lookup(&internal_ip).map_err(ApiError::from)?;

    state
        .runtime
        .power_off(&BmcEndpoint::from(server))
        .await
        .map_err(ApiError::from)?;

    info!("power off issued for {} via {}", internal_ip, server.bmc_ip);

    Ok(Json(PowerActionResponse {
        message: "power off command succeeded".to_string(),
        internal_ip,
        bmc_ip: server.bmc_ip.clone(),
    }))
}

/// Query chassis power state for a server.
pub async fn power_status(
    State(state): State<ApiState>,
    payload: Result<Json<PowerRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let internal_ip = parse_target(payload)?;
    let server = state.fleet.lookup(&internal_ip).map_err(ApiError::from)?;

    let report = state
        .runtime
        .power_status(&BmcEndpoint::from(server))
        .await
        .map_err(ApiError::from)?;

    Ok(Json(PowerStatusResponse {
        internal_ip,
        bmc_ip: server.bmc_ip.clone(),
        status: report.state,
        raw_output: report.raw_output,
    }))
}

// ============================================================================
// Health Handler
// ============================================================================

/// Liveness probe. Read-only, no side effects.
pub async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        servers: state.fleet.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use fleet_config::FleetConfig;
    use power_runtime::MockPowerRuntime;
    use power_shared_types::PowerAction;

    use crate::routes;

    fn test_state(runtime: Arc<MockPowerRuntime>) -> ApiState {
        let fleet = FleetConfig::parse(
            "10.0.0.1 | 192.168.1.1 | admin | pw1\n\
             10.0.0.2 | 192.168.1.2 | admin | pw2\n",
        )
        .unwrap();
        ApiState::new(Arc::new(fleet), runtime)
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_ip_field_is_400() {
        let app = routes::router(test_state(Arc::new(MockPowerRuntime::new())));

        let response = app.oneshot(post("/on", "{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_blank_ip_is_400() {
        let app = routes::router(test_state(Arc::new(MockPowerRuntime::new())));

        let response = app.oneshot(post("/off", r#"{"ip": "   "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "missing required field: ip");
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let app = routes::router(test_state(Arc::new(MockPowerRuntime::new())));

        let response = app.oneshot(post("/status", "not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_internal_ip_is_404() {
        let app = routes::router(test_state(Arc::new(MockPowerRuntime::new())));

        let response = app.oneshot(post("/on", r#"{"ip": "10.9.9.9"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("10.9.9.9"));
    }

    #[tokio::test]
    async fn test_power_on_success() {
        let runtime = Arc::new(MockPowerRuntime::new());
        let app = routes::router(test_state(runtime.clone()));

        // Surrounding whitespace in the request is trimmed before lookup.
        let response = app.oneshot(post("/on", r#"{"ip": " 10.0.0.1 "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], "power on command succeeded");
        assert_eq!(body["internal_ip"], "10.0.0.1");
        assert_eq!(body["bmc_ip"], "192.168.1.1");

        assert_eq!(
            runtime.invocations(),
            vec![("192.168.1.1".to_string(), PowerAction::On)]
        );
    }

    #[tokio::test]
    async fn test_power_off_success() {
        let runtime = Arc::new(MockPowerRuntime::new());
        let app = routes::router(test_state(runtime.clone()));

        let response = app.oneshot(post("/off", r#"{"ip": "10.0.0.2"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], "power off command succeeded");
        assert_eq!(body["bmc_ip"], "192.168.1.2");

        assert_eq!(
            runtime.invocations(),
            vec![("192.168.1.2".to_string(), PowerAction::Off)]
        );
    }

    #[tokio::test]
    async fn test_runtime_failure_is_500_with_error_text() {
        let runtime = Arc::new(MockPowerRuntime::new());
        runtime.fail_with("192.168.1.1", "Unable to establish IPMI v2 / RMCP+ session");
        let app = routes::router(test_state(runtime));

        let response = app.oneshot(post("/on", r#"{"ip": "10.0.0.1"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("RMCP+ session"));
    }

    #[tokio::test]
    async fn test_status_reports_classification_and_raw_output() {
        let runtime = Arc::new(MockPowerRuntime::new());
        runtime.set_state("192.168.1.1", power_runtime::PowerState::Off);
        runtime.set_raw_output("192.168.1.1", "Chassis Power is off");
        let app = routes::router(test_state(runtime));

        let response = app.oneshot(post("/status", r#"{"ip": "10.0.0.1"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["internal_ip"], "10.0.0.1");
        assert_eq!(body["bmc_ip"], "192.168.1.1");
        assert_eq!(body["status"], "off");
        assert_eq!(body["raw_output"], "Chassis Power is off");
    }

    #[tokio::test]
    async fn test_status_unclassified_output_is_unknown() {
        let runtime = Arc::new(MockPowerRuntime::new());
        runtime.set_raw_output("192.168.1.2", "some unexpected phrasing");
        let app = routes::router(test_state(runtime));

        let response = app.oneshot(post("/status", r#"{"ip": "10.0.0.2"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "unknown");
        assert_eq!(body["raw_output"], "some unexpected phrasing");
    }

    #[tokio::test]
    async fn test_concurrent_status_requests_are_independent() {
        let runtime = Arc::new(MockPowerRuntime::new());
        runtime.set_state("192.168.1.1", power_runtime::PowerState::On);
        runtime.set_state("192.168.1.2", power_runtime::PowerState::Off);
        let state = test_state(runtime);

        let app_a = routes::router(state.clone());
        let app_b = routes::router(state);

        let (res_a, res_b) = tokio::join!(
            app_a.oneshot(post("/status", r#"{"ip": "10.0.0.1"}"#)),
            app_b.oneshot(post("/status", r#"{"ip": "10.0.0.2"}"#)),
        );

        let body_a = body_json(res_a.unwrap()).await;
        let body_b = body_json(res_b.unwrap()).await;

        assert_eq!(body_a["status"], "on");
        assert_eq!(body_a["bmc_ip"], "192.168.1.1");
        assert_eq!(body_b["status"], "off");
        assert_eq!(body_b["bmc_ip"], "192.168.1.2");
    }

    #[tokio::test]
    async fn test_healthz() {
        let app = routes::router(test_state(Arc::new(MockPowerRuntime::new())));

        let request = Request::builder()
            .method("GET")
            .uri("/healthz")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["servers"], 2);
    }
}
