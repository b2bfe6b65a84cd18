use serde_json::json;
use tracing::info;

use crate::api::RestBackend;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};

fn handle_health(_state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
    )
}

fn handle_backend_connect(state: &mut AppState, req: &Request) -> serde_json::Value {
    let base_url = match req.params.get("baseUrl").and_then(|v| v.as_str()) {
        Some(v) => v.trim().to_string(),
        None => return err(&req.id, "bad_params", "missing baseUrl", None),
    };
    if base_url.is_empty() {
        return err(&req.id, "bad_params", "baseUrl must not be empty", None);
    }
    let token = req
        .params
        .get("token")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let backend = match RestBackend::new(&base_url, token, state.config.http_timeout_secs) {
        Ok(b) => b,
        Err(e) => return err(&req.id, "connect_failed", e.to_string(), None),
    };
    state.attach_backend(Box::new(backend), &base_url);
    info!(base_url = %base_url, "backend connected");

    ok(&req.id, json!({ "baseUrl": base_url }))
}

fn handle_backend_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "connected": state.backend.is_some(),
            "baseUrl": state.backend_url,
            "connectedAt": state.connected_at.map(|t| t.to_rfc3339()),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "backend.connect" => Some(handle_backend_connect(state, req)),
        "backend.status" => Some(handle_backend_status(state, req)),
        _ => None,
    }
}
