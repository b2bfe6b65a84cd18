use serde_json::json;

use crate::ipc::error::{err, no_backend, ok, sync_failed};
use crate::ipc::types::{AppState, Request};
use crate::sync::Resource;

// The students/corporates/universities screens are plain tables over the
// platform API; these handlers forward their CRUD verbs without holding any
// local state.

fn handle_list(state: &mut AppState, req: &Request, resource: Resource) -> serde_json::Value {
    let Some(backend) = state.backend.as_deref() else {
        return no_backend(&req.id);
    };
    match backend.list_records(resource) {
        Ok(records) => ok(&req.id, json!({ "records": records })),
        Err(e) => sync_failed(&req.id, e),
    }
}

fn handle_create(state: &mut AppState, req: &Request, resource: Resource) -> serde_json::Value {
    let Some(backend) = state.backend.as_deref() else {
        return no_backend(&req.id);
    };
    let Some(record) = req.params.get("record").filter(|v| v.is_object()) else {
        return err(&req.id, "bad_params", "missing record object", None);
    };
    match backend.create_record(resource, record) {
        Ok(created) => ok(&req.id, json!({ "record": created })),
        Err(e) => sync_failed(&req.id, e),
    }
}

fn handle_update(state: &mut AppState, req: &Request, resource: Resource) -> serde_json::Value {
    let Some(backend) = state.backend.as_deref() else {
        return no_backend(&req.id);
    };
    let id = match req.params.get("recordId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing recordId", None),
    };
    let Some(patch) = req.params.get("patch").filter(|v| v.is_object()) else {
        return err(&req.id, "bad_params", "missing patch object", None);
    };
    match backend.update_record(resource, &id, patch) {
        Ok(updated) => ok(&req.id, json!({ "record": updated })),
        Err(e) => sync_failed(&req.id, e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request, resource: Resource) -> serde_json::Value {
    let Some(backend) = state.backend.as_deref() else {
        return no_backend(&req.id);
    };
    let id = match req.params.get("recordId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing recordId", None),
    };
    match backend.delete_record(resource, &id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => sync_failed(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let (prefix, action) = req.method.split_once('.')?;
    let resource = Resource::parse(prefix)?;
    match action {
        "list" => Some(handle_list(state, req, resource)),
        "create" => Some(handle_create(state, req, resource)),
        "update" => Some(handle_update(state, req, resource)),
        "delete" => Some(handle_delete(state, req, resource)),
        _ => None,
    }
}
