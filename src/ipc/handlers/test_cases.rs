use serde_json::json;

use crate::identity::CaseId;
use crate::ipc::error::{editor_error, err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{CaseDraft, CasePatch, Direction};

// Test-case editing for one open editor session. Every successful mutation
// response carries the full re-normalized collection, which is what the
// owning question form reads when it assembles its own payload.

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let editor_id = match req.params.get("editorId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing editorId", None),
    };
    let Some(session) = state.editors.get(&editor_id) else {
        return err(&req.id, "not_found", "editor session not found", None);
    };
    ok(&req.id, json!({ "cases": session.cases() }))
}

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = state.backend.as_deref();
    let editor_id = match req.params.get("editorId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing editorId", None),
    };
    let draft: CaseDraft = match serde_json::from_value(req.params.clone()) {
        Ok(d) => d,
        Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
    };
    let Some(session) = state.editors.get_mut(&editor_id) else {
        return err(&req.id, "not_found", "editor session not found", None);
    };
    match session.add(backend, draft) {
        Ok(case) => ok(&req.id, json!({ "case": case, "cases": session.cases() })),
        Err(e) => editor_error(&req.id, e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = state.backend.as_deref();
    let editor_id = match req.params.get("editorId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing editorId", None),
    };
    let case_id = match req.params.get("caseId").and_then(|v| v.as_str()) {
        Some(v) => CaseId::classify(v),
        None => return err(&req.id, "bad_params", "missing caseId", None),
    };
    let patch: CasePatch = match req.params.get("patch") {
        Some(v) if v.is_object() => match serde_json::from_value(v.clone()) {
            Ok(p) => p,
            Err(e) => return err(&req.id, "bad_params", e.to_string(), None),
        },
        _ => return err(&req.id, "bad_params", "missing patch object", None),
    };
    if patch.is_empty() {
        return err(&req.id, "bad_params", "patch has no fields", None);
    }
    let Some(session) = state.editors.get_mut(&editor_id) else {
        return err(&req.id, "not_found", "editor session not found", None);
    };
    match session.update(backend, &case_id, patch) {
        Ok(case) => ok(&req.id, json!({ "case": case, "cases": session.cases() })),
        Err(e) => editor_error(&req.id, e),
    }
}

fn handle_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = state.backend.as_deref();
    let editor_id = match req.params.get("editorId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing editorId", None),
    };
    let case_id = match req.params.get("caseId").and_then(|v| v.as_str()) {
        Some(v) => CaseId::classify(v),
        None => return err(&req.id, "bad_params", "missing caseId", None),
    };
    let Some(session) = state.editors.get_mut(&editor_id) else {
        return err(&req.id, "not_found", "editor session not found", None);
    };
    match session.remove(backend, &case_id) {
        Ok(()) => ok(&req.id, json!({ "cases": session.cases() })),
        Err(e) => editor_error(&req.id, e),
    }
}

fn handle_move(state: &mut AppState, req: &Request) -> serde_json::Value {
    let backend = state.backend.as_deref();
    let editor_id = match req.params.get("editorId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing editorId", None),
    };
    let case_id = match req.params.get("caseId").and_then(|v| v.as_str()) {
        Some(v) => CaseId::classify(v),
        None => return err(&req.id, "bad_params", "missing caseId", None),
    };
    let direction = match req.params.get("direction").and_then(|v| v.as_str()) {
        Some("up") => Direction::Up,
        Some("down") => Direction::Down,
        _ => {
            return err(
                &req.id,
                "bad_params",
                "direction must be \"up\" or \"down\"",
                None,
            )
        }
    };
    let Some(session) = state.editors.get_mut(&editor_id) else {
        return err(&req.id, "not_found", "editor session not found", None);
    };
    match session.reorder(backend, &case_id, direction) {
        Ok(moved) => ok(
            &req.id,
            json!({ "moved": moved, "cases": session.cases() }),
        ),
        Err(e) => editor_error(&req.id, e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "testCases.list" => Some(handle_list(state, req)),
        "testCases.add" => Some(handle_add(state, req)),
        "testCases.update" => Some(handle_update(state, req)),
        "testCases.remove" => Some(handle_remove(state, req)),
        "testCases.move" => Some(handle_move(state, req)),
        _ => None,
    }
}
