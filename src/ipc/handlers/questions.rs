use serde_json::json;

use crate::editor::EditorSession;
use crate::ipc::error::{editor_error, err, no_backend, ok, sync_failed};
use crate::ipc::types::{AppState, Request};
use crate::store::TestCase;

const QUESTION_TYPES: [&str; 3] = ["coding", "mcq", "text"];

fn handle_questions_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(backend) = state.backend.as_deref() else {
        return no_backend(&req.id);
    };
    match backend.fetch_questions() {
        Ok(questions) => ok(&req.id, json!({ "questions": questions })),
        Err(e) => sync_failed(&req.id, e),
    }
}

fn handle_questions_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(backend) = state.backend.as_deref() else {
        return no_backend(&req.id);
    };
    let editors = &mut state.editors;

    let title = match req.params.get("title").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return err(&req.id, "bad_params", "missing title", None),
    };
    let prompt = match req.params.get("prompt").and_then(|v| v.as_str()) {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => return err(&req.id, "bad_params", "missing prompt", None),
    };
    let question_type = req
        .params
        .get("questionType")
        .and_then(|v| v.as_str())
        .unwrap_or("coding");
    if !QUESTION_TYPES.contains(&question_type) {
        return err(
            &req.id,
            "bad_params",
            format!("unknown questionType: {}", question_type),
            None,
        );
    }

    let mut payload = json!({
        "title": title,
        "prompt": prompt,
        "questionType": question_type,
    });

    // A local editor session means the question is being created together
    // with its authored test cases, as one request.
    let editor_id = req.params.get("editorId").and_then(|v| v.as_str());
    if let Some(eid) = editor_id {
        let Some(session) = editors.get(eid) else {
            return err(&req.id, "not_found", "editor session not found", None);
        };
        if !session.is_local() {
            return err(
                &req.id,
                "bad_params",
                "editor is already bound to a question",
                None,
            );
        }
        if question_type != "coding" && !session.cases().is_empty() {
            return err(
                &req.id,
                "bad_params",
                "test cases only apply to coding questions",
                None,
            );
        }
        payload["testCases"] = json!(session.bundle_drafts());
    }

    let created = match backend.create_question(&payload) {
        Ok(v) => v,
        Err(e) => return sync_failed(&req.id, e),
    };

    if let Some(eid) = editor_id {
        let question_id = match created.get("id").and_then(|v| v.as_str()) {
            Some(v) => v.to_string(),
            None => {
                return err(
                    &req.id,
                    "sync_failed",
                    "create response missing question id",
                    None,
                )
            }
        };
        let cases: Vec<TestCase> = match created.get("testCases") {
            Some(v) => match serde_json::from_value(v.clone()) {
                Ok(c) => c,
                Err(e) => {
                    return err(
                        &req.id,
                        "sync_failed",
                        format!("invalid testCases in create response: {}", e),
                        None,
                    )
                }
            },
            None => match backend.fetch_cases(&question_id) {
                Ok(c) => c,
                Err(e) => return sync_failed(&req.id, e),
            },
        };
        let Some(session) = editors.get_mut(eid) else {
            return err(&req.id, "not_found", "editor session not found", None);
        };
        session.bind_remote(&question_id, cases);
        return ok(
            &req.id,
            json!({ "question": created, "cases": session.cases() }),
        );
    }

    ok(&req.id, json!({ "question": created }))
}

fn handle_questions_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(backend) = state.backend.as_deref() else {
        return no_backend(&req.id);
    };
    let question_id = match req.params.get("questionId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing questionId", None),
    };
    let Some(patch) = req.params.get("patch").filter(|v| v.is_object()) else {
        return err(&req.id, "bad_params", "missing patch object", None);
    };
    match backend.update_question(&question_id, patch) {
        Ok(updated) => ok(&req.id, json!({ "question": updated })),
        Err(e) => sync_failed(&req.id, e),
    }
}

fn handle_questions_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(backend) = state.backend.as_deref() else {
        return no_backend(&req.id);
    };
    let question_id = match req.params.get("questionId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing questionId", None),
    };
    match backend.delete_question(&question_id) {
        Ok(()) => ok(&req.id, json!({ "ok": true })),
        Err(e) => sync_failed(&req.id, e),
    }
}

fn handle_editor_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    match req.params.get("questionId").and_then(|v| v.as_str()) {
        Some(question_id) => {
            let Some(backend) = state.backend.as_deref() else {
                return no_backend(&req.id);
            };
            let session = match EditorSession::open_remote(question_id, backend) {
                Ok(s) => s,
                Err(e) => return editor_error(&req.id, e),
            };
            let cases = json!(session.cases());
            let opened_at = session.opened_at.to_rfc3339();
            let editor_id = state.editors.insert(session);
            ok(
                &req.id,
                json!({
                    "editorId": editor_id,
                    "mode": "remote",
                    "openedAt": opened_at,
                    "cases": cases
                }),
            )
        }
        None => {
            let session = EditorSession::open_local();
            let opened_at = session.opened_at.to_rfc3339();
            let editor_id = state.editors.insert(session);
            ok(
                &req.id,
                json!({
                    "editorId": editor_id,
                    "mode": "local",
                    "openedAt": opened_at,
                    "cases": []
                }),
            )
        }
    }
}

fn handle_editor_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    let editor_id = match req.params.get("editorId").and_then(|v| v.as_str()) {
        Some(v) => v.to_string(),
        None => return err(&req.id, "bad_params", "missing editorId", None),
    };
    // Closing discards any unsubmitted local records; no server call.
    match state.editors.close(&editor_id) {
        Some(_) => ok(&req.id, json!({ "ok": true })),
        None => err(&req.id, "not_found", "editor session not found", None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "questions.list" => Some(handle_questions_list(state, req)),
        "questions.create" => Some(handle_questions_create(state, req)),
        "questions.update" => Some(handle_questions_update(state, req)),
        "questions.delete" => Some(handle_questions_delete(state, req)),
        "questions.editor.open" => Some(handle_editor_open(state, req)),
        "questions.editor.close" => Some(handle_editor_close(state, req)),
        _ => None,
    }
}
