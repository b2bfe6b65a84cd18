use serde_json::json;

use crate::error::{EditorError, SyncError};

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn no_backend(id: &str) -> serde_json::Value {
    err(id, "no_backend", "connect a backend first", None)
}

pub fn sync_failed(id: &str, e: SyncError) -> serde_json::Value {
    let details = e.details();
    err(id, "sync_failed", e.to_string(), Some(details))
}

/// Map a core editor error onto the IPC error envelope. Each variant keeps
/// its own code so the UI can attribute the failure to the one operation
/// that caused it.
pub fn editor_error(id: &str, e: EditorError) -> serde_json::Value {
    match e {
        EditorError::Validation { field, message } => err(
            id,
            "validation_failed",
            format!("{} {}", field, message),
            Some(json!({ "field": field })),
        ),
        EditorError::NotFound { id: case_id } => err(
            id,
            "not_found",
            format!("no test case with id {}", case_id),
            None,
        ),
        EditorError::NoBackend => no_backend(id),
        EditorError::Sync(s) => sync_failed(id, s),
    }
}
