use serde_json::{json, Value};

use crate::ipc::error::{err, no_backend, ok};
use crate::ipc::types::{AppState, Request};
use crate::sync::Resource;

// Bulk upload: the UI parses the CSV and hands over the rows; the daemon
// owns the row-preview contract (per-row verdicts, no writes) and the
// apply step (per-row creates with per-row failure attribution).

fn required_fields(resource: Resource) -> &'static [&'static str] {
    match resource {
        Resource::Students => &["firstName", "lastName", "email"],
        Resource::Corporates => &["name"],
        Resource::Universities => &["name"],
    }
}

fn row_errors(resource: Resource, row: &Value) -> Vec<String> {
    let Some(obj) = row.as_object() else {
        return vec!["row must be an object".to_string()];
    };
    let mut errors = Vec::new();
    for field in required_fields(resource) {
        let present = obj
            .get(*field)
            .and_then(|v| v.as_str())
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        if !present {
            errors.push(format!("missing {}", field));
        }
    }
    errors
}

fn parse_rows<'a>(req: &'a Request) -> Result<(Resource, &'a Vec<Value>), serde_json::Value> {
    let resource = match req.params.get("resource").and_then(|v| v.as_str()) {
        Some(v) => match Resource::parse(v) {
            Some(r) => r,
            None => {
                return Err(err(
                    &req.id,
                    "bad_params",
                    format!("unknown resource: {}", v),
                    None,
                ))
            }
        },
        None => return Err(err(&req.id, "bad_params", "missing resource", None)),
    };
    let rows = match req.params.get("rows").and_then(|v| v.as_array()) {
        Some(v) => v,
        None => return Err(err(&req.id, "bad_params", "missing/invalid rows", None)),
    };
    Ok((resource, rows))
}

fn handle_preview(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let (resource, rows) = match parse_rows(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut verdicts = Vec::with_capacity(rows.len());
    let mut error_count = 0usize;
    for (index, row) in rows.iter().enumerate() {
        let errors = row_errors(resource, row);
        if !errors.is_empty() {
            error_count += 1;
        }
        verdicts.push(json!({
            "index": index,
            "ok": errors.is_empty(),
            "errors": errors,
        }));
    }

    ok(
        &req.id,
        json!({
            "rows": verdicts,
            "validCount": rows.len() - error_count,
            "errorCount": error_count,
        }),
    )
}

fn handle_apply(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(backend) = state.backend.as_deref() else {
        return no_backend(&req.id);
    };
    let (resource, rows) = match parse_rows(req) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let mut outcomes = Vec::with_capacity(rows.len());
    let mut created = 0usize;
    let mut failed = 0usize;
    for (index, row) in rows.iter().enumerate() {
        let errors = row_errors(resource, row);
        if !errors.is_empty() {
            failed += 1;
            outcomes.push(json!({ "index": index, "ok": false, "errors": errors }));
            continue;
        }
        match backend.create_record(resource, row) {
            Ok(record) => {
                created += 1;
                outcomes.push(json!({
                    "index": index,
                    "ok": true,
                    "id": record.get("id").cloned().unwrap_or(Value::Null),
                }));
            }
            Err(e) => {
                failed += 1;
                outcomes.push(json!({
                    "index": index,
                    "ok": false,
                    "errors": [e.to_string()],
                }));
            }
        }
    }

    ok(
        &req.id,
        json!({ "rows": outcomes, "created": created, "failed": failed }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "bulk.preview" => Some(handle_preview(state, req)),
        "bulk.apply" => Some(handle_apply(state, req)),
        _ => None,
    }
}
