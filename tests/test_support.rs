#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{json, Value};

use placementd::config::Config;
use placementd::error::{SyncError, SyncOp};
use placementd::ipc::{handle_request, AppState, Request};
use placementd::store::{CasePayload, TestCase};
use placementd::sync::{Backend, Resource};

struct FailRule {
    kind: String,
    skip: u32,
    status: u16,
}

#[derive(Default)]
struct FakeInner {
    questions: Vec<Value>,
    cases: Vec<Value>,
    records: HashMap<String, Vec<Value>>,
    next_id: u32,
    calls: Vec<String>,
    fail_rules: Vec<FailRule>,
}

/// In-memory platform API with REST semantics, call recording, and
/// scripted failures. Cloning shares the underlying state so a test can
/// keep a handle after moving a clone into `AppState`.
#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Rc<RefCell<FakeInner>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call of `kind` (e.g. "update_case") with HTTP 500.
    pub fn fail_next(&self, kind: &str) {
        self.fail_nth(kind, 0);
    }

    /// Skip `skip` matching calls, then fail the next one.
    pub fn fail_nth(&self, kind: &str, skip: u32) {
        self.inner.borrow_mut().fail_rules.push(FailRule {
            kind: kind.to_string(),
            skip,
            status: 500,
        });
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.borrow().calls.clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.inner
            .borrow()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn seed_question(&self, title: &str) -> String {
        let id = self.mint("q");
        self.inner.borrow_mut().questions.push(json!({
            "id": id,
            "title": title,
            "prompt": format!("{} prompt", title),
            "questionType": "coding",
        }));
        id
    }

    pub fn seed_case(
        &self,
        question_id: &str,
        input: &str,
        output: &str,
        points: u32,
        order: u32,
    ) -> String {
        let id = self.mint("tc");
        self.inner.borrow_mut().cases.push(json!({
            "id": id,
            "questionId": question_id,
            "inputData": input,
            "expectedOutput": output,
            "isHidden": false,
            "points": points,
            "order": order,
        }));
        id
    }

    /// Server-side (id, order) pairs for one question, sorted by order.
    pub fn server_orders(&self, question_id: &str) -> Vec<(String, u64)> {
        let inner = self.inner.borrow();
        let mut rows: Vec<(String, u64)> = inner
            .cases
            .iter()
            .filter(|c| c["questionId"] == json!(question_id))
            .map(|c| {
                (
                    c["id"].as_str().unwrap_or_default().to_string(),
                    c["order"].as_u64().unwrap_or_default(),
                )
            })
            .collect();
        rows.sort_by_key(|(_, order)| *order);
        rows
    }

    pub fn case_record(&self, case_id: &str) -> Option<Value> {
        self.inner
            .borrow()
            .cases
            .iter()
            .find(|c| c["id"] == json!(case_id))
            .cloned()
    }

    pub fn question_record(&self, question_id: &str) -> Option<Value> {
        self.inner
            .borrow()
            .questions
            .iter()
            .find(|q| q["id"] == json!(question_id))
            .cloned()
    }

    fn mint(&self, prefix: &str) -> String {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        format!("{}-{}", prefix, inner.next_id)
    }

    fn begin(&self, kind: &str, call: String, op: SyncOp, path: &str) -> Result<(), SyncError> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(call);
        if let Some(pos) = inner.fail_rules.iter().position(|r| r.kind == kind) {
            if inner.fail_rules[pos].skip > 0 {
                inner.fail_rules[pos].skip -= 1;
            } else {
                let rule = inner.fail_rules.remove(pos);
                return Err(SyncError::new(op, path, "injected failure").with_status(rule.status));
            }
        }
        Ok(())
    }
}

fn typed_case(record: &Value) -> TestCase {
    serde_json::from_value(record.clone()).expect("well-formed case record")
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(obj), Some(fields)) = (target.as_object_mut(), patch.as_object()) {
        for (k, v) in fields {
            obj.insert(k.clone(), v.clone());
        }
    }
}

impl Backend for FakeBackend {
    fn fetch_cases(&self, question_id: &str) -> Result<Vec<TestCase>, SyncError> {
        let path = format!("questions/{}/test-cases", question_id);
        self.begin("fetch_cases", format!("GET {}", path), SyncOp::Fetch, &path)?;
        let inner = self.inner.borrow();
        if !inner.questions.iter().any(|q| q["id"] == json!(question_id)) {
            return Err(SyncError::new(SyncOp::Fetch, &path, "question not found").with_status(404));
        }
        let mut rows: Vec<Value> = inner
            .cases
            .iter()
            .filter(|c| c["questionId"] == json!(question_id))
            .cloned()
            .collect();
        rows.sort_by_key(|c| c["order"].as_u64().unwrap_or_default());
        Ok(rows.iter().map(typed_case).collect())
    }

    fn create_case(
        &self,
        question_id: &str,
        payload: &CasePayload,
    ) -> Result<TestCase, SyncError> {
        let path = format!("questions/{}/test-cases", question_id);
        self.begin("create_case", format!("POST {}", path), SyncOp::Create, &path)?;
        {
            let inner = self.inner.borrow();
            if !inner.questions.iter().any(|q| q["id"] == json!(question_id)) {
                return Err(
                    SyncError::new(SyncOp::Create, &path, "question not found").with_status(404)
                );
            }
        }
        let id = self.mint("tc");
        let record = json!({
            "id": id,
            "questionId": question_id,
            "inputData": payload.input_data,
            "expectedOutput": payload.expected_output,
            "isHidden": payload.is_hidden,
            "points": payload.points,
            "order": payload.order,
        });
        self.inner.borrow_mut().cases.push(record.clone());
        Ok(typed_case(&record))
    }

    fn update_case(&self, case_id: &str, patch: &Value) -> Result<TestCase, SyncError> {
        let path = format!("test-cases/{}", case_id);
        self.begin("update_case", format!("PUT {}", path), SyncOp::Update, &path)?;
        let mut inner = self.inner.borrow_mut();
        let Some(record) = inner.cases.iter_mut().find(|c| c["id"] == json!(case_id)) else {
            return Err(SyncError::new(SyncOp::Update, &path, "test case not found").with_status(404));
        };
        merge(record, patch);
        Ok(typed_case(record))
    }

    fn delete_case(&self, case_id: &str) -> Result<(), SyncError> {
        let path = format!("test-cases/{}", case_id);
        self.begin("delete_case", format!("DELETE {}", path), SyncOp::Delete, &path)?;
        let mut inner = self.inner.borrow_mut();
        let Some(pos) = inner.cases.iter().position(|c| c["id"] == json!(case_id)) else {
            return Err(SyncError::new(SyncOp::Delete, &path, "test case not found").with_status(404));
        };
        inner.cases.remove(pos);
        Ok(())
    }

    fn fetch_questions(&self) -> Result<Vec<Value>, SyncError> {
        self.begin(
            "fetch_questions",
            "GET questions".to_string(),
            SyncOp::Fetch,
            "questions",
        )?;
        Ok(self.inner.borrow().questions.clone())
    }

    fn create_question(&self, payload: &Value) -> Result<Value, SyncError> {
        self.begin(
            "create_question",
            "POST questions".to_string(),
            SyncOp::Create,
            "questions",
        )?;
        let qid = self.mint("q");
        let mut question = payload.clone();
        let drafts = question
            .as_object_mut()
            .and_then(|obj| obj.remove("testCases"))
            .unwrap_or(Value::Null);
        question["id"] = json!(qid);
        self.inner.borrow_mut().questions.push(question.clone());

        let mut created = Vec::new();
        if let Some(rows) = drafts.as_array() {
            for draft in rows {
                let id = self.mint("tc");
                let mut record = draft.clone();
                record["id"] = json!(id);
                record["questionId"] = json!(qid);
                self.inner.borrow_mut().cases.push(record.clone());
                created.push(record);
            }
        }
        let mut response = question;
        response["testCases"] = json!(created);
        Ok(response)
    }

    fn update_question(&self, question_id: &str, patch: &Value) -> Result<Value, SyncError> {
        let path = format!("questions/{}", question_id);
        self.begin(
            "update_question",
            format!("PUT {}", path),
            SyncOp::Update,
            &path,
        )?;
        let mut inner = self.inner.borrow_mut();
        let Some(record) = inner
            .questions
            .iter_mut()
            .find(|q| q["id"] == json!(question_id))
        else {
            return Err(SyncError::new(SyncOp::Update, &path, "question not found").with_status(404));
        };
        merge(record, patch);
        Ok(record.clone())
    }

    fn delete_question(&self, question_id: &str) -> Result<(), SyncError> {
        let path = format!("questions/{}", question_id);
        self.begin(
            "delete_question",
            format!("DELETE {}", path),
            SyncOp::Delete,
            &path,
        )?;
        let mut inner = self.inner.borrow_mut();
        let Some(pos) = inner
            .questions
            .iter()
            .position(|q| q["id"] == json!(question_id))
        else {
            return Err(SyncError::new(SyncOp::Delete, &path, "question not found").with_status(404));
        };
        inner.questions.remove(pos);
        inner.cases.retain(|c| c["questionId"] != json!(question_id));
        Ok(())
    }

    fn list_records(&self, resource: Resource) -> Result<Vec<Value>, SyncError> {
        let path = resource.path();
        self.begin("list_records", format!("GET {}", path), SyncOp::Fetch, path)?;
        Ok(self
            .inner
            .borrow()
            .records
            .get(path)
            .cloned()
            .unwrap_or_default())
    }

    fn create_record(&self, resource: Resource, body: &Value) -> Result<Value, SyncError> {
        let path = resource.path();
        self.begin("create_record", format!("POST {}", path), SyncOp::Create, path)?;
        let id = self.mint(path);
        let mut record = body.clone();
        record["id"] = json!(id);
        self.inner
            .borrow_mut()
            .records
            .entry(path.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    fn update_record(
        &self,
        resource: Resource,
        id: &str,
        body: &Value,
    ) -> Result<Value, SyncError> {
        let path = format!("{}/{}", resource.path(), id);
        self.begin("update_record", format!("PUT {}", path), SyncOp::Update, &path)?;
        let mut inner = self.inner.borrow_mut();
        let Some(record) = inner
            .records
            .get_mut(resource.path())
            .and_then(|rows| rows.iter_mut().find(|r| r["id"] == json!(id)))
        else {
            return Err(SyncError::new(SyncOp::Update, &path, "record not found").with_status(404));
        };
        merge(record, body);
        Ok(record.clone())
    }

    fn delete_record(&self, resource: Resource, id: &str) -> Result<(), SyncError> {
        let path = format!("{}/{}", resource.path(), id);
        self.begin("delete_record", format!("DELETE {}", path), SyncOp::Delete, &path)?;
        let mut inner = self.inner.borrow_mut();
        let Some(rows) = inner.records.get_mut(resource.path()) else {
            return Err(SyncError::new(SyncOp::Delete, &path, "record not found").with_status(404));
        };
        let Some(pos) = rows.iter().position(|r| r["id"] == json!(id)) else {
            return Err(SyncError::new(SyncOp::Delete, &path, "record not found").with_status(404));
        };
        rows.remove(pos);
        Ok(())
    }
}

pub fn offline_state() -> AppState {
    AppState::new(Config::default())
}

pub fn state_with_backend() -> (AppState, FakeBackend) {
    let fake = FakeBackend::new();
    let mut state = AppState::new(Config::default());
    state.attach_backend(Box::new(fake.clone()), "http://backend.test");
    (state, fake)
}

pub fn rpc(state: &mut AppState, id: &str, method: &str, params: Value) -> Value {
    handle_request(
        state,
        Request {
            id: id.to_string(),
            method: method.to_string(),
            params,
        },
    )
}

pub fn rpc_ok(state: &mut AppState, id: &str, method: &str, params: Value) -> Value {
    let value = rpc(state, id, method, params);
    assert!(
        value["ok"].as_bool().unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

pub fn rpc_err(state: &mut AppState, id: &str, method: &str, params: Value) -> Value {
    let value = rpc(state, id, method, params);
    assert_eq!(
        value["ok"].as_bool(),
        Some(false),
        "{} unexpectedly succeeded: {}",
        method,
        value
    );
    value.get("error").cloned().unwrap_or_else(|| json!({}))
}

pub fn case_ids(result: &Value) -> Vec<String> {
    result["cases"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .map(|c| c["id"].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

pub fn case_orders(result: &Value) -> Vec<u64> {
    result["cases"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .map(|c| c["order"].as_u64().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default()
}

/// Assert the dense 0..N-1 ordering invariant on a `cases` result payload.
pub fn assert_dense(result: &Value) {
    let orders = case_orders(result);
    let expected: Vec<u64> = (0..orders.len() as u64).collect();
    assert_eq!(orders, expected, "orders must be dense: {}", result);
}
