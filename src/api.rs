use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;

use crate::error::{SyncError, SyncOp};
use crate::store::{CasePayload, TestCase};
use crate::sync::{Backend, Resource};

/// Production `Backend`: blocking HTTP against the platform API, optional
/// bearer token, JSON bodies throughout.
pub struct RestBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl RestBackend {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn send(&self, op: SyncOp, path: &str, builder: RequestBuilder) -> Result<Value, SyncError> {
        let builder = match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        let response = builder.send().map_err(|e| {
            let mut err = SyncError::new(op, path, e.to_string());
            if let Some(status) = e.status() {
                err = err.with_status(status.as_u16());
            }
            err
        })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| SyncError::new(op, path, e.to_string()).with_status(status.as_u16()))?;
        if !status.is_success() {
            let detail = if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(SyncError::new(op, path, detail).with_status(status.as_u16()));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            SyncError::new(op, path, format!("invalid response body: {}", e))
                .with_status(status.as_u16())
        })
    }

    fn get(&self, op: SyncOp, path: &str) -> Result<Value, SyncError> {
        self.send(op, path, self.client.get(self.url(path)))
    }

    fn post(&self, op: SyncOp, path: &str, body: &Value) -> Result<Value, SyncError> {
        self.send(op, path, self.client.post(self.url(path)).json(body))
    }

    fn put(&self, op: SyncOp, path: &str, body: &Value) -> Result<Value, SyncError> {
        self.send(op, path, self.client.put(self.url(path)).json(body))
    }

    fn delete(&self, op: SyncOp, path: &str) -> Result<Value, SyncError> {
        self.send(op, path, self.client.delete(self.url(path)))
    }
}

fn into_case(op: SyncOp, path: &str, value: Value) -> Result<TestCase, SyncError> {
    serde_json::from_value(value)
        .map_err(|e| SyncError::new(op, path, format!("invalid test case in response: {}", e)))
}

fn into_cases(op: SyncOp, path: &str, value: Value) -> Result<Vec<TestCase>, SyncError> {
    serde_json::from_value(value)
        .map_err(|e| SyncError::new(op, path, format!("invalid test cases in response: {}", e)))
}

fn into_list(op: SyncOp, path: &str, value: Value) -> Result<Vec<Value>, SyncError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(SyncError::new(
            op,
            path,
            format!("expected a JSON array, got {}", other),
        )),
    }
}

impl Backend for RestBackend {
    fn fetch_cases(&self, question_id: &str) -> Result<Vec<TestCase>, SyncError> {
        let path = format!("questions/{}/test-cases", question_id);
        let value = self.get(SyncOp::Fetch, &path)?;
        into_cases(SyncOp::Fetch, &path, value)
    }

    fn create_case(
        &self,
        question_id: &str,
        payload: &CasePayload,
    ) -> Result<TestCase, SyncError> {
        let path = format!("questions/{}/test-cases", question_id);
        let body = serde_json::json!(payload);
        let value = self.post(SyncOp::Create, &path, &body)?;
        into_case(SyncOp::Create, &path, value)
    }

    fn update_case(&self, case_id: &str, patch: &Value) -> Result<TestCase, SyncError> {
        let path = format!("test-cases/{}", case_id);
        let value = self.put(SyncOp::Update, &path, patch)?;
        into_case(SyncOp::Update, &path, value)
    }

    fn delete_case(&self, case_id: &str) -> Result<(), SyncError> {
        let path = format!("test-cases/{}", case_id);
        self.delete(SyncOp::Delete, &path).map(|_| ())
    }

    fn fetch_questions(&self) -> Result<Vec<Value>, SyncError> {
        let value = self.get(SyncOp::Fetch, "questions")?;
        into_list(SyncOp::Fetch, "questions", value)
    }

    fn create_question(&self, payload: &Value) -> Result<Value, SyncError> {
        self.post(SyncOp::Create, "questions", payload)
    }

    fn update_question(&self, question_id: &str, patch: &Value) -> Result<Value, SyncError> {
        let path = format!("questions/{}", question_id);
        self.put(SyncOp::Update, &path, patch)
    }

    fn delete_question(&self, question_id: &str) -> Result<(), SyncError> {
        let path = format!("questions/{}", question_id);
        self.delete(SyncOp::Delete, &path).map(|_| ())
    }

    fn list_records(&self, resource: Resource) -> Result<Vec<Value>, SyncError> {
        let path = resource.path();
        let value = self.get(SyncOp::Fetch, path)?;
        into_list(SyncOp::Fetch, path, value)
    }

    fn create_record(&self, resource: Resource, body: &Value) -> Result<Value, SyncError> {
        self.post(SyncOp::Create, resource.path(), body)
    }

    fn update_record(
        &self,
        resource: Resource,
        id: &str,
        body: &Value,
    ) -> Result<Value, SyncError> {
        let path = format!("{}/{}", resource.path(), id);
        self.put(SyncOp::Update, &path, body)
    }

    fn delete_record(&self, resource: Resource, id: &str) -> Result<(), SyncError> {
        let path = format!("{}/{}", resource.path(), id);
        self.delete(SyncOp::Delete, &path).map(|_| ())
    }
}
