use std::fmt;

use serde_json::{json, Value};

/// Which platform-API call a sync failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Fetch,
    Create,
    Update,
    Delete,
}

impl SyncOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOp::Fetch => "fetch",
            SyncOp::Create => "create",
            SyncOp::Update => "update",
            SyncOp::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed platform-API call, carrying the transport/status detail so the
/// UI can attribute the failure to the one operation that caused it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{op} {path} failed: {detail}")]
pub struct SyncError {
    pub op: SyncOp,
    pub path: String,
    pub status: Option<u16>,
    pub detail: String,
}

impl SyncError {
    pub fn new(op: SyncOp, path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            op,
            path: path.into(),
            status: None,
            detail: detail.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn details(&self) -> Value {
        json!({
            "op": self.op.as_str(),
            "path": self.path,
            "status": self.status,
        })
    }
}

/// Errors surfaced by the test-case editor core.
///
/// `Validation` and `NotFound` are resolved before any network call and
/// leave the store untouched. `Sync` is surfaced after an optimistic local
/// mutation has been rolled back, so the store never reflects a failed
/// mutation. `NoBackend` means a remote-mode operation was attempted while
/// no backend is connected.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("{field} {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },
    #[error("no test case with id {id}")]
    NotFound { id: String },
    #[error("no backend connected")]
    NoBackend,
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl EditorError {
    pub fn empty_field(field: &'static str) -> Self {
        EditorError::Validation {
            field,
            message: "must not be empty",
        }
    }

    pub fn not_found(id: &crate::identity::CaseId) -> Self {
        EditorError::NotFound {
            id: id.as_str().to_string(),
        }
    }
}
