use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::EditorError;
use crate::identity::CaseId;
use crate::store::{CaseDraft, CasePatch, CasePayload, CaseStore, Direction, TestCase};
use crate::sync::{Backend, Gateway, QuestionRef};

/// One open test-case editor, owning the collection for a single question.
///
/// Every mutation returns through the gateway, and the caller reads the
/// re-normalized collection back via `cases()`: the response payload of
/// each successful mutation carries it, which is how the owning question
/// form stays current without a separate notification channel.
pub struct EditorSession {
    pub id: String,
    pub question: QuestionRef,
    pub opened_at: DateTime<Utc>,
    store: CaseStore,
}

impl EditorSession {
    /// Editor for a question that has not been submitted yet. No operation
    /// on this session touches the network until it is bound remote.
    pub fn open_local() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            question: QuestionRef::Local,
            opened_at: Utc::now(),
            store: CaseStore::new(),
        }
    }

    /// Editor for a persisted question; loads the server's collection.
    pub fn open_remote(question_id: &str, backend: &dyn Backend) -> Result<Self, EditorError> {
        let question = QuestionRef::Remote(question_id.to_string());
        let store = Gateway::new(&question, Some(backend)).load()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            question,
            opened_at: Utc::now(),
            store,
        })
    }

    pub fn is_local(&self) -> bool {
        self.question.is_local()
    }

    pub fn cases(&self) -> &[TestCase] {
        self.store.list()
    }

    pub fn add(
        &mut self,
        backend: Option<&dyn Backend>,
        draft: CaseDraft,
    ) -> Result<TestCase, EditorError> {
        Gateway::new(&self.question, backend).add(&mut self.store, draft)
    }

    pub fn update(
        &mut self,
        backend: Option<&dyn Backend>,
        id: &CaseId,
        patch: CasePatch,
    ) -> Result<TestCase, EditorError> {
        Gateway::new(&self.question, backend).update(&mut self.store, id, patch)
    }

    pub fn remove(
        &mut self,
        backend: Option<&dyn Backend>,
        id: &CaseId,
    ) -> Result<(), EditorError> {
        Gateway::new(&self.question, backend).remove(&mut self.store, id)
    }

    pub fn reorder(
        &mut self,
        backend: Option<&dyn Backend>,
        id: &CaseId,
        direction: Direction,
    ) -> Result<bool, EditorError> {
        Gateway::new(&self.question, backend).reorder(&mut self.store, id, direction)
    }

    /// Ordered drafts for embedding into a question-creation payload. Local
    /// ids are stripped here: they mean nothing to the server.
    pub fn bundle_drafts(&self) -> Vec<CasePayload> {
        self.store.list().iter().map(TestCase::payload).collect()
    }

    /// After the owning question is created on the server, adopt its id and
    /// the server's returned records. The local records are replaced
    /// wholesale, not updated: their ids are gone.
    pub fn bind_remote(&mut self, question_id: &str, server_cases: Vec<TestCase>) {
        self.question = QuestionRef::Remote(question_id.to_string());
        self.store = CaseStore::from_records(server_cases);
    }
}

/// Registry of open editor sessions, keyed by minted session id.
#[derive(Default)]
pub struct Editors {
    sessions: HashMap<String, EditorSession>,
}

impl Editors {
    pub fn insert(&mut self, session: EditorSession) -> String {
        let id = session.id.clone();
        self.sessions.insert(id.clone(), session);
        id
    }

    pub fn get(&self, id: &str) -> Option<&EditorSession> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut EditorSession> {
        self.sessions.get_mut(id)
    }

    /// Closing a local session discards its records with no server call.
    pub fn close(&mut self, id: &str) -> Option<EditorSession> {
        self.sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
