use serde_json::{json, Map, Value};
use tracing::warn;

use crate::error::{EditorError, SyncError};
use crate::identity::CaseId;
use crate::store::{CaseDraft, CasePatch, CasePayload, CaseStore, Direction, TestCase};

/// Admin directory collections exposed by the platform API as plain REST
/// resources. The directory screens are pass-through CRUD over these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Students,
    Corporates,
    Universities,
}

impl Resource {
    pub fn parse(s: &str) -> Option<Resource> {
        match s {
            "students" => Some(Resource::Students),
            "corporates" => Some(Resource::Corporates),
            "universities" => Some(Resource::Universities),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Resource::Students => "students",
            Resource::Corporates => "corporates",
            Resource::Universities => "universities",
        }
    }
}

/// The seam to the platform API. Conventional REST with JSON bodies;
/// implemented by `RestBackend` in production and by an in-memory fake in
/// tests.
pub trait Backend {
    fn fetch_cases(&self, question_id: &str) -> Result<Vec<TestCase>, SyncError>;
    fn create_case(
        &self,
        question_id: &str,
        payload: &CasePayload,
    ) -> Result<TestCase, SyncError>;
    fn update_case(&self, case_id: &str, patch: &Value) -> Result<TestCase, SyncError>;
    fn delete_case(&self, case_id: &str) -> Result<(), SyncError>;

    fn fetch_questions(&self) -> Result<Vec<Value>, SyncError>;
    fn create_question(&self, payload: &Value) -> Result<Value, SyncError>;
    fn update_question(&self, question_id: &str, patch: &Value) -> Result<Value, SyncError>;
    fn delete_question(&self, question_id: &str) -> Result<(), SyncError>;

    fn list_records(&self, resource: Resource) -> Result<Vec<Value>, SyncError>;
    fn create_record(&self, resource: Resource, body: &Value) -> Result<Value, SyncError>;
    fn update_record(&self, resource: Resource, id: &str, body: &Value)
        -> Result<Value, SyncError>;
    fn delete_record(&self, resource: Resource, id: &str) -> Result<(), SyncError>;
}

/// Whether the owning question exists on the server yet. This one flag
/// decides the behavior of every collection mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionRef {
    Local,
    Remote(String),
}

impl QuestionRef {
    pub fn is_local(&self) -> bool {
        matches!(self, QuestionRef::Local)
    }
}

/// The dual-mode mutation engine for one question's test-case collection.
///
/// In local mode every operation is purely in-memory; the collection is
/// bundled into the question-creation payload later. In remote mode every
/// mutation round-trips to the platform API before the in-memory state is
/// authoritative: the store is updated optimistically, the server response
/// is merged back (server wins), and a sync failure restores the
/// pre-mutation snapshot.
pub struct Gateway<'a> {
    question: &'a QuestionRef,
    backend: Option<&'a dyn Backend>,
}

impl<'a> Gateway<'a> {
    pub fn new(question: &'a QuestionRef, backend: Option<&'a dyn Backend>) -> Self {
        Self { question, backend }
    }

    fn backend(&self) -> Result<&'a dyn Backend, EditorError> {
        self.backend.ok_or(EditorError::NoBackend)
    }

    /// Initial collection for an editor session: empty for a local
    /// question, the server's list for a remote one.
    pub fn load(&self) -> Result<CaseStore, EditorError> {
        match self.question {
            QuestionRef::Local => Ok(CaseStore::new()),
            QuestionRef::Remote(qid) => {
                let backend = self.backend()?;
                let cases = backend.fetch_cases(qid)?;
                Ok(CaseStore::from_records(cases))
            }
        }
    }

    pub fn add(&self, store: &mut CaseStore, draft: CaseDraft) -> Result<TestCase, EditorError> {
        draft.validate()?;
        match self.question {
            QuestionRef::Local => {
                let case = TestCase {
                    id: CaseId::mint_local(),
                    input_data: draft.input_data,
                    expected_output: draft.expected_output,
                    is_hidden: draft.is_hidden,
                    points: draft.points,
                    order: store.next_order(),
                };
                store.append(case.clone());
                Ok(case)
            }
            QuestionRef::Remote(qid) => {
                let backend = self.backend()?;
                // A provisional record holds the slot while the create is
                // in flight; it never outlives this call.
                let provisional = TestCase {
                    id: CaseId::mint_local(),
                    input_data: draft.input_data,
                    expected_output: draft.expected_output,
                    is_hidden: draft.is_hidden,
                    points: draft.points,
                    order: store.next_order(),
                };
                let provisional_id = provisional.id.clone();
                let payload = provisional.payload();
                store.append(provisional);
                match backend.create_case(qid, &payload) {
                    Ok(created) => {
                        store.replace(&provisional_id, created.clone())?;
                        Ok(created)
                    }
                    Err(e) => {
                        store.remove(&provisional_id)?;
                        Err(e.into())
                    }
                }
            }
        }
    }

    pub fn update(
        &self,
        store: &mut CaseStore,
        id: &CaseId,
        patch: CasePatch,
    ) -> Result<TestCase, EditorError> {
        patch.validate()?;
        match self.question {
            QuestionRef::Local => store.apply_patch(id, &patch),
            QuestionRef::Remote(_) => {
                let backend = self.backend()?;
                if !store.contains(id) {
                    return Err(EditorError::not_found(id));
                }
                let snapshot = store.snapshot();
                store.apply_patch(id, &patch)?;
                match backend.update_case(id.as_str(), &patch_body(&patch)) {
                    Ok(server) => {
                        // Authoritative merge: the server's record replaces
                        // the optimistic one.
                        store.replace(id, server.clone())?;
                        Ok(server)
                    }
                    Err(e) => {
                        store.restore(snapshot);
                        Err(e.into())
                    }
                }
            }
        }
    }

    pub fn remove(&self, store: &mut CaseStore, id: &CaseId) -> Result<(), EditorError> {
        match self.question {
            QuestionRef::Local => {
                store.remove(id)?;
                Ok(())
            }
            QuestionRef::Remote(_) => {
                let backend = self.backend()?;
                if !store.contains(id) {
                    return Err(EditorError::not_found(id));
                }
                let snapshot = store.snapshot();
                let removed = store.remove(id)?;
                if let Err(e) = backend.delete_case(removed.id.as_str()) {
                    store.restore(snapshot);
                    return Err(e.into());
                }
                // The delete is durable; keep the server's orders aligned
                // with the renumbered tail. A failed patch here degrades to
                // a warning rather than failing the whole operation.
                let start = removed.order as usize;
                for case in &store.list()[start..] {
                    if let Err(e) =
                        backend.update_case(case.id.as_str(), &json!({ "order": case.order }))
                    {
                        warn!(
                            case = case.id.as_str(),
                            error = %e,
                            "order renumber patch failed after delete"
                        );
                    }
                }
                Ok(())
            }
        }
    }

    /// Move the record one step. Returns `false` for a boundary no-op, in
    /// which case nothing was mutated and no call was issued.
    pub fn reorder(
        &self,
        store: &mut CaseStore,
        id: &CaseId,
        direction: Direction,
    ) -> Result<bool, EditorError> {
        match self.question {
            QuestionRef::Local => Ok(store.swap_with_neighbor(id, direction)?.is_some()),
            QuestionRef::Remote(_) => {
                let backend = self.backend()?;
                if !store.contains(id) {
                    return Err(EditorError::not_found(id));
                }
                let snapshot = store.snapshot();
                let Some(swap) = store.swap_with_neighbor(id, direction)? else {
                    return Ok(false);
                };
                // Both sides of the swap are persisted so a reload cannot
                // invert the pair.
                if let Err(e) = backend
                    .update_case(swap.moved.as_str(), &json!({ "order": swap.moved_order }))
                {
                    store.restore(snapshot);
                    return Err(e.into());
                }
                if let Err(e) = backend.update_case(
                    swap.neighbor.as_str(),
                    &json!({ "order": swap.neighbor_order }),
                ) {
                    store.restore(snapshot);
                    // Put the moved record's server order back; if even the
                    // compensation fails the server is left stale and we can
                    // only log it.
                    if let Err(undo) = backend.update_case(
                        swap.moved.as_str(),
                        &json!({ "order": swap.neighbor_order }),
                    ) {
                        warn!(
                            case = swap.moved.as_str(),
                            error = %undo,
                            "compensating order patch failed; server order may be stale"
                        );
                    }
                    return Err(e.into());
                }
                Ok(true)
            }
        }
    }
}

/// Partial update body with only the patched fields, in wire names.
fn patch_body(patch: &CasePatch) -> Value {
    let mut body = Map::new();
    if let Some(v) = &patch.input_data {
        body.insert("inputData".to_string(), json!(v));
    }
    if let Some(v) = &patch.expected_output {
        body.insert("expectedOutput".to_string(), json!(v));
    }
    if let Some(v) = patch.is_hidden {
        body.insert("isHidden".to_string(), json!(v));
    }
    if let Some(v) = patch.points {
        body.insert("points".to_string(), json!(v));
    }
    Value::Object(body)
}
