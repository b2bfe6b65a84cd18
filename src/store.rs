use serde::{Deserialize, Serialize};

use crate::error::EditorError;
use crate::identity::CaseId;

/// One validation case of a coding question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: CaseId,
    pub input_data: String,
    pub expected_output: String,
    pub is_hidden: bool,
    pub points: u32,
    pub order: u32,
}

impl TestCase {
    /// Server-bound form of the record: every field except the identity,
    /// which is either minted by the server (create) or already in the URL.
    pub fn payload(&self) -> CasePayload {
        CasePayload {
            input_data: self.input_data.clone(),
            expected_output: self.expected_output.clone(),
            is_hidden: self.is_hidden,
            points: self.points,
            order: self.order,
        }
    }
}

/// Fields the UI supplies when creating a case.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDraft {
    pub input_data: String,
    pub expected_output: String,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default = "default_points")]
    pub points: u32,
}

fn default_points() -> u32 {
    1
}

impl CaseDraft {
    pub fn validate(&self) -> Result<(), EditorError> {
        if self.input_data.trim().is_empty() {
            return Err(EditorError::empty_field("inputData"));
        }
        if self.expected_output.trim().is_empty() {
            return Err(EditorError::empty_field("expectedOutput"));
        }
        if self.points == 0 {
            return Err(EditorError::Validation {
                field: "points",
                message: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// Partial update of a case. `id` and `order` are deliberately absent:
/// identity never changes in place and order moves only through reorder.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CasePatch {
    pub input_data: Option<String>,
    pub expected_output: Option<String>,
    pub is_hidden: Option<bool>,
    pub points: Option<u32>,
}

impl CasePatch {
    pub fn validate(&self) -> Result<(), EditorError> {
        if let Some(v) = &self.input_data {
            if v.trim().is_empty() {
                return Err(EditorError::empty_field("inputData"));
            }
        }
        if let Some(v) = &self.expected_output {
            if v.trim().is_empty() {
                return Err(EditorError::empty_field("expectedOutput"));
            }
        }
        if self.points == Some(0) {
            return Err(EditorError::Validation {
                field: "points",
                message: "must be at least 1",
            });
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.input_data.is_none()
            && self.expected_output.is_none()
            && self.is_hidden.is_none()
            && self.points.is_none()
    }
}

/// Wire form of a case draft sent to the platform API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CasePayload {
    pub input_data: String,
    pub expected_output: String,
    pub is_hidden: bool,
    pub points: u32,
    pub order: u32,
}

/// Single-step move direction exposed by the editor UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Outcome of an adjacent swap: the two records whose orders changed, with
/// their new orders. `neighbor_order` is also the moved record's previous
/// order, which is what a compensating patch must restore.
#[derive(Debug, Clone, PartialEq)]
pub struct Swap {
    pub moved: CaseId,
    pub moved_order: u32,
    pub neighbor: CaseId,
    pub neighbor_order: u32,
}

/// The canonical ordered test-case collection for one question.
///
/// Records are kept sorted by `order`, and orders form a dense 0..N-1
/// sequence after every completed mutation.
#[derive(Debug, Clone, Default)]
pub struct CaseStore {
    records: Vec<TestCase>,
}

impl CaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopt records from the server: sort by order, then renumber densely
    /// in case the upstream sequence had gaps.
    pub fn from_records(mut records: Vec<TestCase>) -> Self {
        records.sort_by_key(|c| c.order);
        let mut store = Self { records };
        store.renumber();
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn list(&self) -> &[TestCase] {
        &self.records
    }

    pub fn next_order(&self) -> u32 {
        self.records.len() as u32
    }

    pub fn get(&self, id: &CaseId) -> Option<&TestCase> {
        self.records.iter().find(|c| &c.id == id)
    }

    pub fn contains(&self, id: &CaseId) -> bool {
        self.get(id).is_some()
    }

    /// Full copy of the collection, taken before an optimistic remote
    /// mutation so a sync failure can be rolled back.
    pub fn snapshot(&self) -> Vec<TestCase> {
        self.records.clone()
    }

    pub fn restore(&mut self, snapshot: Vec<TestCase>) {
        self.records = snapshot;
    }

    /// Append a record at the end of the collection.
    pub fn append(&mut self, mut case: TestCase) {
        case.order = self.next_order();
        self.records.push(case);
    }

    /// Replace the record matching `id` with `case`, keeping its slot, then
    /// re-sort in case the replacement carries a different order.
    pub fn replace(&mut self, id: &CaseId, case: TestCase) -> Result<(), EditorError> {
        let pos = self
            .position(id)
            .ok_or_else(|| EditorError::not_found(id))?;
        self.records[pos] = case;
        self.resort();
        Ok(())
    }

    pub fn apply_patch(&mut self, id: &CaseId, patch: &CasePatch) -> Result<TestCase, EditorError> {
        let pos = self
            .position(id)
            .ok_or_else(|| EditorError::not_found(id))?;
        let case = &mut self.records[pos];
        if let Some(v) = &patch.input_data {
            case.input_data = v.clone();
        }
        if let Some(v) = &patch.expected_output {
            case.expected_output = v.clone();
        }
        if let Some(v) = patch.is_hidden {
            case.is_hidden = v;
        }
        if let Some(v) = patch.points {
            case.points = v;
        }
        Ok(case.clone())
    }

    /// Remove the record and close the gap: every record after it shifts
    /// down by one, which is what keeps the order sequence dense.
    pub fn remove(&mut self, id: &CaseId) -> Result<TestCase, EditorError> {
        let pos = self
            .position(id)
            .ok_or_else(|| EditorError::not_found(id))?;
        let removed = self.records.remove(pos);
        self.renumber();
        Ok(removed)
    }

    /// Swap the record with its immediate neighbor in `direction`.
    ///
    /// Returns `Ok(None)` when the record already sits at that boundary (a
    /// no-op for callers, not an error). Otherwise exactly two records
    /// change order.
    pub fn swap_with_neighbor(
        &mut self,
        id: &CaseId,
        direction: Direction,
    ) -> Result<Option<Swap>, EditorError> {
        let pos = self
            .position(id)
            .ok_or_else(|| EditorError::not_found(id))?;
        let neighbor_pos = match direction {
            Direction::Up => {
                if pos == 0 {
                    return Ok(None);
                }
                pos - 1
            }
            Direction::Down => {
                if pos + 1 >= self.records.len() {
                    return Ok(None);
                }
                pos + 1
            }
        };

        let moved_old = self.records[pos].order;
        let neighbor_old = self.records[neighbor_pos].order;
        self.records[pos].order = neighbor_old;
        self.records[neighbor_pos].order = moved_old;
        self.records.swap(pos, neighbor_pos);

        Ok(Some(Swap {
            moved: self.records[neighbor_pos].id.clone(),
            moved_order: neighbor_old,
            neighbor: self.records[pos].id.clone(),
            neighbor_order: moved_old,
        }))
    }

    /// Stable re-sort by order followed by a dense renumber. Used after an
    /// authoritative server record lands in the collection.
    pub fn resort(&mut self) {
        self.records.sort_by_key(|c| c.order);
        self.renumber();
    }

    fn renumber(&mut self) {
        for (i, case) in self.records.iter_mut().enumerate() {
            case.order = i as u32;
        }
    }

    fn position(&self, id: &CaseId) -> Option<usize> {
        self.records.iter().position(|c| &c.id == id)
    }
}
