//! Work log entries owned by a single employee.

use serde::{Deserialize, Serialize};

use workify_core::{DomainResult, EpochMillis, RecordId};

use crate::document::{Fields, ID_KEY, require_email, strip_keys};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Owner.
    pub email: String,
    pub created: EpochMillis,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Task {
    pub fn owner(&self) -> &str {
        &self.email
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    /// Absent when the client omitted it; ownership checks treat that as
    /// someone else's task.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created: Option<EpochMillis>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl NewTask {
    pub fn into_task(self, id: RecordId, now: EpochMillis) -> DomainResult<Task> {
        Ok(Task {
            id,
            email: require_email(self.email.as_deref().unwrap_or_default())?,
            created: self.created.unwrap_or(now),
            fields: strip_keys(self.fields, &[ID_KEY]),
        })
    }
}

/// Field-level update for `PUT /owntask/:id`.
///
/// Identity, owner and creation time are fixed for the life of a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch(Fields);

impl TaskPatch {
    pub fn new(fields: Fields) -> Self {
        Self(strip_keys(fields, &[ID_KEY, "email", "created"]))
    }

    /// Merge into `task`; returns whether any field changed.
    pub fn apply(&self, task: &mut Task) -> bool {
        let mut changed = false;
        for (key, value) in &self.0 {
            if task.fields.get(key) != Some(value) {
                task.fields.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }

    pub fn fields(&self) -> &Fields {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task() -> Task {
        let new: NewTask = serde_json::from_value(json!({
            "email": "ann@workify.io",
            "task": "Sales",
            "hours": 4,
        }))
        .unwrap();
        new.into_task(RecordId::new(), 1_700_000_000_000).unwrap()
    }

    #[test]
    fn new_task_keeps_free_form_fields() {
        let task = task();
        assert_eq!(task.owner(), "ann@workify.io");
        assert_eq!(task.created, 1_700_000_000_000);
        assert_eq!(task.fields.get("hours"), Some(&json!(4)));
    }

    #[test]
    fn task_without_owner_is_rejected() {
        let new: NewTask = serde_json::from_value(json!({ "task": "Sales" })).unwrap();
        assert!(new.email.is_none());
        assert!(new.into_task(RecordId::new(), 0).is_err());
    }

    #[test]
    fn patch_cannot_reassign_owner() {
        let mut task = task();
        let fields = json!({ "email": "bob@workify.io", "_id": "x", "hours": 6 });
        let patch = TaskPatch::new(fields.as_object().cloned().unwrap());

        assert!(patch.apply(&mut task));
        assert_eq!(task.owner(), "ann@workify.io");
        assert_eq!(task.fields.get("hours"), Some(&json!(6)));
    }

    #[test]
    fn identical_patch_reports_no_change() {
        let mut task = task();
        let patch = TaskPatch::new(json!({ "hours": 4 }).as_object().cloned().unwrap());
        assert!(!patch.apply(&mut task));
    }
}
