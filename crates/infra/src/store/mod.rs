//! Document store abstractions for the four Workify collections.
//!
//! Mutations report store-native counts (`matchedCount`/`modifiedCount`)
//! rather than the updated document, which is what the HTTP layer returns.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use workify_auth::{DirectoryError, IdentityDirectory, Role};
use workify_core::{EpochMillis, RecordId};
use workify_hr::{Payment, Review, Task, TaskPatch, Toggle, UserProfile};

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error during {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("stored document is malformed: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: RecordId,
}

impl InsertResult {
    pub fn new(inserted_id: RecordId) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<RecordId>,
}

impl UpdateResult {
    pub fn matched(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_count: 0,
            upserted_id: None,
        }
    }

    pub fn upserted(id: RecordId) -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 1,
            upserted_id: Some(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

/// Result of registering a profile keyed by email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(UpdateResult),
    AlreadyExists,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserProfile>>;

    /// The raw stored `role` value, without decoding the rest of the profile.
    /// `None` when the account or its role is absent.
    async fn find_role(&self, email: &str) -> StoreResult<Option<String>>;

    /// Newest first; `role = None` lists every account.
    async fn list(&self, role: Option<Role>) -> StoreResult<Vec<UserProfile>>;

    /// Insert unless an account with the same email exists. Atomic per email.
    async fn insert_if_absent(&self, user: UserProfile) -> StoreResult<UpsertOutcome>;

    /// Flip one flag in a single atomic operation.
    async fn toggle(&self, id: RecordId, toggle: Toggle) -> StoreResult<UpdateResult>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: Task) -> StoreResult<InsertResult>;
    async fn find_by_id(&self, id: RecordId) -> StoreResult<Option<Task>>;

    /// Newest first; `owner = None` lists every task.
    async fn list(&self, owner: Option<&str>) -> StoreResult<Vec<Task>>;
    async fn update(&self, id: RecordId, patch: &TaskPatch) -> StoreResult<UpdateResult>;
    async fn delete(&self, id: RecordId) -> StoreResult<DeleteResult>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: Payment) -> StoreResult<InsertResult>;

    /// Newest first; `owner = None` lists every record.
    async fn list(&self, owner: Option<&str>) -> StoreResult<Vec<Payment>>;

    /// Paid records of one employee, oldest payout first.
    async fn list_paid(&self, owner: &str) -> StoreResult<Vec<Payment>>;

    /// One-way: an already paid record is matched but not modified.
    async fn mark_paid(
        &self,
        id: RecordId,
        transaction_id: &str,
        at: EpochMillis,
    ) -> StoreResult<UpdateResult>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert(&self, review: Review) -> StoreResult<InsertResult>;
    async fn list(&self) -> StoreResult<Vec<Review>>;
}

/// Exposes a [`UserStore`] to the policy engine.
pub struct UserDirectory {
    users: Arc<dyn UserStore>,
}

impl UserDirectory {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl IdentityDirectory for UserDirectory {
    async fn current_role(&self, email: &str) -> Result<Option<Role>, DirectoryError> {
        let raw = self
            .users
            .find_role(email)
            .await
            .map_err(|e| DirectoryError(e.to_string()))?;

        // An unrecognised stored role grants nothing.
        Ok(raw.and_then(|role| {
            role.parse::<Role>()
                .inspect_err(|e| tracing::warn!(email, error = %e, "stored role not recognised"))
                .ok()
        }))
    }
}

/// Newest first, ties broken by id so listings are stable.
pub(crate) fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (EpochMillis, RecordId)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    /// Role lookups only; every other operation is unused by the directory.
    struct RolesOnly(HashMap<&'static str, &'static str>);

    #[async_trait]
    impl UserStore for RolesOnly {
        async fn find_by_email(&self, _email: &str) -> StoreResult<Option<UserProfile>> {
            unreachable!("directory must not decode whole profiles")
        }

        async fn find_role(&self, email: &str) -> StoreResult<Option<String>> {
            Ok(self.0.get(email).map(|r| r.to_string()))
        }

        async fn list(&self, _role: Option<Role>) -> StoreResult<Vec<UserProfile>> {
            unreachable!()
        }

        async fn insert_if_absent(&self, _user: UserProfile) -> StoreResult<UpsertOutcome> {
            unreachable!()
        }

        async fn toggle(&self, _id: RecordId, _toggle: Toggle) -> StoreResult<UpdateResult> {
            unreachable!()
        }
    }

    fn directory() -> UserDirectory {
        let roles = HashMap::from([
            ("hr@workify.io", "HR"),
            ("admin@workify.io", "Admin"),
            ("legacy@workify.io", "Manager"),
        ]);
        UserDirectory::new(Arc::new(RolesOnly(roles)))
    }

    #[tokio::test]
    async fn known_roles_resolve() {
        let dir = directory();
        assert_eq!(dir.current_role("hr@workify.io").await.unwrap(), Some(Role::Hr));
        assert_eq!(dir.current_role("admin@workify.io").await.unwrap(), Some(Role::Admin));
    }

    #[tokio::test]
    async fn unknown_stored_role_is_no_role() {
        let dir = directory();
        assert_eq!(dir.current_role("legacy@workify.io").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_account_is_no_role() {
        let dir = directory();
        assert_eq!(dir.current_role("ghost@workify.io").await.unwrap(), None);
    }
}
