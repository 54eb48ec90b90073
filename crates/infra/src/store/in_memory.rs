//! In-memory document store for tests/dev.
//!
//! Each operation runs under a single lock acquisition, which gives the same
//! per-document atomicity the Postgres store gets from single statements.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use workify_auth::Role;
use workify_core::{EpochMillis, RecordId};
use workify_hr::{Payment, Review, Task, TaskPatch, Toggle, UserProfile};

use super::{
    DeleteResult, InsertResult, PaymentStore, ReviewStore, StoreError, StoreResult, TaskStore,
    UpdateResult, UpsertOutcome, UserStore, newest_first,
};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<RecordId, UserProfile>>,
    tasks: RwLock<HashMap<RecordId, Task>>,
    payments: RwLock<HashMap<RecordId, Payment>>,
    reviews: RwLock<HashMap<RecordId, Review>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a document directly, bypassing registration rules.
    ///
    /// Used to provision Admin accounts and to seed tests.
    pub fn put_user(&self, user: UserProfile) -> StoreResult<()> {
        write(&self.users)?.insert(user.id, user);
        Ok(())
    }

    /// Overwrite the stored role of an account, if present.
    pub fn set_role(&self, email: &str, role: Role) -> StoreResult<bool> {
        let mut users = write(&self.users)?;
        match users.values_mut().find(|u| u.email == email) {
            Some(user) => {
                user.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn user_count(&self, email: &str) -> StoreResult<usize> {
        Ok(read(&self.users)?.values().filter(|u| u.email == email).count())
    }
}

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| StoreError::Poisoned)
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| StoreError::Poisoned)
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserProfile>> {
        Ok(read(&self.users)?.values().find(|u| u.email == email).cloned())
    }

    async fn find_role(&self, email: &str) -> StoreResult<Option<String>> {
        Ok(read(&self.users)?
            .values()
            .find(|u| u.email == email)
            .map(|u| u.role.as_str().to_string()))
    }

    async fn list(&self, role: Option<Role>) -> StoreResult<Vec<UserProfile>> {
        let mut users: Vec<UserProfile> = read(&self.users)?
            .values()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect();
        newest_first(&mut users, |u| (u.created, u.id));
        Ok(users)
    }

    async fn insert_if_absent(&self, user: UserProfile) -> StoreResult<UpsertOutcome> {
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.email == user.email) {
            return Ok(UpsertOutcome::AlreadyExists);
        }
        let id = user.id;
        users.insert(id, user);
        Ok(UpsertOutcome::Inserted(UpdateResult::upserted(id)))
    }

    async fn toggle(&self, id: RecordId, toggle: Toggle) -> StoreResult<UpdateResult> {
        let mut users = write(&self.users)?;
        Ok(match users.get_mut(&id) {
            Some(user) => {
                let modified = toggle.apply(user);
                UpdateResult::matched(1, u64::from(modified))
            }
            None => UpdateResult::matched(0, 0),
        })
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn insert(&self, task: Task) -> StoreResult<InsertResult> {
        let id = task.id;
        write(&self.tasks)?.insert(id, task);
        Ok(InsertResult::new(id))
    }

    async fn find_by_id(&self, id: RecordId) -> StoreResult<Option<Task>> {
        Ok(read(&self.tasks)?.get(&id).cloned())
    }

    async fn list(&self, owner: Option<&str>) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = read(&self.tasks)?
            .values()
            .filter(|t| owner.is_none_or(|o| t.owner() == o))
            .cloned()
            .collect();
        newest_first(&mut tasks, |t| (t.created, t.id));
        Ok(tasks)
    }

    async fn update(&self, id: RecordId, patch: &TaskPatch) -> StoreResult<UpdateResult> {
        let mut tasks = write(&self.tasks)?;
        Ok(match tasks.get_mut(&id) {
            Some(task) => UpdateResult::matched(1, u64::from(patch.apply(task))),
            None => UpdateResult::matched(0, 0),
        })
    }

    async fn delete(&self, id: RecordId) -> StoreResult<DeleteResult> {
        let removed = write(&self.tasks)?.remove(&id);
        Ok(DeleteResult::new(u64::from(removed.is_some())))
    }
}

#[async_trait]
impl PaymentStore for InMemoryStore {
    async fn insert(&self, payment: Payment) -> StoreResult<InsertResult> {
        let id = payment.id;
        write(&self.payments)?.insert(id, payment);
        Ok(InsertResult::new(id))
    }

    async fn list(&self, owner: Option<&str>) -> StoreResult<Vec<Payment>> {
        let mut payments: Vec<Payment> = read(&self.payments)?
            .values()
            .filter(|p| owner.is_none_or(|o| p.owner() == o))
            .cloned()
            .collect();
        newest_first(&mut payments, |p| (p.created, p.id));
        Ok(payments)
    }

    async fn list_paid(&self, owner: &str) -> StoreResult<Vec<Payment>> {
        let mut payments: Vec<Payment> = read(&self.payments)?
            .values()
            .filter(|p| p.owner() == owner && p.is_paid())
            .cloned()
            .collect();
        payments.sort_by_key(|p| (p.payment_date, p.id));
        Ok(payments)
    }

    async fn mark_paid(
        &self,
        id: RecordId,
        transaction_id: &str,
        at: EpochMillis,
    ) -> StoreResult<UpdateResult> {
        let mut payments = write(&self.payments)?;
        Ok(match payments.get_mut(&id) {
            Some(payment) => {
                let modified = payment.mark_paid(transaction_id, at);
                UpdateResult::matched(1, u64::from(modified))
            }
            None => UpdateResult::matched(0, 0),
        })
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn insert(&self, review: Review) -> StoreResult<InsertResult> {
        let id = review.id;
        write(&self.reviews)?.insert(id, review);
        Ok(InsertResult::new(id))
    }

    async fn list(&self) -> StoreResult<Vec<Review>> {
        let mut reviews: Vec<Review> = read(&self.reviews)?.values().cloned().collect();
        newest_first(&mut reviews, |r| (r.created, r.id));
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use workify_hr::{Fields, NewPayment, NewTask, NewUser};

    use super::*;

    fn profile(email: &str, role: Role, created: EpochMillis) -> UserProfile {
        UserProfile {
            id: RecordId::new(),
            email: email.to_string(),
            role,
            verified: false,
            fired: false,
            created,
            profile: Fields::new(),
        }
    }

    #[tokio::test]
    async fn second_registration_is_a_no_op() {
        let store = InMemoryStore::new();
        let new = |name: &str| NewUser {
            email: "ann@workify.io".into(),
            role: None,
            created: None,
            profile: json!({ "name": name }).as_object().cloned().unwrap(),
        };

        let first = store
            .insert_if_absent(new("Ann").into_profile(RecordId::new(), 1).unwrap())
            .await
            .unwrap();
        assert!(matches!(first, UpsertOutcome::Inserted(r) if r.upserted_count == 1));

        let second = store
            .insert_if_absent(new("Impostor").into_profile(RecordId::new(), 2).unwrap())
            .await
            .unwrap();
        assert_eq!(second, UpsertOutcome::AlreadyExists);

        let stored = store.find_by_email("ann@workify.io").await.unwrap().unwrap();
        assert_eq!(stored.profile.get("name"), Some(&json!("Ann")));
        assert_eq!(store.user_count("ann@workify.io").unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_registration_keeps_one_document() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .insert_if_absent(profile("race@workify.io", Role::Employee, 1))
                    .await
                    .unwrap()
            }));
        }

        let mut inserted = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), UpsertOutcome::Inserted(_)) {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(store.user_count("race@workify.io").unwrap(), 1);
    }

    #[tokio::test]
    async fn toggles_report_counts() {
        let store = InMemoryStore::new();
        let admin = profile("root@workify.io", Role::Admin, 1);
        let admin_id = admin.id;
        store.put_user(admin).unwrap();

        let result = store.toggle(admin_id, Toggle::Role).await.unwrap();
        assert_eq!((result.matched_count, result.modified_count), (1, 0));

        let result = store.toggle(admin_id, Toggle::Verified).await.unwrap();
        assert_eq!((result.matched_count, result.modified_count), (1, 1));

        let result = store.toggle(RecordId::new(), Toggle::Fired).await.unwrap();
        assert_eq!((result.matched_count, result.modified_count), (0, 0));
    }

    #[tokio::test]
    async fn concurrent_toggles_do_not_lose_updates() {
        let store = Arc::new(InMemoryStore::new());
        let user = profile("ann@workify.io", Role::Employee, 1);
        let id = user.id;
        store.put_user(user).unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.toggle(id, Toggle::Verified).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // An even number of flips lands back on the starting value.
        let user = store.find_by_email("ann@workify.io").await.unwrap().unwrap();
        assert!(!user.verified);
    }

    #[tokio::test]
    async fn listings_are_newest_first_and_filtered() {
        let store = InMemoryStore::new();
        store.put_user(profile("old@workify.io", Role::Employee, 1)).unwrap();
        store.put_user(profile("new@workify.io", Role::Employee, 5)).unwrap();
        store.put_user(profile("hr@workify.io", Role::Hr, 3)).unwrap();

        let employees = UserStore::list(&store, Some(Role::Employee)).await.unwrap();
        let emails: Vec<&str> = employees.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["new@workify.io", "old@workify.io"]);

        assert_eq!(UserStore::list(&store, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn task_lifecycle() {
        let store = InMemoryStore::new();
        let new: NewTask = serde_json::from_value(json!({
            "email": "ann@workify.io",
            "task": "Support",
        }))
        .unwrap();
        let task = new.into_task(RecordId::new(), 1).unwrap();
        let id = task.id;
        TaskStore::insert(&store, task).await.unwrap();

        let patch = TaskPatch::new(json!({ "task": "Paperwork" }).as_object().cloned().unwrap());
        let result = TaskStore::update(&store, id, &patch).await.unwrap();
        assert_eq!(result.modified_count, 1);

        let mine = TaskStore::list(&store, Some("ann@workify.io")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert!(TaskStore::list(&store, Some("bob@workify.io")).await.unwrap().is_empty());

        assert_eq!(TaskStore::delete(&store, id).await.unwrap().deleted_count, 1);
        assert_eq!(TaskStore::delete(&store, id).await.unwrap().deleted_count, 0);
    }

    #[tokio::test]
    async fn payroll_paid_listing_is_oldest_payout_first() {
        let store = InMemoryStore::new();
        let mut ids = Vec::new();
        for month in ["Jan", "Feb", "Mar"] {
            let new: NewPayment = serde_json::from_value(json!({
                "email": "ann@workify.io",
                "amount": 1000,
                "month": month,
            }))
            .unwrap();
            let payment = new.into_payment(RecordId::new(), 1).unwrap();
            ids.push(payment.id);
            PaymentStore::insert(&store, payment).await.unwrap();
        }

        store.mark_paid(ids[1], "pi_b", 200).await.unwrap();
        store.mark_paid(ids[0], "pi_a", 300).await.unwrap();
        let again = store.mark_paid(ids[0], "pi_z", 400).await.unwrap();
        assert_eq!((again.matched_count, again.modified_count), (1, 0));

        let paid = store.list_paid("ann@workify.io").await.unwrap();
        let tx: Vec<_> = paid.iter().map(|p| p.transaction_id.clone().unwrap()).collect();
        assert_eq!(tx, vec!["pi_b", "pi_a"]);
    }
}
