//! Postgres-backed document store.
//!
//! Each collection is a table holding the full document as JSONB plus the few
//! columns the store filters or sorts on. Every mutation is one SQL statement,
//! so toggles and registration are atomic per document.
//!
//! ## Error Mapping
//!
//! | Source | StoreError |
//! |--------|------------|
//! | any `sqlx::Error` | `Database { operation, source }` |
//! | JSONB that does not match the document type | `Corrupt` |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use workify_auth::Role;
use workify_core::{EpochMillis, RecordId};
use workify_hr::{Payment, Review, Task, TaskPatch, Toggle, UserProfile};

use super::{
    DeleteResult, InsertResult, PaymentStore, ReviewStore, StoreError, StoreResult, TaskStore,
    UpdateResult, UpsertOutcome, UserStore,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id      UUID PRIMARY KEY,
    email   TEXT NOT NULL UNIQUE,
    created BIGINT NOT NULL,
    doc     JSONB NOT NULL
);
CREATE TABLE IF NOT EXISTS tasks (
    id      UUID PRIMARY KEY,
    email   TEXT NOT NULL,
    created BIGINT NOT NULL,
    doc     JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS tasks_email_idx ON tasks (email);
CREATE TABLE IF NOT EXISTS payments (
    id           UUID PRIMARY KEY,
    email        TEXT NOT NULL,
    created      BIGINT NOT NULL,
    payment_date BIGINT,
    doc          JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS payments_email_idx ON payments (email);
CREATE TABLE IF NOT EXISTS reviews (
    id      UUID PRIMARY KEY,
    created BIGINT NOT NULL,
    doc     JSONB NOT NULL
);
"#;

/// Shared pool; cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect and make sure the collection tables exist.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| db_error("connect", e))?;

        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| db_error("ensure_schema", e))?;
        Ok(())
    }

    async fn counts(&self, operation: &'static str, sql: &str, id: RecordId) -> StoreResult<UpdateResult> {
        let row = sqlx::query(sql)
            .bind(id.as_uuid())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| db_error(operation, e))?;
        update_counts(operation, &row)
    }
}

fn db_error(operation: &'static str, source: sqlx::Error) -> StoreError {
    StoreError::Database { operation, source }
}

fn doc<T: serde::de::DeserializeOwned>(operation: &'static str, row: &PgRow) -> StoreResult<T> {
    let Json(value): Json<serde_json::Value> =
        row.try_get("doc").map_err(|e| db_error(operation, e))?;
    Ok(serde_json::from_value(value)?)
}

fn docs<T: serde::de::DeserializeOwned>(operation: &'static str, rows: &[PgRow]) -> StoreResult<Vec<T>> {
    rows.iter().map(|row| doc(operation, row)).collect()
}

fn update_counts(operation: &'static str, row: &PgRow) -> StoreResult<UpdateResult> {
    let matched: i64 = row.try_get("matched").map_err(|e| db_error(operation, e))?;
    let modified: i64 = row.try_get("modified").map_err(|e| db_error(operation, e))?;
    Ok(UpdateResult::matched(matched.max(0) as u64, modified.max(0) as u64))
}

/// `matched` counts the target row before the update; `modified` counts rows
/// the conditional update actually touched.
fn toggle_statement(toggle: Toggle) -> &'static str {
    match toggle {
        Toggle::Verified => {
            r#"
            WITH target AS (SELECT id FROM users WHERE id = $1),
            updated AS (
                UPDATE users
                SET doc = jsonb_set(doc, '{verified}',
                    to_jsonb(NOT COALESCE((doc->>'verified')::boolean, false)))
                WHERE id = $1
                RETURNING id
            )
            SELECT (SELECT COUNT(*) FROM target) AS matched,
                   (SELECT COUNT(*) FROM updated) AS modified
            "#
        }
        Toggle::Fired => {
            r#"
            WITH target AS (SELECT id FROM users WHERE id = $1),
            updated AS (
                UPDATE users
                SET doc = jsonb_set(doc, '{fired}',
                    to_jsonb(NOT COALESCE((doc->>'fired')::boolean, false)))
                WHERE id = $1
                RETURNING id
            )
            SELECT (SELECT COUNT(*) FROM target) AS matched,
                   (SELECT COUNT(*) FROM updated) AS modified
            "#
        }
        Toggle::Role => {
            r#"
            WITH target AS (SELECT id FROM users WHERE id = $1),
            updated AS (
                UPDATE users
                SET doc = jsonb_set(doc, '{role}',
                    CASE doc->>'role' WHEN 'HR' THEN '"Employee"'::jsonb ELSE '"HR"'::jsonb END)
                WHERE id = $1 AND doc->>'role' IN ('HR', 'Employee')
                RETURNING id
            )
            SELECT (SELECT COUNT(*) FROM target) AS matched,
                   (SELECT COUNT(*) FROM updated) AS modified
            "#
        }
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserProfile>> {
        let row = sqlx::query("SELECT doc FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_error("find_user", e))?;
        row.map(|r| doc("find_user", &r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_role(&self, email: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query("SELECT doc->>'role' AS role FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_error("find_role", e))?;

        row.map(|r| r.try_get::<Option<String>, _>("role"))
            .transpose()
            .map(Option::flatten)
            .map_err(|e| db_error("find_role", e))
    }

    #[instrument(skip(self), err)]
    async fn list(&self, role: Option<Role>) -> StoreResult<Vec<UserProfile>> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM users
            WHERE $1::text IS NULL OR doc->>'role' = $1
            ORDER BY created DESC, id DESC
            "#,
        )
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| db_error("list_users", e))?;
        docs("list_users", &rows)
    }

    #[instrument(skip(self, user), fields(email = %user.email), err)]
    async fn insert_if_absent(&self, user: UserProfile) -> StoreResult<UpsertOutcome> {
        let id = user.id;
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, created, doc)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(id.as_uuid())
        .bind(&user.email)
        .bind(user.created)
        .bind(Json(&user))
        .execute(&*self.pool)
        .await
        .map_err(|e| db_error("insert_user", e))?;

        Ok(if result.rows_affected() == 0 {
            UpsertOutcome::AlreadyExists
        } else {
            UpsertOutcome::Inserted(UpdateResult::upserted(id))
        })
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn toggle(&self, id: RecordId, toggle: Toggle) -> StoreResult<UpdateResult> {
        self.counts("toggle_user", toggle_statement(toggle), id).await
    }
}

#[async_trait]
impl TaskStore for PostgresStore {
    #[instrument(skip(self, task), fields(id = %task.id), err)]
    async fn insert(&self, task: Task) -> StoreResult<InsertResult> {
        sqlx::query("INSERT INTO tasks (id, email, created, doc) VALUES ($1, $2, $3, $4)")
            .bind(task.id.as_uuid())
            .bind(&task.email)
            .bind(task.created)
            .bind(Json(&task))
            .execute(&*self.pool)
            .await
            .map_err(|e| db_error("insert_task", e))?;
        Ok(InsertResult::new(task.id))
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn find_by_id(&self, id: RecordId) -> StoreResult<Option<Task>> {
        let row = sqlx::query("SELECT doc FROM tasks WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| db_error("find_task", e))?;
        row.map(|r| doc("find_task", &r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list(&self, owner: Option<&str>) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM tasks
            WHERE $1::text IS NULL OR email = $1
            ORDER BY created DESC, id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| db_error("list_tasks", e))?;
        docs("list_tasks", &rows)
    }

    #[instrument(skip(self, patch), fields(id = %id), err)]
    async fn update(&self, id: RecordId, patch: &TaskPatch) -> StoreResult<UpdateResult> {
        let row = sqlx::query(
            r#"
            WITH target AS (SELECT id FROM tasks WHERE id = $1),
            updated AS (
                UPDATE tasks SET doc = doc || $2
                WHERE id = $1 AND NOT (doc @> $2)
                RETURNING id
            )
            SELECT (SELECT COUNT(*) FROM target) AS matched,
                   (SELECT COUNT(*) FROM updated) AS modified
            "#,
        )
        .bind(id.as_uuid())
        .bind(Json(patch.fields()))
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| db_error("update_task", e))?;
        update_counts("update_task", &row)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete(&self, id: RecordId) -> StoreResult<DeleteResult> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| db_error("delete_task", e))?;
        Ok(DeleteResult::new(result.rows_affected()))
    }
}

#[async_trait]
impl PaymentStore for PostgresStore {
    #[instrument(skip(self, payment), fields(id = %payment.id), err)]
    async fn insert(&self, payment: Payment) -> StoreResult<InsertResult> {
        sqlx::query(
            r#"
            INSERT INTO payments (id, email, created, payment_date, doc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(&payment.email)
        .bind(payment.created)
        .bind(payment.payment_date)
        .bind(Json(&payment))
        .execute(&*self.pool)
        .await
        .map_err(|e| db_error("insert_payment", e))?;
        Ok(InsertResult::new(payment.id))
    }

    #[instrument(skip(self), err)]
    async fn list(&self, owner: Option<&str>) -> StoreResult<Vec<Payment>> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM payments
            WHERE $1::text IS NULL OR email = $1
            ORDER BY created DESC, id DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| db_error("list_payments", e))?;
        docs("list_payments", &rows)
    }

    #[instrument(skip(self), err)]
    async fn list_paid(&self, owner: &str) -> StoreResult<Vec<Payment>> {
        let rows = sqlx::query(
            r#"
            SELECT doc FROM payments
            WHERE email = $1 AND payment_date IS NOT NULL
            ORDER BY payment_date ASC, id ASC
            "#,
        )
        .bind(owner)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| db_error("list_paid_payments", e))?;
        docs("list_paid_payments", &rows)
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn mark_paid(
        &self,
        id: RecordId,
        transaction_id: &str,
        at: EpochMillis,
    ) -> StoreResult<UpdateResult> {
        let row = sqlx::query(
            r#"
            WITH target AS (SELECT id FROM payments WHERE id = $1),
            updated AS (
                UPDATE payments
                SET payment_date = $2,
                    doc = doc || jsonb_build_object('paymentDate', $2::bigint, 'transactionId', $3::text)
                WHERE id = $1 AND payment_date IS NULL
                RETURNING id
            )
            SELECT (SELECT COUNT(*) FROM target) AS matched,
                   (SELECT COUNT(*) FROM updated) AS modified
            "#,
        )
        .bind(id.as_uuid())
        .bind(at)
        .bind(transaction_id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| db_error("mark_paid", e))?;
        update_counts("mark_paid", &row)
    }
}

#[async_trait]
impl ReviewStore for PostgresStore {
    #[instrument(skip(self, review), fields(id = %review.id), err)]
    async fn insert(&self, review: Review) -> StoreResult<InsertResult> {
        sqlx::query("INSERT INTO reviews (id, created, doc) VALUES ($1, $2, $3)")
            .bind(review.id.as_uuid())
            .bind(review.created)
            .bind(Json(&review))
            .execute(&*self.pool)
            .await
            .map_err(|e| db_error("insert_review", e))?;
        Ok(InsertResult::new(review.id))
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Review>> {
        let rows = sqlx::query("SELECT doc FROM reviews ORDER BY created DESC, id DESC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| db_error("list_reviews", e))?;
        docs("list_reviews", &rows)
    }
}
