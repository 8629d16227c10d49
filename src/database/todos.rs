//! Todo persistence.
//!
//! Every query is owner-scoped and excludes soft-deleted rows. Update and
//! soft-delete are single conditional statements, so a concurrent delete can
//! never slip in between an existence check and the write.

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::{self, Database};
use crate::error::Result;
use crate::models::todo::{CreateTodo, Todo, UpdateTodo};

/// Storage for todos, always addressed through the owning user's id.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Checks that the backing storage answers.
    async fn ping(&self) -> Result<()>;

    /// Visible todos of `user_id`, most recently created first.
    async fn list(&self, user_id: &str) -> Result<Vec<Todo>>;

    async fn find(&self, user_id: &str, id: Uuid) -> Result<Option<Todo>>;

    async fn create(&self, user_id: &str, todo: CreateTodo) -> Result<Todo>;

    /// Applies a partial update. `None` when nothing visible matched.
    async fn update(&self, user_id: &str, id: Uuid, changes: UpdateTodo) -> Result<Option<Todo>>;

    /// Sets the delete marker. `false` when nothing visible matched.
    async fn soft_delete(&self, user_id: &str, id: Uuid) -> Result<bool>;
}

const TODO_COLUMNS: &str = "id, title, done, due_date, user_id, deleted_at, created_at, updated_at";

// Keeps updated_at strictly increasing even when two writes land within the
// same clock tick.
const TOUCH_UPDATED_AT: &str =
    "updated_at = GREATEST(clock_timestamp(), updated_at + INTERVAL '1 microsecond')";

#[derive(Clone)]
pub struct PgTodoStore {
    db: Database,
}

impl PgTodoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Reads a row regardless of owner or delete marker.
    pub async fn find_raw(&self, id: Uuid) -> Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(&format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(todo)
    }
}

#[async_trait]
impl TodoStore for PgTodoStore {
    async fn ping(&self) -> Result<()> {
        database::ping(&self.db).await?;
        Ok(())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Todo>> {
        let todos = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos
             WHERE deleted_at IS NULL AND user_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(todos)
    }

    async fn find(&self, user_id: &str, id: Uuid) -> Result<Option<Todo>> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(todo)
    }

    async fn create(&self, user_id: &str, todo: CreateTodo) -> Result<Todo> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            "INSERT INTO todos (id, title, due_date, user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(&todo.title)
        .bind(todo.due_date)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(todo)
    }

    async fn update(&self, user_id: &str, id: Uuid, changes: UpdateTodo) -> Result<Option<Todo>> {
        let (due_date_set, due_date) = match changes.due_date {
            Some(due_date) => (true, due_date),
            None => (false, None),
        };

        let todo = sqlx::query_as::<_, Todo>(&format!(
            "UPDATE todos SET
                title = COALESCE($1, title),
                done = COALESCE($2, done),
                due_date = CASE WHEN $3 THEN $4::date ELSE due_date END,
                {TOUCH_UPDATED_AT}
             WHERE id = $5 AND user_id = $6 AND deleted_at IS NULL
             RETURNING {TODO_COLUMNS}"
        ))
        .bind(&changes.title)
        .bind(changes.done)
        .bind(due_date_set)
        .bind(due_date)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(todo)
    }

    async fn soft_delete(&self, user_id: &str, id: Uuid) -> Result<bool> {
        let result = sqlx::query(&format!(
            "UPDATE todos SET deleted_at = clock_timestamp(), {TOUCH_UPDATED_AT}
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL"
        ))
        .bind(id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
