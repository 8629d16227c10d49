use axum::{extract::State, http::StatusCode, response::Json};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::extract::{ValidJson, ValidPath};
use crate::middleware::CurrentUser;
use crate::models::todo::{CreateTodo, Todo, TodoWithUser, UpdateTodo};

// Get all todos of the current user
pub async fn list_todos(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<Vec<TodoWithUser>>> {
    let todos = state.todos.list(current.id()).await?;

    // Every row belongs to the caller, so the owner is the resolved user
    let user = current.0.user;
    let todos = todos
        .into_iter()
        .map(|todo| TodoWithUser { todo, user: user.clone() })
        .collect();

    Ok(Json(todos))
}

// Get todo by ID
pub async fn get_todo(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Todo>> {
    state
        .todos
        .find(current.id(), id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

// Create new todo
pub async fn create_todo(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidJson(payload): ValidJson<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>)> {
    let todo = state.todos.create(current.id(), payload).await?;
    tracing::debug!(todo_id = %todo.id, user_id = %todo.user_id, "todo created");

    Ok((StatusCode::CREATED, Json(todo)))
}

// Update todo
pub async fn update_todo(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(payload): ValidJson<UpdateTodo>,
) -> Result<Json<Todo>> {
    state
        .todos
        .update(current.id(), id, payload)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound)
}

// Soft-delete todo
pub async fn delete_todo(
    State(state): State<AppState>,
    current: CurrentUser,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<StatusCode> {
    if !state.todos.soft_delete(current.id(), id).await? {
        return Err(AppError::NotFound);
    }

    tracing::debug!(todo_id = %id, "todo soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}
