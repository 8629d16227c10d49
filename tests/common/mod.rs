//! Shared fixtures for router-level tests.
//!
//! `MemoryTodoStore` mirrors the SQL semantics of `PgTodoStore` over a
//! `Vec`, and `StaticAuth` resolves bearer tokens from a fixed table, so the
//! full router can be exercised without a database.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::Value;
use todo_api::{
    auth::{session_token, AuthProvider},
    database::TodoStore,
    models::{
        auth::{AuthSession, Session, User},
        todo::{CreateTodo, Todo, UpdateTodo},
    },
    AppState, Result,
};
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryTodoStore {
    rows: Mutex<Vec<Todo>>,
    fail_ping: bool,
}

impl MemoryTodoStore {
    /// A store whose health check always fails.
    pub fn unavailable() -> Self {
        Self {
            fail_ping: true,
            ..Self::default()
        }
    }

    /// Reads a row regardless of owner or delete marker.
    pub fn raw(&self, id: Uuid) -> Option<Todo> {
        self.rows.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }
}

#[async_trait]
impl TodoStore for MemoryTodoStore {
    async fn ping(&self) -> Result<()> {
        if self.fail_ping {
            return Err(todo_api::AppError::internal("database unavailable"));
        }
        Ok(())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<Todo>> {
        let mut todos: Vec<Todo> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.is_visible_to(user_id))
            .cloned()
            .collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(todos)
    }

    async fn find(&self, user_id: &str, id: Uuid) -> Result<Option<Todo>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && t.is_visible_to(user_id))
            .cloned())
    }

    async fn create(&self, user_id: &str, todo: CreateTodo) -> Result<Todo> {
        let now = Utc::now();
        let todo = Todo {
            id: Uuid::now_v7(),
            title: todo.title,
            done: false,
            due_date: todo.due_date,
            user_id: user_id.to_string(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(todo.clone());
        Ok(todo)
    }

    async fn update(&self, user_id: &str, id: Uuid, changes: UpdateTodo) -> Result<Option<Todo>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(todo) = rows.iter_mut().find(|t| t.id == id && t.is_visible_to(user_id)) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            todo.title = title;
        }
        if let Some(done) = changes.done {
            todo.done = done;
        }
        if let Some(due_date) = changes.due_date {
            todo.due_date = due_date;
        }
        todo.updated_at = Utc::now().max(todo.updated_at + Duration::microseconds(1));
        Ok(Some(todo.clone()))
    }

    async fn soft_delete(&self, user_id: &str, id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let Some(todo) = rows.iter_mut().find(|t| t.id == id && t.is_visible_to(user_id)) else {
            return Ok(false);
        };
        let now = Utc::now();
        todo.deleted_at = Some(now);
        todo.updated_at = now.max(todo.updated_at + Duration::microseconds(1));
        Ok(true)
    }
}

/// Resolves `Bearer <token>` against a fixed table of sessions.
#[derive(Default)]
pub struct StaticAuth {
    sessions: HashMap<String, AuthSession>,
}

impl StaticAuth {
    pub fn with_user(mut self, token: &str, user_id: &str) -> Self {
        self.sessions.insert(token.to_string(), auth_session(token, user_id));
        self
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn get_session(&self, headers: &HeaderMap) -> Result<Option<AuthSession>> {
        Ok(session_token(headers).and_then(|token| self.sessions.get(token).cloned()))
    }

    async fn handle(&self, request: Request) -> Response {
        (StatusCode::OK, format!("auth:{}", request.uri().path())).into_response()
    }
}

pub fn auth_session(token: &str, user_id: &str) -> AuthSession {
    let now = Utc::now();
    AuthSession {
        session: Session {
            id: format!("session-{user_id}"),
            expires_at: now + Duration::days(7),
            token: token.to_string(),
            created_at: now,
            updated_at: now,
            ip_address: None,
            user_agent: None,
            user_id: user_id.to_string(),
        },
        user: User {
            id: user_id.to_string(),
            name: format!("User {user_id}"),
            email: format!("{user_id}@example.com"),
            email_verified: false,
            image: None,
            created_at: now,
            updated_at: now,
        },
    }
}

pub const ALICE: &str = "alice-token";
pub const BOB: &str = "bob-token";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryTodoStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(MemoryTodoStore::default())
    }

    pub fn with_store(store: MemoryTodoStore) -> Self {
        let store = Arc::new(store);
        let auth = StaticAuth::default()
            .with_user(ALICE, "alice")
            .with_user(BOB, "bob");
        let state = AppState::new(store.clone(), Arc::new(auth));
        Self {
            router: todo_api::router(state, None),
            store,
        }
    }

    /// Sends a request and returns the status with the body parsed as JSON
    /// (`Value::Null` for an empty body).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(method, uri, token, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    /// Creates a todo as `token` and returns its id.
    pub async fn create(&self, token: &str, body: Value) -> Uuid {
        let (status, value) = self.send(Method::POST, "/api/todo/", Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{value}");
        value["id"].as_str().unwrap().parse().unwrap()
    }
}
