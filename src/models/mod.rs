pub mod auth;
pub mod todo;

pub use auth::{Account, AuthResponse, AuthSession, Session, SigninRequest, SignupRequest, User};
pub use todo::{CreateTodo, Todo, TodoWithUser, UpdateTodo};
