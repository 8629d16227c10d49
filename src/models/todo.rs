use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::extract::Validate;
use crate::models::auth::User;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub done: bool,
    pub due_date: Option<NaiveDate>,
    pub user_id: String,
    #[serde(skip_serializing, default)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.deleted_at.is_none() && self.user_id == user_id
    }
}

/// List item: the todo together with its owner.
#[derive(Debug, Clone, Serialize)]
pub struct TodoWithUser {
    #[serde(flatten)]
    pub todo: Todo,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub title: String,
    #[serde(default, deserialize_with = "due_date::optional")]
    pub due_date: Option<NaiveDate>,
}

impl Validate for CreateTodo {
    fn validate(&self) -> Result<(), Vec<String>> {
        if self.title.trim().is_empty() {
            return Err(vec!["Title is required".to_string()]);
        }
        Ok(())
    }
}

/// Partial update. `due_date` distinguishes "absent" (`None`) from an
/// explicit `null` (`Some(None)`); `title` and `done` may be absent but
/// never `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
    #[serde(default, deserialize_with = "non_null")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub done: Option<bool>,
    #[serde(default, deserialize_with = "due_date::nullable")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl Validate for UpdateTodo {
    fn validate(&self) -> Result<(), Vec<String>> {
        match &self.title {
            Some(title) if title.trim().is_empty() => Err(vec!["Title cannot be empty".to_string()]),
            _ => Ok(()),
        }
    }
}

// Present fields must carry a value; `default` covers the absent case
fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Coercion of date-like JSON input into a calendar date.
///
/// Accepted forms: `"2025-03-01"`, an RFC 3339 timestamp (its UTC date) and
/// epoch milliseconds.
pub mod due_date {
    use serde_json::Value;

    use super::*;

    const INVALID: &str = "dueDate is not a valid date";

    pub fn parse(input: &str) -> Option<NaiveDate> {
        let input = input.trim();
        if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            return Some(date);
        }
        DateTime::parse_from_rfc3339(input)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    }

    fn coerce<E: serde::de::Error>(input: Value) -> Result<NaiveDate, E> {
        let date = match &input {
            Value::Number(ms) => ms
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|dt| dt.date_naive()),
            Value::String(text) => parse(text),
            _ => None,
        };
        date.ok_or_else(|| E::custom(INVALID))
    }

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            Some(input) => coerce(input).map(Some),
            None => Ok(None),
        }
    }

    pub fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        optional(deserializer).map(Some)
    }
}
