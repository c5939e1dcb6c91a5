//! In-memory users API used to exercise the proxy end-to-end.
//!
//! # Design
//! A deliberately small axum app with the shapes the proxy cares about:
//! - create and update run field validation and answer **422** with a
//!   `{"errors": {field: [messages]}}` body on failure, the contract the
//!   proxy bridges into its shared validator;
//! - `POST /users/{id}` takes a multipart body with a `_method=put` text
//!   field — the method-override route used when binary attachments
//!   cannot ride on an actual `PUT`;
//! - `GET /users` honors a `sort=name` query parameter so query-string
//!   serialization can be observed from the outside.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub sort: Option<String>,
}

pub type Db = Arc<RwLock<HashMap<Uuid, User>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .post(override_user)
                .delete(delete_user),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// 422 body in the shape the proxy expects: `{"errors": {field: [msgs]}}`.
fn unprocessable(errors: HashMap<&'static str, Vec<&'static str>>) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "errors": errors })),
    )
        .into_response()
}

/// Validate a create/update body. `require_all` demands both fields be
/// present and valid; otherwise only provided fields are checked.
fn validate(body: &Value, require_all: bool) -> HashMap<&'static str, Vec<&'static str>> {
    let mut errors: HashMap<&'static str, Vec<&'static str>> = HashMap::new();

    match body.get("name").and_then(Value::as_str) {
        Some(name) if name.trim().is_empty() => {
            errors.insert("name", vec!["The name field is required."]);
        }
        Some(_) => {}
        None if require_all => {
            errors.insert("name", vec!["The name field is required."]);
        }
        None => {}
    }

    match body.get("email").and_then(Value::as_str) {
        Some(email) if email.trim().is_empty() => {
            errors.insert("email", vec!["The email field is required."]);
        }
        Some(email) if !email.contains('@') => {
            errors.insert("email", vec!["The email must be a valid email address."]);
        }
        Some(_) => {}
        None if require_all => {
            errors.insert("email", vec!["The email field is required."]);
        }
        None => {}
    }

    errors
}

async fn list_users(State(db): State<Db>, Query(query): Query<ListQuery>) -> Json<Vec<User>> {
    let users = db.read().await;
    let mut users: Vec<User> = users.values().cloned().collect();
    if query.sort.as_deref() == Some("name") {
        users.sort_by(|a, b| a.name.cmp(&b.name));
    }
    Json(users)
}

async fn create_user(State(db): State<Db>, Json(body): Json<Value>) -> Response {
    let errors = validate(&body, true);
    if !errors.is_empty() {
        return unprocessable(errors);
    }
    let user = User {
        id: Uuid::new_v4(),
        name: body["name"].as_str().unwrap_or_default().to_string(),
        email: body["email"].as_str().unwrap_or_default().to_string(),
        avatar: None,
    };
    db.write().await.insert(user.id, user.clone());
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn get_user(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Json<User>, StatusCode> {
    let users = db.read().await;
    users.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Response {
    let errors = validate(&body, false);
    if !errors.is_empty() {
        return unprocessable(errors);
    }
    let mut users = db.write().await;
    let Some(user) = users.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(name) = body.get("name").and_then(Value::as_str) {
        user.name = name.to_string();
    }
    if let Some(email) = body.get("email").and_then(Value::as_str) {
        user.email = email.to_string();
    }
    Json(user.clone()).into_response()
}

/// Method-override route: a multipart `POST` carrying `_method=put`,
/// optional `name`, and an optional `avatar` file whose filename is
/// recorded on the user.
async fn override_user(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<User>, StatusCode> {
    let mut method = None;
    let mut name = None;
    let mut avatar = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("_method") => {
                method = Some(field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            Some("name") => {
                name = Some(field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            Some("avatar") => {
                avatar = field.file_name().map(str::to_string);
                // Bytes are read and discarded; only the filename matters here.
                let _ = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            }
            _ => {
                let _ = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
            }
        }
    }

    if method.as_deref() != Some("put") {
        return Err(StatusCode::METHOD_NOT_ALLOWED);
    }

    let mut users = db.write().await;
    let user = users.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = name {
        user.name = name;
    }
    if avatar.is_some() {
        user.avatar = avatar;
    }
    Ok(Json(user.clone()))
}

async fn delete_user(State(db): State<Db>, Path(id): Path<Uuid>) -> Result<StatusCode, StatusCode> {
    let mut users = db.write().await;
    users
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_serializes_to_json() {
        let user = User {
            id: Uuid::nil(),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            avatar: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["name"], "Jane");
        assert_eq!(json["avatar"], Value::Null);
    }

    #[test]
    fn validate_requires_both_fields_on_create() {
        let errors = validate(&json!({}), true);
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("email"));
    }

    #[test]
    fn validate_accepts_a_complete_body() {
        let errors = validate(&json!({"name": "Jane", "email": "jane@example.com"}), true);
        assert!(errors.is_empty());
    }

    #[test]
    fn validate_rejects_malformed_email() {
        let errors = validate(&json!({"name": "Jane", "email": "nope"}), true);
        assert_eq!(
            errors["email"],
            vec!["The email must be a valid email address."]
        );
    }

    #[test]
    fn validate_ignores_missing_fields_on_update() {
        let errors = validate(&json!({"name": "Jane"}), false);
        assert!(errors.is_empty());
    }

    #[test]
    fn validate_still_rejects_bad_provided_fields_on_update() {
        let errors = validate(&json!({"email": ""}), false);
        assert!(errors.contains_key("email"));
    }
}
