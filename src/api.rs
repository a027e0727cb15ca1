//! User management endpoints.
//!
//! | Method | Path | Success | Failure |
//! |---|---|---|---|
//! | GET | `/users?skip=&limit=` | 200 `{users, total}` | 400 |
//! | GET | `/users/{id}` | 200 user | 400, 404 |
//! | POST | `/users` | 201 user | 400 |
//! | PUT | `/users/{id}` | 200 user | 400, 404 |
//! | PATCH | `/users/{id}` | 200 user | 400, 404 |
//! | DELETE | `/users/{id}` | 204 | 400, 404 |
//! | GET | `/` | 200 `{message, version}` | |
//!
//! Every handler validates its input completely before touching the store.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::handler::with_state;
use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;
use crate::status::Status;
use crate::store::UserStore;
use crate::user::{NewUser, User, UserPatch, ValidationErrors};

pub const DEFAULT_SKIP: usize = 0;
pub const DEFAULT_LIMIT: usize = 100;

const NOT_FOUND_MESSAGE: &str = "User not found";

/// Why a request was refused.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("user not found")]
    NotFound,
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                debug!(%errors, "rejected request");
                (Status::BadRequest, Json(json!({ "detail": errors }))).into_response()
            }
            Self::NotFound => {
                (Status::NotFound, Json(json!({ "detail": NOT_FOUND_MESSAGE }))).into_response()
            }
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// One page of users. `total` is the length of this page.
#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<User>,
    pub total: usize,
}

/// Builds the router with every endpoint bound to `store`.
pub fn routes(store: Arc<UserStore>) -> Router {
    Router::new()
        .on(Method::Get,    "/",           root)
        .on(Method::Get,    "/users",      with_state(Arc::clone(&store), list_users))
        .on(Method::Post,   "/users",      with_state(Arc::clone(&store), create_user))
        .on(Method::Get,    "/users/{id}", with_state(Arc::clone(&store), get_user))
        .on(Method::Put,    "/users/{id}", with_state(Arc::clone(&store), replace_user))
        .on(Method::Patch,  "/users/{id}", with_state(Arc::clone(&store), patch_user))
        .on(Method::Delete, "/users/{id}", with_state(store, delete_user))
}

// GET /
async fn root(_req: Request) -> Json<Value> {
    Json(json!({
        "message": "User Management API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// GET /users?skip=&limit=
async fn list_users(store: Arc<UserStore>, req: Request) -> ApiResult<Json<UserList>> {
    let mut errors = ValidationErrors::default();
    let skip = query_usize(&req, "skip", DEFAULT_SKIP, &mut errors);
    let limit = query_usize(&req, "limit", DEFAULT_LIMIT, &mut errors);
    if !errors.is_empty() {
        return Err(errors.into());
    }

    let users: Vec<User> = store.list().into_iter().skip(skip).take(limit).collect();
    let total = users.len();
    Ok(Json(UserList { users, total }))
}

// GET /users/{id}
async fn get_user(store: Arc<UserStore>, req: Request) -> ApiResult<Json<User>> {
    let id = user_id(&req)?;
    store.get(id).map(Json).ok_or(ApiError::NotFound)
}

// POST /users → 201
async fn create_user(store: Arc<UserStore>, req: Request) -> ApiResult<Response> {
    let user = NewUser::from_json(&json_body(&req)?)?;
    let created = store.create(user);
    let location = format!("/users/{}", created.id);

    let mut response = (Status::Created, Json(created)).into_response();
    response.headers.push(("location".to_owned(), location));
    Ok(response)
}

// PUT /users/{id}: every creatable field must be supplied.
async fn replace_user(store: Arc<UserStore>, req: Request) -> ApiResult<Json<User>> {
    let id = user_id(&req)?;
    let user = NewUser::from_json(&json_body(&req)?)?;
    store.update(id, UserPatch::from(user)).map(Json).ok_or(ApiError::NotFound)
}

// PATCH /users/{id}
async fn patch_user(store: Arc<UserStore>, req: Request) -> ApiResult<Json<User>> {
    let id = user_id(&req)?;
    let patch = UserPatch::from_json(&json_body(&req)?)?;
    store.update(id, patch).map(Json).ok_or(ApiError::NotFound)
}

// DELETE /users/{id} → 204
async fn delete_user(store: Arc<UserStore>, req: Request) -> ApiResult<Status> {
    let id = user_id(&req)?;
    if store.delete(id) { Ok(Status::NoContent) } else { Err(ApiError::NotFound) }
}

// ── Input extraction ──────────────────────────────────────────────────────────

/// A non-integer segment is a client error. An integer that no record can
/// carry (zero, negative, beyond `u64`) is simply an unknown id.
fn user_id(req: &Request) -> ApiResult<u64> {
    let raw = req.param("id").unwrap_or_default();
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationErrors::single("id", "must be an integer").into());
    }

    match raw.strip_prefix('+').unwrap_or(raw).parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::NotFound),
    }
}

fn json_body(req: &Request) -> ApiResult<Value> {
    serde_json::from_slice(req.body())
        .map_err(|e| ValidationErrors::single("body", format!("invalid JSON: {e}")).into())
}

fn query_usize(req: &Request, key: &str, default: usize, errors: &mut ValidationErrors) -> usize {
    match req.query(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            errors.push(key, "must be a non-negative integer");
            default
        }),
    }
}
