use std::sync::Arc;

use axum::{
    extract::{Path, Query, RawQuery, Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_API_KEY: &str = "test-key";
pub const DEFAULT_PER_PAGE: u64 = 15;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct PatchUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// Laravel-style pagination envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub total: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
    pub data: Vec<T>,
}

pub type Db = Arc<RwLock<Vec<User>>>;

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    db: Db,
}

pub fn app() -> Router {
    app_with_key(DEFAULT_API_KEY)
}

pub fn app_with_key(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        db: Arc::new(RwLock::new(Vec::new())),
    };
    Router::new()
        .route("/", get(root))
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).put(replace_user).patch(patch_user).delete(delete_user),
        )
        .route("/tags", get(list_tags))
        .route("/echo", any(echo))
        .route("/fail", any(fail))
        .route("/garbage", get(garbage))
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_key(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_key(api_key)).await
}

/// Build one page of `items`. `from`/`to` are 1-based and null when the page
/// is empty.
pub fn paginate<T: Clone>(items: &[T], page: u64, per_page: u64) -> Paginated<T> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let total = items.len() as u64;
    let last_page = total.div_ceil(per_page).max(1);
    let offset = (page - 1).saturating_mul(per_page);
    let data: Vec<T> = items
        .iter()
        .skip(offset as usize)
        .take(per_page as usize)
        .cloned()
        .collect();
    let (from, to) = if data.is_empty() {
        (None, None)
    } else {
        (Some(offset + 1), Some(offset + data.len() as u64))
    };
    Paginated {
        total,
        current_page: page,
        last_page,
        from,
        to,
        data,
    }
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    info!(method = %request.method(), path = %request.uri().path(), "request");
    let expected = format!("Bearer {}", state.api_key);
    let authorized = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthenticated."}))).into_response();
    }
    next.run(request).await
}

async fn root() -> Json<Value> {
    Json(json!({"message": "api root"}))
}

async fn list_users(State(state): State<AppState>, Query(params): Query<PageParams>) -> Json<Paginated<User>> {
    let users = state.db.read().await;
    Json(paginate(
        users.as_slice(),
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(DEFAULT_PER_PAGE),
    ))
}

async fn create_user(State(state): State<AppState>, Json(input): Json<CreateUser>) -> (StatusCode, Json<User>) {
    let user = User {
        id: Uuid::new_v4(),
        name: input.name,
        email: input.email,
    };
    state.db.write().await.push(user.clone());
    (StatusCode::CREATED, Json(user))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<User>, StatusCode> {
    let users = state.db.read().await;
    users.iter().find(|u| u.id == id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn replace_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateUser>,
) -> Result<Json<User>, StatusCode> {
    let mut users = state.db.write().await;
    let user = users.iter_mut().find(|u| u.id == id).ok_or(StatusCode::NOT_FOUND)?;
    user.name = input.name;
    user.email = input.email;
    Ok(Json(user.clone()))
}

async fn patch_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<PatchUser>,
) -> Result<Json<User>, StatusCode> {
    let mut users = state.db.write().await;
    let user = users.iter_mut().find(|u| u.id == id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        user.name = name;
    }
    if let Some(email) = input.email {
        user.email = email;
    }
    Ok(Json(user.clone()))
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    let mut users = state.db.write().await;
    match users.iter().position(|u| u.id == id) {
        Some(index) => {
            users.remove(index);
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn list_tags() -> Json<Value> {
    Json(json!([
        {"id": 1, "name": "alpha"},
        {"id": 2, "name": "beta"},
        {"id": 3, "name": "gamma"}
    ]))
}

/// Reflects the request back so clients can inspect what went over the wire.
async fn echo(method: Method, headers: HeaderMap, RawQuery(query): RawQuery, body: String) -> Json<Value> {
    let headers: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();
    let body = serde_json::from_str(&body).unwrap_or(Value::Null);
    Json(json!({
        "method": method.as_str(),
        "query": query,
        "headers": headers,
        "body": body,
    }))
}

async fn fail() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn garbage() -> &'static str {
    "this is not json"
}
