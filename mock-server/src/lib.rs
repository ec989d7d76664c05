use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Purchased,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Grocery {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
    pub status: Status,
    pub owner_id: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct CreateGrocery {
    pub name: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct UpdateGrocery {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub status: Option<Status>,
}

#[derive(Default)]
pub struct Store {
    users: HashMap<i64, (User, String)>,
    tokens: HashMap<String, i64>,
    groceries: BTreeMap<i64, Grocery>,
    next_user_id: i64,
    next_item_id: i64,
}

pub type Db = Arc<RwLock<Store>>;

/// FastAPI-shaped error: `{"detail": ...}` with a status.
#[derive(Debug)]
pub struct HttpError(StatusCode, Value);

impl HttpError {
    fn detail(status: StatusCode, message: &str) -> Self {
        Self(status, json!({ "detail": message }))
    }

    fn field(field: &str, message: &str) -> Self {
        Self(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({ "detail": [{ "loc": ["body", field], "msg": message, "type": "value_error" }] }),
        )
    }

    fn unauthorized() -> Self {
        Self::detail(StatusCode::UNAUTHORIZED, "Could not validate credentials")
    }

    fn item_not_found() -> Self {
        Self::detail(StatusCode::NOT_FOUND, "Grocery item not found")
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let api = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/users/me", get(current_user).delete(delete_account))
        .route("/users/me/password", put(change_password))
        .route("/groceries/", get(list_groceries).post(create_grocery))
        .route(
            "/groceries/{id}",
            put(update_grocery).delete(delete_grocery),
        )
        .with_state(db);
    Router::new().nest("/api/v1", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

fn authenticate(headers: &HeaderMap, store: &Store) -> Result<i64, HttpError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(HttpError::unauthorized)?;
    store
        .tokens
        .get(token)
        .copied()
        .filter(|id| store.users.contains_key(id))
        .ok_or_else(HttpError::unauthorized)
}

fn check_item(name: Option<&str>, quantity: Option<i64>) -> Result<(), HttpError> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(HttpError::field("name", "String should have at least 1 character"));
    }
    if quantity.is_some_and(|q| q < 1) {
        return Err(HttpError::field("quantity", "Input should be greater than 0"));
    }
    Ok(())
}

// --- auth ---

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterUser>,
) -> Result<(StatusCode, Json<User>), HttpError> {
    if !input.email.contains('@') {
        return Err(HttpError::field("email", "value is not a valid email address"));
    }
    if input.password.len() < 8 {
        return Err(HttpError::field("password", "Password must be at least 8 characters"));
    }
    let mut store = db.write().await;
    if store.users.values().any(|(u, _)| u.email == input.email) {
        return Err(HttpError::detail(
            StatusCode::BAD_REQUEST,
            "User with this email already exists",
        ));
    }
    store.next_user_id += 1;
    let user = User {
        id: store.next_user_id,
        email: input.email,
        is_active: true,
        created_at: now(),
        updated_at: None,
    };
    store.users.insert(user.id, (user.clone(), input.password));
    tracing::info!(id = user.id, email = %user.email, "registered");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(
    State(db): State<Db>,
    Form(form): Form<LoginForm>,
) -> Result<Json<Value>, HttpError> {
    let mut store = db.write().await;
    let id = store
        .users
        .values()
        .find(|(u, password)| u.email == form.username && *password == form.password)
        .map(|(u, _)| u.id)
        .ok_or_else(|| HttpError::detail(StatusCode::UNAUTHORIZED, "Incorrect email or password"))?;
    let token = Uuid::new_v4().simple().to_string();
    store.tokens.insert(token.clone(), id);
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

// --- users ---

async fn current_user(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, HttpError> {
    let store = db.read().await;
    let id = authenticate(&headers, &store)?;
    let (user, _) = &store.users[&id];
    Ok(Json(user.clone()))
}

async fn change_password(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<PasswordChange>,
) -> Result<Json<Value>, HttpError> {
    let mut store = db.write().await;
    let id = authenticate(&headers, &store)?;
    if input.new_password.len() < 8 {
        return Err(HttpError::field("new_password", "Password must be at least 8 characters"));
    }
    let Some((user, password)) = store.users.get_mut(&id) else {
        return Err(HttpError::unauthorized());
    };
    if *password != input.current_password {
        return Err(HttpError::detail(StatusCode::BAD_REQUEST, "Incorrect current password"));
    }
    *password = input.new_password;
    user.updated_at = Some(now());
    Ok(Json(json!({ "message": "Password updated successfully" })))
}

async fn delete_account(State(db): State<Db>, headers: HeaderMap) -> Result<StatusCode, HttpError> {
    let mut store = db.write().await;
    let id = authenticate(&headers, &store)?;
    store.users.remove(&id);
    store.tokens.retain(|_, owner| *owner != id);
    store.groceries.retain(|_, g| g.owner_id != id);
    Ok(StatusCode::NO_CONTENT)
}

// --- groceries ---

async fn list_groceries(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Grocery>>, HttpError> {
    let store = db.read().await;
    let id = authenticate(&headers, &store)?;
    let items = store
        .groceries
        .values()
        .filter(|g| g.owner_id == id)
        .cloned()
        .collect();
    Ok(Json(items))
}

async fn create_grocery(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateGrocery>,
) -> Result<(StatusCode, Json<Grocery>), HttpError> {
    let mut store = db.write().await;
    let owner_id = authenticate(&headers, &store)?;
    check_item(Some(&input.name), Some(input.quantity))?;
    store.next_item_id += 1;
    let grocery = Grocery {
        id: store.next_item_id,
        name: input.name.trim().to_string(),
        quantity: input.quantity,
        status: Status::Pending,
        owner_id,
        created_at: now(),
        updated_at: None,
    };
    store.groceries.insert(grocery.id, grocery.clone());
    Ok((StatusCode::CREATED, Json(grocery)))
}

async fn update_grocery(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<UpdateGrocery>,
) -> Result<Json<Grocery>, HttpError> {
    let mut store = db.write().await;
    let owner_id = authenticate(&headers, &store)?;
    check_item(input.name.as_deref(), input.quantity)?;
    let grocery = store
        .groceries
        .get_mut(&id)
        .filter(|g| g.owner_id == owner_id)
        .ok_or_else(HttpError::item_not_found)?;
    if let Some(name) = input.name {
        grocery.name = name.trim().to_string();
    }
    if let Some(quantity) = input.quantity {
        grocery.quantity = quantity;
    }
    if let Some(status) = input.status {
        grocery.status = status;
    }
    grocery.updated_at = Some(now());
    Ok(Json(grocery.clone()))
}

async fn delete_grocery(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    let mut store = db.write().await;
    let owner_id = authenticate(&headers, &store)?;
    match store.groceries.get(&id) {
        Some(g) if g.owner_id == owner_id => {
            store.groceries.remove(&id);
            Ok(StatusCode::NO_CONTENT)
        }
        _ => Err(HttpError::item_not_found()),
    }
}
