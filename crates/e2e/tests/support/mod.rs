//! In-process stub of the account/garage control-plane surface
//!
//! Implements just enough of the backend for the suite's hermetic tests:
//! sign-up/sign-in with a `sid` session cookie, account deletion, and the
//! credential-gated vehicle CRUD with the backend's documented status codes
//! and messages. The vehicle listing is returned oldest-first on purpose:
//! clients must not rely on list position to find the newest record.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

const BRANDS: [(i64, &str); 5] = [
    (1, "Audi"),
    (2, "BMW"),
    (3, "Ford"),
    (4, "Porsche"),
    (5, "Fiat"),
];

const MODELS: [(i64, i64, &str); 17] = [
    (1, 1, "TT"),
    (2, 1, "R8"),
    (3, 1, "Q7"),
    (4, 1, "A6"),
    (5, 1, "A8"),
    (6, 2, "3"),
    (7, 2, "5"),
    (8, 2, "X5"),
    (9, 2, "X6"),
    (10, 2, "Z3"),
    (11, 3, "Fiesta"),
    (12, 3, "Focus"),
    (13, 3, "Fusion"),
    (14, 3, "Mondeo"),
    (15, 3, "Sierra"),
    (16, 4, "Panamera"),
    (17, 5, "Panda"),
];

#[derive(Default)]
pub struct StubState {
    users: Mutex<HashMap<String, String>>,
    sessions: Mutex<HashMap<String, String>>,
    cars: Mutex<HashMap<String, Vec<Value>>>,
    next_car_id: AtomicI64,
    /// Counts DELETE /api/cars/{id} attempts, for no-op assertions
    pub car_delete_calls: AtomicUsize,
}

impl StubState {
    fn session_email(&self, headers: &HeaderMap) -> Option<String> {
        let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
        let sid = cookies.split(';').find_map(|pair| {
            let pair = pair.trim();
            pair.strip_prefix("sid=").map(str::to_string)
        })?;
        self.sessions.lock().unwrap().get(&sid).cloned()
    }

    fn open_session(&self, email: &str) -> String {
        let sid = Uuid::new_v4().simple().to_string();
        self.sessions
            .lock()
            .unwrap()
            .insert(sid.clone(), email.to_string());
        sid
    }
}

fn error_body(message: &str) -> Value {
    json!({"status": "error", "message": message})
}

fn session_response(status: StatusCode, sid: &str, body: Value) -> Response {
    (
        status,
        [(header::SET_COOKIE, format!("sid={sid}; Path=/; HttpOnly"))],
        Json(body),
    )
        .into_response()
}

async fn signup(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    if email.is_empty() || password.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(error_body("Email required"))).into_response();
    }

    {
        let mut users = state.users.lock().unwrap();
        if users.contains_key(&email) {
            return (
                StatusCode::BAD_REQUEST,
                Json(error_body("User already exists")),
            )
                .into_response();
        }
        users.insert(email.clone(), password);
    }

    let sid = state.open_session(&email);
    session_response(
        StatusCode::CREATED,
        &sid,
        json!({"status": "ok", "data": {"email": email}}),
    )
}

async fn signin(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();

    let valid = state
        .users
        .lock()
        .unwrap()
        .get(&email)
        .is_some_and(|stored| stored == password);
    if !valid {
        return (
            StatusCode::UNAUTHORIZED,
            Json(error_body("Wrong email or password")),
        )
            .into_response();
    }

    let sid = state.open_session(&email);
    session_response(StatusCode::OK, &sid, json!({"status": "ok"}))
}

async fn delete_user(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> Response {
    let Some(email) = state.session_email(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(error_body("Not authenticated")),
        )
            .into_response();
    };

    state.users.lock().unwrap().remove(&email);
    state.cars.lock().unwrap().remove(&email);
    state
        .sessions
        .lock()
        .unwrap()
        .retain(|_, owner| owner != &email);
    (StatusCode::OK, Json(json!({"status": "ok"}))).into_response()
}

async fn create_car(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let Some(email) = state.session_email(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(error_body("Not authenticated")),
        )
            .into_response();
    };

    let brand_id = body["carBrandId"].as_i64().unwrap_or(0);
    let model_id = body["carModelId"].as_i64().unwrap_or(0);
    let mileage = body["mileage"].as_i64().unwrap_or(-1);

    if !(0..=999_999).contains(&mileage) {
        return (
            StatusCode::BAD_REQUEST,
            Json(error_body("Mileage has to be from 0 to 999999")),
        )
            .into_response();
    }
    let Some((_, brand_name)) = BRANDS.iter().find(|(id, _)| *id == brand_id) else {
        return (StatusCode::NOT_FOUND, Json(error_body("Brand not found"))).into_response();
    };
    let Some((_, _, model_name)) = MODELS
        .iter()
        .find(|(id, brand, _)| *id == model_id && *brand == brand_id)
    else {
        return (StatusCode::NOT_FOUND, Json(error_body("Model not found"))).into_response();
    };

    let id = state.next_car_id.fetch_add(1, Ordering::SeqCst) + 1;
    let row = json!({
        "id": id,
        "carBrandId": brand_id,
        "carModelId": model_id,
        "initialMileage": mileage,
        "mileage": mileage,
        "brand": brand_name,
        "model": model_name,
    });
    state
        .cars
        .lock()
        .unwrap()
        .entry(email)
        .or_default()
        .push(row.clone());

    (StatusCode::CREATED, Json(json!({"status": "ok", "data": row}))).into_response()
}

async fn list_cars(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    let Some(email) = state.session_email(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(error_body("Not authenticated")),
        )
            .into_response();
    };

    // oldest first, deliberately
    let rows = state
        .cars
        .lock()
        .unwrap()
        .get(&email)
        .cloned()
        .unwrap_or_default();
    (StatusCode::OK, Json(json!({"status": "ok", "data": rows}))).into_response()
}

async fn delete_car(
    State(state): State<Arc<StubState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    let Some(email) = state.session_email(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(error_body("Not authenticated")),
        )
            .into_response();
    };

    state.car_delete_calls.fetch_add(1, Ordering::SeqCst);

    let mut cars = state.cars.lock().unwrap();
    let rows = cars.entry(email).or_default();
    let before = rows.len();
    rows.retain(|row| row["id"].as_i64() != Some(id));
    if rows.len() == before {
        return (StatusCode::NOT_FOUND, Json(error_body("Car not found"))).into_response();
    }
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "data": {"carId": id}})),
    )
        .into_response()
}

fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/signin", post(signin))
        .route("/api/users", delete(delete_user))
        .route("/api/cars", post(create_car).get(list_cars))
        .route("/api/cars/:id", delete(delete_car))
        .with_state(state)
}

/// A running stub backend bound to an ephemeral local port
pub struct StubServer {
    pub addr: SocketAddr,
    pub state: Arc<StubState>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl StubServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

/// Bind the stub to `127.0.0.1:0` with graceful shutdown.
pub async fn spawn_stub() -> StubServer {
    let state = Arc::new(StubState::default());
    let app = router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    StubServer {
        addr,
        state,
        shutdown: Some(tx),
        handle,
    }
}
