//! In-process fake backend for integration tests
//!
//! Every request is recorded; responses come from a table of canned
//! `(method, path) -> (status, body)` entries. Unknown routes answer 404.

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use capstone_portal::client::ApiClient;
use capstone_portal::config::ApiConfig;
use capstone_portal::session::SessionStore;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub const PREFIX: &str = "/api";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct BackendState {
    routes: Mutex<HashMap<(String, String), (u16, String)>>,
    requests: Mutex<Vec<Recorded>>,
}

pub struct FakeBackend {
    pub addr: SocketAddr,
    state: Arc<BackendState>,
}

async fn handle(
    State(state): State<Arc<BackendState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let read_header = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: read_header(header::AUTHORIZATION),
        request_id: read_header(header::HeaderName::from_static("x-request-id")),
        content_type: read_header(header::CONTENT_TYPE),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let canned = state
        .routes
        .lock()
        .unwrap()
        .get(&(method.to_string(), uri.path().to_string()))
        .cloned();

    let (status, body) = canned.unwrap_or((404, r#"{"message":"Not found"}"#.to_string()));
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state = Arc::new(BackendState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Canned JSON response for `method` on a path below the API prefix
    pub fn respond(&self, method: &str, path: &str, status: u16, body: Value) {
        self.respond_raw(method, path, status, &body.to_string());
    }

    pub fn respond_raw(&self, method: &str, path: &str, status: u16, body: &str) {
        self.state.routes.lock().unwrap().insert(
            (method.to_string(), format!("{}{}", PREFIX, path)),
            (status, body.to_string()),
        );
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        let full = format!("{}{}", PREFIX, path);
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == full)
            .collect()
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: format!("http://{}", self.addr),
            api_prefix: PREFIX.to_string(),
            ..ApiConfig::default()
        }
    }

    pub fn client(&self, session: Arc<SessionStore>) -> ApiClient {
        ApiClient::new(&self.api_config(), session).unwrap()
    }
}

/// A store already logged in as `u1`
pub fn logged_in_session() -> Arc<SessionStore> {
    let session = Arc::new(SessionStore::in_memory());
    session.login("tok-123", "u1", "TEACHER").unwrap();
    session
}

/// Reference data shared by page tests.
///
/// `u1` is a teacher who created `p4` (pending) and is linked to `p5`.
pub fn seed(backend: &FakeBackend) {
    backend.respond(
        "GET",
        "/careers",
        200,
        json!([
            { "id": "c-sys", "name": "Systems Engineering" },
            { "id": "c-ind", "name": "Industrial Design" }
        ]),
    );
    backend.respond(
        "GET",
        "/roles",
        200,
        json!({ "data": [
            { "id": "r-admin", "name": "ADMIN" },
            { "id": "r-teacher", "name": "TEACHER" }
        ]}),
    );
    backend.respond(
        "GET",
        "/skills",
        200,
        json!([
            { "id": "s-rust", "name": "Rust", "description": "Systems language", "createdById": "u1" },
            { "id": "s-ml", "name": "Machine Learning", "description": "Models", "createdById": "u2" }
        ]),
    );
    backend.respond(
        "GET",
        "/projects-skills",
        200,
        json!([
            { "id": "ps1", "projectId": "p1", "skillId": "s-ml" },
            { "id": "ps2", "projectId": "p4", "skillId": "s-rust" }
        ]),
    );
    backend.respond(
        "GET",
        "/projects",
        200,
        json!({ "data": [
            project("p1", "Crop yield predictor", "en progreso", "u2", "c-ind"),
            project("p2", "Campus map", "completado", "u3", "c-sys"),
            project("p3", "Hidden proposal", "pendiente", "u2", "c-sys"),
            project("p4", "Rust linter", "pendiente", "u1", "c-sys"),
            project("p5", "Shared pending", "pendiente", "u3", "c-sys"),
            project("p6", "Library kiosk", "en progreso", "u3", "c-ind")
        ]}),
    );
    backend.respond(
        "GET",
        "/users/u1",
        200,
        json!({
            "id": "u1",
            "name": "Ana",
            "email": "ana@uni.edu",
            "roleId": "r-teacher",
            "careerId": "c-sys",
            "image": "/uploads/ana.png"
        }),
    );
    backend.respond(
        "GET",
        "/users-projects/user/u1",
        200,
        json!([
            { "id": "up1", "userId": "u1", "projectId": "p5",
              "project": project("p5", "Shared pending", "pendiente", "u3", "c-sys") }
        ]),
    );
}

pub fn project(id: &str, name: &str, status: &str, created_by: &str, career: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{} description", name),
        "status": status,
        "objectives": ["First objective"],
        "summary": "Summary",
        "cycle": "VIII",
        "academic_period": "2024-I",
        "careerId": career,
        "createdBy": created_by,
        "startDate": "2024-03-01T00:00:00.000Z",
        "endDate": null,
        "deliverables": ["Final report", "https://github.com/example/repo"]
    })
}
