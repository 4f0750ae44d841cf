mod common;

use capstone_portal::client::{Anonymous, ApiClient, ApiError};
use capstone_portal::session::SessionStore;
use common::FakeBackend;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_bearer_token_follows_session() {
    let backend = FakeBackend::start().await;
    backend.respond("GET", "/careers", 200, json!([]));

    let session = Arc::new(SessionStore::in_memory());
    let client = backend.client(session.clone());

    client.list_careers().await.unwrap();
    session.login("tok-1", "u1", "TEACHER").unwrap();
    client.list_careers().await.unwrap();
    session.logout().unwrap();
    client.list_careers().await.unwrap();

    let auth: Vec<Option<String>> = backend
        .requests_to("GET", "/careers")
        .into_iter()
        .map(|r| r.authorization)
        .collect();
    assert_eq!(auth, vec![None, Some("Bearer tok-1".to_string()), None]);
}

#[tokio::test]
async fn test_requests_carry_limit_and_request_id() {
    let backend = FakeBackend::start().await;
    backend.respond("GET", "/skills", 200, json!([]));

    let client = backend.client(Arc::new(SessionStore::in_memory()));
    client.list_skills().await.unwrap();

    let request = &backend.requests_to("GET", "/skills")[0];
    assert_eq!(request.query.as_deref(), Some("limit=1000"));
    assert!(request.request_id.as_deref().is_some_and(|id| id.len() == 36));
}

#[tokio::test]
async fn test_list_envelopes() {
    let backend = FakeBackend::start().await;
    backend.respond("GET", "/careers", 200, json!([{ "id": "c1", "name": "Systems" }]));
    backend.respond("GET", "/roles", 200, json!({ "data": [{ "id": "r1", "name": "ADMIN" }] }));
    backend.respond("GET", "/skills", 200, json!({ "total": 0 }));

    let client = ApiClient::new(&backend.api_config(), Arc::new(Anonymous)).unwrap();

    let careers = client.list_careers().await.unwrap();
    assert_eq!(careers[0].name, "Systems");
    let roles = client.list_roles().await.unwrap();
    assert_eq!(roles[0].id, "r1");
    assert!(client.list_skills().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_backend_errors_are_classified() {
    let backend = FakeBackend::start().await;
    backend.respond(
        "POST",
        "/auth/login",
        401,
        json!({ "message": ["Contraseña incorrecta"], "statusCode": 401 }),
    );
    backend.respond_raw("GET", "/projects", 502, "<html>bad gateway</html>");

    let client = backend.client(Arc::new(SessionStore::in_memory()));

    let err = client.login("ana@uni.edu", "wrong").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.messages(), ["Contraseña incorrecta"]);

    let err = client.list_projects().await.unwrap_err();
    assert!(matches!(err, ApiError::Unstructured { status: 502, .. }));
    assert_eq!(err.user_message(), "Something went wrong");
}

#[tokio::test]
async fn test_transport_error() {
    // Grab a free port, then close it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = capstone_portal::config::ApiConfig {
        base_url: format!("http://127.0.0.1:{}", port),
        ..Default::default()
    };
    let client = ApiClient::new(&config, Arc::new(Anonymous)).unwrap();

    let err = client.list_projects().await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.user_message(), "Connection error");
}

#[tokio::test]
async fn test_delete_with_empty_body() {
    let backend = FakeBackend::start().await;
    backend.respond_raw("DELETE", "/projects/p%201", 200, "");

    let client = backend.client(Arc::new(SessionStore::in_memory()));
    client.delete_project("p 1").await.unwrap();

    assert_eq!(backend.requests()[0].path, "/api/projects/p%201");
}

#[tokio::test]
async fn test_user_projects_unwraps_embedded_projects() {
    let backend = FakeBackend::start().await;
    backend.respond(
        "GET",
        "/users-projects/user/u1",
        200,
        json!({ "data": [
            { "id": "up1", "project": common::project("p9", "Linked", "en progreso", "u3", "c1") },
            { "id": "up2", "project": null }
        ]}),
    );

    let client = backend.client(Arc::new(SessionStore::in_memory()));
    let projects = client.list_user_projects("u1").await.unwrap();

    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].id, "p9");
    assert_eq!(projects[0].deliverables().links, vec!["https://github.com/example/repo"]);
}

#[tokio::test]
async fn test_user_project_link_and_user_delete() {
    let backend = FakeBackend::start().await;
    backend.respond("POST", "/users-projects", 201, json!({ "id": "up9" }));
    backend.respond_raw("DELETE", "/users/u7", 204, "");

    let session = common::logged_in_session();
    let client = backend.client(session);

    client.link_user_project("u1", "p4").await.unwrap();
    client.delete_user("u7").await.unwrap();

    assert_eq!(
        backend.requests_to("POST", "/users-projects")[0].json(),
        json!({ "userId": "u1", "projectId": "p4" })
    );
    assert_eq!(
        backend.requests_to("DELETE", "/users/u7")[0].authorization.as_deref(),
        Some("Bearer tok-123")
    );
}
