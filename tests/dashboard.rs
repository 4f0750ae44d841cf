mod common;

use capstone_portal::config::UiConfig;
use capstone_portal::pages::{DashboardPage, DashboardStats};
use common::FakeBackend;
use serde_json::json;

fn users() -> serde_json::Value {
    json!([
        { "id": "u1", "name": "Ana", "email": "ana@uni.edu", "roleId": "r-teacher" },
        { "id": "u2", "name": "Luis", "email": "luis@uni.edu", "roleId": "r-admin" },
        { "id": "u3", "name": "Eva", "email": "eva@uni.edu", "roleId": "r-teacher" }
    ])
}

#[tokio::test]
async fn test_dashboard_counts() {
    let backend = FakeBackend::start().await;
    common::seed(&backend);
    backend.respond("GET", "/users", 200, users());

    let session = common::logged_in_session();
    let client = backend.client(session.clone());
    let page = DashboardPage::load(&client, &session, &UiConfig::default()).await;

    assert_eq!(
        page.stats,
        DashboardStats {
            projects: 6,
            users: 3,
            careers: 2,
            skills: 2
        }
    );
    assert!(page.failed.is_empty());

    let recent: Vec<&str> = page.recent_projects().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(recent, vec!["p1", "p2", "p3", "p4"]);
    assert_eq!(page.career_name("c-ind"), Some("Industrial Design"));
}

#[tokio::test]
async fn test_one_failed_fetch_leaves_others_populated() {
    let backend = FakeBackend::start().await;
    common::seed(&backend);
    backend.respond("GET", "/users", 500, json!({ "message": "boom" }));

    let session = common::logged_in_session();
    let client = backend.client(session.clone());
    let page = DashboardPage::load(&client, &session, &UiConfig::default()).await;

    assert_eq!(page.stats.users, 0);
    assert!(page.users.is_empty());
    assert_eq!(page.stats.projects, 6);
    assert_eq!(page.stats.careers, 2);
    assert_eq!(page.stats.skills, 2);
    assert_eq!(page.failed, vec!["users"]);

    let cards: Vec<(&str, usize)> = page.stat_cards().iter().map(|c| (c.label, c.value)).collect();
    assert_eq!(
        cards,
        vec![("Projects", 6), ("Users", 0), ("Careers", 2), ("Skills", 2)]
    );
}

#[tokio::test]
async fn test_every_fetch_carries_the_token() {
    let backend = FakeBackend::start().await;
    common::seed(&backend);
    backend.respond("GET", "/users", 200, users());

    let session = common::logged_in_session();
    let client = backend.client(session.clone());
    DashboardPage::load(&client, &session, &UiConfig::default()).await;

    let requests = backend.requests();
    assert_eq!(requests.len(), 4);
    assert!(requests
        .iter()
        .all(|r| r.authorization.as_deref() == Some("Bearer tok-123")));
}
