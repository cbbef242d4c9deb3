mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{body_string, get, memory_state, state_for};
use visitlog::config::StoreConfig;

#[tokio::test]
async fn reachable_store_reports_success() {
    let router = visitlog::build_db_check_app(memory_state());

    let resp = get(&router, "/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("Database connection successful"));
}

#[tokio::test]
async fn unreachable_store_reports_the_error() {
    let router = visitlog::build_db_check_app(state_for(StoreConfig {
        max_connections: 1,
        connect_timeout: Duration::from_millis(500),
        ..StoreConfig::from_url("sqlite:/nonexistent-visitlog-dir/check.db")
    }));

    let resp = get(&router, "/").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let html = body_string(resp).await;
    assert!(html.contains("Database connection failed"));
}

#[tokio::test]
async fn check_does_not_create_the_visit_table() {
    let state = memory_state();
    let pool = state.db.clone();
    let router = visitlog::build_db_check_app(state);

    assert_eq!(get(&router, "/").await.status(), StatusCode::OK);

    let (tables,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sqlite_master WHERE name = 'visits'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(tables, 0);
}
