mod common;

use axum::http::StatusCode;
use common::{body_string, get, spawn};
use visitlog::routes::hello::GREETING;
use visitlog::{build_api_app, build_proxy_app, ProxyState};

#[tokio::test]
async fn api_returns_static_greeting() {
    let resp = get(&build_api_app(), "/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, GREETING);
}

#[tokio::test]
async fn proxy_relays_the_api_message() {
    let api = spawn(build_api_app()).await;
    let proxy = build_proxy_app(ProxyState::new(format!("http://{api}")).unwrap());

    let resp = get(&proxy, "/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains(r#"<h1>The API says: "Hello from the API container!"</h1>"#));
}

#[tokio::test]
async fn proxy_renders_connection_errors() {
    // Bind then drop a listener to get a port nobody is serving.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let proxy = build_proxy_app(ProxyState::new(format!("http://{addr}")).unwrap());

    let resp = get(&proxy, "/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_string(resp).await;
    assert!(html.contains("The API says:"));
    assert!(html.contains("Error connecting to the API"));
}

#[tokio::test]
async fn every_service_has_a_health_check() {
    let api = spawn(build_api_app()).await;
    let proxy = build_proxy_app(ProxyState::new(format!("http://{api}")).unwrap());

    for router in [build_api_app(), proxy] {
        let resp = get(&router, "/health").await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "ok");
    }
}
