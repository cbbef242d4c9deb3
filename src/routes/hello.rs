use axum::{routing::get, Router};

pub const GREETING: &str = "Hello from the API container!";

pub fn router() -> Router {
    Router::new().route("/", get(greeting))
}

async fn greeting() -> &'static str {
    GREETING
}
