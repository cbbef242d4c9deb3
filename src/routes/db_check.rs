use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::db;
use crate::error::AppError;
use crate::AppState;

#[derive(Template)]
#[template(path = "db_check.html")]
struct DbCheckTemplate {
    error: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(check))
}

async fn check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let (status, error) = match db::ping(&state.db).await {
        Ok(()) => (StatusCode::OK, None),
        Err(e) => {
            tracing::warn!("database check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, Some(e.to_string()))
        }
    };

    let template = DbCheckTemplate { error };
    Ok((status, Html(template.render()?)))
}
