use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::db;
use crate::error::AppError;
use crate::models::Visit;
use crate::AppState;

#[derive(Template)]
#[template(path = "visits.html")]
struct VisitsTemplate {
    visits: Vec<Visit>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(log_visit))
}

async fn log_visit(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let visits = {
        let mut conn = db::acquire(&state.db, &state.retry, &state.shutdown).await?;
        Visit::record_and_list(&mut conn, state.dialect).await?
    };

    tracing::debug!(count = visits.len(), "visit recorded");

    let template = VisitsTemplate { visits };
    Ok(Html(template.render()?))
}
