use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::error::AppError;
use crate::ProxyState;

#[derive(Template)]
#[template(path = "proxy.html")]
struct ProxyTemplate {
    message: String,
}

pub fn router() -> Router<ProxyState> {
    Router::new().route("/", get(relay))
}

/// Ask the API service for its message and wrap it in a heading.
///
/// An unreachable API is part of the page, not a failure of this service.
async fn relay(State(state): State<ProxyState>) -> Result<impl IntoResponse, AppError> {
    let message = match state.client.get(&state.api_url).send().await {
        Ok(response) => response.text().await?,
        Err(e) if e.is_connect() => {
            tracing::warn!(api_url = %state.api_url, "api unreachable: {e}");
            format!("Error connecting to the API: {e}")
        }
        Err(e) => return Err(e.into()),
    };

    let template = ProxyTemplate { message };
    Ok(Html(template.render()?))
}
