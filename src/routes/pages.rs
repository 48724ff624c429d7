use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    Extension, Form,
};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    views::Views,
};

use super::{parse_user_id, AppState};

#[derive(Debug, Deserialize)]
pub struct ProcessForm {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Renders the user id form
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    match state.views.index() {
        Ok(html) => Html(html).into_response(),
        Err(err) => error_page(&state.views, err),
    }
}

/// Handles the form submission and renders the results page
pub async fn process(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Form(form): Form<ProcessForm>,
) -> Response {
    match results_page(&state, &request_id, form).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => error_page(&state.views, err),
    }
}

async fn results_page(
    state: &AppState,
    request_id: &RequestId,
    form: ProcessForm,
) -> AppResult<String> {
    let user_id = parse_user_id(form.user_id.as_deref())?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        catalog = state.catalog.name(),
        "Processing recommendation request"
    );

    let recommendations = state.catalog.recommendations(user_id).await?;

    tracing::info!(
        request_id = %request_id,
        sorted_count = recommendations.user_sorted_movies.len(),
        average_count = recommendations.user_average_movies.len(),
        favorite_count = recommendations.user_favorite_movies.len(),
        "Recommendations resolved"
    );

    state.views.results(user_id, &recommendations)
}

/// HTML counterpart of the JSON error body. Falls back to JSON when the
/// error page itself cannot be rendered.
fn error_page(views: &Views, err: AppError) -> Response {
    let status = err.status();
    match views.error(status, &err.client_message()) {
        Ok(html) => {
            err.log();
            (status, Html(html)).into_response()
        }
        Err(render_err) => {
            tracing::error!(error = %render_err, "Failed to render error page");
            err.into_response()
        }
    }
}
