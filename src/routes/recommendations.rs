use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{Recommendations, UserId},
};

use super::{parse_user_id, AppState};

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub user_id: UserId,
    #[serde(flatten)]
    pub recommendations: Recommendations,
}

/// JSON form of the results page
pub async fn user_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<String>,
) -> AppResult<Json<RecommendationsResponse>> {
    let user_id = parse_user_id(Some(&user_id))?;

    tracing::info!(
        request_id = %request_id,
        user_id,
        "Fetching recommendations"
    );

    let recommendations = state.catalog.recommendations(user_id).await?;

    Ok(Json(RecommendationsResponse {
        user_id,
        recommendations,
    }))
}
