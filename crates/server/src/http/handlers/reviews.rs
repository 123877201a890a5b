use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::{require_admin, store_error};
use crate::state::AppState;
use domain::{ReviewPatch, ReviewRecord, ReviewStatus, SortDir, SortField, SourcePage};
use storage::ListQuery;

#[derive(Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub page_id: Option<i64>,
    pub sort: Option<SortField>,
    pub dir: Option<SortDir>,
}

pub async fn list_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ReviewRecord>>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    let status = match params.status.as_deref() {
        Some(raw) => ReviewStatus::parse(raw).map_err(|e| (StatusCode::BAD_REQUEST, e))?,
        None => ReviewStatus::Intake,
    };
    let mut query = ListQuery::new(status);
    if let Some(page_id) = params.page_id {
        query = query.page(page_id);
    }
    if let (Some(sort), Some(dir)) = (params.sort, params.dir) {
        query = query.sort(sort, dir);
    }

    let reviews = state.db.list_reviews(&query).await.map_err(store_error)?;
    Ok(Json(reviews))
}

pub async fn get_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ReviewRecord>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    let review = state
        .db
        .get_review(id)
        .await
        .map_err(store_error)?
        .ok_or((StatusCode::NOT_FOUND, format!("Review {} not found", id)))?;
    Ok(Json(review))
}

#[derive(Deserialize)]
pub struct PatchRequest {
    pub body: Option<String>,
    pub admin_response: Option<String>,
    pub flagged: Option<bool>,
}

pub async fn patch_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<PatchRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    let patch = ReviewPatch {
        body: req.body,
        admin_response: req.admin_response,
        flagged: req.flagged,
        ..Default::default()
    };
    let affected = state
        .db
        .update_review(id, patch)
        .await
        .map_err(store_error)?;
    if affected == 0 {
        return Err((StatusCode::NOT_FOUND, format!("Review {} not found", id)));
    }
    Ok(Json(json!({ "success": true, "message": "Review updated" })))
}

pub async fn delete_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    let affected = state.db.delete_review(id).await.map_err(store_error)?;
    if affected == 0 {
        return Err((StatusCode::NOT_FOUND, format!("Review {} not found", id)));
    }
    Ok(Json(json!({ "success": true, "message": "Review deleted" })))
}

#[derive(Deserialize)]
pub struct PagesParams {
    pub status: Option<String>,
}

pub async fn list_pages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PagesParams>,
) -> Result<Json<Vec<SourcePage>>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    let status = params
        .status
        .as_deref()
        .map(ReviewStatus::parse)
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let pages = state
        .db
        .distinct_source_pages(status)
        .await
        .map_err(store_error)?;
    Ok(Json(pages))
}

/// Asks the configured generator for a reply draft and persists it. The
/// generated text replaces the current response; the admin can keep editing.
pub async fn generate_response(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    let review = state
        .db
        .get_review(id)
        .await
        .map_err(store_error)?
        .ok_or((StatusCode::NOT_FOUND, format!("Review {} not found", id)))?;

    let text = state
        .responder
        .generate(&review.body, &review.admin_response)
        .await
        .map_err(|e| (StatusCode::BAD_GATEWAY, e.to_string()))?;

    state
        .db
        .update_review(
            id,
            ReviewPatch {
                admin_response: Some(text.clone()),
                ..Default::default()
            },
        )
        .await
        .map_err(store_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Response generated",
        "response": text,
    })))
}
