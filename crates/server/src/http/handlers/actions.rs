use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::{require_admin, workflow_error};
use crate::state::AppState;
use domain::{ReviewStatus, WorkflowAction};

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub action: String,
}

pub async fn transition(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    let action =
        WorkflowAction::parse(&req.action).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let new_status = state
        .workflow
        .apply(id, action)
        .await
        .map_err(workflow_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Status changed",
        "new_status": new_status,
    })))
}

pub async fn delete_source(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    state
        .workflow
        .delete_source_copy(id)
        .await
        .map_err(workflow_error)?;
    Ok(Json(json!({
        "success": true,
        "message": "Source copy deleted",
    })))
}

#[derive(Deserialize)]
pub struct BulkRequest {
    pub action: String,
    pub ids: Vec<i64>,
    /// Required for workflow actions; the tab the admin is acting from.
    pub current_status: Option<String>,
}

pub async fn bulk(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BulkRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    if req.ids.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No records selected".to_string()));
    }

    match req.action.as_str() {
        "delete" => {
            let deleted = state
                .bulk
                .bulk_delete(&req.ids)
                .await
                .map_err(workflow_error)?;
            Ok(Json(json!({
                "success": true,
                "message": format!("{} reviews deleted", deleted),
                "deleted": deleted,
            })))
        }
        "delete_source" => {
            let report = state
                .bulk
                .bulk_delete_source(&req.ids)
                .await
                .map_err(workflow_error)?;
            Ok(Json(json!({
                "success": true,
                "message": format!(
                    "{} source copies deleted, {} failed",
                    report.succeeded,
                    report.errors.len()
                ),
                "succeeded": report.succeeded,
                "errors": report.errors,
            })))
        }
        raw => {
            let action =
                WorkflowAction::parse(raw).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
            let current_status = req
                .current_status
                .as_deref()
                .ok_or((
                    StatusCode::BAD_REQUEST,
                    "current_status is required for bulk transitions".to_string(),
                ))
                .and_then(|s| ReviewStatus::parse(s).map_err(|e| (StatusCode::BAD_REQUEST, e)))?;

            let moved = state
                .bulk
                .bulk_transition(&req.ids, action, current_status)
                .await
                .map_err(workflow_error)?;
            Ok(Json(json!({
                "success": true,
                "message": format!("{} reviews moved", moved),
                "moved": moved,
                "new_status": action.target(),
            })))
        }
    }
}
