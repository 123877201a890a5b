use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::{require_admin, store_error};
use crate::state::AppState;

pub async fn get_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    let api_key = state.db.responder_api_key().await.map_err(store_error)?;
    let prompt = state.db.prompt_template().await.map_err(store_error)?;
    let columns = state.db.column_order().await.map_err(store_error)?;
    let last_import = state
        .db
        .last_import_completed_at()
        .await
        .map_err(store_error)?;

    // 密钥本身绝不回传
    Ok(Json(json!({
        "api_key_set": api_key.map(|k| !k.is_empty()).unwrap_or(false),
        "prompt_template": prompt,
        "column_order": columns,
        "last_import_completed_at": last_import,
    })))
}

#[derive(Deserialize)]
pub struct SettingsRequest {
    pub api_key: Option<String>,
    pub prompt_template: Option<String>,
    pub column_order: Option<Vec<String>>,
}

pub async fn put_settings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    if let Some(key) = &req.api_key {
        state
            .db
            .set_responder_api_key(key)
            .await
            .map_err(store_error)?;
    }
    if let Some(template) = &req.prompt_template {
        state
            .db
            .set_prompt_template(template)
            .await
            .map_err(store_error)?;
    }
    if let Some(order) = &req.column_order {
        state.db.set_column_order(order).await.map_err(store_error)?;
    }

    Ok(Json(json!({ "success": true, "message": "Settings saved" })))
}

#[derive(Deserialize)]
pub struct PurgeRequest {
    pub months: u32,
}

/// Drops completed reviews whose status change is older than `months`.
pub async fn purge(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PurgeRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    if req.months == 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "months must be at least 1".to_string(),
        ));
    }
    let cutoff = Utc::now()
        .naive_utc()
        .checked_sub_months(chrono::Months::new(req.months))
        .ok_or((StatusCode::BAD_REQUEST, "months out of range".to_string()))?;

    let purged = state
        .db
        .purge_completed_before(cutoff)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({
        "success": true,
        "message": format!("{} completed reviews purged", purged),
        "purged": purged,
    })))
}
