use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::{import_error, require_admin, store_error};
use crate::state::AppState;
use domain::{SourcePage, SourceRecord};
use workflow::{ImportCursor, ImportReport, TrackContext};

/// One page per call; the client feeds the returned cursor back in until
/// `has_more` goes false.
pub async fn run_import(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(cursor): Json<ImportCursor>,
) -> Result<Json<ImportReport>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    let report = state
        .importer
        .run_page(cursor)
        .await
        .map_err(import_error)?;
    Ok(Json(report))
}

#[derive(Deserialize)]
pub struct TrackRequest {
    pub external_id: i64,
    pub page_id: i64,
    pub page_title: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub author_ip: String,
    pub body: String,
    pub submitted_at: NaiveDateTime,
    pub rating: Option<i32>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
}

/// Live intake hook, called by the source site the moment a review lands.
pub async fn track(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<TrackRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    let record = SourceRecord {
        external_id: req.external_id,
        page_id: req.page_id,
        author_name: req.author_name,
        author_email: req.author_email,
        author_ip: req.author_ip,
        body: req.body,
        submitted_at: req.submitted_at,
        rating: req.rating,
        images: Vec::new(),
    };
    let page = SourcePage {
        page_id: req.page_id,
        title: req.page_title,
    };
    let ctx = TrackContext {
        user_agent: req.user_agent,
        referrer: req.referrer,
    };

    let id = state
        .tracker
        .track(record, page, ctx)
        .await
        .map_err(store_error)?;
    Ok(Json(json!({
        "success": true,
        "message": if id.is_some() { "Review tracked" } else { "Already tracked" },
        "id": id,
    })))
}
