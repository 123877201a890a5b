use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use domain::ReviewRecord;

use crate::http::{require_admin, store_error};
use crate::state::AppState;

/// JSON feed for the export renderer: ready-for-export reviews grouped by
/// page title. Document layout is the renderer's problem.
pub async fn export_json(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ReviewRecord>>, (StatusCode, String)> {
    require_admin(&headers, &state)?;

    let feed = state.db.list_export_feed().await.map_err(store_error)?;
    Ok(Json(feed))
}

pub async fn export_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<([(header::HeaderName, &'static str); 2], String), (StatusCode, String)> {
    require_admin(&headers, &state)?;

    let feed = state.db.list_export_feed().await.map_err(store_error)?;

    let mut out = String::from("page_title,author_name,rating,submitted_at,body,admin_response\n");
    for rec in &feed {
        let rating = rec.rating.map(|r| r.to_string()).unwrap_or_default();
        let row = [
            rec.page_title.as_str(),
            rec.author_name.as_str(),
            rating.as_str(),
            &rec.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            rec.body.as_str(),
            rec.admin_response.as_str(),
        ]
        .map(csv_field)
        .join(",");
        out.push_str(&row);
        out.push('\n');
    }

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"reviews-export.csv\"",
            ),
        ],
        out,
    ))
}

fn csv_field(raw: &str) -> String {
    if raw.contains(['"', ',', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
