pub mod handlers;
pub mod router;

use crate::state::AppState;
use axum::http::{HeaderMap, StatusCode};
use workflow::{ImportError, WorkflowError};

/// 所有端点都是管理端点，统一走 Bearer 校验
pub(crate) fn require_admin(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<(), (StatusCode, String)> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            "Missing Authorization header".to_string(),
        ))?;
    let expected_token = format!("Bearer {}", state.admin_token);
    if auth_header != expected_token {
        return Err((StatusCode::FORBIDDEN, "Invalid Admin Token".to_string()));
    }
    Ok(())
}

pub(crate) fn workflow_error(e: WorkflowError) -> (StatusCode, String) {
    let status = match &e {
        WorkflowError::RecordNotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::InvalidTransition(_) => StatusCode::CONFLICT,
        WorkflowError::PreconditionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowError::Source(_) => StatusCode::BAD_GATEWAY,
        WorkflowError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

pub(crate) fn import_error(e: ImportError) -> (StatusCode, String) {
    let status = match &e {
        // 调用方应以同一 offset 重试
        ImportError::Source(_) => StatusCode::BAD_GATEWAY,
        ImportError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

pub(crate) fn store_error(e: storage::StoreError) -> (StatusCode, String) {
    use storage::StoreError;
    let status = match &e {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Duplicate(_) => StatusCode::CONFLICT,
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}
