use std::sync::Arc;
use storage::Db;
use workflow::{BatchImporter, BulkOperator, ResponseGenerator, ReviewTracker, StatusWorkflow};

/// Components are constructed once at startup and handed in here; nothing in
/// the codebase reaches for a global.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub workflow: StatusWorkflow,
    pub bulk: BulkOperator,
    pub importer: BatchImporter,
    pub tracker: ReviewTracker,
    pub responder: Arc<dyn ResponseGenerator>,
    pub admin_token: String,
}
