mod models;
mod status;
pub mod normalize;

pub use models::{
    ImageOrigin, Metadata, NewReview, ReviewImage, ReviewPatch, ReviewRecord, SortDir,
    SortField, SourcePage, SourceRecord,
};
pub use status::{ReviewStatus, TransitionError, WorkflowAction};
