mod bulk;
mod drivers;
mod error;
mod import;
mod tracker;
mod transition;
mod traits;

pub use bulk::{BulkOperator, SourceDeleteReport};
pub use drivers::responder::OpenAiResponder;
pub use drivers::wordpress::WordPressSource;
pub use error::{GeneratorError, ImportError, SourceError, WorkflowError};
pub use import::{BatchImporter, ImportCursor, ImportReport, PAGE_SIZE};
pub use tracker::{ReviewTracker, TrackContext};
pub use traits::{ResponseGenerator, ReviewSource};
pub use transition::StatusWorkflow;

#[cfg(test)]
mod testutil;
