pub mod meta;
pub mod reviews;
