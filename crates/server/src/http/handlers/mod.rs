pub mod actions;
pub mod export;
pub mod import;
pub mod reviews;
pub mod settings;
