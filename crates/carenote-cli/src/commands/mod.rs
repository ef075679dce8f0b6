pub mod common;
pub mod completions;
pub mod drafts;
pub mod form;
pub mod notes;
pub mod notifications;
