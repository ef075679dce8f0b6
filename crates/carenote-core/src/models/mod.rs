//! Data models for carenote

mod draft;
mod form;
mod notification;
mod session;

pub use draft::DraftRecord;
pub use form::{
    Answer, Answers, ChoiceOption, FormSnapshot, FormStatus, OptionAnswer, Question, QuestionType,
    Section,
};
pub use notification::{NotificationId, NotificationItem, NotificationPage, PageMeta};
pub use session::SessionRecord;
