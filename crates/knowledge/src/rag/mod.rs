//! Chat grounding over the similarity index.
//!
//! Retrieves passages for a customer question, renders them into the
//! support prompt and asks the completion provider for an answer.

pub mod chat;
pub mod context;
pub mod types;

pub use chat::{categorize_question, ChatHandler};
pub use types::{ChatReply, QuestionCategory, SourceRef};
