//! Chat reply types.

use serde::{Deserialize, Serialize};

/// A passage used to ground an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Source file name (e.g., "faq.txt")
    pub source: String,

    /// Chunk position within the source
    pub chunk_index: usize,

    /// Cosine similarity to the question
    pub score: f32,

    /// Short excerpt of the passage, truncated at a word boundary
    pub snippet: String,
}

/// Topic of a customer question, used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionCategory {
    Shipping,
    Returns,
    Sizing,
    Product,
    General,
}

impl QuestionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shipping => "shipping",
            Self::Returns => "returns",
            Self::Sizing => "sizing",
            Self::Product => "product",
            Self::General => "general",
        }
    }
}

/// Reply to one chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    /// Text shown to the customer
    pub answer: String,

    /// Passages the answer was grounded on
    pub sources: Vec<SourceRef>,

    /// Highest similarity among the retrieved passages, 0 when none
    pub max_score: f32,

    /// Whether the answer came from the model using retrieved passages
    pub grounded: bool,

    pub category: QuestionCategory,
}

impl ChatReply {
    /// Fixed reply used when the knowledge base has nothing relevant.
    pub fn fallback(message: &str, category: QuestionCategory) -> Self {
        Self {
            answer: message.to_string(),
            sources: Vec::new(),
            max_score: 0.0,
            grounded: false,
            category,
        }
    }

    /// Fixed reply used when the completion provider fails.
    pub fn apology(
        message: &str,
        sources: Vec<SourceRef>,
        max_score: f32,
        category: QuestionCategory,
    ) -> Self {
        Self {
            answer: message.to_string(),
            sources,
            max_score,
            grounded: false,
            category,
        }
    }
}
