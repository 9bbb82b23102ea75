//! Prompt types for the helpdesk chat flow.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of the built-in support prompt.
pub const DEFAULT_PROMPT_ID: &str = "chat.support";

const DEFAULT_SYSTEM: &str = "You are the customer support assistant of an online shop. \
Answer questions about delivery, returns, exchanges, sizing, order tracking and products \
concisely, warmly and professionally. Never quote prices, never place orders and never \
invent policies. Use only the reference documents you are given; when they do not cover \
the question, say so and point the customer to the FAQ page or the support email.";

const DEFAULT_TEMPLATE: &str = "QUESTION: {{question}}

CONTEXT:
{{context}}

Answer concisely and professionally, relying on the context. If the context is insufficient, \
give a reassuring answer and point the customer to the shop's help pages.";

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// System message sent ahead of the rendered template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Template string with Handlebars syntax.
    ///
    /// The chat flow supplies `question` and `context`.
    pub template: String,
}

impl PromptDefinition {
    /// The support prompt used when the workspace defines none.
    pub fn default_support() -> Self {
        Self {
            id: DEFAULT_PROMPT_ID.to_string(),
            title: "Customer support answer".to_string(),
            system: Some(DEFAULT_SYSTEM.to_string()),
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

/// A fully built prompt ready for a completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}
