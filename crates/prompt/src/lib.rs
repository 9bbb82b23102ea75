//! Prompt definitions for the helpdesk chat flow.
//!
//! Prompts are YAML files under `.helpdesk/prompts/` rendered with
//! Handlebars. A built-in support prompt is used when none is defined.

pub mod builder;
pub mod loader;
pub mod types;

pub use builder::build_prompt;
pub use loader::{load_prompt, load_prompt_or_default, prompt_path};
pub use types::{BuiltPrompt, PromptDefinition, DEFAULT_PROMPT_ID};
