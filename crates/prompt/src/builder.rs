//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use helpdesk_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Both the template and the system message are rendered with the same
/// variables. HTML escaping is disabled since the output is plain text.
///
/// # Example
/// ```no_run
/// use helpdesk_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example() -> helpdesk_core::AppResult<()> {
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "Do you ship abroad?".to_string());
/// vars.insert("context".to_string(), "[Document 1 - faq.txt]".to_string());
///
/// let built = build_prompt(&PromptDefinition::default_support(), vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let user = render_template(&definition.template, &variables)?;
    let system = definition
        .system
        .as_deref()
        .map(|system| render_template(system, &variables))
        .transpose()?;

    Ok(BuiltPrompt {
        system,
        user,
        source_prompt_id: definition.id.clone(),
        resolved_variables: variables,
    })
}

fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
