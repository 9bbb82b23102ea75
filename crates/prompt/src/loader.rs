//! Prompt loader for YAML prompt definitions.

use crate::types::{PromptDefinition, DEFAULT_PROMPT_ID};
use helpdesk_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Location of a prompt file inside the workspace.
pub fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    workspace_path
        .join(".helpdesk/prompts")
        .join(format!("{}.yml", prompt_id))
}

/// Load a prompt definition by ID from `.helpdesk/prompts/<id>.yml`.
///
/// # Example
/// ```no_run
/// use helpdesk_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> helpdesk_core::AppResult<()> {
/// let prompt = load_prompt(Path::new("."), "chat.support")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Load a prompt, falling back to the built-in support prompt.
///
/// A missing file for the default ID is expected and silent. Any other
/// failure is logged before the fallback is returned.
pub fn load_prompt_or_default(workspace_path: &Path, prompt_id: &str) -> PromptDefinition {
    if prompt_id == DEFAULT_PROMPT_ID && !prompt_path(workspace_path, prompt_id).exists() {
        return PromptDefinition::default_support();
    }

    match load_prompt(workspace_path, prompt_id) {
        Ok(definition) => definition,
        Err(e) => {
            tracing::warn!(prompt_id, error = %e, "Using built-in support prompt");
            PromptDefinition::default_support()
        }
    }
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    Ok(())
}
