//! Grounded chat replies.

use crate::index::SimilarityIndex;
use crate::rag::context::{build_context, map_sources};
use crate::rag::types::{ChatReply, QuestionCategory};
use helpdesk_core::ChatSettings;
use helpdesk_llm::{Completer, LlmRequest};
use helpdesk_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, Span};

const SHIPPING_WORDS: &[&str] = &[
    "shipping", "delivery", "deliver", "dispatch", "transport", "tracking", "livraison",
    "expédition", "délai",
];
const RETURN_WORDS: &[&str] = &[
    "return", "exchange", "refund", "retour", "échange", "remboursement", "cgv",
];
const SIZING_WORDS: &[&str] = &["size", "sizing", "measure", "taille", "mesure", "morphologie"];
const PRODUCT_WORDS: &[&str] = &[
    "material", "fabric", "composition", "care", "wash", "matière", "entretien", "lavage",
];

/// Classify a question by keyword, first match wins.
pub fn categorize_question(question: &str) -> QuestionCategory {
    let lower = question.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if mentions(SHIPPING_WORDS) {
        QuestionCategory::Shipping
    } else if mentions(RETURN_WORDS) {
        QuestionCategory::Returns
    } else if mentions(SIZING_WORDS) {
        QuestionCategory::Sizing
    } else if mentions(PRODUCT_WORDS) {
        QuestionCategory::Product
    } else {
        QuestionCategory::General
    }
}

/// Remove a leading label such as `[Shop]` the model may echo.
pub fn strip_label(answer: &str, label: Option<&str>) -> String {
    let trimmed = answer.trim();
    match label.filter(|l| !l.is_empty()) {
        Some(label) => trimmed
            .strip_prefix(label)
            .map(str::trim_start)
            .unwrap_or(trimmed)
            .to_string(),
        None => trimmed.to_string(),
    }
}

/// Answers customer messages from the knowledge base.
pub struct ChatHandler {
    index: Arc<SimilarityIndex>,
    completer: Arc<dyn Completer>,
    settings: ChatSettings,
    prompt: PromptDefinition,
}

impl ChatHandler {
    pub fn new(
        index: Arc<SimilarityIndex>,
        completer: Arc<dyn Completer>,
        settings: ChatSettings,
        prompt: PromptDefinition,
    ) -> Self {
        Self {
            index,
            completer,
            settings,
            prompt,
        }
    }

    /// Produce a reply. Never fails: missing knowledge gives the fallback
    /// message, provider errors give the apology message.
    #[instrument(skip(self, question), fields(category))]
    pub async fn respond(&self, question: &str, is_mobile: bool) -> ChatReply {
        let category = categorize_question(question);
        Span::current().record("category", category.as_str());

        let results = self.index.search(question, self.settings.top_k).await;
        if results.is_empty() {
            info!("No grounding available, sending fallback");
            return ChatReply::fallback(&self.settings.fallback_message, category);
        }

        let sources = map_sources(&results);
        let max_score = results
            .iter()
            .map(|r| r.similarity_score)
            .fold(f32::NEG_INFINITY, f32::max);

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("context".to_string(), build_context(&results));

        let built = match build_prompt(&self.prompt, variables) {
            Ok(built) => built,
            Err(e) => {
                error!(error = %e, prompt = %self.prompt.id, "Failed to build prompt");
                return ChatReply::apology(&self.settings.error_message, sources, max_score, category);
            }
        };

        let max_tokens = if is_mobile {
            self.settings.mobile_max_tokens
        } else {
            self.settings.max_tokens
        };

        let mut request = LlmRequest::new(built.user, &self.settings.model)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(max_tokens);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        match self.completer.complete(&request).await {
            Ok(response) => {
                let answer = strip_label(&response.content, self.settings.strip_prefix.as_deref());
                info!(
                    provider = self.completer.provider_name(),
                    sources = sources.len(),
                    max_score,
                    tokens = response.usage.total_tokens,
                    "Generated grounded reply"
                );
                ChatReply {
                    answer,
                    sources,
                    max_score,
                    grounded: true,
                    category,
                }
            }
            Err(e) => {
                error!(error = %e, provider = self.completer.provider_name(), "Completion failed");
                ChatReply::apology(&self.settings.error_message, sources, max_score, category)
            }
        }
    }
}
