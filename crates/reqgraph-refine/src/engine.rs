use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;

use reqgraph_core::{ai_configured, AiSettings, RequirementsSummary};

use crate::error::RefineError;
use crate::pipeline::{Extractor, RefinementRequest, Refiner};
use crate::{parse, prompt};

fn map_backend(provider: &str) -> Result<LLMBackend, RefineError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(RefineError::UnknownProvider(other.to_string())),
    }
}

/// One system + user exchange against `model` on the configured provider.
pub async fn generate(
    settings: &AiSettings,
    model: &str,
    system: &str,
    user_msg: &str,
) -> Result<String, RefineError> {
    if !ai_configured(settings) {
        return Err(RefineError::NotConfigured);
    }
    let backend = map_backend(&settings.provider)?;

    let mut builder = LLMBuilder::new()
        .backend(backend)
        .model(model)
        .system(system);

    if !settings.api_key.is_empty() {
        builder = builder.api_key(&settings.api_key);
    }

    let llm = builder.build().map_err(|e| RefineError::Build(e.to_string()))?;

    let messages = vec![ChatMessage::user().content(user_msg).build()];

    tracing::debug!(provider = %settings.provider, model, "sending request");
    let response = llm
        .chat(&messages)
        .await
        .map_err(|e| RefineError::Chat(e.to_string()))?;

    match response.text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(RefineError::EmptyResponse),
        None => Err(RefineError::NoText),
    }
}

/// Base extraction pass on the configured `model`.
pub struct LlmExtractor {
    settings: AiSettings,
}

impl LlmExtractor {
    pub fn new(settings: AiSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, transcript: &str) -> Result<RequirementsSummary, RefineError> {
        let system = prompt::extraction_system_prompt();
        let user_msg = prompt::extraction_user_message(transcript);
        let raw = generate(&self.settings, &self.settings.model, &system, &user_msg).await?;
        tracing::debug!(len = raw.len(), "raw extraction output");
        parse::parse_summary(&raw)
    }
}

/// Refinement pass on the stronger `refine_model`.
pub struct LlmRefiner {
    settings: AiSettings,
}

impl LlmRefiner {
    pub fn new(settings: AiSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Refiner for LlmRefiner {
    async fn refine(&self, request: RefinementRequest<'_>) -> Result<String, RefineError> {
        let system = prompt::refinement_system_prompt();
        let user_msg = prompt::refinement_user_message(&request);
        generate(
            &self.settings,
            self.settings.refinement_model(),
            &system,
            &user_msg,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(matches!(
            map_backend("watsonx"),
            Err(RefineError::UnknownProvider(p)) if p == "watsonx"
        ));
        assert!(map_backend("anthropic").is_ok());
    }

    #[tokio::test]
    async fn unconfigured_settings_fail_before_any_request() {
        let err = generate(&AiSettings::default(), "model", "system", "user")
            .await
            .unwrap_err();
        assert!(matches!(err, RefineError::NotConfigured));
    }
}
