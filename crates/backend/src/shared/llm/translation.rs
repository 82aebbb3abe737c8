//! Business-text translation between the portal languages.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::types::{ChatMessage, CompletionOptions, LlmError, LlmProvider};

const BATCH_SIZE: usize = 5;
const BATCH_PAUSE: Duration = Duration::from_millis(100);
const MODEL_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Zh,
    Vi,
    Es,
}

impl Language {
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::En),
            "zh" => Some(Language::Zh),
            "vi" => Some(Language::Vi),
            "es" => Some(Language::Es),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
            Language::Vi => "vi",
            Language::Es => "es",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Zh => "Chinese (Simplified)",
            Language::Vi => "Vietnamese",
            Language::Es => "Spanish",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationContext {
    Business,
    Technical,
    Cpfr,
    Manufacturing,
    #[default]
    General,
}

impl TranslationContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationContext::Business => "business",
            TranslationContext::Technical => "technical",
            TranslationContext::Cpfr => "cpfr",
            TranslationContext::Manufacturing => "manufacturing",
            TranslationContext::General => "general",
        }
    }

    fn guidance(&self) -> &'static str {
        match self {
            TranslationContext::Business => "This is business terminology for a B2B supply chain management platform. Use professional, formal language.",
            TranslationContext::Technical => "This is technical terminology for manufacturing and logistics. Use precise, industry-standard terms.",
            TranslationContext::Cpfr => "This is CPFR (Collaborative Planning, Forecasting, and Replenishment) terminology. Use established supply chain terms.",
            TranslationContext::Manufacturing => "This is manufacturing and production terminology. Use standard industrial vocabulary.",
            TranslationContext::General => "This is general user interface text. Use clear, user-friendly language.",
        }
    }
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Invalid language code. Supported: en, zh, vi, es")]
    InvalidLanguage,
    #[error("No translation received")]
    EmptyResponse,
    #[error("Translation failed: {0}")]
    Provider(#[from] LlmError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRequest {
    pub text: String,
    pub from_language: String,
    pub to_language: String,
    #[serde(default)]
    pub context: TranslationContext,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTranslationRequest {
    pub texts: Vec<String>,
    pub from_language: String,
    pub to_language: String,
    #[serde(default)]
    pub context: TranslationContext,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResponse {
    pub original_text: String,
    pub translated_text: String,
    pub from_language: String,
    pub to_language: String,
    pub confidence: f64,
    pub context: String,
}

fn build_prompt(text: &str, from: Language, to: Language, context: TranslationContext) -> String {
    format!(
        "You are a professional translator specializing in business and supply chain terminology.\n\n\
         Task: Translate the following text from {} to {}.\n\n\
         Context: {}\n\n\
         Requirements:\n\
         - Maintain professional business tone\n\
         - Use industry-standard terminology\n\
         - Keep the same meaning and intent\n\
         - For technical terms, use established translations\n\
         - For button text, keep it concise and actionable\n\n\
         Text to translate: \"{}\"\n\n\
         Respond with ONLY the translated text, no explanations or additional content.",
        from.display_name(),
        to.display_name(),
        context.guidance(),
        text
    )
}

pub struct Translator {
    provider: Arc<dyn LlmProvider>,
}

impl Translator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub async fn translate(
        &self,
        text: &str,
        from_language: &str,
        to_language: &str,
        context: TranslationContext,
    ) -> Result<TranslationResponse, TranslationError> {
        let from = Language::parse(from_language).ok_or(TranslationError::InvalidLanguage)?;
        let to = Language::parse(to_language).ok_or(TranslationError::InvalidLanguage)?;

        if from == to {
            return Ok(TranslationResponse {
                original_text: text.to_string(),
                translated_text: text.to_string(),
                from_language: from.code().into(),
                to_language: to.code().into(),
                confidence: 1.0,
                context: context.as_str().into(),
            });
        }

        let messages = vec![
            ChatMessage::system(
                "You are a professional translator. Respond with only the translated text, no explanations.",
            ),
            ChatMessage::user(build_prompt(text, from, to, context)),
        ];
        let response = self
            .provider
            .chat_completion(messages, CompletionOptions::default())
            .await?;

        let translated = response.content.trim();
        if translated.is_empty() {
            return Err(TranslationError::EmptyResponse);
        }

        Ok(TranslationResponse {
            original_text: text.to_string(),
            translated_text: translated.to_string(),
            from_language: from.code().into(),
            to_language: to.code().into(),
            confidence: MODEL_CONFIDENCE,
            context: context.as_str().into(),
        })
    }

    /// Translates in groups of five concurrent requests with a short pause between groups.
    /// Output order matches input order.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        from_language: &str,
        to_language: &str,
        context: TranslationContext,
    ) -> Result<Vec<TranslationResponse>, TranslationError> {
        let mut results = Vec::with_capacity(texts.len());
        let chunks: Vec<&[String]> = texts.chunks(BATCH_SIZE).collect();

        for (i, chunk) in chunks.iter().enumerate() {
            let pending = chunk
                .iter()
                .map(|text| self.translate(text, from_language, to_language, context));
            for outcome in join_all(pending).await {
                results.push(outcome?);
            }
            if i + 1 < chunks.len() {
                tokio::time::sleep(BATCH_PAUSE).await;
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::llm::types::LlmResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoProvider {
        calls: AtomicUsize,
        reply: Option<String>,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn chat_completion(
            &self,
            messages: Vec<ChatMessage>,
            _options: CompletionOptions,
        ) -> Result<LlmResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let content = match &self.reply {
                Some(r) => r.clone(),
                None => {
                    let prompt = &messages[1].content;
                    let start = prompt.find("Text to translate: \"").unwrap_or(0) + 20;
                    let end = prompt[start..].find('"').map(|e| start + e).unwrap_or(start);
                    format!(" <{}> ", &prompt[start..end])
                }
            };
            Ok(LlmResponse {
                content,
                tokens_used: None,
                model: "test".into(),
                finish_reason: None,
            })
        }

        fn provider_name(&self) -> &str {
            "echo"
        }
    }

    fn translator(reply: Option<&str>) -> (Translator, Arc<EchoProvider>) {
        let provider = Arc::new(EchoProvider {
            calls: AtomicUsize::new(0),
            reply: reply.map(String::from),
        });
        (Translator::new(provider.clone()), provider)
    }

    #[tokio::test]
    async fn same_language_skips_provider() {
        let (t, provider) = translator(None);
        let r = t
            .translate("Forecast", "en", "en", TranslationContext::Cpfr)
            .await
            .unwrap();
        assert_eq!(r.translated_text, "Forecast");
        assert_eq!(r.confidence, 1.0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejects_unknown_language() {
        let (t, _) = translator(None);
        let err = t
            .translate("Hi", "en", "fr", TranslationContext::General)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid language code. Supported: en, zh, vi, es"
        );
    }

    #[tokio::test]
    async fn empty_reply_is_error() {
        let (t, _) = translator(Some("   "));
        let err = t
            .translate("Hi", "en", "vi", TranslationContext::General)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::EmptyResponse));
    }

    #[tokio::test]
    async fn batch_keeps_order_and_trims() {
        let (t, provider) = translator(None);
        let texts: Vec<String> = (0..7).map(|i| format!("item {}", i)).collect();
        let results = t
            .translate_batch(&texts, "en", "zh", TranslationContext::Business)
            .await
            .unwrap();
        assert_eq!(results.len(), 7);
        assert_eq!(results[0].translated_text, "<item 0>");
        assert_eq!(results[6].translated_text, "<item 6>");
        assert_eq!(results[3].confidence, 0.95);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 7);
    }
}
