//! crates/book_corner_core/src/lookup.rs
//!
//! The word-definition client. It never fails: whatever the provider does,
//! the caller gets a usable `Definition` back.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{Definition, RawDefinition};
use crate::ports::DefinitionProvider;

pub const FALLBACK_MEANING: &str = "Could not retrieve definition at this time.";
pub const MISSING_MEANING: &str = "No definition found.";
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

#[derive(Clone)]
pub struct DefinitionLookup {
    provider: Arc<dyn DefinitionProvider>,
}

impl DefinitionLookup {
    pub fn new(provider: Arc<dyn DefinitionProvider>) -> Self {
        Self { provider }
    }

    /// Single-shot lookup: no retries, and provider errors turn into the fallback.
    pub async fn define(&self, word: &str, context: Option<&str>) -> Definition {
        let word = word.trim();
        if word.is_empty() {
            return fallback();
        }
        let context = context.map(str::trim).filter(|c| !c.is_empty());

        match self.provider.request_definition(word, context).await {
            Ok(raw) => {
                info!(word, "Definition received");
                normalize(raw)
            }
            Err(e) => {
                warn!(word, error = %e, "Definition lookup failed, using fallback");
                fallback()
            }
        }
    }
}

/// The value returned whenever the provider cannot be used.
pub fn fallback() -> Definition {
    Definition {
        meaning: FALLBACK_MEANING.to_string(),
        language: UNKNOWN_LANGUAGE.to_string(),
    }
}

/// Fills blank or absent fields so neither `meaning` nor `language` is ever empty.
pub fn normalize(raw: RawDefinition) -> Definition {
    let present = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    Definition {
        meaning: present(raw.meaning).unwrap_or_else(|| MISSING_MEANING.to_string()),
        language: present(raw.language).unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingProvider;

    #[async_trait]
    impl DefinitionProvider for FailingProvider {
        async fn request_definition(&self, _: &str, _: Option<&str>) -> PortResult<RawDefinition> {
            Err(PortError::Unexpected("connection refused".into()))
        }
    }

    struct FixedProvider {
        answer: RawDefinition,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DefinitionProvider for FixedProvider {
        async fn request_definition(&self, _: &str, _: Option<&str>) -> PortResult<RawDefinition> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.answer.clone())
        }
    }

    fn fixed(answer: RawDefinition) -> Arc<FixedProvider> {
        Arc::new(FixedProvider {
            answer,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn transport_failure_yields_exact_fallback() {
        let lookup = DefinitionLookup::new(Arc::new(FailingProvider));
        let result = lookup.define("ephemeral", None).await;
        assert_eq!(
            result,
            Definition {
                meaning: "Could not retrieve definition at this time.".into(),
                language: "Unknown".into(),
            }
        );
    }

    #[tokio::test]
    async fn complete_answer_passes_through() {
        let provider = fixed(RawDefinition {
            meaning: Some("Lasting a very short time.".into()),
            language: Some("English".into()),
            synonyms: Some(vec!["fleeting".into()]),
        });
        let lookup = DefinitionLookup::new(provider.clone());
        let result = lookup.define("ephemeral", Some("ephemeral joys")).await;
        assert_eq!(result.meaning, "Lasting a very short time.");
        assert_eq!(result.language, "English");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_fields_get_defaults() {
        let lookup = DefinitionLookup::new(fixed(RawDefinition {
            meaning: Some("   ".into()),
            ..Default::default()
        }));
        let result = lookup.define("kami", None).await;
        assert_eq!(result.meaning, "No definition found.");
        assert_eq!(result.language, "Unknown");
    }

    #[tokio::test]
    async fn blank_word_never_reaches_the_provider() {
        let provider = fixed(RawDefinition::default());
        let lookup = DefinitionLookup::new(provider.clone());
        assert_eq!(lookup.define("  ", None).await, fallback());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
