//! services/api/src/adapters/definition_llm.rs
//!
//! This module contains the adapter for the word-definition LLM.
//! It implements the `DefinitionProvider` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use book_corner_core::{
    domain::RawDefinition,
    ports::{DefinitionProvider, PortError, PortResult},
};

const SYSTEM_INSTRUCTIONS: &str = r#"You are a concise dictionary.
Reply with a single JSON object and nothing else, shaped as:
{"meaning": string, "language": string, "synonyms": [string]}
- "meaning": a clear, concise dictionary definition of the word.
- "language": the language the word belongs to, as a plain name (e.g. English, Japanese, French).
- "synonyms": a few synonyms, or an empty list.
Both "meaning" and "language" are required."#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `DefinitionProvider` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiDefinitionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiDefinitionAdapter {
    /// Creates a new `OpenAiDefinitionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    fn user_prompt(word: &str, context: Option<&str>) -> String {
        let mut prompt = format!(
            "Provide a clear, concise dictionary definition for the word \"{}\". Also detect the language of the word.",
            word
        );
        if let Some(context) = context {
            prompt.push_str(&format!(" Consider the context: \"{}\"", context));
        }
        prompt
    }
}

//=========================================================================================
// `DefinitionProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl DefinitionProvider for OpenAiDefinitionAdapter {
    async fn request_definition(
        &self,
        word: &str,
        context: Option<&str>,
    ) -> PortResult<RawDefinition> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(Self::user_prompt(word, context))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Definition LLM response contained no text content.".to_string())
            })?;

        parse_definition(&content)
    }
}

/// Parses the model's JSON reply. Anything that is not a JSON object with the
/// expected field types is treated as a failed lookup.
fn parse_definition(content: &str) -> PortResult<RawDefinition> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str::<RawDefinition>(trimmed)
        .map_err(|e| PortError::Unexpected(format!("Malformed definition payload: {}", e)))
}
