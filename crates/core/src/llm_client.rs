use crate::history::{ConversationTurn, Role};
use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;

/// Everything the model needs for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system_prompt: String,
    /// Prior turns, oldest first.
    pub history: Vec<ConversationTurn>,
    /// The new user message.
    pub message: String,
}

/// A generic client for interacting with an LLM.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Makes a single, non-streaming call and returns the raw reply text.
    async fn complete(&self, request: ModelRequest) -> Result<String>;
}

/// An implementation of `LLMClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The model identifier to use for chat completions (e.g., "gemini-2.5-flash-lite").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Converts a request into the chat-completions message list: system prompt,
/// prior turns mapped onto user/assistant roles, then the new user message.
pub fn build_messages(request: &ModelRequest) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.clone())
            .build()?
            .into(),
    ];
    for turn in &request.history {
        match turn.role {
            Role::User => messages.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(turn.content.clone())
                    .build()?
                    .into(),
            ),
            Role::Model => messages.push(
                ChatCompletionRequestAssistantMessageArgs::default()
                    .content(turn.content.clone())
                    .build()?
                    .into(),
            ),
        }
    }
    messages.push(
        ChatCompletionRequestUserMessageArgs::default()
            .content(request.message.clone())
            .build()?
            .into(),
    );
    Ok(messages)
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn complete(&self, request: ModelRequest) -> Result<String> {
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(build_messages(&request)?)
            .build()?;

        let response = self.client.chat().create(chat_request).await?;

        let answer = response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .clone()
            .context("No content in LLM response")?;

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_messages_orders_system_history_then_message() {
        let request = ModelRequest {
            system_prompt: "You teach Java.".to_string(),
            history: vec![
                ConversationTurn::user("What is a class?"),
                ConversationTurn::model("{\"explanation\": []}"),
            ],
            message: "And an object?".to_string(),
        };

        let messages = build_messages(&request).unwrap();

        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(
            messages[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
        assert!(matches!(messages[3], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_build_messages_without_history() {
        let request = ModelRequest {
            system_prompt: "sys".to_string(),
            history: vec![],
            message: "hi".to_string(),
        };

        assert_eq!(build_messages(&request).unwrap().len(), 2);
    }
}
