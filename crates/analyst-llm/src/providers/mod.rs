//! Concrete LLM provider implementations
//!
//! This module contains implementations of the LLMProvider trait for
//! various LLM services.

#[cfg(feature = "ollama")]
pub mod ollama;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};
#[cfg(feature = "openai")]
pub use openai::{OpenAIConfig, OpenAIProvider};

/// Merge the optional system prompt into the message list
pub(crate) fn with_system(
    system: Option<String>,
    messages: Vec<crate::Message>,
) -> Vec<crate::Message> {
    let mut result = Vec::with_capacity(messages.len() + 1);
    if let Some(sys) = system {
        result.push(crate::Message::system(sys));
    }
    result.extend(messages);
    result
}
