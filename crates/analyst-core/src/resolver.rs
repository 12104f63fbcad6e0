//! Last-resort company lookup through the reasoning backend

use crate::directory::{CompanyDirectory, CompanyRecord};
use crate::error::{AnalystError, Result};
use crate::prompts::PromptSet;
use analyst_llm::{CompletionRequest, LLMProvider, Message};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Companies listed in the lookup prompt
pub const MAX_CANDIDATES: usize = 500;

const NO_MATCH: &str = "NULL";

/// Asks the backend which directory entry a free-form query refers to
///
/// The answer is only trusted when it names a ticker present in the
/// directory; anything else counts as no match.
pub struct LlmCompanyResolver {
    llm: Arc<dyn LLMProvider>,
    model: String,
    prompts: PromptSet,
}

impl LlmCompanyResolver {
    pub fn new(llm: Arc<dyn LLMProvider>, model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            llm,
            model: model.into(),
            prompts: PromptSet::new()?,
        })
    }

    /// Resolve `query`; errors are logged and reported as no match
    #[instrument(skip(self, directory))]
    pub async fn resolve(
        &self,
        query: &str,
        directory: &CompanyDirectory,
    ) -> Option<CompanyRecord> {
        if directory.is_empty() {
            return None;
        }

        match self.ask(query, directory).await {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "LLM company lookup failed");
                None
            }
        }
    }

    async fn ask(
        &self,
        query: &str,
        directory: &CompanyDirectory,
    ) -> Result<Option<CompanyRecord>> {
        let candidates = &directory.records()[..directory.len().min(MAX_CANDIDATES)];
        let prompt = self.prompts.company_lookup(query, candidates)?;

        let request = CompletionRequest::builder(&self.model)
            .add_message(Message::user(prompt))
            .max_tokens(32)
            .temperature(0.0)
            .build();

        let response = self.llm.complete(request).await?;
        let answer = response
            .message
            .text()
            .map(clean_answer)
            .ok_or_else(|| AnalystError::BackendError("empty lookup answer".to_string()))?;

        debug!(answer, "LLM lookup answered");
        if answer.eq_ignore_ascii_case(NO_MATCH) {
            return Ok(None);
        }

        let record = directory.get(answer).cloned();
        if record.is_none() {
            debug!(answer, "LLM lookup answer is not a known ticker");
        }
        Ok(record)
    }
}

/// First token of the answer without quotes or code markers
fn clean_answer(text: &str) -> &str {
    text.split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '「' | '」' | '.' | ','))
}
