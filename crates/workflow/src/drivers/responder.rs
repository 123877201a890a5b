//! `ResponseGenerator` driver against an OpenAI-compatible chat API.
//!
//! Credential and prompt template live in the meta table so admins can change
//! them without a redeploy; both are read per call.

use crate::error::GeneratorError;
use crate::traits::ResponseGenerator;
use async_trait::async_trait;
use serde_json::{json, Value};
use storage::Db;

const DEFAULT_PROMPT: &str = "You draft short, polite maintenance-team replies \
to customer reviews. Answer in the language of the review.";

pub struct OpenAiResponder {
    client: reqwest::Client,
    api_base: String,
    model: String,
    db: Db,
}

impl OpenAiResponder {
    pub fn new(api_base: &str, model: &str, db: Db) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            db,
        }
    }
}

#[async_trait]
impl ResponseGenerator for OpenAiResponder {
    async fn generate(
        &self,
        review_body: &str,
        current_response: &str,
    ) -> Result<String, GeneratorError> {
        let api_key = self
            .db
            .responder_api_key()
            .await?
            .filter(|k| !k.is_empty())
            .ok_or(GeneratorError::MissingCredential)?;
        let template = self
            .db
            .prompt_template()
            .await?
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());

        let user_message = if current_response.trim().is_empty() {
            format!("Review:\n{}", review_body)
        } else {
            format!(
                "Review:\n{}\n\nCurrent draft reply (improve it):\n{}",
                review_body, current_response
            )
        };

        let body: Value = self
            .client
            .post(format!("{}/v1/chat/completions", self.api_base))
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": template },
                    { "role": "user", "content": user_message },
                ],
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GeneratorError::Protocol("no completion in reply".into()))
    }
}
