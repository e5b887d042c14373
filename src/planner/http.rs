//! `AnthropicPlanner` (spec §4.G concretisation): POSTs the prompt and
//! context to the Anthropic Messages API with a blocking `reqwest`
//! client, matching the rest of the crate's synchronous style, and
//! parses a JSON code block out of the response text.

use std::time::Duration;

use serde_json::json;

use crate::error::{Error, Result};

use super::contract::{Planner, PlannerInput, PlannerOutput, RawPlannerResponse};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-opus-4-20250514";
/// LLM calls get 180s (spec §5).
const LLM_TIMEOUT: Duration = Duration::from_secs(180);

pub struct AnthropicPlanner {
    api_key: String,
    client: reqwest::blocking::Client,
}

impl AnthropicPlanner {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(LLM_TIMEOUT)
            .build()
            .expect("reqwest client builder should not fail with static config");
        Self { api_key: api_key.into(), client }
    }

    fn build_prompt(input: &PlannerInput) -> String {
        let mut prompt = String::new();
        prompt.push_str(&input.prompt);
        if let Some(digest) = &input.project_digest {
            prompt.push_str("\n\nProject structure:\n");
            prompt.push_str(digest);
        }
        for snippet in &input.context_snippets {
            prompt.push_str("\n\n---\n");
            prompt.push_str(snippet);
        }
        if let Some(max_lines) = input.max_lines_per_task {
            prompt.push_str(&format!(
                "\n\nTarget at most {max_lines} lines of code per task. \
                 Respond with a single JSON object: {{\"tasks\": [{{\"id\", \"title\", \"description\", \
                 \"estimated_lines\", \"depends_on\"}}], \"summary\": \"...\"}}."
            ));
        }
        prompt
    }

    fn extract_json_block(text: &str) -> Result<&str> {
        if let Some(start) = text.find("```json") {
            let rest = &text[start + 7..];
            if let Some(end) = rest.find("```") {
                return Ok(rest[..end].trim());
            }
        }
        let start = text.find('{').ok_or_else(|| Error::Planner("response contained no JSON object".into()))?;
        let end = text.rfind('}').ok_or_else(|| Error::Planner("response contained no JSON object".into()))?;
        if end <= start {
            return Err(Error::Planner("response contained no JSON object".into()));
        }
        Ok(&text[start..=end])
    }
}

impl Planner for AnthropicPlanner {
    fn plan(&self, input: &PlannerInput) -> Result<PlannerOutput> {
        let prompt = Self::build_prompt(input);
        let body = json!({
            "model": MODEL,
            "max_tokens": 4096,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .map_err(|e| Error::Planner(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Planner(format!("planner API returned status {}", response.status())));
        }

        let value: serde_json::Value =
            response.json().map_err(|e| Error::Planner(format!("invalid response body: {e}")))?;
        let text = value["content"][0]["text"]
            .as_str()
            .ok_or_else(|| Error::Planner("response missing content[0].text".into()))?;

        let json_block = Self::extract_json_block(text)?;
        let raw: RawPlannerResponse =
            serde_json::from_str(json_block).map_err(|e| Error::Planner(format!("malformed JSON: {e}")))?;

        super::contract::validate(raw)
    }
}
