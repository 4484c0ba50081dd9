use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::SchedulerConfig;
use crate::errors::{GeminiError, GeminiResult};
use crate::types::*;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for interacting with the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    model: GeminiModel,
    base_url: String,
    temperature: Option<f32>,
}

impl GeminiClient {
    /// Create a new Gemini API client
    pub fn new(config: &SchedulerConfig) -> GeminiResult<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            GeminiError::ConfigError(
                "API key is required to initialize the Gemini client".to_string(),
            )
        })?;

        let model = GeminiModel::new(api_key, config.model_name.clone());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs()))
            .build()?;

        Ok(Self {
            client,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: config.temperature,
        })
    }

    /// Point the client at a different API root, e.g. a proxy or a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model.model_name
    }

    /// Get the generateContent URL for the configured model
    fn get_generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model.model_name, self.model.api_key
        )
    }

    /// Default generation settings applied to every request
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            ..Default::default()
        }
    }

    /// Generate content using the Gemini API
    pub async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> GeminiResult<GenerateContentResponse> {
        let url = self.get_generate_url();

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeminiError::RequestError(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                GeminiError::ResponseError(format!("Failed to read error response: {}", e))
            })?;

            return Err(GeminiError::HttpError {
                status_code: status.as_u16(),
                message: format!("API request failed: {}", error_body),
            });
        }

        let response_body = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GeminiError::ParsingError(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = response_body.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Gemini usage"
            );
        }

        Ok(response_body)
    }

    /// Creates a GenerateContentRequest for a single user prompt with no tools.
    pub(crate) fn create_prompt_request(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::new("user", vec![Part::text(prompt.to_string())])],
            system_instruction: None,
            tools: None,
            generation_config: Some(self.generation_config()),
        }
    }

    /// Concatenates every text part of the first candidate.
    ///
    /// A candidate that only carries function calls yields an empty string.
    pub fn extract_text_from_response(
        &self,
        response: &GenerateContentResponse,
    ) -> GeminiResult<String> {
        let candidate = response.candidates.first().ok_or_else(|| {
            GeminiError::ResponseError("No candidates in response".to_string())
        })?;

        let content = candidate.content.as_ref().ok_or_else(|| {
            GeminiError::ResponseError(format!(
                "No content in candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ))
        })?;

        let text = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        Ok(text)
    }

    /// Helper method to extract function calls from a response
    pub fn extract_function_calls_from_response(
        &self,
        response: &GenerateContentResponse,
    ) -> Vec<FunctionCall> {
        let mut function_calls = Vec::new();

        if let Some(candidate) = response.candidates.first() {
            if let Some(content) = &candidate.content {
                for part in &content.parts {
                    if let Some(function_call) = &part.function_call {
                        function_calls.push(function_call.clone());
                    }
                }
            }
        }

        function_calls
    }

    /// Sends a standalone prompt and returns the text of the reply
    pub async fn complete(&self, prompt: &str) -> GeminiResult<String> {
        let request = self.create_prompt_request(prompt);
        let response = self.generate_content(request).await?;
        self.extract_text_from_response(&response)
    }
}
