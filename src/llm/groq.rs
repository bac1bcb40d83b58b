use async_trait::async_trait;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE } };
use serde::{ Deserialize, Serialize };
use std::sync::Arc;
use std::time::Duration;

use super::ChatClient;
use crate::config::Settings;
use crate::errors::GatewayError;
use crate::logging::Logger;
use crate::models::chat::Message;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct GroqChatClient {
    http: HttpClient,
    api_key: Option<String>,
    model: String,
    base_url: String,
    logger: Arc<Logger>,
}

#[derive(Serialize)]
struct GroqRequest<'a> {
    messages: &'a [Message],
    model: &'a str,
}

#[derive(Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Deserialize)]
struct GroqChoice {
    message: GroqMessage,
}

#[derive(Deserialize)]
struct GroqMessage {
    content: Option<String>,
}

impl GroqChatClient {
    pub fn new(
        api_key: Option<String>,
        model: String,
        base_url: String,
        timeout: Duration,
        logger: Arc<Logger>
    ) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            base_url,
            logger,
        })
    }

    pub fn from_settings(settings: &Settings, logger: Arc<Logger>) -> Result<Self, GatewayError> {
        Self::new(
            settings.groq_api_key.clone(),
            settings.groq_model.clone(),
            settings.groq_base_url.clone(),
            settings.groq_timeout(),
            logger
        )
    }

    async fn request_completion(&self, messages: &[Message]) -> Result<String, GatewayError> {
        let api_key = self.api_key
            .as_deref()
            .ok_or_else(|| GatewayError::Configuration("GROQ_API_KEY is not set".to_string()))?;

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let req = GroqRequest {
            messages,
            model: &self.model,
        };

        let resp = self.http.post(&url).bearer_auth(api_key).json(&req).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream(format!("{}: {}", status, body)));
        }

        let completion = resp.json::<GroqResponse>().await?;
        completion.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::Upstream("No completion content in Groq response".to_string()))
    }
}

#[async_trait]
impl ChatClient for GroqChatClient {
    async fn generate_response(&self, messages: &[Message]) -> Result<String, GatewayError> {
        self.logger.info("Sending request to Groq API...");
        match self.request_completion(messages).await {
            Ok(content) => {
                self.logger.info("Received response from Groq API.");
                Ok(content)
            }
            Err(e) => {
                self.logger.error(format_args!("Groq API request failed: {}", e));
                Err(e)
            }
        }
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}
