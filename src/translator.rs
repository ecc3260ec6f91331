use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::language;

/// Why a single provider could not produce a translation.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("provider returned error status {status}: {details}")]
    Rejected { status: String, details: String },
}

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("{provider} failed: {source}")]
    ProviderFailed {
        provider: &'static str,
        #[source]
        source: ProviderError,
    },
    #[error("All translation services failed")]
    AllProvidersFailed,
}

#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn translate(&self, text: &str, source: &str, target: &str)
        -> Result<String, ProviderError>;
}

pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!("quick-translate/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_status: MyMemoryStatus,
    #[serde(default)]
    response_data: Option<MyMemoryData>,
    #[serde(default)]
    response_details: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryData {
    translated_text: String,
}

// MyMemory reports errors with the status as a string ("403") while
// successes carry a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum MyMemoryStatus {
    Code(i64),
    Text(String),
}

impl MyMemoryStatus {
    fn is_ok(&self) -> bool {
        match self {
            Self::Code(code) => *code == 200,
            Self::Text(text) => text.trim() == "200",
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Code(code) => code.to_string(),
            Self::Text(text) => text.clone(),
        }
    }
}

/// Primary provider: the free MyMemory GET endpoint.
pub struct MyMemory {
    client: reqwest::Client,
    url: String,
}

impl MyMemory {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl Provider for MyMemory {
    fn name(&self) -> &'static str {
        "MyMemory"
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, ProviderError> {
        let langpair = format!("{}|{}", source, target);
        let resp = self
            .client
            .get(&self.url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: MyMemoryResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

        if !data.response_status.is_ok() {
            return Err(ProviderError::Rejected {
                status: data.response_status.describe(),
                details: data.response_details.unwrap_or_default(),
            });
        }

        data.response_data
            .map(|d| d.translated_text)
            .ok_or_else(|| ProviderError::Malformed("missing responseData".into()))
    }
}

#[derive(Serialize)]
struct LibreTranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreTranslateResponse {
    translated_text: String,
}

#[derive(Deserialize)]
struct LibreTranslateErrorResponse {
    error: String,
}

/// Secondary provider: a LibreTranslate instance, reached with mapped codes.
pub struct LibreTranslate {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl LibreTranslate {
    pub fn new(client: reqwest::Client, url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            url,
            api_key,
        }
    }
}

#[async_trait]
impl Provider for LibreTranslate {
    fn name(&self) -> &'static str {
        "LibreTranslate"
    }

    async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, ProviderError> {
        let body = LibreTranslateRequest {
            q: text,
            source: language::to_libretranslate(source),
            target: language::to_libretranslate(target),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let resp = self.client.post(&self.url).json(&body).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            let body = match serde_json::from_str::<LibreTranslateErrorResponse>(&text) {
                Ok(err) => err.error,
                Err(_) => text,
            };
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: LibreTranslateResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        Ok(result.translated_text)
    }
}

/// Tries each provider in order until one answers.
pub struct TranslationClient {
    providers: Vec<Box<dyn Provider>>,
}

impl TranslationClient {
    pub fn new(providers: Vec<Box<dyn Provider>>) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = http_client(Duration::from_secs(config.request_timeout_secs.max(1)))?;
        Ok(Self::new(vec![
            Box::new(MyMemory::new(client.clone(), config.mymemory_url.clone())),
            Box::new(LibreTranslate::new(
                client,
                config.libretranslate_url.clone(),
                config.libretranslate_api_key.clone(),
            )),
        ]))
    }

    /// `text` must already be trimmed and non-empty.
    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslationError> {
        if source == target {
            return Ok(text.to_string());
        }

        for provider in &self.providers {
            match provider.translate(text, source, target).await {
                Ok(translated) => {
                    tracing::debug!("{} translated {} -> {}", provider.name(), source, target);
                    return Ok(translated);
                }
                Err(source) => {
                    let err = TranslationError::ProviderFailed {
                        provider: provider.name(),
                        source,
                    };
                    tracing::warn!("{}", err);
                }
            }
        }

        Err(TranslationError::AllProvidersFailed)
    }
}
