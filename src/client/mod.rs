//! Question manager API client.
//!
//! The pipeline only sees the [`QuizApi`] trait; [`HttpQuizApi`] is the production
//! implementation over a shared `reqwest::Client`. One handle is cloned into every
//! worker of both pools, so implementations must tolerate concurrent independent calls.

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::types::{OptionPayload, OptionSet, QuizpackBatch, QuizpackKey, RecordPayload};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Path of the key discovery endpoint, appended to the base URL's path
pub const ROUNDS_PATH: &str = "/utils/question_manager/round_launch_ajax/";
/// Path of the batch fetch endpoint, appended to the base URL's path
pub const QUIZPACK_PATH: &str = "/utils/question_manager/launch_quizpack_json/";
/// Path of the option lookup endpoint, appended to the base URL's path
pub const OPTIONS_PATH: &str = "/utils/question_manager/edit_question_json/";

const SESSION_COOKIE_NAME: &str = "sq_session";
const REFERER_PATH: &str = "/sq-question-manager/";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Remote operations the harvest pipeline depends on
#[async_trait::async_trait]
pub trait QuizApi: Send + Sync {
    /// List the quizpack keys published under one category filter
    async fn discover_keys(&self, filter: &str) -> Result<Vec<QuizpackKey>>;

    /// Fetch the records of one quizpack, in response order
    async fn fetch_quizpack(&self, key: &QuizpackKey) -> Result<QuizpackBatch>;

    /// Look up the answer options of one record
    async fn fetch_options(&self, record_id: &str) -> Result<OptionSet>;
}

/// Production [`QuizApi`] over HTTP, authenticated with a session cookie
pub struct HttpQuizApi {
    http_client: reqwest::Client,
    rounds_url: Url,
    quizpack_url: Url,
    options_url: Url,
    protocol_version: String,
    discovery_timeout: Duration,
    fetch_timeout: Duration,
    options_timeout: Duration,
}

impl HttpQuizApi {
    /// Create a client from API settings
    ///
    /// Endpoint paths are appended to the base URL's own path, so a base URL such
    /// as `https://host/proxy` sends requests under `/proxy/utils/...`.
    ///
    /// # Errors
    /// Returns a configuration error if the base URL or credential cannot be used
    /// in a request, or if the HTTP client cannot be created.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut base = Url::parse(&config.base_url)
            .map_err(|e| Error::config("base_url", format!("invalid base URL: {}", e)))?;
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        let join = |path: &str| {
            base.join(path.trim_start_matches('/'))
                .map_err(|e| Error::config("base_url", format!("cannot join {}: {}", path, e)))
        };
        let rounds_url = join(ROUNDS_PATH)?;
        let quizpack_url = join(QUIZPACK_PATH)?;
        let options_url = join(OPTIONS_PATH)?;
        let referer = join(REFERER_PATH)?;

        let http_client = reqwest::Client::builder()
            .default_headers(default_headers(config, &referer)?)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| Error::config("api", format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            rounds_url,
            quizpack_url,
            options_url,
            protocol_version: config.protocol_version.clone(),
            discovery_timeout: config.discovery_timeout,
            fetch_timeout: config.fetch_timeout,
            options_timeout: config.options_timeout,
        })
    }
}

#[async_trait::async_trait]
impl QuizApi for HttpQuizApi {
    async fn discover_keys(&self, filter: &str) -> Result<Vec<QuizpackKey>> {
        debug!(filter, "Discovering quizpack keys");

        let stamp = cache_buster();
        let response = self
            .http_client
            .get(self.rounds_url.clone())
            .query(&[("data", filter), ("_", stamp.as_str())])
            .timeout(self.discovery_timeout)
            .send()
            .await?;
        let body = read_body(response).await?;

        match serde_json::from_str::<serde_json::Value>(&body)? {
            serde_json::Value::Object(map) => {
                Ok(map.into_iter().map(|(k, _)| QuizpackKey::from(k)).collect())
            }
            // An empty listing is encoded as `[]` rather than `{}`
            serde_json::Value::Array(items) if items.is_empty() => Ok(Vec::new()),
            other => Err(Error::InvalidPayload(format!(
                "expected a JSON object of quizpack keys, got {}",
                json_kind(&other)
            ))),
        }
    }

    async fn fetch_quizpack(&self, key: &QuizpackKey) -> Result<QuizpackBatch> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("str", key.as_str())
            .append_pair("version", &self.protocol_version)
            .finish();

        let response = self
            .http_client
            .post(self.quizpack_url.clone())
            .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form)
            .timeout(self.fetch_timeout)
            .send()
            .await?;
        let body = read_body(response).await?;

        let parsed: QuizpackResponse = serde_json::from_str(&body)?;
        let payloads = parsed.data.unwrap_or_default();
        let total = payloads.len();
        let records: Vec<_> = payloads
            .into_iter()
            .filter_map(RecordPayload::into_record)
            .collect();

        let skipped = total - records.len();
        if skipped > 0 {
            warn!(key = %key, skipped, "Skipped quizpack items without an ID");
        }

        Ok(QuizpackBatch { records, skipped })
    }

    async fn fetch_options(&self, record_id: &str) -> Result<OptionSet> {
        let stamp = cache_buster();
        let response = self
            .http_client
            .get(self.options_url.clone())
            .query(&[("id", record_id), ("_", stamp.as_str())])
            .timeout(self.options_timeout)
            .send()
            .await?;
        let body = read_body(response).await?;

        let payload: OptionPayload = serde_json::from_str(&body)?;
        Ok(payload.into_option_set())
    }
}

/// Batch fetch response envelope
#[derive(Deserialize)]
struct QuizpackResponse {
    #[serde(default)]
    data: Option<Vec<RecordPayload>>,
}

fn default_headers(config: &ApiConfig, referer: &Url) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(
        "x-requested-with",
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers.insert(
        header::REFERER,
        HeaderValue::from_str(referer.as_str())
            .map_err(|e| Error::config("base_url", format!("invalid referer: {}", e)))?,
    );

    let mut cookie = HeaderValue::from_str(&format!(
        "{}={}",
        SESSION_COOKIE_NAME,
        config.session_cookie.trim()
    ))
    .map_err(|_| {
        Error::config(
            "session_cookie",
            "session cookie contains characters not allowed in a header",
        )
    })?;
    cookie.set_sensitive(true);
    headers.insert(header::COOKIE, cookie);

    Ok(headers)
}

/// Fail on non-success status, otherwise read the body as text
async fn read_body(response: reqwest::Response) -> Result<String> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response.text().await?)
}

/// Millisecond timestamp sent as the `_` query parameter to defeat caching
fn cache_buster() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
