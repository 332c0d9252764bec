use crate::config::RelayConfig;
use crate::decode::decode_reply;
use crate::error::RelayError;
use crate::io_struct::{ChatPayload, ChatResult, HistoryInput, Message};
use bytes::Bytes;
use http::header::{ACCEPT, CACHE_CONTROL, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use log::{debug, error, warn};
use reqwest::{RequestBuilder, StatusCode};

pub const VQD_TOKEN_HEADER: &str = "x-vqd-4";
pub const VQD_HASH_HEADER: &str = "x-vqd-hash-1";

/// Session credential pair handed out by the status endpoint. Valid for the
/// chat call that immediately follows and nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub vqd_token: Option<String>,
    pub vqd_hash: Option<String>,
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Credentials {
            vqd_token: read(VQD_TOKEN_HEADER),
            vqd_hash: read(VQD_HASH_HEADER),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.vqd_token.is_some() && self.vqd_hash.is_some()
    }

    fn apply(&self, mut builder: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.vqd_token {
            builder = builder.header(VQD_TOKEN_HEADER, token.as_str());
        }
        if let Some(hash) = &self.vqd_hash {
            builder = builder.header(VQD_HASH_HEADER, hash.as_str());
        }
        builder
    }
}

pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone)]
pub struct Relay {
    client: reqwest::Client,
    config: RelayConfig,
    browser_headers: HeaderMap,
}

impl Relay {
    pub fn new(config: RelayConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let mut browser_headers = HeaderMap::new();
        browser_headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);
        browser_headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        browser_headers.insert(REFERER, HeaderValue::from_str(&config.referer)?);
        Ok(Self {
            client,
            config,
            browser_headers,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Relay one prompt: fetch credentials, forward the extended conversation
    /// and aggregate the streamed reply.
    pub async fn handle(&self, prompt: &str, history: HistoryInput, model: &str) -> ChatResult {
        match self.chat(prompt, history, model).await {
            Ok(reply) => ChatResult::Success {
                reply,
                model: model.to_string(),
            },
            Err(e) => ChatResult::Error(e),
        }
    }

    async fn chat(
        &self,
        prompt: &str,
        history: HistoryInput,
        model: &str,
    ) -> Result<String, RelayError> {
        let mut messages = history.into_messages().inspect_err(|e| {
            warn!("Rejecting request: {}", e);
        })?;
        messages.push(Message::user(prompt));

        let credentials = self.fetch_credentials().await?;
        let response = self.post_chat(&credentials, model, &messages).await?;
        let status = response.status.as_u16();
        let body = response.text();

        match decode_reply(&body) {
            Ok(reply) if reply.is_empty() => {
                warn!("Upstream returned an empty reply with status {}", status);
                Err(RelayError::UpstreamFailure { status, body })
            }
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!("Failed to decode upstream reply: {}", e);
                Err(RelayError::UpstreamDecodeFailure {
                    status,
                    body,
                    detail: e.to_string(),
                })
            }
        }
    }

    /// GET the status endpoint and read the session credential headers.
    ///
    /// An unreachable endpoint yields empty credentials and the chat call is
    /// left to fail upstream; only a timeout aborts the request.
    pub async fn fetch_credentials(&self) -> Result<Credentials, RelayError> {
        let resp = self
            .client
            .get(self.config.status_url())
            .headers(self.browser_headers.clone())
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await;
        let resp = match resp {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                error!("Status fetch timed out: {}", e);
                return Err(RelayError::UpstreamTimeout);
            }
            Err(e) => {
                warn!("Status fetch failed, continuing without credentials: {}", e);
                return Ok(Credentials::default());
            }
        };
        let credentials = Credentials::from_headers(resp.headers());
        if credentials.is_complete() {
            debug!("Obtained session credentials (status {})", resp.status());
        } else {
            warn!(
                "Status endpoint returned {} without complete credential headers",
                resp.status()
            );
        }
        Ok(credentials)
    }

    /// POST the conversation to the chat endpoint and read the whole body.
    pub async fn post_chat(
        &self,
        credentials: &Credentials,
        model: &str,
        messages: &[Message],
    ) -> Result<UpstreamResponse, RelayError> {
        debug!("Forwarding {} messages to model {}", messages.len(), model);
        let request = self
            .client
            .post(self.config.chat_url())
            .headers(self.browser_headers.clone())
            .json(&ChatPayload { model, messages });
        let resp = credentials
            .apply(request)
            .send()
            .await
            .map_err(|e| {
                error!("Chat call failed: {}", e);
                RelayError::from_transport(e)
            })?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| {
            error!("Failed to read chat response body: {}", e);
            RelayError::from_transport(e)
        })?;
        Ok(UpstreamResponse { status, body })
    }
}
