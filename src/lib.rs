//! Typed client for OpenAI-style LLM endpoints.
//!
//! Covers image generation and chat completions (plain, streamed, and with
//! image inputs for vision models).
//!
//! ```no_run
//! use llm_sdk::{CreateImageRequest, LlmSdk};
//!
//! # async fn run() -> llm_sdk::Result<()> {
//! let sdk = LlmSdk::from_env()?;
//! let res = sdk.create_image(CreateImageRequest::new("a caterpillar on a mushroom")).await?;
//! let png = sdk.image_bytes(&res.data[0]).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod sse;

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use futures::stream::{self, BoxStream, Stream, StreamExt};
use log::{debug, warn};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub use api::*;
pub use config::SdkConfig;
pub use error::{Result, SdkError};

use constants::ORGANIZATION_HEADER;
use sse::{EventDecoder, SseEvent};

/// Turns a typed request into an HTTP request against `base_url`.
pub trait IntoRequest {
    fn into_request(self, base_url: &str, client: Client) -> RequestBuilder;
}

#[derive(Debug, Clone)]
pub struct LlmSdk {
    config: SdkConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    r#type: Option<String>,
}

impl LlmSdk {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(SdkConfig::new(api_key))
    }

    pub fn with_config(config: SdkConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::with_config(SdkConfig::from_env()?))
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub async fn create_image(&self, req: CreateImageRequest) -> Result<CreateImageResponse> {
        self.send_json(req).await
    }

    pub async fn chat_completion(
        &self,
        mut req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        req.set_stream(false);
        self.send_json(req).await
    }

    /// Stream partial completions as the model produces them.
    ///
    /// The stream ends after `data: [DONE]` or when the server closes the body.
    pub async fn chat_completion_stream(
        &self,
        mut req: ChatCompletionRequest,
    ) -> Result<BoxStream<'static, Result<ChatCompletionChunk>>> {
        req.set_stream(true);
        let response = self.send(req).await?;
        Ok(decode_chunks(Box::pin(response.bytes_stream())).boxed())
    }

    /// Raw bytes of a generated image, decoded from `b64_json` or downloaded
    /// from `url`.
    pub async fn image_bytes(&self, image: &ImageObject) -> Result<Vec<u8>> {
        if let Some(data) = &image.b64_json {
            return Ok(base64::decode(data)?);
        }

        let url = image.url.as_deref().ok_or(SdkError::MissingImageData)?;
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.config.timeout)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn send_json<T: DeserializeOwned>(&self, req: impl IntoRequest) -> Result<T> {
        let response = self.send(req).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send(&self, req: impl IntoRequest) -> Result<Response> {
        let mut builder = req
            .into_request(&self.config.base_url, self.client.clone())
            .bearer_auth(&self.config.api_key)
            .timeout(self.config.timeout);
        if let Some(org) = &self.config.organization {
            builder = builder.header(ORGANIZATION_HEADER, org);
        }

        let request = builder.build()?;
        debug!("{} {}", request.method(), request.url());
        let response = self.client.execute(request).await?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_retry_after);
    let text = response.text().await.unwrap_or_default();
    let (message, kind) = match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(body) => (body.error.message, body.error.r#type),
        Err(_) => (text, None),
    };
    warn!("request failed with HTTP {}: {}", status.as_u16(), message);

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(SdkError::RateLimited { retry_after });
    }
    Err(SdkError::Api {
        status: status.as_u16(),
        message,
        kind,
    })
}

/// `Retry-After` is either delay-seconds or an HTTP-date; dates in the past
/// count as zero.
fn parse_retry_after(value: &str) -> Option<u64> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = at.with_timezone(&Utc) - Utc::now();
    Some(wait.num_seconds().max(0) as u64)
}

/// A `data:` payload is either a chunk or an `{"error": ...}` object the
/// server sends after the stream has started.
fn parse_chunk(data: &str) -> Result<ChatCompletionChunk> {
    serde_json::from_str::<ChatCompletionChunk>(data).map_err(|err| {
        match serde_json::from_str::<ErrorResponse>(data) {
            Ok(body) => {
                warn!("stream reported an error: {}", body.error.message);
                SdkError::Api {
                    status: StatusCode::OK.as_u16(),
                    message: body.error.message,
                    kind: body.error.r#type,
                }
            }
            Err(_) => SdkError::from(err),
        }
    })
}

/// Decode an SSE response body into chat completion chunks.
fn decode_chunks<S, B>(body: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = reqwest::Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    let state = (body, EventDecoder::new(), VecDeque::new(), false);
    stream::unfold(state, |(mut body, mut decoder, mut pending, mut eof)| async move {
        loop {
            if let Some(event) = pending.pop_front() {
                match event {
                    SseEvent::Done => return None,
                    SseEvent::Data(data) => {
                        return Some((parse_chunk(&data), (body, decoder, pending, eof)));
                    }
                }
            }
            if eof {
                return None;
            }
            match body.next().await {
                Some(Ok(bytes)) => pending.extend(decoder.feed(bytes.as_ref())),
                Some(Err(e)) => {
                    eof = true;
                    return Some((Err(SdkError::from(e)), (body, decoder, pending, eof)));
                }
                None => {
                    eof = true;
                    pending.extend(decoder.finish());
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn chunk_line(content: &str) -> String {
        format!(
            "data: {}\n\n",
            json!({
                "id": "chatcmpl-1",
                "object": "chat.completion.chunk",
                "created": 1,
                "model": "gpt-4",
                "choices": [{"index": 0, "delta": {"content": content}}]
            })
        )
    }

    async fn collect_text(body: Vec<Vec<u8>>) -> Vec<crate::Result<String>> {
        let body = stream::iter(body.into_iter().map(Ok::<_, reqwest::Error>));
        decode_chunks(body)
            .map(|chunk| {
                chunk.map(|c| {
                    c.choices
                        .into_iter()
                        .filter_map(|choice| choice.delta.content)
                        .collect::<String>()
                })
            })
            .collect()
            .await
    }

    #[tokio::test]
    async fn decode_chunks_handles_split_events() {
        let raw = format!("{}{}data: [DONE]\n\n", chunk_line("Hi"), chunk_line(" there"));
        let bytes = raw.into_bytes();
        let (a, b) = bytes.split_at(17);
        let (b, c) = b.split_at(b.len() / 2);

        let texts = collect_text(vec![a.to_vec(), b.to_vec(), c.to_vec()]).await;
        let texts: Vec<String> = texts.into_iter().map(|t| t.unwrap()).collect();
        assert_eq!(texts, vec!["Hi".to_string(), " there".to_string()]);
    }

    #[tokio::test]
    async fn decode_chunks_stops_at_done() {
        let raw = format!("{}data: [DONE]\n\n{}", chunk_line("kept"), chunk_line("dropped"));
        let texts = collect_text(vec![raw.into_bytes()]).await;
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].as_ref().unwrap(), "kept");
    }

    #[tokio::test]
    async fn decode_chunks_reports_malformed_json() {
        let texts = collect_text(vec![b"data: {not json}\n\n".to_vec()]).await;
        assert_eq!(texts.len(), 1);
        assert!(matches!(texts[0], Err(SdkError::Json(_))));
    }

    #[tokio::test]
    async fn decode_chunks_surfaces_server_error_event() {
        let raw = format!(
            "{}data: {{\"error\":{{\"message\":\"The server had an error\",\"type\":\"server_error\"}}}}\n\n",
            chunk_line("partial")
        );
        let texts = collect_text(vec![raw.into_bytes()]).await;

        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].as_ref().unwrap(), "partial");
        match &texts[1] {
            Err(SdkError::Api {
                status,
                message,
                kind,
            }) => {
                assert_eq!(*status, 200);
                assert_eq!(message, "The server had an error");
                assert_eq!(kind.as_deref(), Some("server_error"));
            }
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[test]
    fn retry_after_accepts_seconds_and_http_dates() {
        assert_eq!(parse_retry_after("120"), Some(120));
        assert_eq!(parse_retry_after(" 7 "), Some(7));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), Some(0));

        let later = (Utc::now() + chrono::Duration::seconds(3600)).to_rfc2822();
        let secs = parse_retry_after(&later).unwrap();
        assert!((3500..=3600).contains(&secs));

        assert_eq!(parse_retry_after("soon"), None);
    }

    #[tokio::test]
    async fn configured_timeout_applies_to_requests() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"created": 1, "data": []}))
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let config = SdkConfig::new("sk-test")
            .with_base_url(mock_server.uri())
            .with_timeout(std::time::Duration::from_millis(200));
        let err = LlmSdk::with_config(config)
            .create_image(CreateImageRequest::new("slow"))
            .await
            .unwrap_err();

        assert!(matches!(err, SdkError::Http(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn image_bytes_decodes_b64_payload() -> Result<()> {
        let sdk = LlmSdk::new("sk-test");
        let image = ImageObject {
            b64_json: Some(base64::encode("png-bytes")),
            url: None,
            revised_prompt: None,
        };
        assert_eq!(sdk.image_bytes(&image).await?, b"png-bytes".to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn image_bytes_requires_some_payload() {
        let sdk = LlmSdk::new("sk-test");
        let image = ImageObject {
            b64_json: None,
            url: None,
            revised_prompt: None,
        };
        assert!(matches!(
            sdk.image_bytes(&image).await,
            Err(SdkError::MissingImageData)
        ));
    }

    #[tokio::test]
    async fn requests_carry_auth_and_organization_headers() -> Result<()> {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("openai-organization", "org-42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "created": 1,
                "data": [{"b64_json": "aGk="}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let config = SdkConfig::new("sk-test")
            .with_base_url(format!("{}/", mock_server.uri()))
            .with_organization("org-42");
        let sdk = LlmSdk::with_config(config);
        let res = sdk.create_image(CreateImageRequest::new("hi")).await?;
        assert_eq!(sdk.image_bytes(&res.data[0]).await?, b"hi".to_vec());
        Ok(())
    }

    #[tokio::test]
    async fn non_json_error_body_is_kept_verbatim() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&mock_server)
            .await;

        let sdk = LlmSdk::with_config(SdkConfig::new("sk-test").with_base_url(mock_server.uri()));
        let err = sdk
            .create_image(CreateImageRequest::new("hi"))
            .await
            .unwrap_err();
        match err {
            SdkError::Api {
                status,
                message,
                kind,
            } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
                assert!(kind.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
