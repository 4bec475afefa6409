use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Body, Client, Response, StatusCode};
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::application::ports::{
    BatchBody, BatchReader, BatchUploadResponse, DocumentTransport, TransportError,
};
use crate::infrastructure::spool::BUFFER_SIZE;

/// Document API version of the batch endpoint
pub const DEFAULT_API_VERSION: &str = "2011-02-01";

/// Longest server-requested pause we honor
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct CloudSearchConfig {
    /// Document endpoint host, optionally with scheme
    pub endpoint: String,
    pub api_version: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Retries after the first attempt
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
}

impl CloudSearchConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            retry_max_delay: Duration::from_secs(30),
        }
    }

    /// Full URL of the batch endpoint; bare hosts get `https://`
    pub fn batch_url(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        let base = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("https://{}", endpoint)
        };
        format!("{}/{}/documents/batch", base, self.api_version)
    }

    /// Delay before retry number `retry` (1-based), without jitter
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.retry_base_delay
            .saturating_mul(factor)
            .min(self.retry_max_delay)
    }
}

/// HTTP client for the CloudSearch document batch API
///
/// Throttling (429) and gateway failures (500/502/503/504) are retried with
/// exponential backoff, as are connect errors and timeouts. Every attempt
/// re-opens the batch body from the start.
pub struct CloudSearchClient {
    client: Client,
    config: CloudSearchConfig,
    url: String,
}

impl CloudSearchClient {
    pub fn new(config: CloudSearchConfig) -> Result<Self, TransportError> {
        if config.endpoint.trim().is_empty() {
            return Err(TransportError::Configuration(
                "document endpoint cannot be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("search-batcher/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Configuration(e.to_string()))?;
        let url = config.batch_url();
        info!(url = %url, max_retries = config.max_retries, "CloudSearch client ready");

        Ok(Self {
            client,
            config,
            url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(
        &self,
        content_type: &str,
        content_length: u64,
        reader: BatchReader,
    ) -> Result<Response, reqwest::Error> {
        self.client
            .post(&self.url)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, content_length)
            .body(Body::wrap_stream(ReaderStream::with_capacity(
                reader,
                BUFFER_SIZE,
            )))
            .send()
            .await
    }

    fn retry_delay(&self, retry: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(requested) = retry_after {
            return requested.min(MAX_RETRY_AFTER);
        }
        let delay = self.config.backoff_delay(retry);
        let jitter_ms = (delay.as_millis() / 10) as u64;
        if jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

#[async_trait]
impl DocumentTransport for CloudSearchClient {
    async fn upload(
        &self,
        content_type: &str,
        body: &dyn BatchBody,
    ) -> Result<BatchUploadResponse, TransportError> {
        let content_length = body.content_length();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let reader = body.open()?;

            let (last_status, retry_after) =
                match self.send(content_type, content_length, reader).await {
                    Ok(response) => {
                        let status = response.status();
                        if status.is_success() {
                            return parse_response(response).await;
                        }
                        if !is_retryable_status(status) {
                            return rejected(response).await;
                        }
                        (Some(status.as_u16()), parse_retry_after(&response))
                    }
                    Err(e) if e.is_connect() || e.is_timeout() => {
                        debug!(attempt, "Batch upload attempt failed: {}", e);
                        (None, None)
                    }
                    Err(e) => return Err(TransportError::Http(e.to_string())),
                };

            if attempt > self.config.max_retries {
                return Err(TransportError::Unavailable {
                    attempts: attempt,
                    last_status,
                });
            }

            let delay = self.retry_delay(attempt, retry_after);
            warn!(
                attempt,
                max_retries = self.config.max_retries,
                status = ?last_status,
                delay_ms = delay.as_millis() as u64,
                "Document service unavailable, retrying batch"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn parse_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

async fn parse_response(response: Response) -> Result<BatchUploadResponse, TransportError> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| TransportError::Http(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| TransportError::InvalidResponse(e.to_string()))
}

/// The service answers document-level failures with a 4xx and a regular
/// batch response body; anything else is a plain rejection.
async fn rejected(response: Response) -> Result<BatchUploadResponse, TransportError> {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<BatchUploadResponse>(&body) {
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(TransportError::Rejected { status, body }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::StorageError;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    struct StaticBody(Bytes);

    impl BatchBody for StaticBody {
        fn open(&self) -> Result<BatchReader, StorageError> {
            Ok(Box::pin(Cursor::new(self.0.clone())))
        }

        fn content_length(&self) -> u64 {
            self.0.len() as u64
        }
    }

    struct ReceivedRequest {
        head: String,
        body: Vec<u8>,
    }

    /// One-request-per-connection HTTP server answering from a script
    async fn start_test_server(
        script: Vec<(u16, &'static str)>,
    ) -> (String, Arc<Mutex<Vec<ReceivedRequest>>>, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(Mutex::new(Vec::new()));
        let requests = Arc::clone(&received);
        let mut script: VecDeque<_> = script.into();

        let handle = tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buffer = Vec::new();
                let mut chunk = [0u8; 4096];
                let header_end = loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break None;
                    }
                    buffer.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                        break Some(pos + 4);
                    }
                };
                let Some(header_end) = header_end else {
                    continue;
                };
                let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
                let content_length = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                while buffer.len() < header_end + content_length {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buffer.extend_from_slice(&chunk[..n]);
                }
                requests.lock().push(ReceivedRequest {
                    head,
                    body: buffer[header_end..].to_vec(),
                });

                let (status, body) = script.pop_front().unwrap_or((200, r#"{"status":"success"}"#));
                let response = format!(
                    "HTTP/1.1 {} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), received, handle)
    }

    fn fast_config(endpoint: String) -> CloudSearchConfig {
        CloudSearchConfig {
            max_retries: 2,
            retry_base_delay: Duration::from_millis(1),
            retry_max_delay: Duration::from_millis(5),
            ..CloudSearchConfig::new(endpoint)
        }
    }

    #[test]
    fn test_batch_url() {
        assert_eq!(
            CloudSearchConfig::new("doc-movies.us-east-1.cloudsearch.amazonaws.com").batch_url(),
            "https://doc-movies.us-east-1.cloudsearch.amazonaws.com/2011-02-01/documents/batch"
        );
        assert_eq!(
            CloudSearchConfig::new("http://localhost:8080/").batch_url(),
            "http://localhost:8080/2011-02-01/documents/batch"
        );
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = CloudSearchConfig {
            retry_base_delay: Duration::from_millis(100),
            retry_max_delay: Duration::from_millis(350),
            ..CloudSearchConfig::new("localhost")
        };
        assert_eq!(config.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(config.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(config.backoff_delay(3), Duration::from_millis(350));
        assert_eq!(config.backoff_delay(40), Duration::from_millis(350));
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let result = CloudSearchClient::new(CloudSearchConfig::new("  "));
        assert!(matches!(result, Err(TransportError::Configuration(_))));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
    }

    #[tokio::test]
    async fn test_upload_streams_body_with_headers() {
        let (endpoint, received, server) = start_test_server(vec![(
            200,
            r#"{"status":"success","adds":1,"deletes":0}"#,
        )])
        .await;
        let client = CloudSearchClient::new(fast_config(endpoint)).unwrap();
        let body = StaticBody(Bytes::from_static(br#"[{"type":"add","id":"a"}]"#));

        let response = client.upload("application/json", &body).await.unwrap();

        assert!(response.is_success());
        assert_eq!(response.adds, 1);
        let requests = received.lock();
        assert_eq!(requests.len(), 1);
        let head = requests[0].head.to_ascii_lowercase();
        assert!(head.starts_with("post /2011-02-01/documents/batch "));
        assert!(head.contains("content-type: application/json"));
        assert!(head.contains(&format!("content-length: {}", body.0.len())));
        assert_eq!(requests[0].body, body.0.to_vec());
        server.abort();
    }

    #[tokio::test]
    async fn test_retries_unavailable_then_succeeds() {
        let (endpoint, received, server) = start_test_server(vec![
            (503, ""),
            (429, ""),
            (200, r#"{"status":"success","adds":2}"#),
        ])
        .await;
        let client = CloudSearchClient::new(fast_config(endpoint)).unwrap();
        let body = StaticBody(Bytes::from_static(b"[1,2]"));

        let response = client.upload("application/json", &body).await.unwrap();

        assert_eq!(response.adds, 2);
        let requests = received.lock();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.body == b"[1,2]"));
        server.abort();
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (endpoint, received, server) =
            start_test_server(vec![(503, ""), (503, ""), (503, ""), (503, "")]).await;
        let client = CloudSearchClient::new(fast_config(endpoint)).unwrap();
        let body = StaticBody(Bytes::from_static(b"[]"));

        let result = client.upload("application/json", &body).await;

        assert!(matches!(
            result,
            Err(TransportError::Unavailable {
                attempts: 3,
                last_status: Some(503)
            })
        ));
        assert_eq!(received.lock().len(), 3);
        server.abort();
    }

    #[tokio::test]
    async fn test_document_errors_returned_as_response() {
        let (endpoint, _received, server) = start_test_server(vec![(
            400,
            r#"{"status":"error","adds":0,"deletes":0,"errors":[{"message":"bad field"}]}"#,
        )])
        .await;
        let client = CloudSearchClient::new(fast_config(endpoint)).unwrap();

        let response = client
            .upload("application/json", &StaticBody(Bytes::from_static(b"[]")))
            .await
            .unwrap();

        assert!(!response.is_success());
        assert_eq!(response.errors[0].message, "bad field");
        server.abort();
    }

    #[tokio::test]
    async fn test_plain_rejection() {
        let (endpoint, _received, server) = start_test_server(vec![(403, "forbidden")]).await;
        let client = CloudSearchClient::new(fast_config(endpoint)).unwrap();

        let result = client
            .upload("application/json", &StaticBody(Bytes::from_static(b"[]")))
            .await;

        match result {
            Err(TransportError::Rejected { status, body }) => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        server.abort();
    }

    #[tokio::test]
    async fn test_unparseable_success_body() {
        let (endpoint, _received, server) = start_test_server(vec![(200, "not json")]).await;
        let client = CloudSearchClient::new(fast_config(endpoint)).unwrap();

        let result = client
            .upload("application/json", &StaticBody(Bytes::from_static(b"[]")))
            .await;

        assert!(matches!(result, Err(TransportError::InvalidResponse(_))));
        server.abort();
    }
}
