use std::{future::Future, sync::Arc, time::Duration};

use reqwest::{header::AUTHORIZATION, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{config::AviapagesConfig, throttle::ApiThrottler};

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    #[error("rate limited by upstream")]
    RateLimited,
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("upstream API key is not configured")]
    NotConfigured,
}

/// HTTP client for the Aviapages aviation data API.
///
/// Every request passes through the shared [`ApiThrottler`]. Responses are
/// returned as raw JSON so callers can store them verbatim.
#[derive(Clone)]
pub struct AviapagesClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    throttler: Arc<ApiThrottler>,
}

impl AviapagesClient {
    pub fn new(cfg: &AviapagesConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let throttler = Arc::new(ApiThrottler::new(
            cfg.max_requests,
            Duration::from_secs(cfg.window_secs),
        ));
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            throttler,
        })
    }

    pub fn throttler(&self) -> &ApiThrottler {
        &self.throttler
    }

    #[instrument(skip(self, request))]
    pub async fn charter_prices<B: Serialize>(&self, request: &B) -> Result<Value, UpstreamError> {
        self.send(Method::POST, "/charter_prices/", None, Some(request))
            .await
    }

    #[instrument(skip(self))]
    pub async fn search_aircraft(&self, query: &str) -> Result<Value, UpstreamError> {
        self.send::<()>(Method::GET, "/aircraft/", Some(&[("search", query)][..]), None)
            .await
    }

    #[instrument(skip(self))]
    pub async fn aircraft_details(&self, external_id: i64) -> Result<Value, UpstreamError> {
        let path = format!("/aircraft/{external_id}/");
        self.send::<()>(Method::GET, &path, None, None).await
    }

    #[instrument(skip(self))]
    pub async fn search_airports(&self, query: &str) -> Result<Value, UpstreamError> {
        self.send::<()>(Method::GET, "/airports/", Some(&[("search_name", query)][..]), None)
            .await
    }

    #[instrument(skip(self, request))]
    pub async fn create_quote<B: Serialize>(&self, request: &B) -> Result<Value, UpstreamError> {
        self.send(Method::POST, "/charter_quote_requests/", None, Some(request))
            .await
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&B>,
    ) -> Result<Value, UpstreamError> {
        let key = self.api_key.as_deref().ok_or(UpstreamError::NotConfigured)?;
        let url = format!("{}{}", self.base_url, path);

        let mut req = self
            .http
            .request(method.clone(), &url)
            .header(AUTHORIZATION, format!("Token {key}"));
        if let Some(q) = query {
            req = req.query(q);
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = self.throttler.throttle(|| req.send()).await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!(%method, %url, %status, "aviapages response");
        classify(status, text)
    }
}

fn classify(status: StatusCode, body: String) -> Result<Value, UpstreamError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(UpstreamError::RateLimited);
    }
    if !status.is_success() {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body,
        });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

/// Retries `op` on upstream 429 with exponential backoff
/// (`base_delay`, `2 * base_delay`, ...). Any other outcome is returned as is.
pub async fn retry_on_rate_limit<T, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(UpstreamError::RateLimited) if attempt < max_attempts => {
                let delay = base_delay * 2u32.pow(attempt - 1);
                warn!(attempt, delay_ms = delay.as_millis() as u64, "upstream rate limited; backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn classify_maps_statuses() {
        assert!(matches!(
            classify(StatusCode::TOO_MANY_REQUESTS, String::new()),
            Err(UpstreamError::RateLimited)
        ));
        match classify(StatusCode::BAD_GATEWAY, "down".into()) {
            Err(UpstreamError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "down");
            }
            other => panic!("unexpected {other:?}"),
        }
        let ok = classify(StatusCode::OK, r#"{"results":[]}"#.into()).unwrap();
        assert!(ok["results"].is_array());
        assert_eq!(classify(StatusCode::NO_CONTENT, " ".into()).unwrap(), Value::Null);
        assert!(matches!(
            classify(StatusCode::OK, "<html>".into()),
            Err(UpstreamError::Decode(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_rate_limit_with_doubling_delay() {
        let calls = AtomicU32::new(0);
        let begin = Instant::now();
        let out = retry_on_rate_limit(3, Duration::from_secs(1), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(UpstreamError::RateLimited)
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(out, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s + 2s of backoff
        assert!(begin.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let res: Result<(), _> = retry_on_rate_limit(3, Duration::from_millis(100), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(UpstreamError::RateLimited) }
        })
        .await;
        assert!(matches!(res, Err(UpstreamError::RateLimited)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_other_failures() {
        let calls = AtomicU32::new(0);
        let res: Result<(), _> = retry_on_rate_limit(3, Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(UpstreamError::Status {
                    status: 500,
                    body: "boom".into(),
                })
            }
        })
        .await;
        assert!(matches!(res, Err(UpstreamError::Status { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_api_key_fails_fast() {
        let client = AviapagesClient::new(&AviapagesConfig {
            base_url: "http://127.0.0.1:9".into(),
            api_key: None,
            max_requests: 10,
            window_secs: 60,
        })
        .unwrap();
        let err = client.search_airports("EGLL").await.unwrap_err();
        assert!(matches!(err, UpstreamError::NotConfigured));
        assert_eq!(client.throttler().status().in_window, 0);
    }
}
