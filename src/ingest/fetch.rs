// src/ingest/fetch.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;

use crate::error::FetchError;

/// Retrieves raw feed bytes for a URL.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

pub const DEFAULT_USER_AGENT: &str =
    concat!("feedback-crawler/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed fetcher. Non-2xx answers are failures.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let http_err = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let resp = self.client.get(url).send().await.map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            counter!("crawl_http_status_errors_total").increment(1);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.bytes().await.map_err(http_err)?;
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port; returns the feed URL.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let mut seen = Vec::new();
            while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                seen.extend_from_slice(&buf[..n]);
            }
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.unwrap();
        });
        format!("http://{addr}/feed.atom")
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(DEFAULT_USER_AGENT, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn non_2xx_is_a_status_error() {
        let url = serve_once(
            concat!(
                "HTTP/1.1 503 Service Unavailable\r\n",
                "content-length: 0\r\nconnection: close\r\n\r\n",
            ),
        )
        .await;

        let err = fetcher().fetch(&url).await.unwrap_err();
        match err {
            FetchError::Status { url: u, status } => {
                assert_eq!(status, 503);
                assert_eq!(u, url);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ok_answer_returns_body_bytes() {
        let url = serve_once(
            concat!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/atom+xml\r\n",
                "content-length: 7\r\nconnection: close\r\n\r\n<feed/>",
            ),
        )
        .await;

        let body = fetcher().fetch(&url).await.unwrap();
        assert_eq!(body, b"<feed/>");
    }

    #[tokio::test]
    async fn refused_connection_is_an_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{addr}/");

        let err = fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Http { .. }));
        // the reqwest cause is reported once, through `source()`
        assert_eq!(err.to_string(), format!("http request to {url} failed"));
        let chain = crate::crawler::error_chain(&err);
        let cause = std::error::Error::source(&err).unwrap().to_string();
        assert_eq!(chain.matches(cause.as_str()).count(), 1);
    }
}
