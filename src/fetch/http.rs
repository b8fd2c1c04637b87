//! reqwest-backed fetcher.

use async_trait::async_trait;
use reqwest::header::COOKIE;
use tracing::debug;

use super::{Credentials, FetchRequest, FetchResponse, HttpFetcher, Method};
use crate::error::Result;

/// Fetcher over a shared `reqwest::Client`.
///
/// `Credentials::Include` attaches the configured session cookie, if any.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    cookie: Option<String>,
}

impl ReqwestFetcher {
    pub fn new(cookie: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("nsaide/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, cookie })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.credentials == Credentials::Include {
            if let Some(cookie) = &self.cookie {
                builder = builder.header(COOKIE, cookie.as_str());
            }
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(url = %request.url, status, bytes = body.len(), "Fetched");

        Ok(FetchResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_fetch_returns_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/config.json")
            .match_header("cache-control", "no-cache")
            .with_status(200)
            .with_body(r#"{"modules":[]}"#)
            .create_async()
            .await;

        let fetcher = ReqwestFetcher::new(None).unwrap();
        let response = fetcher
            .fetch(
                FetchRequest::get(format!("{}/config.json", server.url()))
                    .header("Cache-Control", "no-cache"),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"modules":[]}"#);
    }

    #[tokio::test]
    async fn test_non_success_status_is_ok_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = ReqwestFetcher::new(None).unwrap();
        let response = fetcher
            .fetch(FetchRequest::get(format!("{}/missing", server.url())))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert!(matches!(response.error_for_status(), Err(Error::Status(404))));
    }

    #[tokio::test]
    async fn test_cookie_only_sent_with_credentials() {
        let mut server = mockito::Server::new_async().await;
        let with_cookie = server
            .mock("GET", "/me")
            .match_header("cookie", "session=abc")
            .with_status(200)
            .create_async()
            .await;

        let fetcher = ReqwestFetcher::new(Some("session=abc".to_string())).unwrap();
        let response = fetcher
            .fetch(FetchRequest::get(format!("{}/me", server.url())).credentials(Credentials::Include))
            .await
            .unwrap();

        with_cookie.assert_async().await;
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let fetcher = ReqwestFetcher::new(None).unwrap();
        let result = fetcher.fetch(FetchRequest::get("http://127.0.0.1:1/unreachable")).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
