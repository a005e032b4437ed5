//! HTTP client wrapper.
//!
//! Applies the defaults every wallet request needs (timeout, user-agent,
//! HTTPS) and retries transient failures (429, 5xx, timeout, connect) with
//! exponential backoff. After retries are exhausted the last response is
//! handed back for classification; only transport failures become errors
//! here.

use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use reqwest::{Method, RequestBuilder, Response, StatusCode};

use crate::error::WalletError;

pub(crate) struct Request {
    client: reqwest::Client,
    timeout: Duration,
    max_retries: usize,
}

impl Request {
    pub(crate) fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3, // total attempts = 4
        }
    }

    /// Creates a request builder with defaults applied. Cleartext is only
    /// permitted toward loopback (dev servers, tests).
    pub(crate) fn req(&self, method: Method, url: &str) -> RequestBuilder {
        assert!(
            url.starts_with("https")
                || url.starts_with("http://127.0.0.1")
                || url.starts_with("http://localhost"),
            "cleartext requests are only allowed to loopback"
        );

        self.client.request(method, url).timeout(self.timeout).header(
            "User-Agent",
            format!("idwallet-core/{}", env!("CARGO_PKG_VERSION")),
        )
    }

    pub(crate) fn get(&self, url: &str) -> RequestBuilder {
        self.req(Method::GET, url)
    }

    pub(crate) fn post(&self, url: &str) -> RequestBuilder {
        self.req(Method::POST, url)
    }

    /// Sends the request once, without retries. Used where a blind replay
    /// is unsafe (instance registration).
    pub(crate) async fn dispatch(
        &self,
        request_builder: RequestBuilder,
    ) -> Result<Response, WalletError> {
        let (client, request) = request_builder.build_split();
        let request = request.map_err(WalletError::from)?;
        client.execute(request).await.map_err(WalletError::from)
    }

    /// Sends the request, retrying transient failures with backoff.
    pub(crate) async fn handle(
        &self,
        request_builder: RequestBuilder,
    ) -> Result<Response, WalletError> {
        let (client, request) = request_builder.build_split();
        let request = request.map_err(WalletError::from)?;
        let url = request.url().to_string();

        let mut backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(self.max_retries)
            .build();

        loop {
            let Some(attempt) = request.try_clone() else {
                // Not cloneable: single shot.
                return client.execute(request).await.map_err(WalletError::from);
            };
            match client.execute(attempt).await {
                Ok(response) if is_transient_status(response.status()) => {
                    match backoff.next() {
                        Some(delay) => tokio::time::sleep(delay).await,
                        // Retries exhausted; caller classifies the status.
                        None => return Ok(response),
                    }
                }
                Ok(response) => return Ok(response),
                Err(err) if err.is_timeout() || err.is_connect() => match backoff.next() {
                    Some(delay) => tokio::time::sleep(delay).await,
                    None => {
                        return Err(WalletError::Network {
                            url,
                            error: format!("request timeout/connect error: {err}"),
                        })
                    }
                },
                Err(err) => {
                    return Err(WalletError::Network {
                        url,
                        error: format!("request failed: {err}"),
                    })
                }
            }
        }
    }
}

fn is_transient_status(status: StatusCode) -> bool {
    status.as_u16() == 429 || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handle_retries_transient_statuses() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/nonce")
            .with_status(503)
            .expect(4) // initial attempt + 3 retries
            .create_async()
            .await;

        let request = Request::new();
        let response = request
            .handle(request.get(&format!("{}/nonce", server.url())))
            .await
            .expect("final response is handed back");
        assert_eq!(response.status().as_u16(), 503);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_handle_does_not_retry_client_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/nonce")
            .with_status(401)
            .expect(1)
            .create_async()
            .await;

        let request = Request::new();
        let response = request
            .handle(request.get(&format!("{}/nonce", server.url())))
            .await
            .expect("response");
        assert_eq!(response.status().as_u16(), 401);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_dispatch_sends_exactly_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/register")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;

        let request = Request::new();
        let response = request
            .dispatch(request.post(&format!("{}/register", server.url())))
            .await
            .expect("response");
        assert_eq!(response.status().as_u16(), 500);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_network_error() {
        let request = Request::new();
        let result = request
            .dispatch(request.get("http://127.0.0.1:1/nonce"))
            .await;
        assert!(matches!(result, Err(WalletError::Network { .. })));
    }
}
