//! # HTTP Client
//!
//! Thin reqwest wrapper used by the FX feed providers.
//!
//! Requests carry a 5 s timeout; non-2xx statuses and transport errors
//! surface as [`ProviderError`] values the providers isolate per pair.

use crate::infrastructure::providers::{ProviderError, ProviderResult};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// JSON-over-HTTP client with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Creates a client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Internal` if the underlying client cannot
    /// be constructed.
    pub fn new(timeout: Duration) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::internal(e.to_string()))?;
        Ok(Self { client })
    }

    /// Creates a client with the default 5 s timeout.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Internal` if the underlying client cannot
    /// be constructed.
    pub fn with_default_timeout() -> ProviderResult<Self> {
        Self::new(DEFAULT_TIMEOUT)
    }

    /// GETs `url` with query parameters and decodes a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Http` for transport failures and non-2xx
    /// statuses, `ProviderError::Parse` for undecodable bodies.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> ProviderResult<T> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| ProviderError::http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::http(format!(
                "{} returned {}",
                url, status
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::parse(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Payload {
        value: u32,
    }

    #[tokio::test]
    async fn get_json_decodes_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(query_param("pair", "EUR/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": 7
            })))
            .mount(&server)
            .await;

        let client = HttpClient::with_default_timeout().unwrap();
        let url = format!("{}/data", server.uri());
        let payload: Payload = client
            .get_json(&url, &[("pair", "EUR/USD")])
            .await
            .unwrap();
        assert_eq!(payload.value, 7);
    }

    #[tokio::test]
    async fn non_2xx_is_an_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpClient::with_default_timeout().unwrap();
        let result: ProviderResult<Payload> = client.get_json(&server.uri(), &[]).await;
        assert!(matches!(result, Err(ProviderError::Http(_))));
    }

    #[tokio::test]
    async fn bad_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = HttpClient::with_default_timeout().unwrap();
        let result: ProviderResult<Payload> = client.get_json(&server.uri(), &[]).await;
        assert!(matches!(result, Err(ProviderError::Parse(_))));
    }
}
