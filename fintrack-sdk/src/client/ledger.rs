use reqwest::Client;
use url::Url;

use super::ClientError;
use crate::objects::Transaction;

/// Typed HTTP client for the fin-track **ledger API**.
///
/// Used by the analytics side as its remote-fetch path: when stats are not
/// cached, the full transaction list is pulled from the ledger service and
/// recomputed.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    http: Client,
    base_url: Url,
}

impl LedgerClient {
    /// Create a new `LedgerClient`.
    ///
    /// * `base_url` – root URL of the ledger service
    ///   (e.g. `http://fin-api:8080`).
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/v1/users/{user_id}/transactions` – fetch an owner's
    /// complete transaction list.
    pub async fn list_transactions(&self, user_id: &str) -> Result<Vec<Transaction>, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/users/{user_id}/transactions"))?;

        let resp = self.http.get(url).send().await?;
        parse_response(resp).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
