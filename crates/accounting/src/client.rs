//! REST client for the accounting service.
//!
//! Endpoints used:
//!
//! - `POST {base}/postings` records a balanced entry, keyed by the
//!   `Idempotency-Key` header
//! - `POST {base}/postings/{id}/reversal` reverses an earlier entry
//! - `POST {base}/accounts/resolve` finds or opens an account by owner name

use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, warn};
use uuid::Uuid;

use kopa_core::loan::{AccountCategory, AccountDirectory, BalancedPosting, LedgerError, LedgerGateway};
use kopa_shared::config::AccountingConfig;
use kopa_shared::types::{AccountId, PostingId};

/// Header the ledger deduplicates postings on.
pub const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

/// HTTP client for one accounting service instance.
#[derive(Debug, Clone)]
pub struct AccountingClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReversalRequest<'a> {
    reason: &'a str,
}

#[derive(Debug, Serialize)]
struct ResolveAccountRequest<'a> {
    name: &'a str,
    category: &'static str,
}

/// Body returned by endpoints that create or find a resource.
#[derive(Debug, Deserialize)]
struct IdResponse {
    id: Uuid,
}

impl AccountingClient {
    /// Build a client from configuration.
    pub fn new(config: &AccountingConfig) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        Ok(Self::with_client(
            client,
            config.base_url.clone(),
            config.api_key.clone(),
        ))
    }

    /// Build a client around an existing [`reqwest::Client`].
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
        idempotency_key: Option<&str>,
    ) -> Result<reqwest::Response, LedgerError> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_KEY, key);
        }

        let response = request.send().await.map_err(|e| {
            warn!(path, error = %e, "Accounting request failed");
            LedgerError::Unavailable(e.to_string())
        })?;
        Self::ensure_success(response).await
    }

    /// Map non-2xx answers to errors.
    ///
    /// 4xx means the service refused the request; 5xx is treated as the
    /// service being unavailable.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, LedgerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            return Err(LedgerError::Unavailable(format!("{status}: {body}")));
        }
        Err(LedgerError::Rejected {
            status: status.as_u16(),
            message: body,
        })
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, LedgerError> {
        response
            .json::<T>()
            .await
            .map_err(|e| LedgerError::Unavailable(format!("invalid response body: {e}")))
    }
}

impl LedgerGateway for AccountingClient {
    async fn post_balanced_entry(&self, posting: &BalancedPosting) -> Result<PostingId, LedgerError> {
        let response = self
            .post("/postings", posting, Some(&posting.reference))
            .await?;
        let IdResponse { id } = Self::parse(response).await?;

        debug!(posting_id = %id, reference = %posting.reference, "Posting recorded");
        Ok(PostingId::from_uuid(id))
    }

    async fn reverse_posting(&self, posting_id: PostingId, reason: &str) -> Result<(), LedgerError> {
        self.post(
            &format!("/postings/{posting_id}/reversal"),
            &ReversalRequest { reason },
            None,
        )
        .await?;

        debug!(posting_id = %posting_id, "Posting reversed");
        Ok(())
    }
}

impl AccountDirectory for AccountingClient {
    async fn get_or_create_account(
        &self,
        owner_name: &str,
        category: AccountCategory,
    ) -> Result<AccountId, LedgerError> {
        let response = self
            .post(
                "/accounts/resolve",
                &ResolveAccountRequest {
                    name: owner_name,
                    category: category.as_str(),
                },
                None,
            )
            .await?;
        let IdResponse { id } = Self::parse(response).await?;

        Ok(AccountId::from_uuid(id))
    }
}
