//! HTTP client wrapper for Azure Resource Manager API.
//!
//! Handles bearer-token injection, rate-limit retries with exponential backoff,
//! pagination via `nextLink`, long-running PUT headers and standard ARM error
//! extraction.

use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::types::{
    ArmList, ArmPutResponse, AzureConfig, AzureCredentials, AzureError, AzureErrorKind,
    AzureResult, AzureToken, ARM_BASE,
};

/// Maximum retries for transient / rate-limit errors.
const MAX_RETRIES: u32 = 3;
/// Base delay between retries (doubled each attempt).
const BASE_DELAY_MS: u64 = 500;

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
const REQUEST_ID_HEADER: &str = "x-ms-request-id";

/// HTTP client with Azure-specific auth and retry logic.
#[derive(Clone)]
pub struct AzureClient {
    http: Client,
    token: Option<AzureToken>,
    credentials: Option<AzureCredentials>,
    config: AzureConfig,
}

impl AzureClient {
    pub fn new() -> Self {
        Self::with_config(AzureConfig::new())
    }

    pub fn with_config(config: AzureConfig) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            token: None,
            credentials: None,
            config,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &AzureConfig {
        &self.config
    }

    pub fn set_credentials(&mut self, creds: AzureCredentials) {
        self.credentials = Some(creds);
    }

    pub fn credentials(&self) -> Option<&AzureCredentials> {
        self.credentials.as_ref()
    }

    pub fn set_token(&mut self, token: AzureToken) {
        self.token = Some(token);
    }

    pub fn token(&self) -> Option<&AzureToken> {
        self.token.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .as_ref()
            .map(|t| !t.access_token.is_empty() && !t.is_expired())
            .unwrap_or(false)
    }

    pub fn subscription_id(&self) -> AzureResult<&str> {
        self.credentials
            .as_ref()
            .map(|c| c.subscription_id.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(AzureError::subscription_not_set)
    }

    /// Inner reqwest client (for auth module direct use).
    pub fn http(&self) -> &Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Subscription-scoped URL.
    pub fn subscription_url(&self, suffix: &str) -> AzureResult<String> {
        let sub = self.subscription_id()?;
        Ok(format!("{}/subscriptions/{}{}", ARM_BASE, sub, suffix))
    }

    /// Resource-group-scoped URL.
    pub fn resource_group_url(&self, rg: &str, suffix: &str) -> AzureResult<String> {
        let sub = self.subscription_id()?;
        Ok(format!(
            "{}/subscriptions/{}/resourceGroups/{}{}",
            ARM_BASE, sub, rg, suffix
        ))
    }

    // ── Auth header builder ──────────────────────────────────────────

    fn auth_headers(&self) -> AzureResult<HeaderMap> {
        let token = self
            .token
            .as_ref()
            .filter(|t| !t.access_token.is_empty())
            .ok_or_else(AzureError::not_authenticated)?;

        let mut headers = HeaderMap::new();
        let val = format!("Bearer {}", token.access_token);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&val).map_err(|e| {
                AzureError::new(AzureErrorKind::Auth, format!("Header value error: {e}"))
            })?,
        );
        Ok(headers)
    }

    /// Send a request, retrying on transient statuses.
    ///
    /// `build` is invoked once per attempt. Returns the first successful
    /// response, or the ARM error of the last one.
    async fn send_with_retry<F>(&self, verb: &str, url: &str, build: F) -> AzureResult<Response>
    where
        F: Fn(HeaderMap) -> RequestBuilder,
    {
        let headers = self.auth_headers()?;

        for attempt in 0..=MAX_RETRIES {
            let resp = build(headers.clone())
                .send()
                .await
                .map_err(|e| AzureError::new(AzureErrorKind::Network, format!("{e}")))?;

            let status = resp.status();
            if status.is_success() {
                return Ok(resp);
            }

            if should_retry(status.as_u16()) && attempt < MAX_RETRIES {
                let delay = BASE_DELAY_MS * 2u64.pow(attempt);
                warn!("Azure {} {} → {} – retrying in {}ms", verb, url, status, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                continue;
            }

            let body = resp.text().await.unwrap_or_default();
            return Err(AzureError::from_status(status.as_u16(), &body));
        }

        Err(AzureError::new(
            AzureErrorKind::Network,
            "Max retries exceeded",
        ))
    }

    // ── Core HTTP verbs ──────────────────────────────────────────────

    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> AzureResult<T> {
        let resp = self
            .send_with_retry("GET", url, |h| self.http.get(url).headers(h))
            .await?;
        parse_json(resp).await
    }

    pub async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> AzureResult<T> {
        let resp = self
            .send_with_retry("POST", url, |h| self.http.post(url).headers(h).json(body))
            .await?;
        parse_json(resp).await
    }

    /// PUT a resource definition, keeping the long-running-operation headers.
    ///
    /// A 202 with an empty body yields `body: None`.
    pub async fn put_long_running<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> AzureResult<ArmPutResponse<T>> {
        let resp = self
            .send_with_retry("PUT", url, |h| self.http.put(url).headers(h).json(body))
            .await?;

        let status = resp.status();
        let async_operation_url = header_string(resp.headers(), ASYNC_OPERATION_HEADER);
        let request_id = header_string(resp.headers(), REQUEST_ID_HEADER);

        let text = resp
            .text()
            .await
            .map_err(|e| AzureError::new(AzureErrorKind::Network, format!("{e}")))?;
        let body = if text.trim().is_empty() || status == StatusCode::NO_CONTENT {
            None
        } else {
            Some(serde_json::from_str::<T>(&text).map_err(|e| {
                AzureError::new(AzureErrorKind::Parse, format!("JSON parse: {e}"))
            })?)
        };

        debug!(
            "Azure PUT {} → {} (async operation: {})",
            url,
            status,
            async_operation_url.as_deref().unwrap_or("none")
        );

        Ok(ArmPutResponse {
            status_code: status.as_u16(),
            body,
            async_operation_url,
            request_id,
        })
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Follow `nextLink` to collect **all** items from a paginated ARM list endpoint.
    pub async fn get_all_pages<T: serde::de::DeserializeOwned + Default>(
        &self,
        initial_url: &str,
    ) -> AzureResult<Vec<T>> {
        let mut all: Vec<T> = Vec::new();
        let mut url = initial_url.to_string();

        loop {
            debug!("Azure paginate: {}", url);
            let page: ArmList<T> = self.get_json(&url).await?;
            all.extend(page.value);
            match page.next_link {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }

        Ok(all)
    }

    /// POST unauthenticated form data (used by auth module for token exchange).
    pub async fn post_form_unauthenticated<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        form: &[(impl AsRef<str>, impl AsRef<str>)],
    ) -> AzureResult<T> {
        let form_pairs: Vec<(&str, &str)> = form
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .collect();

        let resp = self
            .http
            .post(url)
            .form(&form_pairs)
            .send()
            .await
            .map_err(|e| AzureError::new(AzureErrorKind::Network, format!("{e}")))?;

        if resp.status().is_success() {
            parse_json(resp).await
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(AzureError::from_status(status, &body))
        }
    }
}

impl Default for AzureClient {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

async fn parse_json<T: serde::de::DeserializeOwned>(resp: Response) -> AzureResult<T> {
    resp.json::<T>()
        .await
        .map_err(|e| AzureError::new(AzureErrorKind::Parse, format!("JSON parse: {e}")))
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn should_retry(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

// ─── Tests ──────────────────────────────────────────────────────────
