//! Remote source client for the logistics docks API
//!
//! [`DockSource`] is the seam the collection pipeline fetches through;
//! [`HttpDockSource`] is the production implementation. Credentials are turned
//! into an immutable [`ApiHeaders`] bundle once per run and passed into every
//! fetch call, so the HTTP client itself never carries per-run state.

use crate::config::{ApiConfig, TENANT_PLACEHOLDER};
use crate::error::{Error, FetchError, FetchErrorKind, Result, ValidationError};
use crate::types::{Credentials, DockPayload, TenantId};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::time::Duration;
use url::Url;

/// Header carrying the app key
pub const APP_KEY_HEADER: &str = "X-VTEX-API-AppKey";

/// Header carrying the app token
pub const APP_TOKEN_HEADER: &str = "X-VTEX-API-AppToken";

/// Immutable set of request headers derived from [`Credentials`]
#[derive(Clone, Debug)]
pub struct ApiHeaders {
    headers: HeaderMap,
}

impl ApiHeaders {
    /// Build the JSON and authentication headers for a credential pair
    ///
    /// # Errors
    /// Returns [`ValidationError::MissingCredentials`] if key or token is empty and
    /// [`ValidationError::InvalidCredentials`] if either is not a valid header value.
    pub fn from_credentials(credentials: &Credentials) -> std::result::Result<Self, ValidationError> {
        if !credentials.is_complete() {
            return Err(ValidationError::MissingCredentials);
        }

        let mut app_key = HeaderValue::from_str(credentials.app_key.trim())
            .map_err(|_| ValidationError::InvalidCredentials)?;
        let mut app_token = HeaderValue::from_str(credentials.app_token.trim())
            .map_err(|_| ValidationError::InvalidCredentials)?;
        app_key.set_sensitive(true);
        app_token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(APP_KEY_HEADER, app_key);
        headers.insert(APP_TOKEN_HEADER, app_token);

        Ok(Self { headers })
    }

    /// The underlying header map
    pub fn as_header_map(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Source of dock payloads for a tenant
///
/// Implementations must be "parse or fail": return the payload list unmodified,
/// or a [`FetchError`] describing why the tenant could not be read.
#[async_trait]
pub trait DockSource: Send + Sync {
    /// Fetch every dock configured for `tenant`
    async fn fetch(
        &self,
        tenant: &TenantId,
        headers: &ApiHeaders,
    ) -> std::result::Result<Vec<DockPayload>, FetchError>;
}

/// [`DockSource`] backed by the remote HTTP API
#[derive(Clone, Debug)]
pub struct HttpDockSource {
    client: reqwest::Client,
    url_template: String,
    timeout: Duration,
}

impl HttpDockSource {
    /// Create a source from the API configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            client,
            url_template: config.url_template.clone(),
            timeout: config.request_timeout,
        })
    }

    /// Endpoint URL for a tenant
    ///
    /// The trimmed tenant must consist of ASCII letters, digits and `-` only;
    /// anything else could move the request (and its credentials) to another
    /// host or path.
    pub fn endpoint(&self, tenant: &TenantId) -> std::result::Result<Url, FetchError> {
        let name = tenant.as_str().trim();
        if !is_valid_tenant_name(name) {
            return Err(FetchError::new(
                tenant.as_str(),
                FetchErrorKind::InvalidTenant,
                format!(
                    "Invalid tenant name '{}': only letters, digits and '-' are allowed",
                    name
                ),
            ));
        }

        let raw = self.url_template.replace(TENANT_PLACEHOLDER, name);
        Url::parse(&raw).map_err(|e| {
            FetchError::new(
                tenant.as_str(),
                FetchErrorKind::Request,
                format!("Invalid endpoint URL '{}': {}", raw, e),
            )
        })
    }

    fn classify(&self, tenant: &TenantId, url: &Url, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::new(
                tenant.as_str(),
                FetchErrorKind::Timeout,
                format!(
                    "Request to '{}' timed out after {} seconds",
                    url,
                    self.timeout.as_secs_f32()
                ),
            )
        } else if e.is_connect() {
            FetchError::new(
                tenant.as_str(),
                FetchErrorKind::Connect,
                format!("Connection failed for '{}': {}", url, e),
            )
        } else {
            FetchError::new(
                tenant.as_str(),
                FetchErrorKind::Request,
                format!("Failed to fetch '{}': {}", url, e),
            )
        }
    }
}

/// Tenant accounts are single host labels
fn is_valid_tenant_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

#[async_trait]
impl DockSource for HttpDockSource {
    async fn fetch(
        &self,
        tenant: &TenantId,
        headers: &ApiHeaders,
    ) -> std::result::Result<Vec<DockPayload>, FetchError> {
        let url = self.endpoint(tenant)?;
        tracing::debug!(tenant = %tenant, url = %url, "fetching docks");

        let response = self
            .client
            .get(url.clone())
            .headers(headers.as_header_map().clone())
            .send()
            .await
            .map_err(|e| self.classify(tenant, &url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                tenant.as_str(),
                FetchErrorKind::Status(status.as_u16()),
                format!("HTTP error {} for url: {}", status, url),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(tenant, &url, e))?;

        serde_json::from_slice::<Vec<DockPayload>>(&body).map_err(|e| {
            FetchError::new(
                tenant.as_str(),
                FetchErrorKind::Decode,
                format!("Invalid docks payload from '{}': {}", url, e),
            )
        })
    }
}
