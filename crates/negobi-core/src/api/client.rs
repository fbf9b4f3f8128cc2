//! API client for communicating with the Negobi REST backend.
//!
//! Every request goes through the request interceptor (language, bearer
//! token, API key). Responses to requests made with the stored session go
//! through the session guard, which handles an expired session. Nothing
//! is retried.

use std::time::Duration;

use futures::future::join_all;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::CredentialStore;
use crate::effects::Effects;
use crate::models::RoleInfo;
use crate::resources::{Resource, ResourceKind};

use super::envelope::{
    is_success_status, Ack, AckEnvelope, ListEnvelope, ListQuery, Mutation, MutationEnvelope, Page,
};
use super::interceptor::{Disposition, RequestInterceptor, SessionGuard, DEFAULT_SESSION_EXPIRED_REDIRECT};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when none is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Everything needed to build a client, usually derived from `Config`.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub session_expired_redirect: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            session_expired_redirect: DEFAULT_SESSION_EXPIRED_REDIRECT,
        }
    }
}

/// How a request is authenticated.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Auth<'a> {
    /// Stored session token; a 401 ends the session.
    Session,
    /// Stored headers, but a 401 is an ordinary failure (login, recovery).
    Public,
    /// Explicit bearer token, e.g. the OTP exchange token.
    Bearer(&'a str),
}

/// API client for the Negobi backend.
/// Clone is cheap - reqwest::Client and the store share state internally.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: CredentialStore,
    interceptor: RequestInterceptor,
    guard: SessionGuard,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(settings: ClientSettings, store: CredentialStore, effects: Effects) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        let guard = SessionGuard::new(store.clone(), effects)
            .with_redirect_delay(settings.session_expired_redirect);

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            store,
            interceptor: RequestInterceptor::new(settings.api_key),
            guard,
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Wait until a login redirect scheduled by an expired session has run.
    pub async fn wait_for_redirect(&self) {
        self.guard.wait_for_redirect().await;
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attach headers, send, and run the response through the guard.
    pub(crate) async fn execute(&self, request: RequestBuilder, auth: Auth<'_>) -> Result<Response, ApiError> {
        let headers = match auth {
            Auth::Session | Auth::Public => self.interceptor.headers(&self.store.snapshot()),
            Auth::Bearer(token) => self.interceptor.build(self.store.language(), Some(token)),
        };

        let response = request.headers(headers).send().await?;
        let status = response.status();

        if let Auth::Session = auth {
            if self.guard.inspect(status) == Disposition::SessionInvalid {
                return Err(ApiError::SessionExpired);
            }
        }

        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            let err = ApiError::from_status(status, &body);
            debug!(status = status.as_u16(), error = %err, "Request failed");
            Err(err)
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e)))
    }

    fn request<B: Serialize>(&self, method: Method, url: &str, body: Option<&B>) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match body {
            Some(body) => builder.json(body),
            None => builder,
        }
    }

    /// Send a mutation and unwrap `{status, data: {data, message}}`.
    pub(crate) async fn mutate<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth<'_>,
    ) -> Result<Mutation<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let url = self.url(path);
        let response = self.execute(self.request(method, &url, body), auth).await?;
        let http_status = response.status().as_u16();
        let envelope: MutationEnvelope<T> = Self::parse(response, &url).await?;

        let status = envelope.status.unwrap_or(http_status);
        if !is_success_status(status) {
            return Err(Self::envelope_failure(status, envelope.data.message));
        }
        let data = envelope
            .data
            .data
            .ok_or_else(|| ApiError::InvalidResponse(format!("Response from {} has no data", url)))?;
        Ok(Mutation {
            status,
            data,
            message: envelope.data.message,
        })
    }

    /// Send a mutation whose response carries no record.
    pub(crate) async fn acknowledge<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth<'_>,
    ) -> Result<Ack, ApiError> {
        let url = self.url(path);
        let response = self.execute(self.request(method, &url, body), auth).await?;
        let http_status = response.status().as_u16();

        let text = response.text().await?;
        let envelope = if text.trim().is_empty() {
            AckEnvelope { status: None, data: None }
        } else {
            serde_json::from_str::<AckEnvelope>(&text)
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e)))?
        };

        let status = envelope.status.unwrap_or(http_status);
        let message = envelope.data.and_then(|d| d.message);
        if !is_success_status(status) {
            return Err(Self::envelope_failure(status, message));
        }
        Ok(Ack { status, message })
    }

    /// A 2xx response whose envelope reports a failure status.
    fn envelope_failure(status: u16, message: Option<String>) -> ApiError {
        match message {
            Some(message) => ApiError::Rejected { status, message },
            None => ApiError::Unexpected(format!("Envelope status {}", status)),
        }
    }

    async fn fetch_page<T: DeserializeOwned>(&self, path: &str, query: &ListQuery) -> Result<Page<T>, ApiError> {
        let url = self.url(path);
        let request = self.client.get(&url).query(query);
        let response = self.execute(request, Auth::Session).await?;
        let envelope: ListEnvelope<T> = Self::parse(response, &url).await?;
        debug!(path = path, page = query.page, total = envelope.data.total, "Page fetched");
        Ok(envelope.data)
    }

    // ===== Resource Methods =====

    /// Fetch one page of a collection.
    pub async fn list<R: Resource>(&self, query: &ListQuery) -> Result<Page<R::Item>, ApiError> {
        self.fetch_page(R::KIND.path(), query).await
    }

    /// Fetch a single record by id.
    pub async fn get<R: Resource>(&self, id: i64) -> Result<R::Item, ApiError> {
        let path = format!("{}/{}", R::KIND.path(), id);
        let mutation: Mutation<R::Item> = self
            .mutate::<R::Item, ()>(Method::GET, &path, None, Auth::Session)
            .await?;
        Ok(mutation.data)
    }

    pub async fn create<R: Resource>(&self, payload: &R::Payload) -> Result<Mutation<R::Item>, ApiError> {
        self.mutate(Method::POST, R::KIND.path(), Some(payload), Auth::Session)
            .await
    }

    pub async fn update<R: Resource>(&self, id: i64, payload: &R::Payload) -> Result<Mutation<R::Item>, ApiError> {
        let path = format!("{}/{}", R::KIND.path(), id);
        self.mutate(Method::PATCH, &path, Some(payload), Auth::Session)
            .await
    }

    pub async fn delete<R: Resource>(&self, id: i64) -> Result<Ack, ApiError> {
        let path = format!("{}/{}", R::KIND.path(), id);
        self.acknowledge::<()>(Method::DELETE, &path, None, Auth::Session)
            .await
    }

    /// Roles that can be assigned to users.
    pub async fn roles(&self) -> Result<Vec<RoleInfo>, ApiError> {
        let page: Page<RoleInfo> = self.fetch_page("users/roles", &ListQuery::default().with_items_per_page(100)).await?;
        Ok(page.data)
    }

    /// Record count of every collection, fetched concurrently.
    /// Collections the user cannot read report their error individually.
    pub async fn resource_totals(&self) -> Vec<(ResourceKind, Result<u64, ApiError>)> {
        let query = ListQuery::default().with_items_per_page(1);
        let futures = ResourceKind::ALL.iter().map(|kind| {
            let query = &query;
            async move {
                let result = self
                    .fetch_page::<serde_json::Value>(kind.path(), query)
                    .await
                    .map(|page| page.total);
                if let Err(ref e) = result {
                    warn!(resource = %kind, error = %e, "Failed to fetch total");
                }
                (*kind, result)
            }
        });
        join_all(futures).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ApiClient {
        let settings = ClientSettings {
            base_url: base_url.to_string(),
            ..ClientSettings::default()
        };
        ApiClient::new(settings, CredentialStore::in_memory(), Effects::logging()).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let api = client("https://api.negobi.com/v1/");
        assert_eq!(api.base_url(), "https://api.negobi.com/v1");
        assert_eq!(api.url("clients"), "https://api.negobi.com/v1/clients");
        assert_eq!(api.url("/auth/login"), "https://api.negobi.com/v1/auth/login");
    }

    #[test]
    fn test_envelope_failure() {
        let err = ApiClient::envelope_failure(409, Some("Duplicado".to_string()));
        assert!(matches!(err, ApiError::Rejected { status: 409, .. }));
        let err = ApiClient::envelope_failure(500, None);
        assert!(matches!(err, ApiError::Unexpected(_)));
    }
}
