//! Remote API client.
//!
//! A thin transport: builds authenticated requests, classifies
//! non-2xx responses into typed failures, and contains no business
//! logic. The actual HTTP stack sits behind the [`HttpClient`] trait
//! so tests can script responses; a reqwest-backed implementation is
//! available behind the `reqwest-client` feature.

use crate::config::SyncConfiguration;
use crate::error::{SyncError, SyncResult};
use chrono::{DateTime, SecondsFormat, Utc};
use crmlink_protocol::{
    page_items, pipeline_items, unwrap_envelope, user_items, ApiErrorBody, EntityKind,
    RemotePipeline, RemoteUser,
};
use serde_json::Value;

/// Production base URL of the remote service.
pub const DEFAULT_BASE_URL: &str = "https://services.leadconnectorhq.com";

/// Fixed protocol version header value every request carries.
pub const API_VERSION: &str = "2021-07-28";

/// HTTP method for a remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
}

impl HttpMethod {
    /// Method name on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }
}

/// A request handed to the HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Method.
    pub method: HttpMethod,
    /// Absolute URL without the query string.
    pub url: String,
    /// Header pairs.
    pub headers: Vec<(String, String)>,
    /// Query pairs, not yet encoded.
    pub query: Vec<(String, String)>,
    /// JSON body, when present.
    pub body: Option<Value>,
}

/// A response from the HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body text.
    pub body: String,
}

impl HttpResponse {
    /// Convenience constructor for scripted responses.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Blocking HTTP transport abstraction.
///
/// Implementations return `Err` only for network-level failures
/// (connect, timeout); any response with a status code is `Ok`.
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns the response.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        (**self).send(request)
    }
}

/// The remote API client.
pub struct RemoteClient<C: HttpClient> {
    base_url: String,
    client: C,
}

impl<C: HttpClient> RemoteClient<C> {
    /// Creates a client against the production base URL.
    pub fn new(client: C) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, client)
    }

    /// Creates a client against a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends one authenticated request and decodes the JSON body.
    ///
    /// An empty or non-JSON 2xx body decodes to `Value::Null` (logged,
    /// never fatal). A missing token fails before any network call.
    fn send(
        &self,
        method: HttpMethod,
        path: &str,
        token: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> SyncResult<Value> {
        if token.is_empty() {
            return Err(SyncError::Auth(
                "remote API token is not configured".into(),
            ));
        }

        let url = format!("{}{}", self.base_url, path);
        tracing::info!(method = method.as_str(), %url, ?query, "remote API request");

        let request = HttpRequest {
            method,
            url: url.clone(),
            headers: vec![
                ("Authorization".into(), format!("Bearer {token}")),
                ("Version".into(), API_VERSION.into()),
                ("Content-Type".into(), "application/json".into()),
            ],
            query,
            body,
        };

        let response = self.client.send(request).map_err(|e| {
            tracing::error!(%url, error = %e, "remote API connection failed");
            SyncError::transport_retryable(e)
        })?;

        if response.status == 401 || response.status == 403 {
            tracing::error!(status = response.status, body = %response.body, "remote API auth rejected");
            return Err(SyncError::Auth(format!(
                "{}: {}",
                response.status, response.body
            )));
        }
        if response.status >= 400 {
            tracing::error!(status = response.status, %url, body = %response.body, "remote API error");
            if let Some(parsed) = ApiErrorBody::parse(&response.body) {
                if let Some(remote_id) = parsed.duplicate_record_id() {
                    return Err(SyncError::DuplicateRecord {
                        remote_id: remote_id.to_owned(),
                    });
                }
            }
            return Err(SyncError::Api {
                status: response.status,
                body: response.body,
            });
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        match serde_json::from_str(&response.body) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(%url, error = %e, body = %response.body, "remote API non-JSON response");
                Ok(Value::Null)
            }
        }
    }

    /// Lists one page of records updated after `updated_after`.
    pub fn list(
        &self,
        config: &SyncConfiguration,
        kind: EntityKind,
        updated_after: Option<DateTime<Utc>>,
        limit: u32,
    ) -> SyncResult<Vec<Value>> {
        let mut query = vec![
            ("locationId".to_owned(), config.location_id.clone()),
            ("limit".to_owned(), limit.to_string()),
        ];
        if let Some(after) = updated_after {
            query.push((
                "updatedAt__gt".to_owned(),
                after.to_rfc3339_opts(SecondsFormat::Millis, true),
            ));
        }
        let body = self.send(
            HttpMethod::Get,
            kind.collection_path(),
            &config.api_token,
            query,
            None,
        )?;
        Ok(page_items(kind, &body))
    }

    /// Creates a record; returns the unwrapped created object.
    pub fn create(
        &self,
        config: &SyncConfiguration,
        kind: EntityKind,
        payload: Value,
    ) -> SyncResult<Value> {
        let body = self.send(
            HttpMethod::Post,
            kind.collection_path(),
            &config.api_token,
            Vec::new(),
            Some(payload),
        )?;
        Ok(unwrap_envelope(kind, &body))
    }

    /// Updates a record addressed by remote id; returns the unwrapped
    /// updated object.
    pub fn update(
        &self,
        config: &SyncConfiguration,
        kind: EntityKind,
        remote_id: &str,
        payload: Value,
    ) -> SyncResult<Value> {
        let body = self.send(
            HttpMethod::Put,
            &kind.item_path(remote_id),
            &config.api_token,
            Vec::new(),
            Some(payload),
        )?;
        Ok(unwrap_envelope(kind, &body))
    }

    /// Fetches the remote user directory.
    pub fn get_users(&self, config: &SyncConfiguration) -> SyncResult<Vec<RemoteUser>> {
        let body = self.send(
            HttpMethod::Get,
            "/users/",
            &config.api_token,
            vec![("locationId".to_owned(), config.location_id.clone())],
            None,
        )?;
        Ok(user_items(&body)
            .into_iter()
            .filter_map(|item| match crmlink_protocol::from_value(item) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed remote user");
                    None
                }
            })
            .collect())
    }

    /// Fetches the remote pipelines with their stages.
    pub fn get_pipelines(&self, config: &SyncConfiguration) -> SyncResult<Vec<RemotePipeline>> {
        let body = self.send(
            HttpMethod::Get,
            "/opportunities/pipelines",
            &config.api_token,
            vec![("locationId".to_owned(), config.location_id.clone())],
            None,
        )?;
        Ok(pipeline_items(&body)
            .into_iter()
            .filter_map(|item| match crmlink_protocol::from_value(item) {
                Ok(pipeline) => Some(pipeline),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed remote pipeline");
                    None
                }
            })
            .collect())
    }

    /// Verifies the supplied credentials with a single bounded list
    /// call, bypassing stored configuration.
    pub fn test_connection(&self, token: &str, location_id: &str) -> SyncResult<()> {
        self.send(
            HttpMethod::Get,
            EntityKind::Contact.collection_path(),
            token,
            vec![
                ("locationId".to_owned(), location_id.to_owned()),
                ("limit".to_owned(), "1".to_owned()),
            ],
            None,
        )?;
        Ok(())
    }
}

/// A scriptable HTTP client for tests.
///
/// Responses are consumed in FIFO order; every request is logged for
/// assertion.
#[derive(Default)]
pub struct MockHttpClient {
    responses: parking_lot::Mutex<std::collections::VecDeque<Result<HttpResponse, String>>>,
    requests: parking_lot::Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
    /// Creates a client with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the next response.
    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .push_back(Ok(HttpResponse::new(status, body)));
    }

    /// Scripts a network-level failure.
    pub fn push_transport_error(&self, message: impl Into<String>) {
        self.responses.lock().push_back(Err(message.into()));
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

impl HttpClient for MockHttpClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted response".into()))
    }
}

/// Real transport backed by `reqwest::blocking`.
#[cfg(feature = "reqwest-client")]
pub mod reqwest_client {
    use super::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
    use std::time::Duration;

    /// A blocking reqwest client with the connector's 30s timeout.
    pub struct ReqwestClient {
        client: reqwest::blocking::Client,
    }

    impl ReqwestClient {
        /// Builds a client with the default timeout.
        pub fn new() -> Result<Self, String> {
            Self::with_timeout(Duration::from_secs(30))
        }

        /// Builds a client with a custom timeout.
        pub fn with_timeout(timeout: Duration) -> Result<Self, String> {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| e.to_string())?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
            let method = match request.method {
                HttpMethod::Get => reqwest::Method::GET,
                HttpMethod::Post => reqwest::Method::POST,
                HttpMethod::Put => reqwest::Method::PUT,
            };
            let mut builder = self
                .client
                .request(method, &request.url)
                .query(&request.query);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }
            let response = builder.send().map_err(|e| e.to_string())?;
            let status = response.status().as_u16();
            let body = response.text().map_err(|e| e.to_string())?;
            Ok(HttpResponse { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfiguration;
    use serde_json::json;

    fn client_and_config() -> (MockHttpClient, SyncConfiguration) {
        (MockHttpClient::new(), SyncConfiguration::new("tok", "loc1"))
    }

    fn remote(mock: MockHttpClient) -> RemoteClient<MockHttpClient> {
        RemoteClient::with_base_url("https://api.test", mock)
    }

    #[test]
    fn missing_token_fails_before_any_call() {
        let mock = MockHttpClient::new();
        let config = SyncConfiguration::new("", "loc1");
        let client = remote(mock);

        let err = client
            .list(&config, EntityKind::Contact, None, 10)
            .unwrap_err();
        assert!(matches!(err, SyncError::Auth(_)));
        assert!(client.client.requests().is_empty());
    }

    #[test]
    fn request_carries_auth_and_version_headers() {
        let (mock, config) = client_and_config();
        mock.push_response(200, r#"{"contacts": []}"#);
        let client = remote(mock);

        client.list(&config, EntityKind::Contact, None, 10).unwrap();

        let requests = client.client.requests();
        let headers = &requests[0].headers;
        assert!(headers.contains(&("Authorization".into(), "Bearer tok".into())));
        assert!(headers.contains(&("Version".into(), API_VERSION.into())));
    }

    #[test]
    fn list_builds_incremental_query() {
        let (mock, config) = client_and_config();
        mock.push_response(200, r#"{"contacts": [{"id": "a"}]}"#);
        let client = remote(mock);

        let after = crmlink_protocol::parse_remote_timestamp("2024-01-01T00:00:00Z");
        let items = client
            .list(&config, EntityKind::Contact, after, 25)
            .unwrap();
        assert_eq!(items.len(), 1);

        let query = &client.client.requests()[0].query;
        assert!(query.contains(&("locationId".into(), "loc1".into())));
        assert!(query.contains(&("limit".into(), "25".into())));
        assert!(query.contains(&(
            "updatedAt__gt".into(),
            "2024-01-01T00:00:00.000Z".into()
        )));
    }

    #[test]
    fn auth_rejection_maps_to_auth_error() {
        let (mock, config) = client_and_config();
        mock.push_response(401, r#"{"message": "invalid token"}"#);
        let client = remote(mock);

        let err = client
            .list(&config, EntityKind::Contact, None, 10)
            .unwrap_err();
        assert!(matches!(err, SyncError::Auth(_)));
    }

    #[test]
    fn duplicate_rejection_is_typed() {
        let (mock, config) = client_and_config();
        mock.push_response(
            400,
            r#"{"statusCode": 400, "message": "duplicate", "meta": {"contactId": "abc123"}}"#,
        );
        let client = remote(mock);

        let err = client
            .create(&config, EntityKind::Contact, json!({"firstName": "Jane"}))
            .unwrap_err();
        assert!(matches!(err, SyncError::DuplicateRecord { remote_id } if remote_id == "abc123"));
    }

    #[test]
    fn plain_api_error_keeps_status_and_body() {
        let (mock, config) = client_and_config();
        mock.push_response(422, r#"{"message": "name required"}"#);
        let client = remote(mock);

        let err = client
            .create(&config, EntityKind::Opportunity, json!({}))
            .unwrap_err();
        match err {
            SyncError::Api { status, body } => {
                assert_eq!(status, 422);
                assert!(body.contains("name required"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn transport_failure_is_retryable() {
        let (mock, config) = client_and_config();
        mock.push_transport_error("connection refused");
        let client = remote(mock);

        let err = client
            .list(&config, EntityKind::Task, None, 10)
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn non_json_success_body_is_empty_result() {
        let (mock, config) = client_and_config();
        mock.push_response(200, "<html>ok</html>");
        let client = remote(mock);

        let items = client.list(&config, EntityKind::Note, None, 10).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn create_unwraps_envelope() {
        let (mock, config) = client_and_config();
        mock.push_response(200, r#"{"contact": {"id": "abc123"}}"#);
        let client = remote(mock);

        let created = client
            .create(&config, EntityKind::Contact, json!({"firstName": "Jane"}))
            .unwrap();
        assert_eq!(created["id"], "abc123");
    }

    #[test]
    fn update_addresses_item_path() {
        let (mock, config) = client_and_config();
        mock.push_response(200, r#"{"id": "abc123"}"#);
        let client = remote(mock);

        client
            .update(&config, EntityKind::Contact, "abc123", json!({}))
            .unwrap();
        let request = &client.client.requests()[0];
        assert_eq!(request.method, HttpMethod::Put);
        assert!(request.url.ends_with("/contacts/abc123"));
    }

    #[test]
    fn directory_fetches_decode_typed() {
        let (mock, config) = client_and_config();
        mock.push_response(
            200,
            r#"{"users": [{"id": "u1", "name": "Jane"}, {"bogus": true}]}"#,
        );
        let client = remote(mock);

        let users = client.get_users(&config).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "u1");
    }

    #[test]
    fn test_connection_uses_supplied_credentials() {
        let mock = MockHttpClient::new();
        mock.push_response(200, r#"{"contacts": []}"#);
        let client = remote(mock);

        client.test_connection("adhoc", "loc9").unwrap();
        let request = &client.client.requests()[0];
        assert!(request
            .headers
            .contains(&("Authorization".into(), "Bearer adhoc".into())));
        assert!(request.query.contains(&("limit".into(), "1".into())));
    }
}
