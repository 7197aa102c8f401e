// Async HTTP client for the OneVisitor REST backend.
//
// Auth: `Authorization: Bearer <token>` from a TokenStore. A 401 triggers
// exactly one refresh-and-retry; a second 401 is returned as an API error.
// Tenant scoping: `X-Tenant-ID` header whenever a tenant is set.

use std::sync::{Arc, RwLock};

use chrono::Local;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::TokenStore;
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::CheckInForm;

pub const TENANT_HEADER: &str = "X-Tenant-ID";
pub const TIMEZONE_FIELD: &str = "timezoneOffset";

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the OneVisitor backend.
///
/// Cheap to share behind an `Arc`; the tenant can be switched at runtime
/// while the token store is consulted on every request.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
    tenant: RwLock<Option<String>>,
    timezone_offset: i32,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client with a fresh `reqwest::Client` from `transport`.
    pub fn new(
        base_url: &str,
        transport: &TransportConfig,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url, tokens)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Self::normalize_base_url(base_url)?,
            tokens,
            tenant: RwLock::new(None),
            timezone_offset: local_timezone_offset(),
        })
    }

    /// Ensure the base path ends with `/` so relative joins append.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    /// Override the `timezoneOffset` sent with writes (minutes, UTC - local).
    pub fn with_timezone_offset(mut self, minutes: i32) -> Self {
        self.timezone_offset = minutes;
        self
    }

    pub fn with_tenant(self, tenant: impl Into<String>) -> Self {
        self.set_tenant(Some(tenant.into()));
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn timezone_offset(&self) -> i32 {
        self.timezone_offset
    }

    pub fn tenant(&self) -> Option<String> {
        self.tenant.read().expect("tenant lock poisoned").clone()
    }

    /// Switch the tenant sent in `X-Tenant-ID` (or stop sending it).
    pub fn set_tenant(&self, tenant: Option<String>) {
        *self.tenant.write().expect("tenant lock poisoned") = tenant;
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Join a relative path (e.g. `"sites/site/"`) onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Request pipeline ─────────────────────────────────────────────

    fn decorate(
        &self,
        mut req: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, Error> {
        if let Some(token) = self.tokens.access_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| Error::InvalidHeader {
                    name: "Authorization",
                    reason: e.to_string(),
                })?;
            value.set_sensitive(true);
            req = req.header(AUTHORIZATION, value);
        }

        if let Some(tenant) = self.tenant() {
            let value = HeaderValue::from_str(&tenant).map_err(|e| Error::InvalidHeader {
                name: TENANT_HEADER,
                reason: e.to_string(),
            })?;
            req = req.header(TENANT_HEADER, value);
        }

        Ok(req)
    }

    async fn dispatch<F>(
        &self,
        method: &Method,
        url: &Url,
        build: &F,
    ) -> Result<reqwest::Response, Error>
    where
        F: Fn(reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> + Sync,
    {
        let req = self.decorate(self.http.request(method.clone(), url.clone()))?;
        Ok(build(req)?.send().await?)
    }

    /// Send a request, refreshing the access token once on HTTP 401.
    ///
    /// `build` is applied to a fresh builder on each attempt, so request
    /// bodies (including multipart forms) are rebuilt for the retry.
    async fn send<F>(&self, method: Method, url: Url, build: F) -> Result<reqwest::Response, Error>
    where
        F: Fn(reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> + Send + Sync,
    {
        debug!("{method} {url}");
        let resp = self.dispatch(&method, &url, &build).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Ok(resp);
        }

        debug!("{method} {url} returned 401, refreshing access token");
        self.refresh_access_token().await?;

        debug!("{method} {url} (retry)");
        self.dispatch(&method, &url, &build).await
    }

    /// Add `timezoneOffset` to a JSON object body unless already present.
    fn with_timezone(&self, body: serde_json::Value) -> serde_json::Value {
        match body {
            serde_json::Value::Object(mut map) => {
                map.entry(TIMEZONE_FIELD)
                    .or_insert_with(|| self.timezone_offset.into());
                serde_json::Value::Object(map)
            }
            other => other,
        }
    }

    fn encode_with_timezone<B: Serialize>(&self, body: &B) -> Result<serde_json::Value, Error> {
        let value = serde_json::to_value(body).map_err(Error::Encode)?;
        Ok(self.with_timezone(value))
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        let resp = self.send(Method::GET, url, Ok).await?;
        handle_response(&Method::GET, resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        let resp = self
            .send(Method::GET, url, |req| Ok(req.query(params)))
            .await?;
        handle_response(&Method::GET, resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        let body = self.encode_with_timezone(body)?;
        let resp = self
            .send(Method::POST, url, |req| Ok(req.json(&body)))
            .await?;
        handle_response(&Method::POST, resp).await
    }

    pub(crate) async fn post_no_response<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.url(path)?;
        let body = self.encode_with_timezone(body)?;
        let resp = self
            .send(Method::POST, url, |req| Ok(req.json(&body)))
            .await?;
        handle_empty(&Method::POST, resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        let body = self.encode_with_timezone(body)?;
        let resp = self
            .send(Method::PUT, url, |req| Ok(req.json(&body)))
            .await?;
        handle_response(&Method::PUT, resp).await
    }

    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        let body = serde_json::to_value(body).map_err(Error::Encode)?;
        let resp = self
            .send(Method::PATCH, url, |req| Ok(req.json(&body)))
            .await?;
        handle_response(&Method::PATCH, resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        let resp = self.send(Method::DELETE, url, Ok).await?;
        handle_empty(&Method::DELETE, resp).await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &CheckInForm,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        let offset = self.timezone_offset;
        let resp = self
            .send(Method::POST, url, |req| {
                Ok(req.multipart(check_in_multipart(form, offset)?))
            })
            .await?;
        handle_response(&Method::POST, resp).await
    }
}

/// Minutes to add to local time to get UTC (negative east of Greenwich).
pub fn local_timezone_offset() -> i32 {
    -(Local::now().offset().local_minus_utc() / 60)
}

fn check_in_multipart(form: &CheckInForm, timezone_offset: i32) -> Result<Form, Error> {
    let mut multipart = Form::new();
    for (name, value) in &form.fields {
        multipart = multipart.text(name.clone(), value.clone());
    }
    if !form.has_field("checkIn") {
        multipart = multipart.text("checkIn", form.check_in.to_rfc3339());
    }
    if !form.has_field(TIMEZONE_FIELD) {
        multipart = multipart.text(TIMEZONE_FIELD, timezone_offset.to_string());
    }
    if let Some(photo) = &form.photo {
        let part = Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone())
            .mime_str(&photo.content_type)?;
        multipart = multipart.part("photo", part);
    }
    Ok(multipart)
}

// ── Response handling ────────────────────────────────────────────────

pub(crate) async fn handle_response<T: DeserializeOwned>(
    method: &Method,
    resp: reqwest::Response,
) -> Result<T, Error> {
    let status = resp.status();
    if status.is_success() {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    } else {
        Err(parse_error(method, resp).await)
    }
}

pub(crate) async fn handle_empty(method: &Method, resp: reqwest::Response) -> Result<(), Error> {
    if resp.status().is_success() {
        Ok(())
    } else {
        Err(parse_error(method, resp).await)
    }
}

async fn parse_error(method: &Method, resp: reqwest::Response) -> Error {
    let status = resp.status();
    let url = resp.url().clone();
    let raw = resp.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ErrorResponse>(&raw)
        .ok()
        .and_then(|err| err.detail.or(err.message).or(err.error))
        .unwrap_or_else(|| {
            if raw.is_empty() {
                status.to_string()
            } else {
                raw
            }
        });

    warn!(%method, %url, status = status.as_u16(), "request failed: {message}");
    Error::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::MemoryTokenStore;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_client(
            reqwest::Client::new(),
            base,
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap()
        .with_timezone_offset(-120)
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let c = client("http://localhost:8000/api");
        assert_eq!(c.base_url().as_str(), "http://localhost:8000/api/");
        assert_eq!(
            c.url("sites/site/").unwrap().as_str(),
            "http://localhost:8000/api/sites/site/"
        );
    }

    #[test]
    fn timezone_is_added_to_objects() {
        let c = client("http://localhost:8000/api");
        let body = c.with_timezone(json!({"name": "Ada"}));
        assert_eq!(body, json!({"name": "Ada", "timezoneOffset": -120}));
    }

    #[test]
    fn explicit_timezone_is_kept() {
        let c = client("http://localhost:8000/api");
        let body = c.with_timezone(json!({"timezoneOffset": 60}));
        assert_eq!(body, json!({"timezoneOffset": 60}));
    }

    #[test]
    fn non_object_bodies_are_untouched() {
        let c = client("http://localhost:8000/api");
        assert_eq!(c.with_timezone(json!([1, 2])), json!([1, 2]));
    }
}
