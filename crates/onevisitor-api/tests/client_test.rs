#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use onevisitor_api::{ApiClient, CheckInForm, Error, MemoryTokenStore, PhotoPart};

// ── Helpers ─────────────────────────────────────────────────────────

fn secret(s: &str) -> SecretString {
    s.to_string().into()
}

async fn setup_with_tokens(
    access: Option<&str>,
    refresh: Option<&str>,
) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let store = MemoryTokenStore::with_tokens(access.map(secret), refresh.map(secret));
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        &format!("{}/api", server.uri()),
        Arc::new(store),
    )
    .unwrap()
    .with_timezone_offset(-60);
    (server, client)
}

async fn setup() -> (MockServer, ApiClient) {
    setup_with_tokens(Some("access-1"), Some("refresh-1")).await
}

fn site_json() -> serde_json::Value {
    json!({
        "id": "site-1",
        "tenantId": "acme",
        "name": "HQ Lobby",
        "url": "acme-hq-lobby",
        "urlType": "path",
        "published": true,
        "branding": {
            "logo": "",
            "primaryColor": "#3498db",
            "secondaryColor": "#2980b9",
            "favicon": ""
        },
        "welcomeMessage": "Welcome!",
        "language": "en",
        "lastPublished": null,
        "visitorTypes": [{ "id": "visitor", "name": "Visitor" }],
        "formFields": [
            { "id": "name", "label": "Full Name", "type": "text", "required": true }
        ]
    })
}

// ── Headers ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_and_tenant_headers() {
    let (server, client) = setup().await;
    client.set_tenant(Some("acme".into()));

    Mock::given(method("GET"))
        .and(path("/api/sites/site"))
        .and(query_param("tenantId", "acme"))
        .and(header("authorization", "Bearer access-1"))
        .and(header("x-tenant-id", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([site_json()])))
        .expect(1)
        .mount(&server)
        .await;

    let sites = client.list_sites("acme").await.unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0].url, "acme-hq-lobby");
}

#[tokio::test]
async fn test_site_by_url() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sites/site/search_by_url/"))
        .and(query_param("url", "acme-hq-lobby"))
        .respond_with(ResponseTemplate::new(200).set_body_json(site_json()))
        .mount(&server)
        .await;

    let site = client.site_by_url("acme-hq-lobby").await.unwrap();
    assert_eq!(site.name, "HQ Lobby");
    assert_eq!(site.form_fields[0].field_type, "text");
}

// ── Refresh-and-retry ───────────────────────────────────────────────

#[tokio::test]
async fn test_401_refreshes_once_and_retries() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sites/site/site-1/"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/users/refresh-token/"))
        .and(body_partial_json(json!({ "refresh_token": "refresh-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "access-2" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/sites/site/site-1/"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(site_json()))
        .expect(1)
        .mount(&server)
        .await;

    let site = client.get_site("site-1").await.unwrap();
    assert_eq!(site.id, "site-1");
    assert_eq!(
        client.tokens().access_token().unwrap().expose_secret(),
        "access-2"
    );
}

#[tokio::test]
async fn test_second_401_is_an_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/tenants/acme/sites/s1/permissions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "nope" })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/users/refresh-token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "access-2" })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.list_permissions("acme", "s1").await;
    assert!(
        matches!(result, Err(Error::Api { status: 401, ref message }) if message == "nope"),
        "expected API 401, got: {result:?}"
    );
}

#[tokio::test]
async fn test_401_without_refresh_token() {
    let (server, client) = setup_with_tokens(Some("access-1"), None).await;

    Mock::given(method("GET"))
        .and(path("/api/admin/tenants/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.list_tenants().await;
    assert!(matches!(result, Err(Error::NoRefreshToken)));
}

#[tokio::test]
async fn test_rejected_refresh_is_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/users/profile/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/users/refresh-token/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.profile().await;
    assert!(matches!(result, Err(Error::SessionExpired)));
}

// ── Timezone injection ──────────────────────────────────────────────

#[tokio::test]
async fn test_post_injects_timezone_offset() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/sites/site/"))
        .and(body_partial_json(json!({ "name": "HQ Lobby", "timezoneOffset": -60 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(site_json()))
        .expect(1)
        .mount(&server)
        .await;

    let site: onevisitor_api::types::SiteDto = serde_json::from_value(site_json()).unwrap();
    client.create_site(&site).await.unwrap();
}

#[tokio::test]
async fn test_put_injects_timezone_offset() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/tenants/acme/sites/s1/permissions/p1"))
        .and(body_partial_json(json!({ "timezoneOffset": -60, "role": "Staff" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "p1",
            "userName": "Sam",
            "userEmail": "sam@acme.test",
            "role": "Staff",
            "level": "Viewer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let permission = onevisitor_api::types::PermissionDto {
        id: "p1".into(),
        user_name: "Sam".into(),
        user_email: "sam@acme.test".into(),
        role: "Staff".into(),
        level: "Viewer".into(),
    };
    let updated = client
        .update_permission("acme", "s1", &permission)
        .await
        .unwrap();
    assert_eq!(updated.level, "Viewer");
}

// ── Check-in ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_check_in_is_multipart_with_photo() {
    let (server, client) = setup_with_tokens(None, None).await;

    Mock::given(method("POST"))
        .and(path("/api/sites/visitors/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "v1",
            "tenantId": "acme",
            "name": "Ada Lovelace",
            "hostName": "Grace Hopper",
            "checkInTime": "2024-05-01T09:30:00Z",
            "status": "checked-in",
            "agreementSigned": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let form = CheckInForm {
        fields: vec![
            ("name".into(), "Ada Lovelace".into()),
            ("host".into(), "h1".into()),
        ],
        photo: Some(PhotoPart {
            file_name: "ada.png".into(),
            content_type: "image/png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }),
        check_in: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
    };

    let visitor = client.check_in(&form).await.unwrap();
    assert_eq!(visitor.status, "checked-in");

    let requests: Vec<Request> = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body).into_owned();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();

    assert!(content_type.starts_with("multipart/form-data"));
    assert!(body.contains("name=\"name\""));
    assert!(body.contains("Ada Lovelace"));
    assert!(body.contains("name=\"checkIn\""));
    assert!(body.contains("2024-05-01T09:30:00+00:00"));
    assert!(body.contains("name=\"timezoneOffset\""));
    assert!(body.contains("name=\"photo\"; filename=\"ada.png\""));
    assert!(requests[0].headers.get("authorization").is_none());
}

// ── Auth ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_stores_tokens() {
    let (server, client) = setup_with_tokens(None, None).await;

    Mock::given(method("POST"))
        .and(path("/api/users/login/"))
        .and(body_partial_json(json!({ "email": "ada@acme.test" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok",
            "refresh_token": "ref",
            "user": { "id": 7, "email": "ada@acme.test", "first_name": "Ada", "last_name": "L" }
        })))
        .mount(&server)
        .await;

    let user = client
        .login("ada@acme.test", &secret("hunter2"))
        .await
        .unwrap();
    assert_eq!(user.first_name, "Ada");
    assert_eq!(client.tokens().access_token().unwrap().expose_secret(), "tok");
    assert_eq!(client.tokens().refresh_token().unwrap().expose_secret(), "ref");
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup_with_tokens(None, None).await;

    Mock::given(method("POST"))
        .and(path("/api/users/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.login("ada@acme.test", &secret("wrong")).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_logout_clears_tokens_even_on_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/users/logout/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client.logout().await;
    assert!(matches!(result, Err(Error::Api { status: 500, .. })));
    assert!(client.tokens().access_token().is_none());
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/admin/tenants/nope/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })))
        .mount(&server)
        .await;

    let err = client.get_tenant("nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_bad_json_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/sites/visitors/v1/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sites/visitors"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    client.delete_visitor("v1").await.unwrap();
    let result = client.list_visitors(None, "acme").await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}
