#![allow(clippy::unwrap_used)]
// Integration tests for `Dashboard` against a wiremock backend.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use onevisitor_core::{
    ClientConfig, CoreError, Dashboard, MemoryTokenStore, PermissionRole, SitePermission, Step,
    TenantSource, TokenStore, VisitorFilter, VisitorStatus,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn tokens() -> Arc<dyn TokenStore> {
    let access: SecretString = "access-1".to_string().into();
    let refresh: SecretString = "refresh-1".to_string().into();
    Arc::new(MemoryTokenStore::with_tokens(Some(access), Some(refresh)))
}

async fn setup() -> (MockServer, Dashboard) {
    let server = MockServer::start().await;
    let mut config = ClientConfig::new(Url::parse(&format!("{}/api", server.uri())).unwrap());
    config.timezone_offset = Some(-60);
    let dashboard = Dashboard::new(config, tokens()).unwrap();
    (server, dashboard)
}

fn kiosk_site() -> serde_json::Value {
    json!({
        "id": "s1",
        "tenantId": "acme",
        "name": "HQ Lobby",
        "url": "acme-hq-lobby",
        "published": true,
        "branding": { "logo": "", "primaryColor": "#112233", "secondaryColor": "#445566", "favicon": "" },
        "visitorTypes": [{ "id": "visitor", "name": "Visitor" }],
        "formFields": [
            { "id": "name", "label": "Full Name", "type": "text", "required": true },
            { "id": "email", "label": "Email", "type": "email", "required": true },
            { "id": "host", "label": "Host", "type": "select", "required": true }
        ],
        "hosts": [{ "id": "h1", "name": "Grace Hopper", "email": "grace@acme.test" }]
    })
}

fn visitor_json(id: &str, name: &str, status: &str, site: &str) -> serde_json::Value {
    json!({
        "id": id,
        "tenantId": "acme",
        "name": name,
        "company": "Acme,Inc",
        "hostName": "Grace Hopper",
        "checkInTime": "2024-05-10T09:30:00.000Z",
        "status": status,
        "agreementSigned": true,
        "siteId": site,
        "visitorType": "visitor"
    })
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connect_without_tokens_fails() {
    let server = MockServer::start().await;
    let config = ClientConfig::new(Url::parse(&server.uri()).unwrap());
    let dashboard = Dashboard::new(config, Arc::new(MemoryTokenStore::new())).unwrap();

    let err = dashboard.connect().await.unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn test_tenant_defaults_to_fallback_for_ip_hosts() {
    let (_server, dashboard) = setup().await;
    assert_eq!(dashboard.tenant_id(), "acme-corp");
}

// ── Kiosk ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_kiosk_check_in_end_to_end() {
    let (server, dashboard) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sites/site/search_by_url/"))
        .and(query_param("url", "acme-hq-lobby"))
        .and(header("X-Tenant-ID", "acme-corp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kiosk_site()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/sites/visitors/"))
        .and(header("X-Tenant-ID", "acme-corp"))
        .and(body_string_contains("Ada Lovelace"))
        .and(body_string_contains("Grace Hopper"))
        .and(body_string_contains("timezoneOffset"))
        .respond_with(ResponseTemplate::new(201).set_body_json(visitor_json(
            "v9",
            "Ada Lovelace",
            "checked-in",
            "s1",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut wizard = dashboard.start_check_in("/acme-hq-lobby/").await.unwrap();
    assert_eq!(wizard.step(), Step::Details);
    assert_eq!(dashboard.tenant().branding().primary_color, "#112233");
    assert_eq!(dashboard.tenant().current_tenant().as_deref(), Some("acme"));
    assert_eq!(dashboard.tenant_id(), "acme-corp");

    wizard.set_text("name", "Ada Lovelace").unwrap();
    wizard.set_text("email", "ada@example.com").unwrap();
    assert!(!wizard.can_advance());
    wizard.set_text("host", "h1").unwrap();
    wizard.next().unwrap();
    wizard.next().unwrap();
    wizard.acknowledge_signature(true).unwrap();

    let visitor = wizard.submit(dashboard.client()).await.unwrap();
    assert_eq!(visitor.id, "v9");
    assert_eq!(visitor.status, VisitorStatus::CheckedIn);
    assert_eq!(wizard.step(), Step::Complete);
}

#[tokio::test]
async fn test_hyphenated_kiosk_path_keeps_explicit_tenant() {
    let server = MockServer::start().await;
    let mut config = ClientConfig::new(Url::parse(&format!("{}/api", server.uri())).unwrap());
    config.tenant = Some("acme-corp".into());
    let dashboard = Dashboard::new(config, tokens()).unwrap();

    let mut site = kiosk_site();
    site["tenantId"] = json!("acme-corp");
    site["url"] = json!("acme-corp-lobby");
    Mock::given(method("GET"))
        .and(path("/api/sites/site/search_by_url/"))
        .and(query_param("url", "acme-corp-lobby"))
        .and(header("X-Tenant-ID", "acme-corp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(site))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sites/visitors/"))
        .and(header("X-Tenant-ID", "acme-corp"))
        .respond_with(ResponseTemplate::new(201).set_body_json(visitor_json(
            "v10",
            "Ada Lovelace",
            "checked-in",
            "s1",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut wizard = dashboard.start_check_in("acme-corp-lobby").await.unwrap();
    let resolved = dashboard.tenant().resolved();
    assert_eq!(resolved.id.as_str(), "acme-corp");
    assert_eq!(resolved.source, TenantSource::Explicit);
    assert_eq!(dashboard.tenant_id(), "acme-corp");
    assert_eq!(dashboard.client().tenant().as_deref(), Some("acme-corp"));

    wizard.set_text("name", "Ada Lovelace").unwrap();
    wizard.set_text("email", "ada@example.com").unwrap();
    wizard.set_text("host", "h1").unwrap();
    wizard.next().unwrap();
    wizard.next().unwrap();
    wizard.acknowledge_signature(true).unwrap();
    let visitor = wizard.submit(dashboard.client()).await.unwrap();
    assert_eq!(visitor.id, "v10");
}

#[tokio::test]
async fn test_missing_kiosk_site_is_named() {
    let (server, dashboard) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sites/site/search_by_url/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })))
        .mount(&server)
        .await;

    let err = dashboard.kiosk_site("globex-annex").await.unwrap_err();
    match err {
        CoreError::NotFound {
            entity_type,
            identifier,
        } => {
            assert_eq!(entity_type, "Site");
            assert_eq!(identifier, "globex-annex");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

// ── Visitors ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_visitor_filter_and_export() {
    let (server, dashboard) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sites/visitors"))
        .and(query_param("tenantId", "acme-corp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            visitor_json("v1", "Ada Lovelace", "checked-in", "s1"),
            visitor_json("v2", "Alan Turing", "checked-out", "s1"),
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/sites/site"))
        .and(query_param("tenantId", "acme-corp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([kiosk_site()])))
        .mount(&server)
        .await;

    let filter = VisitorFilter {
        status: Some(VisitorStatus::CheckedIn),
        ..VisitorFilter::default()
    };
    let visitors = dashboard.visitors(&filter).await.unwrap();
    assert_eq!(visitors.len(), 1);
    assert_eq!(visitors[0].name, "Ada Lovelace");

    let csv = dashboard.export_visitors(&VisitorFilter::default()).await.unwrap();
    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "HQ Lobby");
    assert_eq!(&rows[0][2], "Acme,Inc");
}

#[tokio::test]
async fn test_check_out_patches_status() {
    let (server, dashboard) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/sites/visitors/v1/"))
        .and(body_string_contains("\"status\":\"checked-out\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(visitor_json(
            "v1",
            "Ada Lovelace",
            "checked-out",
            "s1",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let visitor = dashboard.check_out("v1").await.unwrap();
    assert_eq!(visitor.status, VisitorStatus::CheckedOut);
}

// ── Permissions ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_upsert_permission_creates_then_updates() {
    let (server, dashboard) = setup().await;
    let saved = json!({
        "id": "p1",
        "userName": "Front Desk",
        "userEmail": "desk@acme.test",
        "role": "Receptionist",
        "level": "Viewer"
    });

    Mock::given(method("POST"))
        .and(path("/api/tenants/acme-corp/sites/s1/permissions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(saved.clone()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/tenants/acme-corp/sites/s1/permissions/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(saved))
        .expect(1)
        .mount(&server)
        .await;

    let mut permission = SitePermission {
        id: String::new(),
        user_name: "Front Desk".into(),
        user_email: "desk@acme.test".into(),
        role: PermissionRole::Receptionist,
        level: Default::default(),
    };
    let created = dashboard.upsert_permission("s1", &permission).await.unwrap();
    assert_eq!(created.id, "p1");

    permission.id = created.id;
    dashboard.upsert_permission("s1", &permission).await.unwrap();
}

// ── Tenants ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_switch_tenant_changes_header() {
    let (server, dashboard) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/sites/site"))
        .and(header("X-Tenant-ID", "globex"))
        .and(query_param("tenantId", "globex"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    dashboard.switch_tenant("Globex").unwrap();
    assert_eq!(dashboard.tenant().branding().name, "Globex Industries");
    assert!(dashboard.list_sites().await.unwrap().is_empty());
}
