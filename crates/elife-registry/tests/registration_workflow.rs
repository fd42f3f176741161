//! End-to-end scenarios for registration intake and review, driven through the public
//! service facade and the HTTP routers.

mod common {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::response::Response;
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use elife_registry::access::{session_router, with_admin_sessions, AdminRole, SessionTokens};
    use elife_registry::catalog::{catalog_router, CatalogService};
    use elife_registry::config::ExportConfig;
    use elife_registry::dashboard::{dashboard_router, Dashboard};
    use elife_registry::registrations::{
        registration_router, RegistrationService, RegistrationSubmission,
    };
    use elife_registry::store::InMemoryStore;

    pub(super) struct Harness {
        pub(super) store: Arc<InMemoryStore>,
        pub(super) registrations: Arc<RegistrationService<InMemoryStore>>,
        pub(super) router: Router,
    }

    pub(super) fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let registrations = Arc::new(RegistrationService::new(
            store.clone(),
            ExportConfig::default(),
        ));
        let catalog = Arc::new(CatalogService::new(store.clone(), store.clone()));
        let dashboard = Arc::new(Dashboard::new(registrations.clone(), catalog.clone()));

        let tokens = Arc::new(SessionTokens::new());
        let router = with_admin_sessions(
            Router::new()
                .merge(registration_router(registrations.clone()))
                .merge(catalog_router(catalog))
                .merge(dashboard_router(dashboard))
                .merge(session_router(tokens.clone())),
            tokens,
        );

        Harness {
            store,
            registrations,
            router,
        }
    }

    pub(super) fn asha() -> RegistrationSubmission {
        RegistrationSubmission {
            category: "FarmeLife".to_string(),
            name: "Asha".to_string(),
            address: "X".to_string(),
            mobile_number: "9876543210".to_string(),
            panchayath: "Kadavoor".to_string(),
            ward: "3".to_string(),
            agent_pro: None,
        }
    }

    pub(super) fn json_request(
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        }
    }

    pub(super) async fn json_body(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    /// Logs in over HTTP and returns the bearer token.
    pub(super) async fn login(router: &Router, username: &str, role: AdminRole) -> String {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/admin/login",
                None,
                Some(json!({ "username": username, "role": role })),
            ))
            .await
            .expect("route executes");
        json_body(response).await["token"]
            .as_str()
            .expect("session token")
            .to_string()
    }
}

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::*;
use elife_registry::access::{AccessDenied, AdminRole, AdminSession};
use elife_registry::registrations::{
    RegistrationFilter, RegistrationRepository, RegistrationServiceError, RegistrationStatus,
};

#[test]
fn documented_scenario_through_the_service() {
    let harness = harness();
    let service = &harness.registrations;

    let record = service.submit(asha()).expect("first submission succeeds");
    assert_eq!(record.customer_id.as_str(), "ESEP9876543210A");
    assert_eq!(record.status, RegistrationStatus::Pending);

    assert!(matches!(
        service.submit(asha()),
        Err(RegistrationServiceError::Duplicate)
    ));
    assert_eq!(
        harness.store.count(&RegistrationFilter::all()).expect("count"),
        1
    );

    let local_admin = AdminSession::new("meera", AdminRole::LocalAdmin);
    let approved = service
        .approve(Some(&local_admin), &record.id)
        .expect("local admin approves");
    assert_eq!(approved.status, RegistrationStatus::Approved);
    assert!(approved.updated_at > record.updated_at);

    let checked = service.check_status("9876543210").expect("status check");
    assert_eq!(checked.status, RegistrationStatus::Approved);

    let user_admin = AdminSession::new("ravi", AdminRole::UserAdmin);
    assert!(matches!(
        service.approve(Some(&user_admin), &record.id),
        Err(RegistrationServiceError::Unauthorized(
            AccessDenied::InsufficientRole
        ))
    ));
}

#[tokio::test]
async fn documented_scenario_over_http() {
    let harness = harness();
    let router = harness.router;

    let submitted = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/registrations",
            None,
            Some(json!({
                "mobile_number": "9876543210",
                "name": "Asha",
                "category": "FarmeLife",
                "address": "X",
                "panchayath": "Kadavoor",
                "ward": "3"
            })),
        ))
        .await
        .expect("route executes");
    assert_eq!(submitted.status(), StatusCode::CREATED);
    let submitted = json_body(submitted).await;
    assert_eq!(submitted["customer_id"], "ESEP9876543210A");
    assert_eq!(submitted["status"], "pending");

    let duplicate = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/registrations",
            None,
            Some(serde_json::to_value(asha()).expect("encode")),
        ))
        .await
        .expect("route executes");
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let meera = login(&router, "meera", AdminRole::LocalAdmin).await;
    let ravi = login(&router, "ravi", AdminRole::UserAdmin).await;
    let director = login(&router, "director", AdminRole::SuperAdmin).await;

    let listing = router
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/v1/admin/registrations",
            Some(meera.as_str()),
            None,
        ))
        .await
        .expect("route executes");
    let listing = json_body(listing).await;
    let id = listing["records"][0]["id"]
        .as_str()
        .expect("registration id")
        .to_string();

    let denied = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/admin/registrations/{id}/approve"),
            Some(ravi.as_str()),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(denied.status(), StatusCode::SEE_OTHER);

    let approved = router
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/v1/admin/registrations/{id}/approve"),
            Some(meera.as_str()),
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(approved.status(), StatusCode::OK);

    let status = router
        .clone()
        .oneshot(json_request(
            "GET",
            "/api/v1/registrations/status/9876543210",
            None,
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(status.status(), StatusCode::OK);
    assert_eq!(json_body(status).await["status"], "approved");

    let dashboard = router
        .oneshot(json_request(
            "GET",
            "/api/v1/admin/dashboard",
            Some(director.as_str()),
            None,
        ))
        .await
        .expect("route executes");
    let dashboard = json_body(dashboard).await;
    assert_eq!(dashboard["total"], 1);
    assert_eq!(dashboard["approved"], 1);
    assert_eq!(dashboard["pending"], 0);
}

#[tokio::test]
async fn dashboard_is_reserved_for_super_admins() {
    let harness = harness();
    let meera = login(&harness.router, "meera", AdminRole::LocalAdmin).await;

    let response = harness
        .router
        .oneshot(json_request(
            "GET",
            "/api/v1/admin/dashboard",
            Some(meera.as_str()),
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok()),
        Some("/admin/dashboard")
    );
}

#[test]
fn filtered_export_matches_the_filtered_view() {
    let harness = harness();
    let service = &harness.registrations;
    let reviewer = AdminSession::new("meera", AdminRole::LocalAdmin);

    for (mobile, name) in [("9000000001", "Asha"), ("9000000002", "Binu"), ("9000000003", "Chitra")] {
        let mut submission = asha();
        submission.mobile_number = mobile.to_string();
        submission.name = name.to_string();
        service.submit(submission).expect("submission");
    }
    let binu = service.check_status("9000000002").expect("binu");
    service.approve(Some(&reviewer), &binu.id).expect("approve");

    let filter = RegistrationFilter::all().with_status(RegistrationStatus::Pending);
    let snapshot = service.snapshot(Some(&reviewer)).expect("snapshot");
    let visible = snapshot.filter(&filter);
    let table = service.export_records(&visible).expect("export");

    let exported: Vec<&str> = table.rows().iter().map(|row| row[0].as_str()).collect();
    let shown: Vec<&str> = visible
        .iter()
        .map(|record| record.customer_id.as_str())
        .collect();
    assert_eq!(exported, shown);
    assert_eq!(exported.len(), 2);
}

#[tokio::test]
async fn logging_out_revokes_admin_access() {
    let harness = harness();
    let router = harness.router;
    harness.registrations.submit(asha()).expect("submission");
    let director = login(&router, "director", AdminRole::SuperAdmin).await;

    let before = router
        .clone()
        .oneshot(json_request("GET", "/api/v1/admin/dashboard", Some(director.as_str()), None))
        .await
        .expect("route executes");
    assert_eq!(before.status(), StatusCode::OK);

    let logout = router
        .clone()
        .oneshot(json_request("POST", "/api/v1/admin/logout", Some(director.as_str()), None))
        .await
        .expect("route executes");
    assert_eq!(logout.status(), StatusCode::NO_CONTENT);

    let after = router
        .oneshot(json_request("GET", "/api/v1/admin/dashboard", Some(director.as_str()), None))
        .await
        .expect("route executes");
    assert_eq!(after.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        after
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok()),
        Some("/admin/login")
    );
}
