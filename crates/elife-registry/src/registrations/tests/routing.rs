use super::common::*;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::access::{AdminRole, AdminSession, DASHBOARD_PATH, LOGIN_PATH};
use crate::config::ExportConfig;
use crate::registrations::router;
use crate::registrations::RegistrationService;

fn admin_request(method: &str, uri: &str, actor: &AdminSession, body: Option<Value>) -> Request<Body> {
    let token = session_tokens()
        .login(&actor.username, actor.role)
        .expect("login");
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn submit_route_creates_pending_registrations() {
    let (service, _, _) = build_service();
    let router = registration_router_with_service(service);

    let response = router
        .oneshot(
            Request::post("/api/v1/registrations")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&submission()).unwrap()))
                .unwrap(),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["customer_id"], "ESEP9876543210A");
    assert_eq!(payload["status"], "pending");
    assert!(payload.get("mobile_number").is_none());
}

#[tokio::test]
async fn submit_handler_returns_conflict_on_duplicate() {
    let (service, _, _) = build_service();
    let service = Arc::new(service);
    service.submit(submission()).expect("first submission");

    let response =
        router::submit_handler::<crate::store::InMemoryStore>(State(service), axum::Json(submission()))
            .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "mobile number is already registered");
}

#[tokio::test]
async fn submit_handler_returns_unprocessable_for_missing_fields() {
    let (service, _, _) = build_service();
    let mut incomplete = submission();
    incomplete.panchayath = String::new();

    let response = router::submit_handler::<crate::store::InMemoryStore>(
        State(Arc::new(service)),
        axum::Json(incomplete),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "missing required field(s): panchayath");
}

#[tokio::test]
async fn submit_handler_hides_store_details_on_outage() {
    let service = Arc::new(RegistrationService::new(
        Arc::new(UnavailableRepository),
        ExportConfig::default(),
    ));

    let response =
        router::submit_handler::<UnavailableRepository>(State(service), axum::Json(submission()))
            .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert!(!payload["error"].as_str().unwrap().contains("database offline"));
}

#[tokio::test]
async fn status_handler_reports_not_found_as_a_normal_outcome() {
    let (service, _, _) = build_service();

    let response = router::status_handler::<crate::store::InMemoryStore>(
        State(Arc::new(service)),
        Path("ESEP0000000000Z".to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["search"], "ESEP0000000000Z");
}

#[tokio::test]
async fn approval_route_requires_a_reviewer() {
    let (service, _, _) = build_service();
    let record = service.submit(submission()).expect("submission");
    let router = registration_router_with_service(service);
    let uri = format!("/api/v1/admin/registrations/{}/approve", record.id);

    let denied = router
        .clone()
        .oneshot(admin_request("POST", &uri, &user_admin(), None))
        .await
        .expect("route executes");
    assert_eq!(denied.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        denied.headers().get(header::LOCATION),
        Some(&HeaderValue::from_static(DASHBOARD_PATH))
    );

    let anonymous = router
        .clone()
        .oneshot(Request::post(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .expect("route executes");
    assert_eq!(
        anonymous.headers().get(header::LOCATION),
        Some(&HeaderValue::from_static(LOGIN_PATH))
    );

    let approved = router
        .oneshot(admin_request("POST", &uri, &local_admin(), None))
        .await
        .expect("route executes");
    assert_eq!(approved.status(), StatusCode::OK);
    let payload = read_json_body(approved).await;
    assert_eq!(payload["status"], "approved");
}

#[tokio::test]
async fn self_asserted_identity_headers_grant_nothing() {
    let (service, _, _) = build_service();
    let record = service.submit(submission()).expect("submission");
    let router = registration_router_with_service(service);
    let uri = format!("/api/v1/admin/registrations/{}/approve", record.id);

    let forged = router
        .clone()
        .oneshot(
            Request::post(uri.as_str())
                .header("x-admin-user", "intruder")
                .header("x-admin-role", AdminRole::SuperAdmin.label())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(forged.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        forged.headers().get(header::LOCATION),
        Some(&HeaderValue::from_static(LOGIN_PATH))
    );

    let token = session_tokens()
        .login("meera", AdminRole::LocalAdmin)
        .expect("login");
    session_tokens().logout(&token).expect("logout");
    let revoked = router
        .oneshot(
            Request::post(uri.as_str())
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .expect("route executes");
    assert_eq!(
        revoked.headers().get(header::LOCATION),
        Some(&HeaderValue::from_static(LOGIN_PATH))
    );
}

#[tokio::test]
async fn reopen_route_reads_the_reason_from_the_body() {
    let (service, _, _) = build_service();
    let record = service.submit(submission()).expect("submission");
    service
        .approve(Some(&local_admin()), &record.id)
        .expect("approve");
    let router = registration_router_with_service(service);
    let uri = format!("/api/v1/admin/registrations/{}/reopen", record.id);

    let without_reason = router
        .clone()
        .oneshot(admin_request("POST", &uri, &local_admin(), None))
        .await
        .expect("route executes");
    assert_eq!(without_reason.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let reopened = router
        .clone()
        .oneshot(admin_request(
            "POST",
            &uri,
            &local_admin(),
            Some(json!({ "reason": "ward corrected" })),
        ))
        .await
        .expect("route executes");
    assert_eq!(reopened.status(), StatusCode::OK);

    let history = router
        .oneshot(admin_request(
            "GET",
            &format!("/api/v1/admin/registrations/{}/reviews", record.id),
            &local_admin(),
            None,
        ))
        .await
        .expect("route executes");
    let payload = read_json_body(history).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(2));
    assert_eq!(payload[1]["reason"], "ward corrected");
}

#[tokio::test]
async fn invalid_transitions_are_conflicts() {
    let (service, _, _) = build_service();
    let record = service.submit(submission()).expect("submission");
    let router = registration_router_with_service(service);

    let response = router
        .oneshot(admin_request(
            "POST",
            &format!("/api/v1/admin/registrations/{}/reopen", record.id),
            &local_admin(),
            Some(json!({ "reason": "nothing to reopen" })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_registrations_are_not_found() {
    let (service, _, _) = build_service();
    let router = registration_router_with_service(service);

    let response = router
        .oneshot(admin_request(
            "PUT",
            "/api/v1/admin/registrations/reg-404/category",
            &local_admin(),
            Some(json!({ "category": "FoodeLife" })),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_route_filters_and_keeps_full_facets() {
    let (service, _, clock) = build_service();
    seed(&service, &clock);
    let router = registration_router_with_service(service);

    let response = router
        .oneshot(admin_request(
            "GET",
            "/api/v1/admin/registrations?category=FarmeLife&panchayath=&status=pending",
            &local_admin(),
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total"], 3);
    assert_eq!(payload["filtered"], 2);
    assert_eq!(payload["records"][0]["name"], "Chitra");
    assert_eq!(
        payload["facets"]["categories"],
        json!(["FarmeLife", "FoodeLife"])
    );
    assert_eq!(
        payload["facets"]["panchayaths"],
        json!(["Piravom", "Kadavoor"])
    );
}

#[tokio::test]
async fn list_route_rejects_unknown_statuses() {
    let (service, _, _) = build_service();
    let router = registration_router_with_service(service);

    let response = router
        .oneshot(admin_request(
            "GET",
            "/api/v1/admin/registrations?status=archived",
            &local_admin(),
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn export_route_serves_a_dated_csv_attachment() {
    let (service, _, clock) = build_service();
    seed(&service, &clock);
    let router = registration_router_with_service(service);

    let response = router
        .oneshot(admin_request(
            "GET",
            "/api/v1/admin/registrations/export?panchayath=Kadavoor",
            &super_admin(),
            None,
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION),
        Some(&HeaderValue::from_static(
            "attachment; filename=\"registrations_2026-03-02.csv\""
        ))
    );
    let body = read_text_body(response).await;
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Customer ID,Name"));
    assert!(lines[1].starts_with("ESEP9000000002B,Binu"));
    assert!(lines[2].starts_with("ESEP9000000001A,Asha"));
}
