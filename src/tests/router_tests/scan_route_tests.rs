// src/tests/router_tests/scan_route_tests.rs
use crate::router::handle;
use crate::tests::utils::*;
use astra::{Body, Request};
use serde_json::Value;

fn request(method: &str, uri: &str) -> Request {
    let mut req = Request::new(Body::empty());
    *req.method_mut() = method.parse().unwrap();
    *req.uri_mut() = uri.parse().unwrap();
    req
}

#[test]
fn health_reports_ok() {
    let db = temp_db("route_health");
    let svc = service(&db, FakePages::default(), None);

    let resp = handle(request("GET", "/health"), &svc).unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(body_string(resp), r#"{"status":"ok"}"#);
}

#[test]
fn scan_requires_a_user() {
    let db = temp_db("route_no_user");
    let svc = service(&db, FakePages::default(), None);

    let err = handle(request("POST", "/scan"), &svc).unwrap_err();
    assert_eq!(err.status(), 400);

    let blank = handle(request("POST", "/scan?user_id=%20"), &svc).unwrap_err();
    assert_eq!(blank.status(), 400);
}

#[test]
fn scan_without_competitor_is_404() {
    let db = temp_db("route_no_competitor");
    let svc = service(&db, FakePages::default(), None);

    let err = handle(request("POST", "/scan?user_id=u1"), &svc).unwrap_err();
    assert_eq!(err.status(), 404);
    assert_eq!(err.to_string(), "No competitor configured");
}

#[test]
fn scan_returns_report_json() {
    let db = temp_db("route_scan");
    seed_competitor(&db, "u1", "https://acme.test/pricing");
    let pages = FakePages::default().with("https://acme.test/pricing", THREE_TIER_PAGE);
    let svc = service(&db, pages, None);

    let mut req = request("POST", "/scan");
    req.headers_mut().insert("x-user-id", "u1".parse().unwrap());
    let resp = handle(req, &svc).unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("Content-Type").unwrap(),
        "application/json"
    );

    let json: Value = serde_json::from_str(&body_string(resp)).unwrap();
    assert_eq!(json["is_first_run"], true);
    assert_eq!(json["has_significant_change"], false);
    assert_eq!(json["classification"], "Stable");
    assert_eq!(json["insight"], "Initial baseline established.");
    assert_eq!(json["delta"]["changes"], Value::Array(vec![]));
    assert_eq!(json["delta"]["current_pricing"][0]["tier"], "Starter");
    assert_eq!(json["delta"]["current_pricing"][0]["price"], 29.0);
    assert_eq!(json["scan_meta"]["data_source"], "scraped");
    assert_eq!(json["scan_meta"]["steps"][0]["type"], "init");
    assert!(json["last_scan_time"].is_string());
}

#[test]
fn latest_report_follows_a_scan() {
    let db = temp_db("route_latest");
    seed_competitor(&db, "u1", "https://acme.test/pricing");
    let pages = FakePages::default().with("https://acme.test/pricing", THREE_TIER_PAGE);
    let svc = service(&db, pages, None);

    let none = handle(request("GET", "/reports/latest?user_id=u1"), &svc).unwrap_err();
    assert_eq!(none.status(), 404);

    handle(request("POST", "/scan?user_id=u1"), &svc).unwrap();
    let resp = handle(request("GET", "/reports/latest?user_id=u1"), &svc).unwrap();
    let json: Value = serde_json::from_str(&body_string(resp)).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["insight"], "Initial baseline established.");
    assert_eq!(json["data"]["data_source"], "scraped");
}

#[test]
fn unknown_routes_are_404() {
    let db = temp_db("route_unknown");
    let svc = service(&db, FakePages::default(), None);

    let err = handle(request("GET", "/admin"), &svc).unwrap_err();
    assert_eq!(err.status(), 404);
}
