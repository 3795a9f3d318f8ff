// src/tests/router_tests/competitor_tests.rs
use crate::router::handle;
use crate::tests::utils::*;
use astra::{Body, Request};
use serde_json::Value;

fn json_request(method: &str, uri: &str, body: &str) -> Request {
    let mut req = Request::new(Body::from(body.to_string()));
    *req.method_mut() = method.parse().unwrap();
    *req.uri_mut() = uri.parse().unwrap();
    req
}

#[test]
fn create_then_fetch_competitor() {
    let db = temp_db("route_competitor");
    let svc = service(&db, FakePages::default(), None);

    let resp = handle(
        json_request(
            "POST",
            "/competitor?user_id=u1",
            r#"{"name": " Acme ", "url": "https://acme.test"}"#,
        ),
        &svc,
    )
    .unwrap();
    assert_eq!(resp.status(), 201);
    let created: Value = serde_json::from_str(&body_string(resp)).unwrap();
    assert_eq!(created["data"]["name"], "Acme");

    let resp = handle(json_request("GET", "/competitor?user_id=u1", ""), &svc).unwrap();
    let fetched: Value = serde_json::from_str(&body_string(resp)).unwrap();
    assert_eq!(fetched["data"]["url"], "https://acme.test");
}

#[test]
fn second_competitor_is_forbidden() {
    let db = temp_db("route_competitor_limit");
    seed_competitor(&db, "u1", "https://acme.test");
    let svc = service(&db, FakePages::default(), None);

    let err = handle(
        json_request(
            "POST",
            "/competitor?user_id=u1",
            r#"{"name": "Other", "url": "https://other.test"}"#,
        ),
        &svc,
    )
    .unwrap_err();
    assert_eq!(err.status(), 403);
}

#[test]
fn invalid_competitor_input_is_400() {
    let db = temp_db("route_competitor_invalid");
    let svc = service(&db, FakePages::default(), None);

    for body in [r#"{"name": "Acme"}"#, r#"{"name": "Acme", "url": "acme"}"#, "not json"] {
        let err = handle(json_request("POST", "/competitor?user_id=u1", body), &svc).unwrap_err();
        assert_eq!(err.status(), 400, "body: {body}");
    }
}

#[test]
fn update_only_touches_own_competitor() {
    let db = temp_db("route_competitor_update");
    let id = seed_competitor(&db, "u1", "https://acme.test");
    let svc = service(&db, FakePages::default(), None);
    let body = r#"{"name": "Acme Inc", "url": "https://acme.test/pricing"}"#;

    let err = handle(
        json_request("PUT", &format!("/competitor/{id}?user_id=u2"), body),
        &svc,
    )
    .unwrap_err();
    assert_eq!(err.status(), 404);

    let resp = handle(
        json_request("PUT", &format!("/competitor/{id}?user_id=u1"), body),
        &svc,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
    let json: Value = serde_json::from_str(&body_string(resp)).unwrap();
    assert_eq!(json["data"]["name"], "Acme Inc");
}
