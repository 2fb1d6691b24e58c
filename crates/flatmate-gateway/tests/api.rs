// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP-level tests driving the router directly.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use flatmate_gateway::{build_router, GatewayState};
use flatmate_test_utils::{FailingStore, TestHarness};

fn router(harness: &TestHarness) -> Router {
    build_router(GatewayState::new(harness.registry.clone(), &harness.config))
}

async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("cookie", cookie)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("cookie", cookie)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn session(harness: &TestHarness, uid: &str) -> String {
    format!("flatmate_session={}", harness.token(None, uid).await.unwrap())
}

fn hello(receiver: &str, text: &str) -> Value {
    json!({"receiverId": receiver, "propertyId": "p1", "message": text})
}

#[tokio::test]
async fn health_needs_no_session() {
    let harness = TestHarness::in_memory().unwrap();
    let app = router(&harness);
    let (status, body) = call(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_or_forged_sessions_are_rejected() {
    let harness = TestHarness::in_memory().unwrap();
    let app = router(&harness);

    let (status, body) = call(&app, Request::get("/chat/list").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = call(&app, get("/chat/list", "flatmate_session=abc.def")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bearer_token_is_accepted() {
    let harness = TestHarness::in_memory().unwrap();
    let app = router(&harness);
    let token = harness.token(None, "u1").await.unwrap();
    let request = Request::get("/chat/list")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "chats": []}));
}

#[tokio::test]
async fn five_sends_then_limit() {
    let harness = TestHarness::in_memory().unwrap();
    let app = router(&harness);
    let cookie = session(&harness, "u1").await;

    for expected in [4, 3, 2, 1, 0] {
        let (status, body) = call(&app, post("/chat/send", &cookie, hello("u2", "hello"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["chatId"], "u1_u2_p1");
        assert_eq!(body["remainingMessages"], expected);
        assert_eq!(body["messageData"]["text"], "hello");
    }

    let (status, body) = call(&app, post("/chat/send", &cookie, hello("u2", "world"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["limitExceeded"], true);

    let reader = session(&harness, "u2").await;
    let (status, body) = call(&app, get("/chat/messages/u1_u2_p1", &reader)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"].as_array().unwrap().len(), 5);
    assert_eq!(body["userId"], "u2");
    assert_eq!(body["chatId"], "u1_u2_p1");
}

#[tokio::test]
async fn send_validation_errors() {
    let harness = TestHarness::in_memory().unwrap();
    let app = router(&harness);
    let cookie = session(&harness, "u1").await;

    let (status, body) = call(&app, post("/chat/send", &cookie, hello("u1", "hi"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.get("limitExceeded").is_none());

    let (status, _) = call(&app, post("/chat/send", &cookie, hello("u2", "   "))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, post("/chat/send", &cookie, hello("u2", &"x".repeat(501)))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, post("/chat/send", &cookie, json!({"message": "hi"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn outsiders_cannot_read() {
    let harness = TestHarness::in_memory().unwrap();
    let app = router(&harness);
    let sender = session(&harness, "u1").await;
    call(&app, post("/chat/send", &sender, hello("u2", "private"))).await;

    let outsider = session(&harness, "u3").await;
    let (status, body) = call(&app, get("/chat/messages/u1_u2_p1", &outsider)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!body.to_string().contains("private"));
}

#[tokio::test]
async fn bulk_send_truncates() {
    let harness = TestHarness::in_memory().unwrap();
    let app = router(&harness);
    let cookie = session(&harness, "u1").await;
    call(&app, post("/chat/send", &cookie, hello("u2", "one"))).await;
    call(&app, post("/chat/send", &cookie, hello("u2", "two"))).await;

    let messages: Vec<Value> = (0..7)
        .map(|i| json!({"text": format!("q{i}"), "clientMsgId": format!("c{i}")}))
        .collect();
    let (status, body) = call(
        &app,
        post(
            "/chat/send-bulk",
            &cookie,
            json!({"receiverId": "u2", "propertyId": "p1", "messages": messages}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processedIds"], json!(["c0", "c1", "c2"]));
    assert_eq!(body["remainingMessages"], 0);
}

#[tokio::test]
async fn list_and_status_report_conversations() {
    let harness = TestHarness::in_memory().unwrap();
    let app = router(&harness);
    harness
        .seed_user(None, "owner", json!({"displayName": "Owner", "phoneNumber": "900"}))
        .await
        .unwrap();
    let visitor = session(&harness, "visitor").await;

    let (status, body) = call(&app, get("/chat/status/p1?ownerId=owner", &visitor)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chatExists"], false);
    assert_eq!(body["suggestedChatId"], "owner_visitor_p1");

    call(&app, post("/chat/send", &visitor, hello("owner", "still free?"))).await;

    let (_, body) = call(&app, get("/chat/status/p1?ownerId=owner", &visitor)).await;
    assert_eq!(body["chatExists"], true);
    assert_eq!(body["chat"]["lastMessage"], "still free?");
    assert_eq!(body["chat"]["propertyLocation"], "Inquiry");

    let (_, body) = call(&app, get("/chat/list", &visitor)).await;
    assert_eq!(body["chats"][0]["partnerId"], "owner");
    assert_eq!(body["chats"][0]["partnerName"], "Owner");
    assert_eq!(body["chats"][0]["partnerPhone"], "900");

    let (status, _) = call(&app, get("/chat/status/p1", &visitor)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&app, get("/chat/status/p1?ownerId=visitor", &visitor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn tenant_is_selected_per_request() {
    let harness = TestHarness::builder()
        .with_tenant("flatmate")
        .with_tenant("roomies")
        .build()
        .unwrap();
    let app = router(&harness);
    let roomies_token = harness.token(Some("roomies"), "u1").await.unwrap();
    let roomies_cookie = format!("roomies_session={roomies_token}");

    // Query parameter.
    let (status, _) = call(&app, post("/chat/send?appName=roomies", &roomies_cookie, hello("u2", "hi"))).await;
    assert_eq!(status, StatusCode::OK);

    // Body field.
    let mut body = hello("u2", "again");
    body["appName"] = json!("roomies");
    let (status, sent) = call(&app, post("/chat/send", &roomies_cookie, body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["remainingMessages"], 3);

    // Header.
    let request = Request::get("/chat/list")
        .header("x-app-name", "roomies")
        .header("cookie", &roomies_cookie)
        .body(Body::empty())
        .unwrap();
    let (_, listed) = call(&app, request).await;
    assert_eq!(listed["chats"].as_array().unwrap().len(), 1);

    // The default tenant neither accepts the roomies session nor sees its data.
    let (status, _) = call(&app, get("/chat/list", &roomies_cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let flatmate_cookie = session(&harness, "u1").await;
    let (_, listed) = call(&app, get("/chat/list", &flatmate_cookie)).await;
    assert_eq!(listed["chats"], json!([]));

    let (status, _) = call(&app, get("/chat/list?appName=nope", &flatmate_cookie)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn notification_feed_and_read_state() {
    let harness = TestHarness::in_memory().unwrap();
    let app = router(&harness);
    harness
        .seed_user(
            None,
            "owner",
            json!({
                "phoneNumber": "900",
                "notifications": {"visits": {"v1": {"timestamp": 10, "isInterestedLead": true}}},
                "property": {"p1": {"reviews": {"r1": {"timestamp": 20}}}}
            }),
        )
        .await
        .unwrap();
    let cookie = session(&harness, "owner").await;

    let (_, body) = call(&app, get("/notifications/unread-count", &cookie)).await;
    assert_eq!(body["count"], 2);

    let (_, feed) = call(&app, get("/notifications", &cookie)).await;
    assert_eq!(feed["notifications"][0]["id"], "p1_r1");
    assert_eq!(feed["notifications"][0]["type"], "review");
    assert_eq!(feed["notifications"][1]["visitorPhone"], "900");

    let node = feed["notifications"][1]["node"].as_str().unwrap().to_string();
    let (status, ack) = call(
        &app,
        post("/notifications/read", &cookie, json!({"notifId": "v1", "node": node})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["updated"], 1);

    let empty = Request::post("/notifications/read")
        .header("cookie", &cookie)
        .body(Body::empty())
        .unwrap();
    let (status, ack) = call(&app, empty).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["updated"], 1);

    let (_, body) = call(&app, get("/notifications/unread-count", &cookie)).await;
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn offers_round_trip() {
    let harness = TestHarness::in_memory().unwrap();
    let app = router(&harness);
    let cookie = session(&harness, "visitor").await;

    let (status, body) = call(
        &app,
        post(
            "/property/p1/negotiate",
            &cookie,
            json!({"offerAmount": "9000", "currentRent": 10000, "ownerId": "owner"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["existingOffer"]["discountPercent"], "10.0%");
    assert_eq!(body["existingOffer"]["status"], "pending");

    let (_, body) = call(&app, get("/property/p1/negotiate/status?ownerId=owner", &cookie)).await;
    assert_eq!(body["existingOffer"]["offerAmount"], 9000.0);

    let (status, _) = call(&app, get("/property/p1/negotiate/status", &cookie)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = call(&app, get("/property/p2/negotiate/status?ownerId=owner", &cookie)).await;
    assert_eq!(body["existingOffer"], Value::Null);
}

#[tokio::test]
async fn offer_carries_the_visitor_profile() {
    let harness = TestHarness::in_memory().unwrap();
    let app = router(&harness);
    harness
        .seed_user(
            None,
            "visitor",
            json!({"name": "Arjun", "profileImage": "https://img.example/arjun.png"}),
        )
        .await
        .unwrap();
    let cookie = session(&harness, "visitor").await;

    let (status, body) = call(
        &app,
        post(
            "/property/p1/negotiate",
            &cookie,
            json!({"offerAmount": 9000, "currentRent": 10000, "ownerId": "owner"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["existingOffer"]["visitorName"], "Arjun");

    let ns = harness.namespace(None).await.unwrap();
    let stored = ns
        .store()
        .get(&ns.at(&["users", "owner", "property", "p1", "negotiations", "visitor"]).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["visitorName"], "Arjun");
    assert_eq!(stored["visitorPhoto"], "https://img.example/arjun.png");
}

#[tokio::test]
async fn malformed_query_gets_the_error_envelope() {
    let harness = TestHarness::in_memory().unwrap();
    let app = router(&harness);
    let cookie = session(&harness, "visitor").await;

    for uri in [
        "/chat/status/p1?ownerId=a&ownerId=b",
        "/property/p1/negotiate/status?ownerId=a&ownerId=b",
    ] {
        let (status, body) = call(&app, get(uri, &cookie)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["success"], false, "{uri}");
        assert!(body["message"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn store_failures_are_opaque() {
    let store = Arc::new(FailingStore::new());
    let harness = TestHarness::builder()
        .with_shared_store(store.clone())
        .build()
        .unwrap();
    let app = router(&harness);
    let cookie = session(&harness, "u1").await;

    store.fail_writes(true);
    let (status, body) = call(&app, post("/chat/send", &cookie, hello("u2", "hi"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "internal error");

    store.fail_writes(false);
    let (status, body) = call(&app, post("/chat/send", &cookie, hello("u2", "hi"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remainingMessages"], 4);
}
