//! End-to-end tests driving the full router over in-memory stores.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use cardvault_core::cards::CardService;
use cardvault_core::credentials::CredentialService;
use cardvault_core::crypto::{EncryptionKey, SecretCodec};
use cardvault_core::models::{Card, Credential};
use cardvault_core::token::{Identity, JwtValidator};
use cardvault_server::routes;
use cardvault_server::state::AppState;
use cardvault_storage::{MemoryStore, RecordStore};

const JWT_SECRET: &str = "integration-test-secret";

struct Harness {
    app: Router,
    cards: MemoryStore<Card>,
    validator: JwtValidator,
}

impl Harness {
    fn new() -> Self {
        let cards = MemoryStore::<Card>::new();
        let credentials = MemoryStore::<Credential>::new();
        let codec = Arc::new(SecretCodec::new(EncryptionKey::generate()));
        let validator = JwtValidator::new(JWT_SECRET);

        let state = Arc::new(AppState {
            cards: CardService::new(Arc::new(cards.clone()), Arc::clone(&codec)),
            credentials: CredentialService::new(Arc::new(credentials), codec),
            token_validator: Arc::new(validator.clone()),
        });

        Self {
            app: routes::router(state),
            cards,
            validator,
        }
    }

    fn token(&self, id: i64) -> String {
        let identity = Identity {
            id,
            email: format!("user{id}@example.com"),
        };
        self.validator
            .issue(&identity, Duration::from_secs(300))
            .unwrap()
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(req).await.unwrap();
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

    async fn call(
        &self,
        method: Method,
        uri: &str,
        user: i64,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)));
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }
}

fn example_card() -> Value {
    json!({
        "title": "T",
        "name": "N",
        "number": "1111",
        "secureCode": "111",
        "password": "p@ss",
        "expirationDate": "2023-12-02",
        "isVirtual": true,
        "type": "CREDIT"
    })
}

fn example_credential() -> Value {
    json!({
        "title": "GitHub",
        "url": "https://github.com",
        "username": "octocat",
        "password": "hunter2"
    })
}

// ── Access gate ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_needs_no_token() {
    let h = Harness::new();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = h.send(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn missing_authorization_is_401() {
    let h = Harness::new();
    let req = Request::builder().uri("/cards").body(Body::empty()).unwrap();
    let (status, body) = h.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "missing authorization token");
}

#[tokio::test]
async fn wrong_scheme_is_401() {
    let h = Harness::new();
    let req = Request::builder()
        .uri("/cards")
        .header(header::AUTHORIZATION, "Token xyz")
        .body(Body::empty())
        .unwrap();
    let (status, body) = h.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid token");
}

#[tokio::test]
async fn foreign_signature_is_401() {
    let h = Harness::new();
    let forged = JwtValidator::new("some-other-secret")
        .issue(
            &Identity {
                id: 1,
                email: "user1@example.com".to_owned(),
            },
            Duration::from_secs(300),
        )
        .unwrap();
    let req = Request::builder()
        .uri("/credentials")
        .header(header::AUTHORIZATION, format!("Bearer {forged}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = h.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "invalid or expired token");
}

#[tokio::test]
async fn gate_runs_before_body_parsing() {
    let h = Harness::new();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/cards")
        .header(header::AUTHORIZATION, "Token xyz")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = h.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(h.cards.is_empty().await);
}

#[tokio::test]
async fn responses_carry_hardening_headers() {
    let h = Harness::new();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = h.app.clone().oneshot(req).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
}

// ── Cards ────────────────────────────────────────────────────────────

#[tokio::test]
async fn card_round_trip_for_owner_only() {
    let h = Harness::new();

    let (status, created) = h
        .call(Method::POST, "/cards", 1, Some(example_card()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created.get("password").is_none());
    assert!(created.get("createdAt").is_none());
    assert_eq!(created["authorId"], 1);
    assert_eq!(created["type"], "CREDIT");
    assert_eq!(created["expirationDate"], "2023-12-02");

    let id = created["id"].as_i64().unwrap();
    let stored = h.cards.find_by_id(id).await.unwrap().unwrap();
    assert_ne!(stored.password, "p@ss");

    let (status, view) = h.call(Method::GET, &format!("/cards/{id}"), 1, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["password"], "p@ss");
    assert!(view.get("createdAt").is_some());

    let (status, body) = h.call(Method::GET, &format!("/cards/{id}"), 2, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn list_is_scoped_to_caller() {
    let h = Harness::new();
    h.call(Method::POST, "/cards", 1, Some(example_card())).await;

    let (status, mine) = h.call(Method::GET, "/cards", 1, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["password"], "p@ss");

    let (status, theirs) = h.call(Method::GET, "/cards", 2, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(theirs, json!([]));
}

#[tokio::test]
async fn duplicate_card_number_is_409() {
    let h = Harness::new();
    let (first, _) = h
        .call(Method::POST, "/cards", 1, Some(example_card()))
        .await;
    assert_eq!(first, StatusCode::CREATED);

    let (status, body) = h
        .call(Method::POST, "/cards", 1, Some(example_card()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Card already exists for this user.");
    assert_eq!(h.cards.len().await, 1);

    let (other_owner, _) = h
        .call(Method::POST, "/cards", 2, Some(example_card()))
        .await;
    assert_eq!(other_owner, StatusCode::CREATED);
}

#[tokio::test]
async fn delete_card_flow() {
    let h = Harness::new();
    let (_, created) = h
        .call(Method::POST, "/cards", 1, Some(example_card()))
        .await;
    let uri = format!("/cards/{}", created["id"]);

    let (status, _) = h.call(Method::DELETE, &uri, 2, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(h.cards.len().await, 1);

    let (status, deleted) = h.call(Method::DELETE, &uri, 1, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["number"], "1111");
    assert!(deleted.get("password").is_none());
    assert!(deleted.get("secureCode").is_none());
    assert!(deleted.get("updatedAt").is_none());

    let (status, body) = h.call(Method::GET, &uri, 1, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Card not found.");

    let (status, _) = h.call(Method::DELETE, &uri, 1, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_card_bodies_are_400() {
    let h = Harness::new();

    let mut missing = example_card();
    missing.as_object_mut().unwrap().remove("number");

    let mut empty_title = example_card();
    empty_title["title"] = json!("   ");

    let mut bad_date = example_card();
    bad_date["expirationDate"] = json!("next tuesday");

    let mut bad_type = example_card();
    bad_type["type"] = json!("GOLD");

    let mut mistyped = example_card();
    mistyped["isVirtual"] = json!("yes");

    for body in [missing, empty_title, bad_date, bad_type, mistyped] {
        let (status, err) = h.call(Method::POST, "/cards", 1, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{err}");
        assert_eq!(err["error"], "bad_request");
    }
    assert!(h.cards.is_empty().await);
}

#[tokio::test]
async fn local_datetime_expiration_keeps_its_date() {
    let h = Harness::new();
    let mut card = example_card();
    card["expirationDate"] = json!("2023-12-02T10:00:00");

    let (status, created) = h.call(Method::POST, "/cards", 1, Some(card)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["expirationDate"], "2023-12-02");
}

#[tokio::test]
async fn malformed_json_is_400() {
    let h = Harness::new();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/cards")
        .header(header::AUTHORIZATION, format!("Bearer {}", h.token(1)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let (status, body) = h.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn non_numeric_id_is_400() {
    let h = Harness::new();
    let (status, body) = h.call(Method::GET, "/cards/abc", 1, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = h.call(Method::DELETE, "/credentials/1.5", 1, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Credentials ──────────────────────────────────────────────────────

#[tokio::test]
async fn credentials_are_wrapped_in_data() {
    let h = Harness::new();

    let (status, created) = h
        .call(Method::POST, "/credentials", 1, Some(example_credential()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["username"], "octocat");
    assert!(created["data"].get("password").is_none());

    let id = created["data"]["id"].as_i64().unwrap();
    let (status, view) = h
        .call(Method::GET, &format!("/credentials/{id}"), 1, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["data"]["password"], "hunter2");

    let (status, list) = h.call(Method::GET, "/credentials", 1, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn foreign_credential_is_404() {
    let h = Harness::new();
    let (_, created) = h
        .call(Method::POST, "/credentials", 1, Some(example_credential()))
        .await;
    let uri = format!("/credentials/{}", created["data"]["id"]);

    let (status, body) = h.call(Method::GET, &uri, 2, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Credential not found.");

    let (status, _) = h.call(Method::DELETE, &uri, 2, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, deleted) = h.call(Method::DELETE, &uri, 1, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["data"]["title"], "GitHub");
    assert!(deleted["data"].get("password").is_none());
}

#[tokio::test]
async fn empty_credential_field_is_400() {
    let h = Harness::new();
    let mut body = example_credential();
    body["username"] = json!("");
    let (status, err) = h.call(Method::POST, "/credentials", 1, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["message"], "username should not be empty");
}
