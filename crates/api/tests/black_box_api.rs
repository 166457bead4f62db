use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

use stockroom_auth::{JwtClaims, Role};
use stockroom_core::UserId;
use stockroom_infra::InMemoryInventoryStore;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over a fresh in-memory store, on an ephemeral port.
        let app = stockroom_api::app::build_app(JWT_SECRET.to_string(), Arc::new(InMemoryInventoryStore::new()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a user and mint a token for them with `roles`.
    async fn login(&self, username: &str, full_name: &str, roles: Vec<Role>) -> String {
        let res = self
            .client
            .post(self.url("/users"))
            .json(&json!({ "username": username, "full_name": full_name }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let user: Value = res.json().await.unwrap();
        let id: UserId = user["id"].as_str().unwrap().parse().unwrap();
        mint_jwt(id, roles)
    }

    async fn post(&self, path: &str, token: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = self.client.post(self.url(path)).bearer_auth(token);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(sub: UserId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public_but_everything_else_needs_a_token() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/items")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let (status, body) = srv.get("/whoami", "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn whoami_resolves_the_registered_identity() {
    let srv = TestServer::spawn().await;
    let token = srv.login("ann", "Ann Lee", vec![Role::USER]).await;

    let (status, body) = srv.get("/whoami", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"]["full_name"], "Ann Lee");
    assert_eq!(body["identity"]["role"], "user");
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "user"));
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let srv = TestServer::spawn().await;
    srv.login("ann", "Ann Lee", vec![Role::USER]).await;

    let res = srv
        .client
        .post(srv.url("/users"))
        .json(&json!({ "username": "ann", "full_name": "Someone Else" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn users_cannot_write_the_catalog_or_manage_requests() {
    let srv = TestServer::spawn().await;
    let user = srv.login("ann", "Ann Lee", vec![Role::USER]).await;

    let (status, body) = srv
        .post("/items", &user, Some(json!({ "title": "Globe", "quantity": 1 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = srv.get("/requests/pending", &user).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = srv.get("/audit", &user).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unregistered_token_subject_cannot_file_requests() {
    let srv = TestServer::spawn().await;
    let admin = srv.login("admin", "School Admin", vec![Role::ADMIN]).await;
    let (_, item) = srv
        .post("/items", &admin, Some(json!({ "title": "Globe", "quantity": 1 })))
        .await;

    let ghost = mint_jwt(UserId::new(), vec![Role::USER]);
    let path = format!("/items/{}/requests", item["id"].as_str().unwrap());
    let (status, body) = srv.post(&path, &ghost, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "identity_unresolved");
}

#[tokio::test]
async fn admin_claim_in_a_plain_users_token_grants_nothing() {
    let srv = TestServer::spawn().await;
    let admin = srv.login("admin", "School Admin", vec![Role::ADMIN]).await;
    let (_, item) = srv
        .post("/items", &admin, Some(json!({ "title": "Globe", "quantity": 1 })))
        .await;

    let mallory = srv.login("mallory", "Mallory", vec![Role::ADMIN]).await;
    let path = format!("/items/{}/requests", item["id"].as_str().unwrap());
    let (status, request) = srv.post(&path, &mallory, None).await;
    assert_eq!(status, StatusCode::CREATED);

    let approve = format!("/requests/{}/approve", request["id"].as_str().unwrap());
    let (status, body) = srv.post(&approve, &mallory, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    let (status, _) = srv.get("/audit", &mallory).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let ghost = mint_jwt(UserId::new(), vec![Role::ADMIN]);
    let (status, body) = srv.get("/audit", &ghost).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "identity_unresolved");
}

#[tokio::test]
async fn catalog_validation_and_lookup_errors() {
    let srv = TestServer::spawn().await;
    let admin = srv.login("admin", "School Admin", vec![Role::ADMIN]).await;

    let (status, _) = srv
        .post("/items", &admin, Some(json!({ "title": "Globe", "quantity": -1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = srv
        .post("/items", &admin, Some(json!({ "title": "   ", "quantity": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = srv.get("/items/not-a-uuid", &admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (status, body) = srv.get(&format!("/items/{}", stockroom_core::ItemId::new()), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn keyword_search_is_case_insensitive() {
    let srv = TestServer::spawn().await;
    let admin = srv.login("admin", "School Admin", vec![Role::ADMIN]).await;
    for title in ["Digital Microscope", "Globe", "Pocket microscope"] {
        srv.post("/items", &admin, Some(json!({ "title": title, "quantity": 1 })))
            .await;
    }

    let (status, body) = srv.get("/items?keyword=MICRO", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = srv.get("/items", &admin).await;
    assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn single_copy_lending_round_trip() {
    let srv = TestServer::spawn().await;
    let admin = srv.login("admin", "School Admin", vec![Role::ADMIN]).await;
    let u1 = srv.login("u1", "U1", vec![Role::USER]).await;
    let u2 = srv.login("u2", "U2", vec![Role::USER]).await;

    let (status, item) = srv
        .post("/items", &admin, Some(json!({ "title": "A", "quantity": 1 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = item["id"].as_str().unwrap().to_string();
    let requests_path = format!("/items/{item_id}/requests");

    let (status, r1) = srv.post(&requests_path, &u1, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(r1["status"], "PENDING");
    let (_, r2) = srv.post(&requests_path, &u2, None).await;
    let r1 = r1["id"].as_str().unwrap().to_string();
    let r2 = r2["id"].as_str().unwrap().to_string();

    let (_, pending) = srv.get("/requests/pending", &admin).await;
    assert_eq!(pending.as_array().unwrap().len(), 2);

    let (status, body) = srv.post(&format!("/requests/{r1}/approve"), &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");

    let (status, body) = srv.post(&format!("/requests/{r2}/approve"), &admin, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "insufficient_quantity");

    let (_, loans) = srv.get("/requests/approved", &admin).await;
    assert_eq!(loans.as_array().unwrap().len(), 1);

    let (status, body) = srv.post(&format!("/requests/{r2}/return"), &admin, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_transition");

    let (status, _) = srv.post(&format!("/requests/{r1}/return"), &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = srv.post(&format!("/requests/{r2}/approve"), &admin, None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, item) = srv.get(&format!("/items/{item_id}"), &admin).await;
    assert_eq!(item["quantity"], 0);

    let (status, audit) = srv.get("/audit", &admin).await;
    assert_eq!(status, StatusCode::OK);
    let messages: Vec<&str> = audit
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["message"].as_str().unwrap())
        .collect();
    assert_eq!(
        messages,
        vec!["Issued: A -> U2", "Returned: U1 -> A", "Issued: A -> U1", "Added to catalog: A"]
    );
}

#[tokio::test]
async fn delete_is_refused_while_a_unit_is_on_loan() {
    let srv = TestServer::spawn().await;
    let admin = srv.login("admin", "School Admin", vec![Role::ADMIN]).await;
    let user = srv.login("ann", "Ann Lee", vec![Role::USER]).await;

    let (_, item) = srv
        .post("/items", &admin, Some(json!({ "title": "Globe", "quantity": 2 })))
        .await;
    let item_path = format!("/items/{}", item["id"].as_str().unwrap());
    let (_, req) = srv.post(&format!("{item_path}/requests"), &user, None).await;
    let req_id = req["id"].as_str().unwrap().to_string();
    srv.post(&format!("/requests/{req_id}/approve"), &admin, None).await;

    let res = srv.client.delete(srv.url(&item_path)).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    srv.post(&format!("/requests/{req_id}/return"), &admin, None).await;
    let res = srv.client.delete(srv.url(&item_path)).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let (status, _) = srv.get(&item_path, &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_keeps_date_added_and_bumps_version() {
    let srv = TestServer::spawn().await;
    let admin = srv.login("admin", "School Admin", vec![Role::ADMIN]).await;

    let (_, item) = srv
        .post("/items", &admin, Some(json!({ "title": "Globe", "quantity": 1 })))
        .await;
    let res = srv
        .client
        .put(srv.url(&format!("/items/{}", item["id"].as_str().unwrap())))
        .bearer_auth(&admin)
        .json(&json!({ "title": "World Globe", "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();

    assert_eq!(updated["title"], "World Globe");
    assert_eq!(updated["quantity"], 3);
    assert_eq!(updated["date_added"], item["date_added"]);
    assert!(updated["version"].as_u64().unwrap() > item["version"].as_u64().unwrap());
}
