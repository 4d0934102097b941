//! End-to-end handler tests: the real router over a real document file,
//! driven request by request with `oneshot`.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use chirpy_api::{AppStateInner, router};
use chirpy_db::Database;

const JWT_SECRET: &str = "test-jwt-secret";
const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

struct TestApp {
    app: Router,
    path: PathBuf,
}

impl TestApp {
    fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("chirpy_api_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{name}.json"));

        let state = Arc::new(AppStateInner {
            db: Database::initialize(&path).unwrap(),
            jwt_secret: JWT_SECRET.into(),
            polka_key: POLKA_KEY.into(),
        });

        Self {
            app: router(state),
            path,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.send_raw(method, uri, auth, body.map(|json| json.to_string()))
            .await
    }

    /// Like `send`, but the JSON body is passed through as-is.
    async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let body = match body {
            Some(text) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(text)
            }
            None => Body::empty(),
        };

        let resp = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn signup_and_login(&self, email: &str, password: &str) -> (u64, String, String) {
        let creds = json!({ "email": email, "password": password });
        let (status, _) = self
            .send(Method::POST, "/api/users", None, Some(creds.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self.send(Method::POST, "/api/login", None, Some(creds)).await;
        assert_eq!(status, StatusCode::OK);
        (
            body["id"].as_u64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[tokio::test]
async fn healthz_is_ok() {
    let t = TestApp::new("healthz");
    let (status, _) = t.send(Method::GET, "/api/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn user_signup_rejects_duplicate_email() {
    let t = TestApp::new("signup");
    let creds = json!({ "email": "saul@bettercall.com", "password": "123456" });

    let (status, body) = t
        .send(Method::POST, "/api/users", None, Some(creds.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 1);
    assert_eq!(body["email"], "saul@bettercall.com");
    assert_eq!(body["is_chirpy_red"], false);
    assert!(body.get("password").is_none());

    let (status, body) = t.send(Method::POST, "/api/users", None, Some(creds)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let t = TestApp::new("login_wrong");
    t.signup_and_login("walt@breakingbad.com", "123456").await;

    let (status, _) = t
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "walt@breakingbad.com", "password": "654321" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chirp_lifecycle() {
    let t = TestApp::new("chirps");
    let (author_id, token, _) = t.signup_and_login("author@example.com", "pw").await;
    let (_, other_token, _) = t.signup_and_login("other@example.com", "pw").await;

    let (status, chirp) = t
        .send(
            Method::POST,
            "/api/chirps",
            Some(&bearer(&token)),
            Some(json!({ "body": "What a kerfuffle this is" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(chirp["id"], 1);
    assert_eq!(chirp["body"], "What a **** this is");
    assert_eq!(chirp["author_id"], author_id);

    let (status, _) = t
        .send(
            Method::POST,
            "/api/chirps",
            Some(&bearer(&token)),
            Some(json!({ "body": "x".repeat(141) })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, fetched) = t.send(Method::GET, "/api/chirps/1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, chirp);

    let (status, _) = t
        .send(Method::DELETE, "/api/chirps/1", Some(&bearer(&other_token)), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = t
        .send(Method::DELETE, "/api/chirps/1", Some(&bearer(&token)), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = t.send(Method::GET, "/api/chirps/1", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = t
        .send(Method::DELETE, "/api/chirps/1", Some(&bearer(&token)), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chirp_listing_filters_and_sorts() {
    let t = TestApp::new("listing");
    let (first_id, first, _) = t.signup_and_login("one@example.com", "pw").await;
    let (_, second, _) = t.signup_and_login("two@example.com", "pw").await;

    for (token, body) in [(&first, "a"), (&second, "b"), (&first, "c")] {
        let (status, _) = t
            .send(
                Method::POST,
                "/api/chirps",
                Some(&bearer(token)),
                Some(json!({ "body": body })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let ids = |v: &Value| -> Vec<u64> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_u64().unwrap())
            .collect()
    };

    let (_, all) = t.send(Method::GET, "/api/chirps", None, None).await;
    assert_eq!(ids(&all), vec![1, 2, 3]);

    let (_, desc) = t.send(Method::GET, "/api/chirps?sort=desc", None, None).await;
    assert_eq!(ids(&desc), vec![3, 2, 1]);

    let uri = format!("/api/chirps?author_id={first_id}&sort=desc");
    let (_, mine) = t.send(Method::GET, &uri, None, None).await;
    assert_eq!(ids(&mine), vec![3, 1]);

    let (status, _) = t
        .send(Method::GET, "/api/chirps?author_id=abc", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_need_a_valid_session() {
    let t = TestApp::new("protected");
    let body = Some(json!({ "body": "hello" }));

    let (status, _) = t
        .send(Method::POST, "/api/chirps", None, body.clone())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t
        .send(Method::POST, "/api/chirps", Some("Basic dXNlcjpwdw=="), body.clone())
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .send(Method::POST, "/api/chirps", Some(&bearer("not-a-jwt")), body)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_user_changes_credentials() {
    let t = TestApp::new("update");
    let (user_id, token, _) = t.signup_and_login("old@example.com", "old").await;

    let (status, body) = t
        .send(
            Method::PUT,
            "/api/users",
            Some(&bearer(&token)),
            Some(json!({ "email": "new@example.com", "password": "new" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id);
    assert_eq!(body["email"], "new@example.com");

    let (status, _) = t
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "new@example.com", "password": "new" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_and_revoke() {
    let t = TestApp::new("refresh");
    let (_, _, refresh_token) = t.signup_and_login("r@example.com", "pw").await;

    let (status, body) = t
        .send(Method::POST, "/api/refresh", Some(&bearer(&refresh_token)), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let session = body["token"].as_str().unwrap().to_string();

    let (status, _) = t
        .send(
            Method::POST,
            "/api/chirps",
            Some(&bearer(&session)),
            Some(json!({ "body": "refreshed" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = t
        .send(Method::POST, "/api/revoke", Some(&bearer(&refresh_token)), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = t
        .send(Method::POST, "/api/refresh", Some(&bearer(&refresh_token)), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upgrade_webhook_requires_api_key() {
    let t = TestApp::new("webhook");
    let (user_id, _, _) = t.signup_and_login("red@example.com", "pw").await;
    let upgrade = json!({ "event": "user.upgraded", "data": { "user_id": user_id } });

    let (status, _) = t
        .send(Method::POST, "/api/polka/webhooks", None, Some(upgrade.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = t
        .send(
            Method::POST,
            "/api/polka/webhooks",
            Some("ApiKey wrong-key"),
            Some(upgrade.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let api_key = format!("ApiKey {POLKA_KEY}");

    let (status, _) = t
        .send(
            Method::POST,
            "/api/polka/webhooks",
            Some(&api_key),
            Some(json!({ "event": "user.payment_failed", "data": { "user_id": user_id } })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = t
        .send(Method::POST, "/api/polka/webhooks", Some(&api_key), Some(upgrade))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_chirpy_red"], true);

    let (status, _) = t
        .send(
            Method::POST,
            "/api/polka/webhooks",
            Some(&api_key),
            Some(json!({ "event": "user.upgraded", "data": { "user_id": 999 } })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = t
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "red@example.com", "password": "pw" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_chirpy_red"], true);
}

#[tokio::test]
async fn webhook_checks_key_before_reading_body() {
    let t = TestApp::new("webhook_order");
    let garbage = Some("{ not json".to_string());

    let (status, body) = t
        .send_raw(Method::POST, "/api/polka/webhooks", None, garbage.clone())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = t
        .send_raw(
            Method::POST,
            "/api/polka/webhooks",
            Some("ApiKey wrong-key"),
            garbage.clone(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let api_key = format!("ApiKey {POLKA_KEY}");
    let (status, body) = t
        .send_raw(Method::POST, "/api/polka/webhooks", Some(&api_key), garbage)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn bad_input_gets_json_errors() {
    let t = TestApp::new("bad_input");

    let (status, body) = t.send(Method::GET, "/api/chirps/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = t
        .send_raw(Method::POST, "/api/users", None, Some("{\"email\":".into()))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = t
        .send(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "missing-password@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, token, _) = t.signup_and_login("owner@example.com", "pw").await;
    let (status, body) = t
        .send(
            Method::DELETE,
            "/api/chirps/not-a-number",
            Some(&bearer(&token)),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
