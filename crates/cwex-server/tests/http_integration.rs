//! End-to-end tests of the HTTP surface, with an in-process broker.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use cwex_server::auth::{CredentialVerifier, JwtManager};
use cwex_server::dispatch::{
    BrokerConnector, BrokerLink, CommandDispatcher, DispatchError, DispatcherConfig,
};
use cwex_server::http::{AppState, build_router};
use cwex_server::registry::MachineRegistry;
use cwex_server::storage::RegistryDatabase;

const PREFIX: &str = "/cwex/v1";

#[derive(Default)]
struct RecordingBroker {
    refuse: AtomicBool,
    published: Mutex<Vec<(String, String)>>,
}

struct RecordingLink(Arc<RecordingBroker>);

#[async_trait]
impl BrokerLink for RecordingLink {
    fn is_connected(&self) -> bool {
        true
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), DispatchError> {
        self.0
            .published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

struct Connector(Arc<RecordingBroker>);

#[async_trait]
impl BrokerConnector for Connector {
    async fn connect(&self) -> Result<Arc<dyn BrokerLink>, DispatchError> {
        if self.0.refuse.load(Ordering::SeqCst) {
            return Err(DispatchError::Unreachable("connection refused".into()));
        }
        Ok(Arc::new(RecordingLink(Arc::clone(&self.0))))
    }
}

struct TestApp {
    router: axum::Router,
    auth: Arc<CredentialVerifier>,
    broker: Arc<RecordingBroker>,
}

async fn app() -> TestApp {
    let db = RegistryDatabase::open_in_memory().await.unwrap();
    let jwt = Arc::new(JwtManager::new(b"test-secret", 3600));
    let registry = MachineRegistry::new(db.clone());
    let auth = Arc::new(CredentialVerifier::new(db, jwt));
    let broker = Arc::new(RecordingBroker::default());
    let dispatcher = Arc::new(CommandDispatcher::new(
        registry.clone(),
        Arc::new(Connector(Arc::clone(&broker))),
        DispatcherConfig {
            connect_timeout: Duration::from_millis(200),
            ..DispatcherConfig::default()
        },
    ));

    let router = build_router(AppState {
        registry,
        auth: Arc::clone(&auth),
        dispatcher,
        api_version: Arc::from("v1"),
    });
    TestApp {
        router,
        auth,
        broker,
    }
}

impl TestApp {
    /// Send a request and return (status, parsed JSON body).
    async fn send(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let resp = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn login(&self, email: &str, password: &str, authorized: bool) -> String {
        self.auth
            .provision_user(email, password, authorized)
            .await
            .unwrap();
        let (status, body) = self
            .send(
                "POST",
                &format!("{PREFIX}/auth"),
                Some(json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body.as_str().expect("token is a JSON string").to_string()
    }
}

fn machine(location: &str, branch: &str, number: &str) -> Value {
    json!({ "location": location, "branch": branch, "machineNumber": number })
}

#[tokio::test]
async fn machine_lifecycle_scenario() {
    let app = app().await;
    let machines = format!("{PREFIX}/machines");

    let (status, created) = app
        .send("POST", &machines, Some(machine("NYC", "5th", "12")), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["_id"].as_str().unwrap().to_string();
    assert_eq!(created["machineNumber"], "12");

    let (status, body) = app
        .send("POST", &machines, Some(machine("NYC", "5th", "12")), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains(&id));

    let one = format!("{machines}/{id}");
    let (status, updated) = app
        .send("PUT", &one, Some(json!({ "machineNumber": "13" })), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["machineNumber"], "13");
    assert_eq!(updated["location"], "NYC");

    let (status, body) = app
        .send("PUT", &one, Some(json!({ "machineNumber": "13" })), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains(&id));

    let (status, deleted) = app.send("DELETE", &one, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["_id"], id.as_str());

    let (status, again) = app.send("DELETE", &one, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(again.is_null());
}

#[tokio::test]
async fn numeric_machine_number_is_accepted() {
    let app = app().await;
    let (status, created) = app
        .send(
            "POST",
            &format!("{PREFIX}/machines"),
            Some(json!({ "location": "LA", "branch": "main", "machineNumber": 7 })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["machineNumber"], "7");
}

#[tokio::test]
async fn update_into_other_machine_conflicts() {
    let app = app().await;
    let machines = format!("{PREFIX}/machines");
    let (_, a) = app
        .send("POST", &machines, Some(machine("NYC", "5th", "1")), None)
        .await;
    let (_, b) = app
        .send("POST", &machines, Some(machine("NYC", "5th", "2")), None)
        .await;

    let (status, body) = app
        .send(
            "PUT",
            &format!("{machines}/{}", b["_id"].as_str().unwrap()),
            Some(json!({ "machineNumber": "1" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains(a["_id"].as_str().unwrap())
    );
}

#[tokio::test]
async fn get_and_update_unknown_machine_are_not_found() {
    let app = app().await;
    let one = format!("{PREFIX}/machines/missing");

    let (status, body) = app.send("GET", &one, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = app
        .send("PUT", &one, Some(json!({ "branch": "x" })), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_sorts_and_filters() {
    let app = app().await;
    let machines = format!("{PREFIX}/machines");
    for (loc, branch) in [("Boston", "a"), ("NYC", "a"), ("Austin", "b")] {
        app.send("POST", &machines, Some(machine(loc, branch, "1")), None)
            .await;
    }

    let (status, all) = app.send("GET", &machines, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let locations: Vec<_> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["location"].as_str().unwrap())
        .collect();
    assert_eq!(locations, ["NYC", "Boston", "Austin"]);

    let (_, filtered) = app
        .send("GET", &format!("{machines}?branch=a"), None, None)
        .await;
    assert_eq!(filtered.as_array().unwrap().len(), 2);

    let (status, none) = app
        .send("GET", &format!("{machines}?location=Paris"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(none, json!([]));

    let (status, body) = app
        .send("GET", &format!("{machines}?color=red"), None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("color"));
}

#[tokio::test]
async fn malformed_bodies_are_bad_request_with_error_json() {
    let app = app().await;
    let machines = format!("{PREFIX}/machines");

    let (status, body) = app
        .send("POST", &machines, Some(json!({ "location": "NYC" })), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = app
        .send("POST", &machines, Some(machine("NYC/2", "5th", "1")), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_failures_are_uniform() {
    let app = app().await;
    app.login("alice@example.com", "password123", true).await;
    let auth = format!("{PREFIX}/auth");

    let (status, wrong_pw) = app
        .send(
            "POST",
            &auth,
            Some(json!({ "email": "alice@example.com", "password": "nope" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, unknown) = app
        .send(
            "POST",
            &auth,
            Some(json!({ "email": "bob@example.com", "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(wrong_pw, unknown);
    assert_eq!(wrong_pw, json!({ "error": "Invalid Credential" }));
}

#[tokio::test]
async fn profile_requires_valid_token_and_hides_password() {
    let app = app().await;
    let token = app.login("alice@example.com", "password123", true).await;
    let auth = format!("{PREFIX}/auth");

    let (status, user) = app.send("GET", &auth, None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["authorized"], true);
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("password").is_none());

    let (status, _) = app.send("GET", &auth, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.send("GET", &auth, None, Some("forged")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn blink_publishes_to_machine_topic() {
    let app = app().await;
    let token = app.login("ops@example.com", "password123", true).await;
    let (_, created) = app
        .send(
            "POST",
            &format!("{PREFIX}/machines"),
            Some(machine("NYC", "5th", "12")),
            None,
        )
        .await;
    let id = created["_id"].as_str().unwrap();

    let (status, sent) = app
        .send(
            "POST",
            &format!("{PREFIX}/machines/{id}/blink"),
            Some(json!({ "amount": 3 })),
            Some(&token),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent, json!({ "topic": "@msg/NYC/5th/12/task", "payload": "on 3" }));
    assert_eq!(
        *app.broker.published.lock().unwrap(),
        vec![("@msg/NYC/5th/12/task".to_string(), "on 3".to_string())]
    );
}

#[tokio::test]
async fn blink_requires_authorized_flag() {
    let app = app().await;
    let token = app.login("viewer@example.com", "password123", false).await;
    let (_, created) = app
        .send(
            "POST",
            &format!("{PREFIX}/machines"),
            Some(machine("NYC", "5th", "12")),
            None,
        )
        .await;
    let blink = format!("{PREFIX}/machines/{}/blink", created["_id"].as_str().unwrap());

    let (status, _) = app
        .send("POST", &blink, Some(json!({ "amount": 1 })), Some(&token))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send("POST", &blink, Some(json!({ "amount": 1 })), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.broker.published.lock().unwrap().is_empty());
}

#[tokio::test]
async fn blink_unknown_machine_or_dead_broker() {
    let app = app().await;
    let token = app.login("ops@example.com", "password123", true).await;

    let (status, _) = app
        .send(
            "POST",
            &format!("{PREFIX}/machines/missing/blink"),
            Some(json!({ "amount": 1 })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, created) = app
        .send(
            "POST",
            &format!("{PREFIX}/machines"),
            Some(machine("NYC", "5th", "12")),
            None,
        )
        .await;
    app.broker.refuse.store(true, Ordering::SeqCst);

    let (status, body) = app
        .send(
            "POST",
            &format!("{PREFIX}/machines/{}/blink", created["_id"].as_str().unwrap()),
            Some(json!({ "amount": 1 })),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "error": "Message broker unreachable" }));
}

#[tokio::test]
async fn health_is_outside_versioned_prefix() {
    let app = app().await;
    let (status, body) = app.send("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], "v1");
    assert_eq!(body["buildVersion"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["brokerConnected"], false);

    let (status, _) = app.send("GET", "/cwex/v2/machines", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
