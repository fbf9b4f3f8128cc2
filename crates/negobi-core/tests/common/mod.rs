//! In-process backend for integration tests.
//!
//! Each test builds an axum `Router` with the endpoints it needs (paths
//! under `/api`), serves it on an ephemeral port and points a real
//! `ApiClient` at it. Every request is recorded so tests can assert on the
//! headers the client sent.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use chrono::Utc;
use negobi_core::api::{ApiClient, ClientSettings};
use negobi_core::auth::{CredentialStore, Role, SessionData, SessionService};
use negobi_core::effects::{recording, MemoryNavigator, MemoryNotifier};
use negobi_core::models::UserProfile;
use negobi_core::Effects;
use tokio::net::TcpListener;

pub const API_KEY: &str = "test-api-key";

/// Short enough to keep tests fast, long enough to observe "not yet".
pub const REDIRECT_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Recorder {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> RecordedRequest {
        self.requests().pop().expect("no request recorded")
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn record(State(recorder): State<Recorder>, request: Request, next: Next) -> Response {
    recorder.requests.lock().unwrap().push(RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        headers: request.headers().clone(),
    });
    next.run(request).await
}

/// Serve `router` on 127.0.0.1 and return the API base URL.
pub async fn serve(router: Router) -> (String, Recorder) {
    let recorder = Recorder::default();
    let app = router.layer(middleware::from_fn_with_state(recorder.clone(), record));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/api", addr), recorder)
}

pub struct Harness {
    pub api: ApiClient,
    pub sessions: SessionService,
    pub effects: Effects,
    pub notifier: MemoryNotifier,
    pub navigator: MemoryNavigator,
    pub recorder: Recorder,
}

impl Harness {
    pub fn store(&self) -> &CredentialStore {
        self.api.store()
    }
}

pub async fn harness(router: Router) -> Harness {
    let (base_url, recorder) = serve(router).await;
    let (effects, notifier, navigator) = recording();

    let settings = ClientSettings {
        base_url,
        api_key: API_KEY.to_string(),
        session_expired_redirect: REDIRECT_DELAY,
        ..ClientSettings::default()
    };
    let api = ApiClient::new(settings, CredentialStore::in_memory(), effects.clone()).unwrap();
    let sessions = SessionService::new(api.clone(), effects.clone()).with_logout_redirect(REDIRECT_DELAY);

    Harness {
        api,
        sessions,
        effects,
        notifier,
        navigator,
        recorder,
    }
}

pub fn profile(role: Role) -> UserProfile {
    UserProfile {
        id: 7,
        email: "ana@negobi.com".to_string(),
        first_name: Some("Ana".to_string()),
        last_name: Some("Pérez".to_string()),
        role,
        company_id: Some(3),
        company_tax_id: Some("J-40123456-7".to_string()),
    }
}

/// Put a logged-in session straight into the store.
pub fn log_in(store: &CredentialStore, token: &str) {
    let session = SessionData::new(token.to_string(), format!("{}-refresh", token), Utc::now()).expiring_in(3600);
    store.set_login(session, Some(profile(Role::SuperAdmin)), Some("J-40123456-7".to_string()));
}

/// Wait past the redirect delay so scheduled navigations have fired.
pub async fn settle() {
    tokio::time::sleep(REDIRECT_DELAY * 3).await;
}
