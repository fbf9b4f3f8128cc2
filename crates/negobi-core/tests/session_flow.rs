mod common;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use common::{harness, log_in, settle, API_KEY};
use negobi_core::effects::Level;
use negobi_core::{HookOutcome, Route};
use serde_json::{json, Value};

fn login_router() -> Router {
    Router::new().route(
        "/api/auth/login",
        post(|Json(body): Json<Value>| async move {
            if body["password"] == "correcta" {
                (
                    StatusCode::OK,
                    Json(json!({
                        "status": 200,
                        "data": {
                            "data": {
                                "accessToken": "access-1",
                                "refreshToken": "refresh-1",
                                "expiresIn": 3600,
                                "user": {
                                    "id": 7,
                                    "email": "ana@negobi.com",
                                    "firstName": "Ana",
                                    "role": "sales",
                                    "companyTaxId": "J-40123456-7"
                                }
                            },
                            "message": "Bienvenida, Ana"
                        }
                    })),
                )
            } else {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"message": "Credenciales inválidas"})),
                )
            }
        }),
    )
}

#[tokio::test]
async fn test_login_stores_session_and_navigates() {
    let h = harness(login_router()).await;

    let outcome = h.sessions.login("ana@negobi.com", "correcta", true).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.status(), Some(200));
    let session = h.store().get().unwrap();
    assert_eq!(session.access_token, "access-1");
    assert_eq!(session.refresh_token, "refresh-1");
    assert!(session.expires_at.is_some());
    assert_eq!(h.store().company_tax_id().as_deref(), Some("J-40123456-7"));
    assert!(h.store().remember_me());
    assert_eq!(h.navigator.routes(), vec![Route::Dashboard]);
    assert!(!h.sessions.busy().is_busy());

    let notes = h.notifier.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, Level::Success);
    assert_eq!(notes[0].message, "Bienvenida, Ana");
}

#[tokio::test]
async fn test_login_request_is_unauthenticated() {
    let h = harness(login_router()).await;

    h.sessions.login("ana@negobi.com", "correcta", false).await;

    let request = h.recorder.last();
    assert_eq!(request.path, "/api/auth/login");
    assert_eq!(request.header("authorization"), None);
    assert_eq!(request.header("x-api-key"), None);
    assert_eq!(request.header("language"), Some("es"));
}

#[tokio::test]
async fn test_wrong_password_keeps_store_and_does_not_redirect() {
    let h = harness(login_router()).await;
    log_in(h.store(), "previous");
    let before = h.store().snapshot();

    let outcome = h.sessions.login("ana@negobi.com", "incorrecta", false).await;

    assert_eq!(
        outcome,
        HookOutcome::Failure {
            status: Some(401),
            message: "Credenciales inválidas".to_string()
        }
    );
    assert_eq!(h.store().snapshot(), before);
    assert_eq!(h.notifier.errors(), vec!["Credenciales inválidas".to_string()]);

    settle().await;
    assert!(h.navigator.routes().is_empty());
    assert!(!h.sessions.busy().is_busy());
}

#[tokio::test]
async fn test_empty_credentials_never_reach_backend() {
    let h = harness(login_router()).await;

    let outcome = h.sessions.login("  ", "", false).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.status(), None);
    assert_eq!(h.recorder.count(), 0);
    assert_eq!(h.notifier.errors().len(), 1);
}

#[tokio::test]
async fn test_network_failure_has_no_status() {
    // Nothing listens on port 9.
    let h = harness(Router::new()).await;
    let settings = negobi_core::ClientSettings {
        base_url: "http://127.0.0.1:9/api".to_string(),
        ..negobi_core::ClientSettings::default()
    };
    let api = negobi_core::ApiClient::new(settings, h.store().clone(), h.effects.clone()).unwrap();
    let sessions = negobi_core::SessionService::new(api, h.effects.clone());

    let outcome = sessions.login("ana@negobi.com", "correcta", false).await;

    assert_eq!(outcome.status(), None);
    assert_eq!(h.notifier.errors(), vec!["No se pudo conectar con el servidor".to_string()]);
    assert!(h.store().get().is_none());
}

#[tokio::test]
async fn test_logout_is_local_and_redirects_after_delay() {
    let h = harness(Router::new()).await;
    log_in(h.store(), "token");

    let outcome = h.sessions.logout().await;

    assert!(outcome.is_success());
    assert!(h.store().get().is_none());
    assert!(h.store().user().is_none());
    assert_eq!(h.recorder.count(), 0);
    assert!(h.navigator.routes().is_empty());

    settle().await;
    assert_eq!(h.navigator.routes(), vec![Route::Login]);
}

#[tokio::test]
async fn test_change_password_sends_session_headers() {
    let router = Router::new().route(
        "/api/auth/change-password",
        post(|| async { Json(json!({"status": 200, "data": {"message": "Contraseña cambiada"}})) }),
    );
    let h = harness(router).await;
    log_in(h.store(), "token-9");

    let outcome = h.sessions.change_password("vieja", "nueva").await;

    assert!(outcome.is_success());
    let request = h.recorder.last();
    assert_eq!(request.header("authorization"), Some("Bearer token-9"));
    assert_eq!(request.header("x-api-key"), Some(API_KEY));
    assert_eq!(h.notifier.notifications()[0].message, "Contraseña cambiada");
}

#[tokio::test]
async fn test_change_password_requires_session() {
    let h = harness(Router::new()).await;

    let outcome = h.sessions.change_password("vieja", "nueva").await;

    assert!(!outcome.is_success());
    assert_eq!(h.recorder.count(), 0);
}

#[tokio::test]
async fn test_refresh_keeps_refresh_token_when_not_rotated() {
    let router = Router::new().route(
        "/api/auth/refresh",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["refreshToken"], "token-refresh");
            Json(json!({"status": 201, "data": {"data": {"accessToken": "access-2", "refreshToken": ""}}}))
        }),
    );
    let h = harness(router).await;
    log_in(h.store(), "token");

    let outcome = h.sessions.refresh().await;

    assert_eq!(outcome.status(), Some(201));
    let session = h.store().get().unwrap();
    assert_eq!(session.access_token, "access-2");
    assert_eq!(session.refresh_token, "token-refresh");
}

#[tokio::test]
async fn test_login_with_out_of_range_expiry_uses_token_lifetime() {
    let router = Router::new().route(
        "/api/auth/login",
        post(|| async {
            Json(json!({
                "status": 200,
                "data": {"data": {"accessToken": "access-1", "refreshToken": "refresh-1", "expiresIn": i64::MAX}}
            }))
        }),
    );
    let h = harness(router).await;

    let outcome = h.sessions.login("ana@negobi.com", "correcta", false).await;

    assert!(outcome.is_success());
    let session = h.store().get().unwrap();
    assert_eq!(session.expires_at, None);
    assert!(!h.store().is_expired(chrono::Utc::now()));
    assert_eq!(h.navigator.routes(), vec![Route::Dashboard]);
}
