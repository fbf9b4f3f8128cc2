mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use common::{harness, log_in};
use negobi_core::auth::{RecoveryError, RecoveryFlow, RecoveryState};
use negobi_core::Route;
use serde_json::{json, Value};

const EMAIL: &str = "ana@negobi.com";
const TAX_ID: &str = "J-40123456-7";

/// Recovery endpoints. The reset endpoint fails until `accept_reset` is set.
fn recovery_router(accept_reset: Arc<AtomicBool>) -> Router {
    Router::new()
        .route(
            "/api/auth/recover-password",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["taxId"], TAX_ID);
                Json(json!({"status": 200, "data": {"message": "Código enviado"}}))
            }),
        )
        .route(
            "/api/auth/validate-otp",
            post(|Json(body): Json<Value>| async move {
                if body["otp"] == "123456" {
                    (
                        StatusCode::OK,
                        Json(json!({"status": 200, "data": {"data": {"token": "temp-abc"}}})),
                    )
                } else {
                    (StatusCode::BAD_REQUEST, Json(json!({"message": "Código inválido"})))
                }
            }),
        )
        .route(
            "/api/auth/reset-password",
            post(move |headers: HeaderMap| {
                let accept = accept_reset.load(Ordering::SeqCst);
                async move {
                    assert_eq!(headers.get("authorization").unwrap(), "Bearer temp-abc");
                    if accept {
                        (StatusCode::OK, Json(json!({"status": 200, "data": {"message": "Listo"}})))
                    } else {
                        (StatusCode::BAD_REQUEST, Json(json!({"message": "Contraseña débil"})))
                    }
                }
            }),
        )
}

#[tokio::test]
async fn test_full_recovery_sequence() {
    let h = harness(recovery_router(Arc::new(AtomicBool::new(true)))).await;
    let mut flow = RecoveryFlow::new();

    flow.request(&h.sessions, EMAIL, TAX_ID).await.unwrap();
    assert!(matches!(flow.state(), RecoveryState::OtpPending { .. }));

    flow.validate(&h.sessions, "123456").await.unwrap();
    assert_eq!(h.store().temp_token().as_deref(), Some("temp-abc"));
    assert!(h.store().get().is_none());

    flow.set_password(&h.sessions, "Nueva123*").await.unwrap();
    assert_eq!(flow.state(), &RecoveryState::PasswordSet);
    assert_eq!(h.store().temp_token(), None);
    assert!(h.store().get().is_none());

    assert_eq!(
        h.navigator.routes(),
        vec![
            Route::NewPassword {
                email: EMAIL.to_string(),
                tax_id: TAX_ID.to_string()
            },
            Route::Login
        ]
    );
}

#[tokio::test]
async fn test_reset_uses_temp_token_not_session() {
    let h = harness(recovery_router(Arc::new(AtomicBool::new(true)))).await;
    log_in(h.store(), "session-token");
    h.store().set_temp_token("temp-abc");

    let outcome = h.sessions.reset_password(EMAIL, TAX_ID, "Nueva123*").await;

    assert!(outcome.is_success());
    let request = h.recorder.last();
    assert_eq!(request.header("authorization"), Some("Bearer temp-abc"));
    assert_eq!(h.store().access_token().as_deref(), Some("session-token"));
}

#[tokio::test]
async fn test_wrong_otp_keeps_flow_waiting() {
    let h = harness(recovery_router(Arc::new(AtomicBool::new(true)))).await;
    let mut flow = RecoveryFlow::resume(RecoveryState::OtpPending {
        email: EMAIL.to_string(),
        tax_id: TAX_ID.to_string(),
    });

    let err = flow.validate(&h.sessions, "000000").await.unwrap_err();

    assert_eq!(err, RecoveryError::Failed("Código inválido".to_string()));
    assert!(matches!(flow.state(), RecoveryState::OtpPending { .. }));
    assert_eq!(h.store().temp_token(), None);
    assert!(h.navigator.routes().is_empty());
}

#[tokio::test]
async fn test_failed_reset_keeps_temp_token_for_retry() {
    let accept = Arc::new(AtomicBool::new(false));
    let h = harness(recovery_router(accept.clone())).await;
    h.store().set_temp_token("temp-abc");
    let mut flow = RecoveryFlow::resume(RecoveryState::OtpValidated {
        email: EMAIL.to_string(),
        tax_id: TAX_ID.to_string(),
    });

    let err = flow.set_password(&h.sessions, "123").await.unwrap_err();
    assert_eq!(err, RecoveryError::Failed("Contraseña débil".to_string()));
    assert_eq!(h.store().temp_token().as_deref(), Some("temp-abc"));

    accept.store(true, Ordering::SeqCst);
    flow.set_password(&h.sessions, "Nueva123*").await.unwrap();
    assert_eq!(h.store().temp_token(), None);
}

#[tokio::test]
async fn test_reset_without_validated_otp_is_refused_locally() {
    let h = harness(recovery_router(Arc::new(AtomicBool::new(true)))).await;

    let outcome = h.sessions.reset_password(EMAIL, TAX_ID, "Nueva123*").await;

    assert!(!outcome.is_success());
    assert_eq!(h.recorder.count(), 0);
    assert_eq!(
        h.notifier.errors(),
        vec!["Debe validar el código antes de continuar".to_string()]
    );
}

#[tokio::test]
async fn test_login_discards_pending_temp_token() {
    let h = harness(Router::new()).await;
    h.store().set_temp_token("temp-abc");

    log_in(h.store(), "token");

    assert_eq!(h.store().temp_token(), None);
}
