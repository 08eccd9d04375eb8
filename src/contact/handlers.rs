use axum::{extract::State, routing::post, Json, Router};
use tracing::{error, info, instrument};

use super::{
    dto::{ContactRequest, PartnerInquiryRequest},
    services::{contact_email, partner_inquiry_email},
};
use crate::{
    auth::dto::MessageResponse,
    error::{ApiError, ApiResult, PublicMessage},
    mailer::OutgoingEmail,
    state::AppState,
};

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/contact", post(send_contact))
        .route("/contact/partner", post(send_partner_inquiry))
}

async fn deliver(state: &AppState, email: OutgoingEmail) -> ApiResult<()> {
    state.mailer.send(email).await.map_err(|e| {
        error!(error = ?e, "contact email failed");
        ApiError::Internal(e.context(PublicMessage("Failed to send message")))
    })
}

#[instrument(skip(state, payload))]
pub async fn send_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> ApiResult<Json<MessageResponse>> {
    payload.validate()?;
    deliver(&state, contact_email(&state.config.mail.contact_inbox, &payload)).await?;
    info!("contact message forwarded");
    Ok(Json(MessageResponse::new("Message sent successfully")))
}

#[instrument(skip(state, payload))]
pub async fn send_partner_inquiry(
    State(state): State<AppState>,
    Json(payload): Json<PartnerInquiryRequest>,
) -> ApiResult<Json<MessageResponse>> {
    payload.validate()?;
    deliver(
        &state,
        partner_inquiry_email(&state.config.mail.contact_inbox, &payload),
    )
    .await?;
    info!(company = %payload.company.trim(), "partner inquiry forwarded");
    Ok(Json(MessageResponse::new("Inquiry sent successfully")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{app::build_app, mailer::testing::RecordingMailer, state::AppState};

    fn post(path: &str, body: &str) -> Request<Body> {
        Request::post(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn contact_is_mailed_to_inbox() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = build_app(AppState::fake_with_mailer(mailer.clone()));
        let res = app
            .oneshot(post(
                "/api/contact",
                r#"{"name":"Ada","email":"ada@example.com","message":"Hello"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ops@example.com");
        assert_eq!(sent[0].reply_to.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn invalid_contact_sends_nothing() {
        let mailer = Arc::new(RecordingMailer::default());
        let app = build_app(AppState::fake_with_mailer(mailer.clone()));
        let res = app
            .oneshot(post(
                "/api/contact",
                r#"{"name":"Ada","email":"nope","message":"Hello"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mail_failure_is_a_server_error() {
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let app = build_app(AppState::fake_with_mailer(mailer));
        let res = app
            .oneshot(post(
                "/api/contact/partner",
                r#"{"company":"Jet FBO","name":"Ada","email":"ada@example.com","message":"Hi"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Failed to send message");
    }
}
