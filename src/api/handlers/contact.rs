//! Contact-form handler: validates and relays to Telegram.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ContactFormRequest, ContactFormResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};
use crate::notify::ContactMessage;

/// `POST /auth/contact-form`: Relay a contact-form submission.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] when the name is empty or the
/// email is missing or malformed.
#[utoipa::path(
    post,
    path = "/auth/contact-form",
    tag = "Contact",
    summary = "Submit the contact form",
    description = "Validates the submission and relays it to the configured Telegram chat. The relay runs after the response is sent; delivery failures are logged, never surfaced.",
    request_body = ContactFormRequest,
    responses(
        (status = 200, description = "Submission accepted", body = ContactFormResponse),
        (status = 400, description = "Missing or invalid name or email", body = ErrorResponse),
    )
)]
pub async fn contact_form(
    State(state): State<AppState>,
    Json(req): Json<ContactFormRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    if req.name.trim().is_empty() {
        return Err(GatewayError::InvalidRequest("name is required".to_string()));
    }
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(GatewayError::InvalidRequest(
            "a valid email is required".to_string(),
        ));
    }

    let message = ContactMessage {
        name: req.name,
        email: req.email,
        company_name: req.company_name,
        website: req.website,
        goals: req.goals,
    };
    let notifier = Arc::clone(&state.notifier);
    tokio::spawn(async move {
        if let Err(e) = notifier.send_contact_message(&message).await {
            tracing::warn!(error = %e, "contact relay failed");
        }
    });

    Ok((
        StatusCode::OK,
        Json(ContactFormResponse {
            status: "ok".to_string(),
        }),
    ))
}

/// Contact routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/contact-form", post(contact_form))
}
