//! User handlers: login, logout, profile, referrals, points history.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    LoginRequest, LoginResponse, PointsEntryDto, PointsHistoryResponse, ProfileResponse,
    ReferralListResponse, UserDto,
};
use crate::api::session::{authenticate, clear_session_cookie, session_cookie};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /user/login`: Wallet login; registers on first contact.
///
/// # Errors
///
/// Returns [`GatewayError`] on validation failure or conflicting email.
#[utoipa::path(
    post,
    path = "/user/login",
    tag = "User",
    summary = "Wallet login / registration",
    description = "Logs a wallet in, creating the user on first contact. First contact awards registration points and honors an optional referral code; later logins promote the user to connected. Sets the session cookie.",
    request_body = LoginRequest,
    responses(
        (status = 201, description = "New user registered", body = LoginResponse),
        (status = 200, description = "Existing user logged in", body = LoginResponse),
        (status = 400, description = "Missing wallet or contact details", body = ErrorResponse),
        (status = 409, description = "Email belongs to another wallet", body = ErrorResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let outcome = state
        .user_service
        .login(&req.wallet_address, req.email, req.phone, req.referral_code)
        .await?;

    let cookie = session_cookie(&state.sessions.issue(outcome.user.id));
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let body = LoginResponse {
        user: UserDto::from(outcome.user),
        created: outcome.created,
    };

    Ok((status, [(header::SET_COOKIE, cookie)], Json(body)))
}

/// `POST /user/logout`: Clears the session cookie.
#[utoipa::path(
    post,
    path = "/user/logout",
    tag = "User",
    summary = "Logout",
    description = "Clears the session cookie. Always succeeds.",
    responses(
        (status = 204, description = "Session cleared"),
    )
)]
pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    )
}

/// `GET /user/me`: The authenticated user's profile and points total.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] without a valid session.
#[utoipa::path(
    get,
    path = "/user/me",
    tag = "User",
    summary = "Current user profile",
    description = "Returns the authenticated user's record and derived points total.",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
    )
)]
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = authenticate(&state.sessions, &headers)?;
    let user = state.user_service.get(user_id).await?;
    let points_total = state.user_service.points_total(user_id).await;

    Ok(Json(ProfileResponse {
        user: UserDto::from(user),
        points_total,
    }))
}

/// `GET /user/referrals`: Referrals made by the authenticated user.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] without a valid session.
#[utoipa::path(
    get,
    path = "/user/referrals",
    tag = "User",
    summary = "List own referrals",
    description = "Returns every referral where the authenticated user is the referrer, with checklist progress and reward status.",
    responses(
        (status = 200, description = "Referral list", body = ReferralListResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
    )
)]
pub async fn referrals(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = authenticate(&state.sessions, &headers)?;
    let referrals = state.user_service.referrals_of(user_id).await;

    Ok(Json(ReferralListResponse {
        referrals: referrals.into_iter().map(Into::into).collect(),
    }))
}

/// `GET /user/points-history`: The authenticated user's points log.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] without a valid session.
#[utoipa::path(
    get,
    path = "/user/points-history",
    tag = "User",
    summary = "Points history",
    description = "Returns the authenticated user's points events oldest first, plus the derived total. The total is always the sum of the entries.",
    responses(
        (status = 200, description = "Points history", body = PointsHistoryResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
    )
)]
pub async fn points_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = authenticate(&state.sessions, &headers)?;
    let total = state.user_service.points_total(user_id).await;
    let entries = state.user_service.points_history(user_id).await;

    Ok(Json(PointsHistoryResponse {
        total,
        entries: entries.into_iter().map(PointsEntryDto::from).collect(),
    }))
}

/// User routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/login", post(login))
        .route("/user/logout", post(logout))
        .route("/user/me", get(me))
        .route("/user/referrals", get(referrals))
        .route("/user/points-history", get(points_history))
}
