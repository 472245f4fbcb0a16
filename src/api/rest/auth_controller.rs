use crate::api::rest::forms::JsonBody;
use crate::api::rest::{ApiResult, AppState, OrApi};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EmailRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub oob_code: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub id_token: String,
    pub refresh_token: String,
    pub username: String,
    pub uid: String,
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/send-verification-email", post(send_verification_email))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or_default()
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let uid = state
        .auth_service
        .register(text(&body.email), text(&body.password), text(&body.username))
        .await
        .or_api("Registration failed")?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Registration successful", "userId": uid })),
    ))
}

pub async fn send_verification_email(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<EmailRequest>,
) -> ApiResult<Json<Value>> {
    state
        .auth_service
        .send_verification_email(text(&body.email))
        .await
        .or_api("Failed to send verification email")?;

    Ok(Json(json!({ "message": "Verification email sent" })))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = state
        .auth_service
        .login(text(&body.email), text(&body.password))
        .await
        .or_api("Login failed")?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        id_token: outcome.tokens.id_token,
        refresh_token: outcome.tokens.refresh_token,
        username: outcome.username,
        uid: outcome.uid,
    }))
}

/// Tokens are dropped by the client; nothing is kept server-side
pub async fn logout() -> Json<Value> {
    info!("Logout requested");
    Json(json!({ "message": "Logged out. Remove the token on the client." }))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<EmailRequest>,
) -> ApiResult<Json<Value>> {
    state
        .auth_service
        .forgot_password(text(&body.email))
        .await
        .or_api("Failed to send password reset link")?;

    Ok(Json(json!({ "message": "Password reset link sent" })))
}

pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ResetPasswordRequest>,
) -> ApiResult<Json<Value>> {
    state
        .auth_service
        .reset_password(text(&body.oob_code), text(&body.new_password))
        .await
        .or_api("Failed to change password")?;

    Ok(Json(json!({ "message": "Password updated" })))
}
