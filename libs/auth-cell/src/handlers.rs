use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::HeaderMap,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{LoginRequest, LoginResponse, TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::bearer_token;
use shared_utils::jwt::validate_token as check_token;

use crate::models::AuthError;
use crate::services::OperatorService;

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Auth(err.to_string()),
            AuthError::BadHash(_) | AuthError::Token(_) => AppError::Internal(err.to_string()),
            AuthError::Store(e) => AppError::Persistence(e.to_string()),
        }
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_value = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    bearer_token(auth_value).map(str::to_string)
}

pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    debug!("Login request for {}", request.username.trim());

    let response = OperatorService::new(&config).login(&request.username, &request.password)?;
    Ok(Json(response))
}

pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;
    let user = check_token(&token, &config.jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        role: user.role,
    }))
}

pub async fn verify_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    debug!("Verifying token");

    let token = extract_bearer_token(&headers)?;
    let valid = check_token(&token, &config.jwt_secret).is_ok();

    Ok(Json(json!({ "valid": valid })))
}

pub async fn get_profile(Extension(user): Extension<User>) -> Json<Value> {
    debug!("Getting profile for operator: {}", user.id);

    Json(json!({
        "user_id": user.id,
        "role": user.role
    }))
}
