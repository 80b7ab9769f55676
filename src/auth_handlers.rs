// src/auth_handlers.rs - Authentication route handlers

use actix_web::{web, HttpResponse};
use validator::Validate;
use std::sync::Arc;
use chrono::{Duration, Utc};

use crate::handlers::ApiResponse;
use crate::auth::{AuthService, LockState, LoginRequest, LoginResponse, User};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

// ======== AUTH HANDLERS ========

pub async fn login(
    app_state: web::Data<Arc<AppState>>,
    auth_service: web::Data<Arc<AuthService>>,
    request: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    request.validate()?;
    let pool = &app_state.db_pool;
    let auth_config = &app_state.config.auth;

    // Одинаковый ответ для неизвестного логина и неверного пароля
    let mut user = match User::find_by_username(pool, &request.username).await {
        Ok(user) => user,
        Err(ApiError::NotFound(_)) => {
            return Err(ApiError::BadRequest("Invalid username or password".to_string()));
        }
        Err(err) => return Err(err),
    };

    if !user.is_active {
        return Err(ApiError::Forbidden("Account is disabled".to_string()));
    }

    match user.lock_state(Utc::now()) {
        LockState::Locked => {
            return Err(ApiError::AuthError("Account is temporarily locked. Try again later.".to_string()));
        }
        // Блокировка истекла: счётчик попыток начинается заново
        LockState::Expired => user.reset_failed_attempts(pool).await?,
        LockState::Open => {}
    }

    if !auth_service.verify_password(&request.password, &user.password_hash)
        .map_err(|_| ApiError::InternalServerError("Password verification failed".to_string()))? {

        let must_lock = user.register_failed_attempt(auth_config.max_login_attempts);
        user.save_failed_attempts(pool).await?;

        if must_lock {
            user.lock_for_duration(pool, Duration::minutes(auth_config.lockout_duration_minutes)).await?;
            log::warn!("User {} locked after {} failed attempts", user.username, user.failed_login_attempts);
            return Err(ApiError::AuthError(format!(
                "Account locked due to too many failed attempts. Try again in {} minutes.",
                auth_config.lockout_duration_minutes
            )));
        }

        return Err(ApiError::BadRequest("Invalid username or password".to_string()));
    }

    user.reset_failed_attempts(pool).await?;
    user.update_last_login(pool).await?;

    let token = auth_service.generate_token(&user)?;

    let response = LoginResponse {
        token,
        expires_in: auth_service.token_lifetime_seconds(),
        user: user.clone().into(),
    };

    log::info!("User {} ({}) logged in", user.username, user.company_code);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        response,
        "Login successful".to_string(),
    )))
}
