use bcrypt::verify;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use sqlx::MySqlPool;
use actix_web::web;
use actix_web::HttpMessage;
use validator::Validate;
use actix_web::{HttpRequest, dev::ServiceRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use crate::error::{ApiError, ApiResult};
use crate::repositories::TenantScope;

// ======== USER MODEL ========

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub user_code: String,
    pub company_code: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub failed_login_attempts: i32,
    pub locked_until: Option<DateTime<Utc>>,
}

// ======== REQUEST/RESPONSE STRUCTS ========

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub user_code: String,
    pub company_code: String,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            user_code: user.user_code,
            company_code: user.company_code,
            last_login: user.last_login,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub username: String,
    pub user_code: String,
    pub company_code: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    /// Report rows visible to the bearer of this token.
    pub fn tenant(&self) -> TenantScope {
        TenantScope {
            user_code: self.user_code.clone(),
            company_code: self.company_code.clone(),
        }
    }
}

// ======== AUTH SERVICE ========

pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_lifetime: Duration,
}

impl AuthService {
    pub fn new(jwt_secret: &str, token_expiration_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_lifetime: Duration::hours(token_expiration_hours),
        }
    }

    pub fn token_lifetime_seconds(&self) -> i64 {
        self.token_lifetime.num_seconds()
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
        verify(password, hash)
    }

    pub fn generate_token(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + self.token_lifetime;

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            user_code: user.user_code.clone(),
            company_code: user.company_code.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| ApiError::AuthError("Failed to generate token".to_string()))
    }

    pub fn verify_token(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                match err.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature =>
                        ApiError::AuthError("Token expired".to_string()),
                    jsonwebtoken::errors::ErrorKind::InvalidToken =>
                        ApiError::AuthError("Invalid token".to_string()),
                    _ =>
                        ApiError::AuthError("Token verification failed".to_string()),
                }
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Open,
    Locked,
    /// Lock time has passed but the failed-attempt counter is still set.
    Expired,
}

// ======== USER METHODS ========

const USER_COLUMNS: &str = "id, username, email, password_hash, user_code, company_code, \
     is_active, last_login, failed_login_attempts, locked_until";

impl User {
    pub async fn find_by_username(pool: &MySqlPool, username: &str) -> ApiResult<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE username = ?", USER_COLUMNS))
            .bind(username)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub fn lock_state(&self, now: DateTime<Utc>) -> LockState {
        match self.locked_until {
            Some(locked_until) if now < locked_until => LockState::Locked,
            Some(_) => LockState::Expired,
            None => LockState::Open,
        }
    }

    /// Counts one wrong password. Returns true when the account must be locked.
    pub fn register_failed_attempt(&mut self, max_attempts: i32) -> bool {
        self.failed_login_attempts += 1;
        self.failed_login_attempts >= max_attempts
    }

    /// Forgets failed attempts and any lock. Returns false when there was nothing to clear.
    pub fn clear_lockout(&mut self) -> bool {
        if self.failed_login_attempts == 0 && self.locked_until.is_none() {
            return false;
        }
        self.failed_login_attempts = 0;
        self.locked_until = None;
        true
    }

    pub async fn update_last_login(&self, pool: &MySqlPool) -> ApiResult<()> {
        sqlx::query("UPDATE users SET last_login = UTC_TIMESTAMP() WHERE id = ?")
            .bind(&self.id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn save_failed_attempts(&self, pool: &MySqlPool) -> ApiResult<()> {
        sqlx::query("UPDATE users SET failed_login_attempts = ? WHERE id = ?")
            .bind(self.failed_login_attempts)
            .bind(&self.id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn lock_for_duration(&mut self, pool: &MySqlPool, duration: Duration) -> ApiResult<()> {
        self.locked_until = Some(Utc::now() + duration);
        sqlx::query("UPDATE users SET locked_until = ? WHERE id = ?")
            .bind(self.locked_until)
            .bind(&self.id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn reset_failed_attempts(&mut self, pool: &MySqlPool) -> ApiResult<()> {
        if !self.clear_lockout() {
            return Ok(());
        }
        sqlx::query(
            "UPDATE users SET failed_login_attempts = 0, locked_until = NULL WHERE id = ?"
        )
            .bind(&self.id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

// ======== HELPER FUNCTIONS ========

pub fn get_current_user(req: &HttpRequest) -> ApiResult<Claims> {
    req.extensions()
        .get::<Claims>().cloned()
        .ok_or_else(|| ApiError::Unauthorized("No user information found".to_string()))
}

// ======== JWT MIDDLEWARE ========

pub async fn jwt_middleware(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (actix_web::Error, ServiceRequest)> {
    let token = credentials.token();

    let auth_service = match req.app_data::<web::Data<std::sync::Arc<AuthService>>>() {
        Some(svc) => svc,
        None => {
            log::error!("AuthService not found in app data");
            return Err((
                ApiError::InternalServerError("Auth service not available".to_string()).into(),
                req,
            ));
        }
    };

    match auth_service.verify_token(token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(req)
        }
        Err(err) => {
            log::warn!("JWT verification failed: {}", err);
            Err((err.into(), req))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit_test_secret_with_enough_length_0123";

    fn user() -> User {
        User {
            id: "u-1".to_string(),
            username: "amina".to_string(),
            email: "amina@example.com".to_string(),
            password_hash: bcrypt::hash("Secret123", 4).unwrap(),
            user_code: "USR01".to_string(),
            company_code: "CMP01".to_string(),
            is_active: true,
            last_login: None,
            failed_login_attempts: 0,
            locked_until: None,
        }
    }

    #[test]
    fn test_token_carries_tenant() {
        let service = AuthService::new(SECRET, 24);
        let token = service.generate_token(&user()).unwrap();
        let claims = service.verify_token(&token).unwrap();

        assert_eq!(claims.sub, "u-1");
        assert_eq!(
            claims.tenant(),
            TenantScope { user_code: "USR01".to_string(), company_code: "CMP01".to_string() }
        );
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let issuer = AuthService::new("another_secret_that_is_long_enough_xyz", 24);
        let token = issuer.generate_token(&user()).unwrap();

        let service = AuthService::new(SECRET, 24);
        assert!(matches!(service.verify_token(&token), Err(ApiError::AuthError(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        // leeway по умолчанию 60 секунд
        let service = AuthService::new(SECRET, -1);
        let token = service.generate_token(&user()).unwrap();
        match service.verify_token(&token) {
            Err(ApiError::AuthError(msg)) => assert_eq!(msg, "Token expired"),
            other => panic!("unexpected: {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_verify_password() {
        let service = AuthService::new(SECRET, 24);
        let user = user();
        assert!(service.verify_password("Secret123", &user.password_hash).unwrap());
        assert!(!service.verify_password("wrong", &user.password_hash).unwrap());
    }

    #[test]
    fn test_lock_state() {
        let now = Utc::now();
        let mut user = user();
        assert_eq!(user.lock_state(now), LockState::Open);

        user.locked_until = Some(now + Duration::minutes(5));
        assert_eq!(user.lock_state(now), LockState::Locked);

        user.locked_until = Some(now - Duration::minutes(5));
        assert_eq!(user.lock_state(now), LockState::Expired);
    }

    #[test]
    fn test_failed_attempts_reach_lock_threshold() {
        let mut user = user();
        assert!(!user.register_failed_attempt(3));
        assert!(!user.register_failed_attempt(3));
        assert!(user.register_failed_attempt(3));
        assert_eq!(user.failed_login_attempts, 3);
    }

    #[test]
    fn test_expired_lock_gives_a_fresh_set_of_attempts() {
        let mut clean = user();
        assert!(!clean.clear_lockout());

        let mut user = user();
        user.failed_login_attempts = 5;
        user.locked_until = Some(Utc::now() - Duration::minutes(1));
        assert_eq!(user.lock_state(Utc::now()), LockState::Expired);

        assert!(user.clear_lockout());
        assert_eq!(user.lock_state(Utc::now()), LockState::Open);
        // one wrong password after the lock ran out must not relock
        assert!(!user.register_failed_attempt(5));
        assert_eq!(user.failed_login_attempts, 1);
    }
}
