/// Identity store: registration, authentication and tokens
///
/// Emails are trimmed and lowercased before they are stored or looked up, so
/// `A@X.com` and `a@x.com` are the same account. Login failures never reveal
/// whether the email or the password was wrong.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::{check_len, ServiceError, ServiceResult};
use crate::auth::context::AuthContext;
use crate::auth::jwt::{self, Claims, TokenType};
use crate::auth::password::{hash_password_with, verify_password, Argon2Params};
use crate::models::user::{normalize_email, CreateUser, User};
use crate::store::{Store, StoreError};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const MAX_EMAIL_LEN: usize = 255;
const MAX_USERNAME_LEN: usize = 100;

/// Access and refresh tokens issued at login
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Access token issued in exchange for a refresh token
#[derive(Debug, Clone, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn Store>,
    jwt_secret: Arc<str>,
    password_params: Argon2Params,
}

impl IdentityService {
    pub fn new(store: Arc<dyn Store>, jwt_secret: String, password_params: Argon2Params) -> Self {
        Self {
            store,
            jwt_secret: jwt_secret.into(),
            password_params,
        }
    }

    /// Creates an account
    ///
    /// # Errors
    ///
    /// - `Validation` if email, username or password is missing, too long or
    ///   malformed, and if the email is already registered
    pub async fn register(&self, email: &str, username: &str, password: &str) -> ServiceResult<User> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(ServiceError::validation("email", "Email is required"));
        }
        if !email.contains('@') {
            return Err(ServiceError::validation("email", "Invalid email format"));
        }
        check_len("email", &email, MAX_EMAIL_LEN)?;

        let username = username.trim();
        if username.is_empty() {
            return Err(ServiceError::validation("username", "Username is required"));
        }
        check_len("username", username, MAX_USERNAME_LEN)?;
        if password.is_empty() {
            return Err(ServiceError::validation("password", "Password is required"));
        }

        let password_hash = hash_password_with(password, &self.password_params)?;

        let user = self
            .store
            .insert_user(CreateUser {
                email,
                username: username.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    ServiceError::validation("email", "Email already registered")
                }
                other => other.into(),
            })?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Checks credentials and issues a token pair
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<(User, TokenPair)> {
        let email = normalize_email(email);

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            debug!("Login failed: unknown email");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(password, &user.password_hash)? {
            debug!(user_id = %user.id, "Login failed: wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let tokens = self.issue_tokens(user.id)?;
        info!(user_id = %user.id, "User logged in");
        Ok((user, tokens))
    }

    /// Validates an access token and returns the caller identity
    pub fn verify_token(&self, token: &str) -> ServiceResult<AuthContext> {
        let claims = jwt::validate_access_token(token, &self.jwt_secret)?;
        Ok(AuthContext::from(&claims))
    }

    /// Exchanges a refresh token for a new access token
    ///
    /// Fails with `Unauthorized` if the account was deleted after the refresh
    /// token was issued.
    pub async fn refresh(&self, refresh_token: &str) -> ServiceResult<AccessToken> {
        let (access_token, claims) = jwt::refresh_access_token(refresh_token, &self.jwt_secret)?;

        if self.store.find_user_by_id(claims.sub).await?.is_none() {
            return Err(ServiceError::Unauthorized("Account no longer exists".to_string()));
        }

        Ok(AccessToken {
            access_token,
            token_type: "Bearer",
            expires_in: claims.expires_in_seconds(),
        })
    }

    fn issue_tokens(&self, user_id: Uuid) -> ServiceResult<TokenPair> {
        let access_claims = Claims::new(user_id, TokenType::Access);
        let refresh_claims = Claims::new(user_id, TokenType::Refresh);

        Ok(TokenPair {
            access_token: jwt::create_token(&access_claims, &self.jwt_secret)?,
            refresh_token: jwt::create_token(&refresh_claims, &self.jwt_secret)?,
            token_type: "Bearer",
            expires_in: access_claims.expires_in_seconds(),
        })
    }
}
