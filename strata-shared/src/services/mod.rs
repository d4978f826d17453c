/// Component services
///
/// Each service owns one component's rules and talks to storage only through
/// [`Store`]. Every project-scoped operation resolves the target, then runs the
/// membership gate, then validates input:
///
/// 1. referenced entity missing: [`ServiceError::NotFound`]
/// 2. caller not a member: [`ServiceError::Forbidden`]
/// 3. bad input: [`ServiceError::Validation`]
///
/// - [`identity::IdentityService`]: registration, login, token refresh
/// - [`membership::MembershipLedger`]: projects and their members
/// - [`content::ContentRegistry`]: content items
/// - [`versions::VersionChain`]: append-only versions
/// - [`tags::TagIndex`]: global tags and content tagging
/// - [`search::SearchFacade`]: keyword search over member projects
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use strata_shared::auth::password::Argon2Params;
/// use strata_shared::services::Services;
/// use strata_shared::store::MemoryStore;
///
/// let services = Services::new(
///     Arc::new(MemoryStore::new()),
///     "a-secret-that-is-at-least-32-bytes!".to_string(),
///     Argon2Params::default(),
/// );
/// ```

pub mod content;
pub mod identity;
pub mod membership;
pub mod search;
pub mod tags;
pub mod versions;

use std::sync::Arc;

use crate::auth::authorization::AuthzError;
use crate::auth::jwt::JwtError;
use crate::auth::password::{Argon2Params, PasswordError};
use crate::store::{Store, StoreError};

/// Error type for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Input failed a business rule
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Credentials were wrong or missing
    #[error("{0}")]
    Unauthorized(String),

    /// Caller lacks access to the project
    #[error("{0}")]
    Forbidden(String),

    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness rule violated
    #[error("{0}")]
    Conflict(String),

    /// Storage failure
    #[error(transparent)]
    Store(StoreError),

    /// Password hashing failure
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Token failure
    #[error(transparent)]
    Jwt(#[from] JwtError),
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ServiceError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => ServiceError::NotFound(entity),
            StoreError::Conflict(message) => ServiceError::Conflict(message),
            other => ServiceError::Store(other),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotMember(_) => {
                ServiceError::Forbidden("You are not a member of this project".to_string())
            }
            AuthzError::InsufficientRole { required, .. } => {
                ServiceError::Forbidden(format!("This action requires the {} role", required))
            }
            AuthzError::Store(err) => err.into(),
        }
    }
}

/// Result alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Rejects values longer than the column that stores them
pub(crate) fn check_len(field: &'static str, value: &str, max: usize) -> ServiceResult<()> {
    if value.chars().count() > max {
        return Err(ServiceError::validation(
            field,
            format!("Must be at most {} characters", max),
        ));
    }
    Ok(())
}

/// Trims an optional text field, mapping blank to `None`
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// All services, sharing one store
///
/// Built once at startup and held in the HTTP layer's state.
#[derive(Clone)]
pub struct Services {
    pub identity: identity::IdentityService,
    pub membership: membership::MembershipLedger,
    pub content: content::ContentRegistry,
    pub versions: versions::VersionChain,
    pub tags: tags::TagIndex,
    pub search: search::SearchFacade,
    store: Arc<dyn Store>,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, jwt_secret: String, password_params: Argon2Params) -> Self {
        Self {
            identity: identity::IdentityService::new(store.clone(), jwt_secret, password_params),
            membership: membership::MembershipLedger::new(store.clone()),
            content: content::ContentRegistry::new(store.clone()),
            versions: versions::VersionChain::new(store.clone()),
            tags: tags::TagIndex::new(store.clone()),
            search: search::SearchFacade::new(store.clone()),
            store,
        }
    }

    /// Shared store, for readiness checks
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
}
