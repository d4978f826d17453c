/// Authenticated caller identity
///
/// The API's bearer-token middleware builds one from validated access-token
/// claims and inserts it into the request extensions. Handlers read it with
/// `Extension<AuthContext>`.
///
/// # Example
///
/// ```
/// use strata_shared::auth::context::AuthContext;
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let auth = AuthContext::new(user_id);
/// assert_eq!(auth.user_id, user_id);
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;

/// Authentication context added to request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

impl From<&Claims> for AuthContext {
    fn from(claims: &Claims) -> Self {
        Self::new(claims.sub)
    }
}
