use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Identity carried by a session token: exactly the email and user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub email: String,
    pub user_id: Uuid,
}

impl From<&User> for SessionClaims {
    fn from(u: &User) -> Self {
        Self {
            email: u.email.clone(),
            user_id: u.id,
        }
    }
}

/// JWT payload: the session claims plus the registered envelope fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TokenClaims {
    #[serde(flatten)]
    pub session: SessionClaims,
    pub iat: usize,     // issued at (unix timestamp)
    pub exp: usize,     // expires at (unix timestamp)
    pub iss: String,    // issuer
    pub aud: String,    // audience
}
