use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        claims::SessionClaims,
        dto::AuthResponse,
        jwt::TokenSigner,
        password::CredentialHasher,
        repo::UserStore,
        repo_types::{PublicUser, User},
    },
    error::AppError,
};

/// Password verified against when the email is unknown, so both failure
/// paths pay for one hash comparison.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

/// Registration, login and session issuing.
///
/// Email and password are expected to have passed request validation already.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    signer: Arc<dyn TokenSigner>,
    decoy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        signer: Arc<dyn TokenSigner>,
    ) -> Self {
        Self {
            users,
            hasher,
            signer,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Check email and password. Unknown email and wrong password fail the
    /// same way.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User, AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            let decoy = self
                .decoy_hash
                .get_or_try_init(|| self.hasher.hash(DECOY_PASSWORD))
                .await?;
            let _ = self.hasher.verify(password, decoy).await?;
            warn!(%email, "login unknown email");
            return Err(AppError::AuthenticationFailed);
        };

        if !self.hasher.verify(password, &user.password_hash).await? {
            warn!(%email, user_id = %user.id, "login invalid password");
            return Err(AppError::AuthenticationFailed);
        }
        Ok(user)
    }

    /// Sign a token for `user` and strip the credential from the view.
    pub fn issue(&self, user: User) -> Result<AuthResponse, AppError> {
        let token = self.signer.sign(&SessionClaims::from(&user))?;
        Ok(AuthResponse {
            token,
            user: PublicUser::from(user),
        })
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        if self.users.find_by_email(email).await?.is_some() {
            warn!(%email, "email already registered");
            return Err(AppError::DuplicateEmail);
        }

        let hash = self.hasher.hash(password).await?;
        let user = self.users.create(email, &hash).await?.ok_or_else(|| {
            warn!(%email, "email registered concurrently");
            AppError::DuplicateEmail
        })?;

        info!(user_id = %user.id, %email, "user registered");
        self.issue(user)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self.verify_credentials(email, password).await?;
        info!(user_id = %user.id, %email, "user logged in");
        self.issue(user)
    }

    /// Profile of the token holder. A token for a deleted account is
    /// treated as invalid.
    pub async fn current_user(&self, user_id: Uuid) -> Result<PublicUser, AppError> {
        let user = self.users.find_by_id(user_id).await?.ok_or_else(|| {
            warn!(%user_id, "token for unknown user");
            AppError::InvalidToken
        })?;
        Ok(user.into())
    }
}
