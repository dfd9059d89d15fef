use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use rand::rngs::OsRng;
use tracing::error;

/// One-way salted password hashing.
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash(&self, plain: &str) -> anyhow::Result<String>;
    async fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool>;
}

/// Argon2id hasher. Work runs on the blocking pool.
///
/// The cost is fixed: 19 MiB memory, 2 iterations, parallelism 1
/// (`Params::DEFAULT`). Hashes embed their own parameters, so verification
/// keeps working for hashes produced under a different cost.
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self {
            params: Params::DEFAULT,
        }
    }

    #[cfg(test)]
    pub fn fast() -> Self {
        Self {
            params: Params::new(1024, 1, 1, None).unwrap(),
        }
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_with(params: Params, plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

fn verify_with(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[async_trait]
impl CredentialHasher for Argon2Hasher {
    async fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let params = self.params.clone();
        let plain = plain.to_owned();
        tokio::task::spawn_blocking(move || hash_with(params, &plain))
            .await
            .context("hash task")?
    }

    async fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let plain = plain.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || verify_with(&plain, &hash))
            .await
            .context("verify task")?
    }
}
