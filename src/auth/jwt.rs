use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};

use crate::{
    auth::claims::{SessionClaims, TokenClaims},
    config::JwtConfig,
    error::AppError,
};

/// Issues and verifies bearer tokens for a session.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &SessionClaims) -> Result<String, AppError>;

    /// Rejects tampered, expired or foreign tokens with `InvalidToken`.
    fn verify(&self, token: &str) -> Result<SessionClaims, AppError>;
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64) * 60),
        }
    }
}

impl TokenSigner for JwtKeys {
    fn sign(&self, claims: &SessionClaims) -> Result<String, AppError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let payload = TokenClaims {
            session: claims.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &payload, &self.encoding)
            .map_err(|e| anyhow::anyhow!("jwt encode: {e}"))?;
        debug!(user_id = %claims.user_id, "jwt signed");
        Ok(token)
    }

    fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<TokenClaims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            AppError::InvalidToken
        })?;
        debug!(user_id = %data.claims.session.user_id, "jwt verified");
        Ok(data.claims.session)
    }
}

/// Verified caller identity taken from `Authorization: Bearer <token>`.
pub struct AuthUser(pub SessionClaims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(AppError::InvalidToken)?;

        match keys.verify(token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(e) => {
                warn!("invalid or expired token");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
        })
    }

    fn claims() -> SessionClaims {
        SessionClaims {
            email: "reader@example.com".into(),
            user_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn sign_and_verify_roundtrip_keeps_claims_shape() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let original = claims();
        let token = keys.sign(&original).expect("sign");
        let verified = keys.verify(&token).expect("verify");
        assert_eq!(verified, original);
    }

    #[test]
    fn payload_carries_only_email_and_user_id_besides_envelope() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign(&claims()).expect("sign");

        let mut validation = Validation::default();
        validation.set_audience(&["aud"]);
        validation.set_issuer(&["iss"]);
        let raw = decode::<serde_json::Value>(&token, &keys.decoding, &validation)
            .expect("decode raw")
            .claims;
        let mut fields: Vec<_> = raw.as_object().unwrap().keys().cloned().collect();
        fields.sort();
        assert_eq!(fields, ["aud", "email", "exp", "iat", "iss", "userId"]);
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = keys.sign(&claims()).expect("sign");
        let other = keys.sign(&claims()).expect("sign");
        let parts: Vec<&str> = token.split('.').collect();
        let foreign_payload = other.split('.').nth(1).unwrap();
        let tampered = format!("{}.{}.{}", parts[0], foreign_payload, parts[2]);

        assert!(matches!(keys.verify(&tampered), Err(AppError::InvalidToken)));
    }

    #[test]
    fn verify_rejects_other_secret() {
        let good = make_keys("secret-a", "iss", "aud");
        let bad = make_keys("secret-b", "iss", "aud");
        let token = good.sign(&claims()).expect("sign");
        assert!(matches!(bad.verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let bad = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.sign(&claims()).expect("sign");
        assert!(matches!(bad.verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let past = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let payload = TokenClaims {
            session: claims(),
            iat: past.unix_timestamp() as usize,
            exp: (past + TimeDuration::minutes(5)).unix_timestamp() as usize,
            iss: "iss".into(),
            aud: "aud".into(),
        };
        let token = encode(&Header::default(), &payload, &keys.encoding).unwrap();
        assert!(matches!(keys.verify(&token), Err(AppError::InvalidToken)));
    }
}
