use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use time::OffsetDateTime;
use tracing::debug;

use crate::{auth::claims::Claims, config::JwtConfig};

/// Why a presented token was refused.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature mismatch")]
    BadSignature,
    #[error("malformed token")]
    Malformed,
    #[error("token issuer, audience or validity window rejected")]
    Rejected,
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::ImmatureSignature
            | ErrorKind::InvalidAlgorithm => Self::Rejected,
            _ => Self::Malformed,
        }
    }
}

/// HS256 signing and verification keys, built once from [`JwtConfig`].
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64).saturating_mul(60)),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation
    }

    pub(crate) fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Signs a token binding `subject_id` until `now + ttl`.
    pub fn issue(&self, subject_id: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: subject_id.to_owned(),
            iat: now,
            exp: now.saturating_add(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = self.encode_claims(&claims)?;
        debug!(subject = %subject_id, exp = claims.exp, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: i64) -> Result<String, TokenError> {
        self.issue(&user_id.to_string(), self.access_ttl)
    }

    /// Checks signature, issuer, audience and expiry, returning the subject.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation())?;
        // the library accepts exp == now; a token is dead from its expiry second on
        if data.claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            return Err(TokenError::Expired);
        }
        debug!(subject = %data.claims.sub, "jwt verified");
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
pub(crate) fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret".into(),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
        ttl_minutes: 5,
    }
}
