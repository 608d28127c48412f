use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use crate::config::HashConfig;

const DUMMY_PASSWORD: &str = "fintrack-dummy-password";

/// Argon2id password hashing with per-call random salts.
///
/// New hashes use the configured cost; verification always uses the
/// algorithm, cost and salt embedded in the stored PHC string, so older hashes
/// keep verifying after the cost is raised.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
    dummy_hash: Arc<str>,
}

impl CredentialHasher {
    pub fn new(cfg: &HashConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 parameters: {e}"))?;
        let mut hasher = Self {
            params,
            dummy_hash: Arc::from(""),
        };
        hasher.dummy_hash = Arc::from(hasher.hash(DUMMY_PASSWORD)?);
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Returns `false` for a wrong password and for a hash that does not parse.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "stored password hash is malformed");
                return false;
            }
        };
        self.argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burns one verification against a throwaway hash. Used when the account
    /// does not exist so the response time matches a wrong password.
    pub fn verify_dummy(&self, plain: &str) -> bool {
        self.verify(plain, &self.dummy_hash)
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    CredentialHasher::new(&HashConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    })
    .expect("test argon2 params are valid")
}
