use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::{distributions::Alphanumeric, Rng};
use tracing::error;

use crate::error::AuthError;

/// Argon2id credential hashing. Digests are PHC strings, so the salt and cost
/// parameters travel with each digest and verification needs nothing else.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    dummy_digest: String,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    pub fn new() -> Result<Self, AuthError> {
        Self::with_params(Params::default())
    }

    pub fn with_params(params: Params) -> Result<Self, AuthError> {
        // Digest of random material that no caller can know, verified on the
        // unknown-user login path.
        let filler: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let dummy_digest = hash_with(&params, &filler)?;

        Ok(Self { params, dummy_digest })
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let params = self.params.clone();
        let plaintext = plaintext.to_owned();

        tokio::task::spawn_blocking(move || hash_with(&params, &plaintext))
            .await
            .map_err(|e| {
                error!("Password hashing task failed: {}", e);
                AuthError::HashingError
            })?
    }

    /// Returns `false` on mismatch and on digests that do not parse.
    pub async fn verify(&self, plaintext: &str, digest: &str) -> bool {
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();

        match tokio::task::spawn_blocking(move || verify_with(&plaintext, &digest)).await {
            Ok(matched) => matched,
            Err(e) => {
                error!("Password verification task failed: {}", e);
                false
            }
        }
    }

    /// Spends the same work as a real verification and always fails.
    pub async fn verify_dummy(&self, plaintext: &str) -> bool {
        self.verify(plaintext, &self.dummy_digest).await
    }
}

fn hash_with(params: &Params, plaintext: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());

    argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            AuthError::HashingError
        })
}

fn verify_with(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    // Output comparison inside argon2 is constant time.
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
pub(crate) fn cheap_hasher() -> PasswordHasher {
    let params = Params::new(Params::MIN_M_COST, 1, 1, None).expect("valid argon2 params");
    PasswordHasher::with_params(params).expect("hasher")
}
