//! bcrypt password hashing, run off the async executor.

/// bcrypt only reads this many bytes; anything past it would be ignored.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(thiserror::Error, Debug)]
pub enum PasswordError {
    #[error("password longer than {MAX_PASSWORD_BYTES} bytes")]
    TooLong,
    #[error("bcrypt: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self { cost: bcrypt::DEFAULT_COST }
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: String) -> Result<String, PasswordError> {
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(PasswordError::TooLong);
        }
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
        Ok(hashed)
    }

    /// `false` on mismatch, on an unreadable stored hash, and for passwords
    /// too long to have been hashed in full.
    pub async fn verify(&self, password: String, hash: String) -> bool {
        if password.len() > MAX_PASSWORD_BYTES {
            return false;
        }
        match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "stored password hash is unreadable");
                false
            }
            Err(err) => {
                tracing::error!(error = %err, "password verification task failed");
                false
            }
        }
    }
}
