//! API tokens: one per user, issued on first login and reused afterwards.

use rand::RngCore;
use sqlx::PgPool;

use metra_core::UserId;

use super::RepositoryError;
use crate::models::StaffUser;

/// Random bytes per token; hex-encoded to 40 characters.
const TOKEN_BYTES: usize = 20;

/// A fresh random token key.
#[must_use]
pub fn generate_key() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Repository for API tokens.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's token, created if they have none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<String, RepositoryError> {
        sqlx::query(
            "INSERT INTO dashboard.api_token (key, user_id) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(generate_key())
        .bind(user_id)
        .execute(self.pool)
        .await?;

        let key = sqlx::query_scalar::<_, String>(
            "SELECT key FROM dashboard.api_token WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(key)
    }

    /// The user a token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn authenticate(&self, key: &str) -> Result<Option<StaffUser>, RepositoryError> {
        let user = sqlx::query_as::<_, StaffUser>(
            "SELECT u.id, u.username, u.is_staff \
             FROM dashboard.api_token t \
             JOIN store.user u ON u.id = t.user_id \
             WHERE t.key = $1",
        )
        .bind(key)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_are_40_hex_chars() {
        let key = generate_key();
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_key());
    }
}
