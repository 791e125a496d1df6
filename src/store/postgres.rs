//! Postgres-backed credential store.
//!
//! Single `users` table; every mutation is one statement on one row, which
//! gives the per-record atomicity the service requires without any
//! in-process locking.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{Instrument, info_span};
use uuid::Uuid;

use super::{DuplicateField, Role, StoreError, User, UserStore, VerificationCode};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

const SELECT_COLUMNS: &str = r"
    id, email, username, password_hash, avatar, bio, role, verified,
    verification_code, verification_code_expires_at,
    reset_token_hash, reset_token_expires_at, created_at
";

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL statement fails.
    pub async fn migrate(&self) -> Result<()> {
        let query = r"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY,
                email TEXT NOT NULL,
                username TEXT,
                password_hash TEXT,
                avatar TEXT NOT NULL DEFAULT 'default-avatar.jpg',
                bio TEXT,
                role TEXT NOT NULL DEFAULT 'user',
                verified BOOLEAN NOT NULL DEFAULT FALSE,
                verification_code TEXT,
                verification_code_expires_at TIMESTAMPTZ,
                reset_token_hash TEXT,
                reset_token_expires_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT users_email_key UNIQUE (email),
                CONSTRAINT users_username_key UNIQUE (username)
            )
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "CREATE TABLE",
            db.statement = query
        );
        sqlx::query(query)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to create users table")?;
        Ok(())
    }
}

fn row_to_user(row: &PgRow) -> User {
    let code: Option<String> = row.get("verification_code");
    let code_expires_at: Option<DateTime<Utc>> = row.get("verification_code_expires_at");
    let verification_code = match (code, code_expires_at) {
        (Some(code), Some(expires_at)) => Some(VerificationCode { code, expires_at }),
        _ => None,
    };
    let role: String = row.get("role");

    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        avatar: row.get("avatar"),
        bio: row.get("bio"),
        role: Role::from_str_or_user(&role),
        verified: row.get("verified"),
        verification_code,
        reset_token_hash: row.get("reset_token_hash"),
        reset_token_expires_at: row.get("reset_token_expires_at"),
        created_at: row.get("created_at"),
    }
}

/// Map a unique-constraint violation to the field it collided on.
fn duplicate_field(err: &sqlx::Error) -> Option<DuplicateField> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.code().as_deref() != Some("23505") {
        return None;
    }
    match db_err.constraint() {
        Some(constraint) if constraint.contains("username") => Some(DuplicateField::Username),
        Some(_) | None => Some(DuplicateField::Email),
    }
}

fn backend(err: sqlx::Error, action: &'static str) -> StoreError {
    StoreError::Backend(anyhow::Error::new(err).context(action))
}

#[async_trait::async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM users WHERE email = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| backend(err, "failed to look up user by email"))?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM users WHERE id = $1");
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| backend(err, "failed to look up user by id"))?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn find_by_reset_token_hash(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        // Expired tokens are filtered here so they are indistinguishable
        // from tokens that never existed.
        let query = format!(
            "SELECT {SELECT_COLUMNS} FROM users \
             WHERE reset_token_hash = $1 AND reset_token_expires_at > $2"
        );
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(digest)
            .bind(now)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .map_err(|err| backend(err, "failed to look up user by reset token"))?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn create(&self, user: User) -> Result<User, StoreError> {
        let query = r"
            INSERT INTO users
                (id, email, username, password_hash, avatar, bio, role, verified,
                 verification_code, verification_code_expires_at,
                 reset_token_hash, reset_token_expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.avatar)
            .bind(&user.bio)
            .bind(user.role.as_str())
            .bind(user.verified)
            .bind(user.verification_code.as_ref().map(|code| code.code.clone()))
            .bind(user.verification_code.as_ref().map(|code| code.expires_at))
            .bind(&user.reset_token_hash)
            .bind(user.reset_token_expires_at)
            .bind(user.created_at)
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(user),
            Err(err) => match duplicate_field(&err) {
                Some(field) => Err(StoreError::Duplicate(field)),
                None => Err(backend(err, "failed to insert user")),
            },
        }
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let query = r"
            UPDATE users SET
                email = $2,
                username = $3,
                password_hash = $4,
                avatar = $5,
                bio = $6,
                role = $7,
                verified = $8,
                verification_code = $9,
                verification_code_expires_at = $10,
                reset_token_hash = $11,
                reset_token_expires_at = $12
            WHERE id = $1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(&user.avatar)
            .bind(&user.bio)
            .bind(user.role.as_str())
            .bind(user.verified)
            .bind(user.verification_code.as_ref().map(|code| code.code.clone()))
            .bind(user.verification_code.as_ref().map(|code| code.expires_at))
            .bind(&user.reset_token_hash)
            .bind(user.reset_token_expires_at)
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(StoreError::NotFound),
            Ok(_) => Ok(()),
            Err(err) => match duplicate_field(&err) {
                Some(field) => Err(StoreError::Duplicate(field)),
                None => Err(backend(err, "failed to update user")),
            },
        }
    }

    async fn healthy(&self) -> bool {
        use sqlx::Connection;
        let span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        match self.pool.acquire().await {
            Ok(mut conn) => conn.ping().instrument(span).await.is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn duplicate_field_maps_constraint_names() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
            constraint: Some("users_username_key"),
        }));
        assert_eq!(duplicate_field(&err), Some(DuplicateField::Username));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
            constraint: Some("users_email_key"),
        }));
        assert_eq!(duplicate_field(&err), Some(DuplicateField::Email));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
            constraint: None,
        }));
        assert_eq!(duplicate_field(&err), None);

        assert_eq!(duplicate_field(&sqlx::Error::RowNotFound), None);
    }
}
