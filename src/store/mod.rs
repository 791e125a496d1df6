//! Credential store: the durable account record and the trait seam the
//! authentication service talks to.
//!
//! The store is the single source of truth and the only shared mutable
//! resource. Implementations must provide atomic per-record read-modify-write
//! semantics so that two requests racing to consume the same verification
//! code result in at most one success.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const DEFAULT_AVATAR: &str = "default-avatar.jpg";

/// Account role used by the authorization allow-list check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn from_str_or_user(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

/// A single active one-time code, superseded atomically on re-issue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationCode {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// The durable account record.
///
/// Deliberately not `Serialize`: secrets (password hash, code, reset digest)
/// must never reach an outward-facing representation. Callers serialize
/// [`PublicUser`] or [`Profile`] instead.
#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub avatar: String,
    pub bio: Option<String>,
    pub role: Role,
    pub verified: bool,
    pub verification_code: Option<VerificationCode>,
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Unverified placeholder created on the first "send registration code".
    /// Reserves the email until registration completes.
    #[must_use]
    pub fn placeholder(email: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            username: None,
            password_hash: None,
            avatar: DEFAULT_AVATAR.to_string(),
            bio: None,
            role: Role::User,
            verified: false,
            verification_code: None,
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: now,
        }
    }

    #[must_use]
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.to_string(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            avatar: self.avatar.clone(),
        }
    }

    #[must_use]
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id.to_string(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            avatar: self.avatar.clone(),
            bio: self.bio.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

/// Outward projection returned by registration, login, and reset flows.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: String,
    pub username: Option<String>,
    pub email: String,
    pub role: Role,
    pub avatar: String,
}

/// Projection for the "get self" endpoint only.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: String,
    pub username: Option<String>,
    pub email: String,
    pub role: Role,
    pub avatar: String,
    pub bio: Option<String>,
    pub created_at: String,
}

/// Which unique constraint a duplicate write collided with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateField {
    Email,
    Username,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {0:?}")]
    Duplicate(DuplicateField),
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Atomic per-record account storage.
///
/// `save` replaces the whole mutable portion of the record keyed by id and
/// must observe unique constraints on email and username, reporting
/// collisions as [`StoreError::Duplicate`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Look up the account holding an unexpired reset token with this digest.
    /// Expired digests behave exactly like absent ones.
    async fn find_by_reset_token_hash(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError>;

    async fn create(&self, user: User) -> Result<User, StoreError>;

    async fn save(&self, user: &User) -> Result<(), StoreError>;

    /// Connectivity check for the health endpoint.
    async fn healthy(&self) -> bool;
}
