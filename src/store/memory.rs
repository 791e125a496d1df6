//! In-memory store for tests and dev mode (no DSN configured).

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use super::{DuplicateField, StoreError, User, UserStore};

/// `HashMap` keyed by account id behind a single mutex. The lock makes every
/// operation an atomic read-modify-write, which is exactly the per-record
/// guarantee the service relies on to make codes single-use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().expect("memory store lock poisoned");
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().expect("memory store lock poisoned");
        Ok(users.get(&id).cloned())
    }

    async fn find_by_reset_token_hash(
        &self,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().expect("memory store lock poisoned");
        Ok(users
            .values()
            .find(|user| {
                user.reset_token_hash.as_deref() == Some(digest)
                    && user.reset_token_expires_at.is_some_and(|expires| now < expires)
            })
            .cloned())
    }

    async fn create(&self, user: User) -> Result<User, StoreError> {
        let mut users = self.users.lock().expect("memory store lock poisoned");
        if users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::Duplicate(DuplicateField::Email));
        }
        if let Some(username) = &user.username {
            if users
                .values()
                .any(|existing| existing.username.as_deref() == Some(username))
            {
                return Err(StoreError::Duplicate(DuplicateField::Username));
            }
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.lock().expect("memory store lock poisoned");
        if !users.contains_key(&user.id) {
            return Err(StoreError::NotFound);
        }
        if users
            .values()
            .any(|existing| existing.id != user.id && existing.email == user.email)
        {
            return Err(StoreError::Duplicate(DuplicateField::Email));
        }
        if let Some(username) = &user.username {
            if users.values().any(|existing| {
                existing.id != user.id && existing.username.as_deref() == Some(username)
            }) {
                return Err(StoreError::Duplicate(DuplicateField::Username));
            }
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::VerificationCode;
    use anyhow::Result;
    use chrono::Duration;

    fn placeholder(email: &str) -> User {
        User::placeholder(email.to_string(), Utc::now())
    }

    #[tokio::test]
    async fn create_and_find_by_email() -> Result<()> {
        let store = MemoryStore::new();
        let user = store.create(placeholder("a@x.com")).await?;
        let found = store.find_by_email("a@x.com").await?;
        assert_eq!(found.map(|found| found.id), Some(user.id));
        assert!(store.find_by_email("b@x.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email_even_unverified() -> Result<()> {
        let store = MemoryStore::new();
        store.create(placeholder("a@x.com")).await?;
        let result = store.create(placeholder("a@x.com")).await;
        assert!(matches!(
            result,
            Err(StoreError::Duplicate(DuplicateField::Email))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn save_rejects_username_collision_with_other_account() -> Result<()> {
        let store = MemoryStore::new();
        let mut alice = store.create(placeholder("a@x.com")).await?;
        alice.username = Some("alice".to_string());
        store.save(&alice).await?;

        let mut bob = store.create(placeholder("b@x.com")).await?;
        bob.username = Some("alice".to_string());
        let result = store.save(&bob).await;
        assert!(matches!(
            result,
            Err(StoreError::Duplicate(DuplicateField::Username))
        ));

        // Saving the same account with its own username is not a collision.
        alice.bio = Some("hi".to_string());
        store.save(&alice).await?;
        Ok(())
    }

    #[tokio::test]
    async fn save_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let user = placeholder("a@x.com");
        assert!(matches!(store.save(&user).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn reset_token_lookup_honors_expiry() -> Result<()> {
        let store = MemoryStore::new();
        let now = Utc::now();
        let mut user = store.create(placeholder("a@x.com")).await?;
        user.reset_token_hash = Some("digest".to_string());
        user.reset_token_expires_at = Some(now + Duration::minutes(10));
        store.save(&user).await?;

        let found = store.find_by_reset_token_hash("digest", now).await?;
        assert_eq!(found.map(|found| found.id), Some(user.id));

        // The expiry instant itself is already expired.
        let found = store
            .find_by_reset_token_hash("digest", now + Duration::minutes(10))
            .await?;
        assert!(found.is_none());

        assert!(store.find_by_reset_token_hash("other", now).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn save_persists_code_material() -> Result<()> {
        let store = MemoryStore::new();
        let mut user = store.create(placeholder("a@x.com")).await?;
        user.verification_code = Some(VerificationCode {
            code: "123456".to_string(),
            expires_at: Utc::now() + Duration::minutes(10),
        });
        store.save(&user).await?;
        let found = store.find_by_id(user.id).await?.expect("saved user");
        assert_eq!(
            found.verification_code.map(|code| code.code),
            Some("123456".to_string())
        );
        Ok(())
    }
}
