use std::{collections::HashMap, sync::RwLock};

use axum::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::{
    repo::{StoreError, UserStore},
    repo_types::{NewUser, User},
};

/// `UserStore` kept in process memory. Enforces the same uniqueness rules as the
/// `users` table; contents vanish with the process.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_poisoned() -> StoreError {
    StoreError::Database(sqlx::Error::Protocol("user store lock poisoned".into()))
}

fn check_unique(
    users: &HashMap<Uuid, User>,
    skip: Option<Uuid>,
    username: &str,
    email: &str,
) -> Result<(), StoreError> {
    for other in users.values().filter(|u| Some(u.id) != skip) {
        if other.username == username {
            return Err(StoreError::Duplicate("username"));
        }
        if other.email == email {
            return Err(StoreError::Duplicate("email"));
        }
    }
    Ok(())
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().map_err(|_| lock_poisoned())?;
        check_unique(&users, None, &new_user.username, &new_user.email)?;

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            bio: None,
            image: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| lock_poisoned())?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().map_err(|_| lock_poisoned())?;
        if !users.contains_key(&user.id) {
            return Err(StoreError::NotFound);
        }
        check_unique(&users, Some(user.id), &user.username, &user.email)?;

        let stored = users.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        stored.username = user.username.clone();
        stored.email = user.email.clone();
        stored.password_hash = user.password_hash.clone();
        stored.bio = user.bio.clone();
        stored.image = user.image.clone();
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(stored.clone())
    }
}
