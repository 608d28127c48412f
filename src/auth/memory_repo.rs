use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::{
    repo::{RepoError, UniqueField, UserRepository},
    repo_types::{NewUser, User},
};

/// Process-local user store. The uniqueness check and the push happen under
/// one lock, so concurrent inserts of the same key cannot both succeed.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    fn lock(&self) -> MutexGuard<'_, Vec<User>> {
        self.users.lock().expect("user store poisoned")
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.lock();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, RepoError> {
        let users = self.lock();
        Ok(users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepoError> {
        let mut users = self.lock();
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::UniqueViolation(UniqueField::Email));
        }
        if users.iter().any(|u| u.phone_number == user.phone_number) {
            return Err(RepoError::UniqueViolation(UniqueField::PhoneNumber));
        }
        let created = User {
            user_id: users.len() as i64 + 1,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            email: user.email,
            date_of_birth: user.date_of_birth,
            gender: user.gender,
            opening_balance: user.opening_balance,
            current_balance: user.current_balance,
            created_at: OffsetDateTime::now_utc(),
            hashed_password: user.hashed_password,
        };
        users.push(created.clone());
        Ok(created)
    }
}
