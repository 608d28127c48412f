use std::fmt;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::repo_types::{NewUser, User};

/// Column guarded by a unique constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    PhoneNumber,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Email => f.write_str("Email"),
            UniqueField::PhoneNumber => f.write_str("Phone number"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{0} already registered")]
    UniqueViolation(UniqueField),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Storage contract for user accounts. Uniqueness of email and phone number
/// is the store's job: a colliding `insert` must fail atomically.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, RepoError>;
    async fn insert(&self, user: NewUser) -> Result<User, RepoError>;
}

const USER_COLUMNS: &str = "user_id, first_name, last_name, phone_number, email, date_of_birth, \
     gender, opening_balance, current_balance, created_at, hashed_password";

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_insert_error(e: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(c) if c.contains("phone") => {
                    return RepoError::UniqueViolation(UniqueField::PhoneNumber)
                }
                Some(c) if c.contains("email") => {
                    return RepoError::UniqueViolation(UniqueField::Email)
                }
                // some other unique index; not a field the client can fix
                _ => {}
            }
        }
    }
    RepoError::Database(e)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, phone_number, email, date_of_birth,
                               gender, opening_balance, current_balance, hashed_password)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(&user.email)
        .bind(user.date_of_birth)
        .bind(&user.gender)
        .bind(user.opening_balance)
        .bind(user.current_balance)
        .bind(&user.hashed_password)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[test]
    fn unique_violation_message_names_field() {
        assert_eq!(
            RepoError::UniqueViolation(UniqueField::Email).to_string(),
            "Email already registered"
        );
        assert_eq!(
            RepoError::UniqueViolation(UniqueField::PhoneNumber).to_string(),
            "Phone number already registered"
        );
    }

    #[derive(Debug)]
    struct ConstraintError {
        unique: bool,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "constraint {:?} violated", self.constraint)
        }
    }

    impl std::error::Error for ConstraintError {}

    impl DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::CheckViolation
            }
        }
    }

    fn db_error(unique: bool, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintError { unique, constraint }))
    }

    #[test]
    fn unique_violation_maps_to_field_by_constraint() {
        let phone = map_insert_error(db_error(
            true,
            Some("users_phone_number_key"),
        ));
        assert!(matches!(
            phone,
            RepoError::UniqueViolation(UniqueField::PhoneNumber)
        ));

        let email = map_insert_error(db_error(
            true,
            Some("users_email_key"),
        ));
        assert!(matches!(email, RepoError::UniqueViolation(UniqueField::Email)));
    }

    #[test]
    fn unknown_or_non_unique_constraints_stay_database_errors() {
        let unknown = map_insert_error(db_error(
            true,
            Some("users_pkey"),
        ));
        assert!(matches!(unknown, RepoError::Database(_)));

        let unnamed = map_insert_error(db_error(true, None));
        assert!(matches!(unnamed, RepoError::Database(_)));

        let check = map_insert_error(db_error(
            false,
            Some("users_email_key"),
        ));
        assert!(matches!(check, RepoError::Database(_)));
    }

    #[test]
    fn non_database_errors_pass_through() {
        let mapped = map_insert_error(sqlx::Error::RowNotFound);
        assert!(matches!(mapped, RepoError::Database(sqlx::Error::RowNotFound)));
    }
}
