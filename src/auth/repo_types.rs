use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub opening_balance: Decimal,
    pub current_balance: Decimal,
    pub created_at: OffsetDateTime,
    #[serde(skip_serializing)]
    pub hashed_password: String, // Argon2 PHC string, not exposed in JSON
}

/// Fields for a user that does not exist yet; the store assigns
/// `user_id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub opening_balance: Decimal,
    pub current_balance: Decimal,
    pub hashed_password: String,
}
