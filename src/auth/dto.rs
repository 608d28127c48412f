use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::{Date, OffsetDateTime};

use crate::auth::repo_types::User;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Other => "other",
        }
    }
}

/// Request body for user registration. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
    #[serde(default, with = "iso_date::option")]
    pub date_of_birth: Option<Date>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub opening_balance: Option<Decimal>,
}

/// Decimal given as a JSON number or string; `null`, `""` and whitespace mean
/// "not provided" (the signup form always sends the field).
fn blank_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
    let text = match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(D::Error::custom(format!(
                "expected a decimal number, got {other}"
            )))
        }
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map(Some)
        .map_err(|e| D::Error::custom(format!("invalid decimal {text:?}: {e}")))
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Profile projection returned to the client; never carries the hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(with = "iso_date::option")]
    pub date_of_birth: Option<Date>,
    pub gender: Option<String>,
    pub opening_balance: Decimal,
    pub current_balance: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            phone_number: u.phone_number,
            date_of_birth: u.date_of_birth,
            gender: u.gender,
            opening_balance: u.opening_balance,
            current_balance: u.current_balance,
            created_at: u.created_at,
        }
    }
}
