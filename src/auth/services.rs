use anyhow::Context;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, SignupRequest},
        errors::AuthError,
        jwt::{JwtKeys, TokenError},
        repo_types::{NewUser, User},
        validation::{normalize_email, validate_signup},
    },
    state::AppState,
};

/// Registers a new account. No token is issued here; the client logs in next.
pub async fn signup(state: &AppState, mut req: SignupRequest) -> Result<User, AuthError> {
    validate_signup(&mut req)?;

    let hasher = state.hasher.clone();
    let password = std::mem::take(&mut req.password);
    let hashed_password = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .context("hash task panicked")??;

    let opening_balance = req.opening_balance.unwrap_or(Decimal::ZERO);
    let new_user = NewUser {
        first_name: req.first_name,
        last_name: req.last_name,
        phone_number: req.phone_number,
        email: req.email,
        date_of_birth: req.date_of_birth,
        gender: req.gender.map(|g| g.as_str().to_owned()),
        opening_balance,
        current_balance: opening_balance,
        hashed_password,
    };

    let user = state.users.insert(new_user).await.map_err(|e| {
        warn!(error = %e, "signup insert rejected");
        AuthError::from(e)
    })?;
    info!(user_id = user.user_id, email = %user.email, "user registered");
    Ok(user)
}

/// Checks credentials and returns an access token. Unknown email and wrong
/// password produce the same error.
pub async fn login(state: &AppState, req: LoginRequest) -> Result<String, AuthError> {
    let email = normalize_email(&req.email);
    let user = state.users.find_by_email(&email).await?;

    let hasher = state.hasher.clone();
    let password = req.password;
    let stored = user.as_ref().map(|u| u.hashed_password.clone());
    let ok = tokio::task::spawn_blocking(move || match stored {
        Some(hash) => hasher.verify(&password, &hash),
        None => {
            hasher.verify_dummy(&password);
            false
        }
    })
    .await
    .context("verify task panicked")?;

    let user = match (user, ok) {
        (Some(u), true) => u,
        (Some(u), false) => {
            warn!(user_id = u.user_id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }
        (None, _) => {
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        }
    };

    let token = state.keys.sign_access(user.user_id)?;
    info!(user_id = user.user_id, "user logged in");
    Ok(token)
}

/// Resolves a bearer token to the user id it was issued for.
pub fn authenticate(keys: &JwtKeys, token: &str) -> Result<i64, AuthError> {
    let subject = keys.verify(token).map_err(|e| {
        warn!(reason = %e, "token rejected");
        AuthError::from(e)
    })?;
    subject.parse::<i64>().map_err(|_| {
        warn!(subject = %subject, "token subject is not a user id");
        AuthError::InvalidToken(TokenError::Malformed)
    })
}

pub async fn profile(state: &AppState, user_id: i64) -> Result<PublicUser, AuthError> {
    let user = state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(user_id, "token subject no longer resolves");
        AuthError::NotFound
    })?;
    Ok(PublicUser::from(user))
}
