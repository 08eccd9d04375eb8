use lazy_static::lazy_static;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{error, warn};

use super::{
    claims::Role,
    dto::{AuthResponse, PublicUser, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, validate_new_password},
    repo::{CreateUserError, NewUser, UserStore},
    repo_types::User,
};
use crate::{error::ApiError, mailer::OutgoingEmail};

pub const RESET_TOKEN_TTL: Duration = Duration::hours(1);

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

pub(crate) fn reset_token_expiry(now: OffsetDateTime) -> OffsetDateTime {
    now + RESET_TOKEN_TTL
}

pub(crate) fn issue_tokens(keys: &JwtKeys, user: &User) -> anyhow::Result<AuthResponse> {
    let role = Role::from_db(&user.role);
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id, role)?,
        refresh_token: keys.sign_refresh(user.id, role)?,
        user: PublicUser::from(user),
    })
}

pub(crate) fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

/// Validates and stores a new account. An email that is already registered
/// is a 400 whether the pre-check sees it or the unique index catches a
/// concurrent insert.
pub async fn register_user<S: UserStore + ?Sized>(
    store: &S,
    payload: &RegisterRequest,
) -> Result<User, ApiError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(%email, "invalid email");
        return Err(ApiError::bad_request("Invalid email"));
    }
    validate_new_password(&payload.password)?;

    if store.find_by_email(&email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(ApiError::bad_request("User already exists"));
    }

    let hash = hash_password(&payload.password)?;
    let new_user = NewUser {
        email: &email,
        password_hash: &hash,
        first_name: payload.first_name.trim(),
        last_name: payload.last_name.trim(),
        phone: payload.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()),
    };
    match store.create(new_user).await {
        Ok(user) => Ok(user),
        Err(CreateUserError::EmailTaken) => {
            warn!(%email, "lost registration race");
            Err(ApiError::bad_request("User already exists"))
        }
        Err(CreateUserError::Db(e)) => {
            error!(error = %e, "create user failed");
            Err(e.into())
        }
    }
}

pub(crate) fn password_reset_email(to: &str, frontend_url: &str, token: &str) -> OutgoingEmail {
    let link = format!("{}/reset-password/{}", frontend_url.trim_end_matches('/'), token);
    OutgoingEmail {
        to: to.to_string(),
        subject: "Reset your AeroCharter password".into(),
        body: format!(
            "We received a request to reset your password.\n\n\
             Open this link within one hour to choose a new one:\n{link}\n\n\
             If you did not ask for this, you can ignore this email."
        ),
        reply_to: None,
    }
}
