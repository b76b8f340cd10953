use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RegisterRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_dummy, verify_password},
        repo::UserStore,
        repo_types::{NewUser, PublicUser},
    },
    error::{AppError, Result},
    validation::{Validate, ValidationResult},
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

impl Validate for RegisterRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        if !is_valid_email(&self.email) {
            result.add_error("email", "email must be a valid address");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            result.add_error("password", "password must be at least 6 characters");
        }
        result
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        if !is_valid_email(&self.email) {
            result.add_error("email", "email must be a valid address");
        }
        if self.password.is_empty() {
            result.add_error("password", "password is required");
        }
        result
    }
}

/// Creates an account. The returned user never carries the password hash.
pub async fn register(users: &dyn UserStore, mut req: RegisterRequest) -> Result<PublicUser> {
    req.email = req.email.trim().to_string();
    req.validate().into_result().map_err(|errs| {
        warn!(email = %req.email, "register rejected");
        AppError::from(errs)
    })?;

    if users.find_by_email(&req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(AppError::Conflict("Email already in use".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = users
        .create(NewUser {
            email: req.email,
            password_hash,
            role: req.role.unwrap_or_default(),
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
    Ok(PublicUser::from(user))
}

/// Verifies credentials and issues a session token.
pub async fn login(users: &dyn UserStore, keys: &JwtKeys, mut req: LoginRequest) -> Result<AuthResponse> {
    req.email = req.email.trim().to_string();
    req.validate().into_result()?;

    let invalid = || AppError::Unauthorized("Invalid credentials".into());

    let Some(user) = users.find_by_email(&req.email).await? else {
        verify_dummy(&req.password);
        warn!(email = %req.email, "login unknown email");
        return Err(invalid());
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid());
    }

    let access_token = keys.sign(&user)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(AuthResponse {
        access_token,
        user: PublicUser::from(user),
    })
}
