use std::time::Duration;

use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::{claims::Claims, repo_types::User},
    config::JwtConfig,
    state::AppState,
};

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs(u64::try_from(cfg.ttl_minutes).unwrap_or(0).saturating_mul(60)),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    /// Issues a session token carrying the user's id, email and role.
    pub fn sign(&self, user: &User) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = TimeDuration::try_from(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .context("token lifetime out of range")?;
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user.id, role = %user.role, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, role = %data.claims.role, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;
    use uuid::Uuid;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
        })
    }

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            password_hash: "irrelevant".into(),
            role,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn sign_and_verify_carries_identity() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let u = user(Role::Admin);
        let token = keys.sign(&u).expect("sign");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, u.id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good_keys = make_keys("same-secret", "good-iss", "good-aud");
        let bad_keys = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good_keys.sign(&user(Role::User)).expect("sign");
        assert!(bad_keys.verify(&token).is_err());
    }

    #[test]
    fn verify_rejects_foreign_signature() {
        let ours = make_keys("secret-a", "iss", "aud");
        let theirs = make_keys("secret-b", "iss", "aud");
        let token = theirs.sign(&user(Role::Admin)).expect("sign");
        assert!(ours.verify(&token).is_err());
    }

    #[test]
    fn oversized_lifetime_fails_to_sign_instead_of_wrapping() {
        let keys = JwtKeys::from(&JwtConfig {
            secret: "s".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: i64::MAX,
        });
        assert_eq!(keys.ttl, Duration::from_secs(u64::MAX));
        assert!(keys.sign(&user(Role::User)).is_err());
    }

    #[test]
    fn negative_lifetime_is_clamped_to_zero() {
        let keys = JwtKeys::from(&JwtConfig {
            secret: "s".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: -10,
        });
        assert_eq!(keys.ttl, Duration::ZERO);
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let past = OffsetDateTime::now_utc() - TimeDuration::hours(2);
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "old@example.com".into(),
            role: Role::User,
            iat: past.unix_timestamp() as usize,
            exp: (past + TimeDuration::minutes(5)).unix_timestamp() as usize,
            iss: "iss".into(),
            aud: "aud".into(),
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
