//! Role gate for authenticated routes.
//!
//! A missing session is an authentication failure (401); a session whose
//! role does not match the required one is an authorization failure (403).

use thiserror::Error;

use super::{claims::Role, extractors::Session};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Requires {required} role")]
    Forbidden { required: Role },
}

impl From<AccessError> for AppError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::Unauthenticated => AppError::Unauthorized(e.to_string()),
            AccessError::Forbidden { .. } => AppError::Forbidden(e.to_string()),
        }
    }
}

pub fn authorize(session: Option<&Session>, required: Option<Role>) -> Result<(), AccessError> {
    let session = session.ok_or(AccessError::Unauthenticated)?;
    match required {
        Some(role) if session.role != role => Err(AccessError::Forbidden { required: role }),
        _ => Ok(()),
    }
}

/// Shorthand for the admin-only routes.
pub fn require_admin(session: &Session) -> Result<(), AppError> {
    authorize(Some(session), Some(Role::Admin)).map_err(|e| {
        tracing::warn!(user_id = %session.user_id, role = %session.role, "admin route refused");
        AppError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn session(role: Role) -> Session {
        Session {
            user_id: Uuid::new_v4(),
            email: "x@example.com".into(),
            role,
        }
    }

    #[test]
    fn no_session_is_unauthenticated() {
        assert_eq!(authorize(None, None), Err(AccessError::Unauthenticated));
        assert_eq!(authorize(None, Some(Role::Admin)), Err(AccessError::Unauthenticated));
    }

    #[test]
    fn any_session_passes_without_required_role() {
        assert!(authorize(Some(&session(Role::User)), None).is_ok());
        assert!(authorize(Some(&session(Role::Admin)), None).is_ok());
    }

    #[test]
    fn required_role_must_match_exactly() {
        assert!(authorize(Some(&session(Role::Admin)), Some(Role::Admin)).is_ok());
        assert_eq!(
            authorize(Some(&session(Role::User)), Some(Role::Admin)),
            Err(AccessError::Forbidden { required: Role::Admin })
        );
        assert_eq!(
            authorize(Some(&session(Role::Admin)), Some(Role::User)),
            Err(AccessError::Forbidden { required: Role::User })
        );
    }

    #[test]
    fn require_admin_maps_to_forbidden() {
        let err = require_admin(&session(Role::User)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(require_admin(&session(Role::Admin)).is_ok());
    }
}
