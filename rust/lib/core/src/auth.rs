//! Authentication seam.
//!
//! The production module never talks to an identity provider directly. It
//! asks an [`Authenticator`] who is signed in and, before destructive
//! actions, asks it to re-verify the operator's password. The concrete
//! implementation is injected at startup time.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ServiceError;

/// The signed-in operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub uid: String,
    #[serde(default)]
    pub email: String,
}

/// Pluggable authenticator.
pub trait Authenticator: Send + Sync + 'static {
    /// The signed-in user, or `ServiceError::Unauthorized` if nobody is.
    fn current_user(&self) -> Result<Principal, ServiceError>;

    /// Re-verify the current user's password.
    ///
    /// Returns `Ok(())` if the password matches, `PermissionDenied` if not.
    fn reverify(&self, password: &str) -> Result<(), ServiceError>;
}

/// Verifies re-confirmation passwords against an argon2id PHC hash.
pub struct PasswordAuthenticator {
    principal: Principal,
    password_hash: String,
}

impl PasswordAuthenticator {
    pub fn new(principal: Principal, password_hash: impl Into<String>) -> Self {
        Self {
            principal,
            password_hash: password_hash.into(),
        }
    }
}

impl Authenticator for PasswordAuthenticator {
    fn current_user(&self) -> Result<Principal, ServiceError> {
        if self.principal.uid.is_empty() {
            return Err(ServiceError::Unauthorized("Not authenticated".into()));
        }
        Ok(self.principal.clone())
    }

    fn reverify(&self, password: &str) -> Result<(), ServiceError> {
        if verify_password(password, &self.password_hash) {
            Ok(())
        } else {
            warn!(uid = %self.principal.uid, "password re-confirmation failed");
            Err(ServiceError::PermissionDenied("Incorrect password".into()))
        }
    }
}

/// Hash a plain password with argon2id.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    use argon2::Argon2;
    use password_hash::rand_core::OsRng;
    use password_hash::{PasswordHasher, SaltString};

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::Internal(format!("hash password: {e}")))
}

/// Verify a password against an argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::Argon2;
    use password_hash::{PasswordHash, PasswordVerifier};

    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Signed in as a fixed test user; every password is accepted.
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn current_user(&self) -> Result<Principal, ServiceError> {
        Ok(Principal {
            uid: "test-user".into(),
            email: "test@example.com".into(),
        })
    }

    fn reverify(&self, _password: &str) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Signed in as a fixed test user; every password is rejected.
pub struct DenyAll;

impl Authenticator for DenyAll {
    fn current_user(&self) -> Result<Principal, ServiceError> {
        AllowAll.current_user()
    }

    fn reverify(&self, _password: &str) -> Result<(), ServiceError> {
        Err(ServiceError::PermissionDenied("Incorrect password".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Principal {
        Principal {
            uid: "u1".into(),
            email: "owner@mill.in".into(),
        }
    }

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("loom-secret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("loom-secret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn password_authenticator_gate() {
        let auth = PasswordAuthenticator::new(owner(), hash_password("pw").unwrap());
        assert_eq!(auth.current_user().unwrap().uid, "u1");
        assert!(auth.reverify("pw").is_ok());

        let err = auth.reverify("nope").unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
        assert_eq!(err.to_string(), "Incorrect password");
    }

    #[test]
    fn missing_principal_is_unauthorized() {
        let auth = PasswordAuthenticator::new(
            Principal { uid: String::new(), email: String::new() },
            "",
        );
        let err = auth.current_user().unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHENTICATED");
    }

    #[test]
    fn test_doubles() {
        assert!(AllowAll.reverify("x").is_ok());
        assert!(DenyAll.reverify("x").is_err());
        assert_eq!(DenyAll.current_user().unwrap().uid, "test-user");
    }
}
