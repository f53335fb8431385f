//! Authentication service.
//!
//! Password registration and login. Passwords are stored as Argon2id PHC
//! strings.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{info, warn};

use campus_core::{Email, Role};

use crate::db::{RepositoryError, Store};
use crate::models::{CurrentUser, NewUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Registration input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Requested role; students by default.
    pub role: Option<Role>,
}

/// Authentication service.
///
/// Handles user registration and password login.
pub struct AuthService<'a> {
    store: &'a dyn Store,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Register a new user.
    ///
    /// Anyone may register as a student or a teacher. Only an admin `actor`
    /// may create admins.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if the name is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::RoleNotAllowed` if a non-admin asks for the admin role.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        registration: Registration,
        actor: Option<&CurrentUser>,
    ) -> Result<User, AuthError> {
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingField("name"));
        }
        let email = Email::parse(&registration.email)?;
        validate_password(&registration.password)?;

        let role = registration.role.unwrap_or_default();
        let is_admin = actor.is_some_and(|a| a.role == Role::Admin);
        if role == Role::Admin && !is_admin {
            warn!(email = %email, "Rejected admin self-registration");
            return Err(AuthError::RoleNotAllowed(role));
        }

        let password_hash = hash_password(&registration.password)?;

        let user = self
            .store
            .insert_user(NewUser {
                name: name.to_owned(),
                email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .store
            .credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::testing::{actor, seed_user};

    fn registration(email: &str, role: Option<Role>) -> Registration {
        Registration {
            name: "Ana Gomez".to_owned(),
            email: email.to_owned(),
            password: "secret1".to_owned(),
            role,
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret1", &hash).is_ok());
        assert!(matches!(
            verify_password("secret2", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let service = AuthService::new(&store);

        let user = service
            .register(registration(" Ana@X.com ", None), None)
            .await
            .unwrap();
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.email.as_str(), "ana@x.com");

        let logged_in = service.login("ana@x.com", "secret1").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        assert!(matches!(
            service.login("ana@x.com", "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("nobody@x.com", "secret1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = MemoryStore::new();
        let service = AuthService::new(&store);

        service
            .register(registration("ana@x.com", None), None)
            .await
            .unwrap();
        let again = service
            .register(registration("ana@x.com", Some(Role::Teacher)), None)
            .await;
        assert!(matches!(again, Err(AuthError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_only_admins_create_admins() {
        let store = MemoryStore::new();
        let admin = seed_user(&store, "Root", "root@x.com", Role::Admin).await;
        let service = AuthService::new(&store);

        let anonymous = service
            .register(registration("a@x.com", Some(Role::Admin)), None)
            .await;
        assert!(matches!(anonymous, Err(AuthError::RoleNotAllowed(Role::Admin))));

        let teacher = service
            .register(registration("t@x.com", Some(Role::Teacher)), None)
            .await
            .unwrap();
        assert_eq!(teacher.role, Role::Teacher);

        let created = service
            .register(registration("b@x.com", Some(Role::Admin)), Some(&actor(&admin)))
            .await
            .unwrap();
        assert_eq!(created.role, Role::Admin);
    }
}
