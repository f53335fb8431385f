//! Authentication extractors and role gates.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use campus_core::Role;

use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in user.
///
/// Rejects with 401 when there is no session or no user in it.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state)
            .await
            .unwrap_or(OptionalAuth(None));

        user.map(Self)
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is
/// logged in.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

impl CurrentUser {
    /// Gate an action on the user's role.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` when the user holds none of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if self.has_role(roles) {
            return Ok(());
        }

        tracing::warn!(user_id = %self.id, role = %self.role, "Role check failed");
        Err(AppError::Forbidden(
            "you do not have permission to perform this action".to_owned(),
        ))
    }
}

/// Store the logged-in user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use campus_core::{Email, UserId};

    use super::*;
    use crate::models::User;

    fn user(role: Role) -> CurrentUser {
        let now = Utc::now();
        CurrentUser::from(&User {
            id: UserId::generate(),
            name: "Ana Gomez".to_owned(),
            email: Email::parse("ana@x.com").unwrap(),
            role,
            created_at: now,
            updated_at: now,
        })
    }

    #[test]
    fn test_require_role() {
        let student = user(Role::Student);
        assert!(student.require_role(&[Role::Admin, Role::Student]).is_ok());
        assert!(matches!(
            student.require_role(&[Role::Admin, Role::Teacher]),
            Err(AppError::Forbidden(_))
        ));
    }
}
