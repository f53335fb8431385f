//! User profile management.

use campus_core::{Email, Role, UserId};
use tracing::info;

use super::auth::{AuthError, hash_password, validate_password};
use super::error::{ServiceError, ServiceResult};
use crate::db::{RepositoryError, Store, UserQuery};
use crate::models::{CurrentUser, User, UserUpdate};

/// Requested profile changes. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

pub struct UserService<'a> {
    store: &'a dyn Store,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// All users, oldest first, optionally restricted to one role.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list(&self, role: Option<Role>) -> ServiceResult<Vec<User>> {
        let query = UserQuery {
            role,
            ..UserQuery::default()
        };
        Ok(self.store.find_users(&query).await?)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a malformed id and
    /// `ServiceError::NotFound` when the user does not exist.
    pub async fn get(&self, id: &str) -> ServiceResult<User> {
        let id = parse_user_id(id)?;
        self.store
            .user_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("user not found".to_owned()))
    }

    /// Update a profile.
    ///
    /// Users may edit themselves; admins may edit anyone and are the only
    /// ones allowed to change a role. A new password is rehashed.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation` for malformed input
    /// - `ServiceError::Authorization` when the actor may not make the change
    /// - `ServiceError::NotFound` when the user does not exist
    /// - `ServiceError::Conflict` when the new email belongs to someone else
    pub async fn update(
        &self,
        actor: &CurrentUser,
        id: &str,
        changes: UserChanges,
    ) -> ServiceResult<User> {
        let id = parse_user_id(id)?;
        let is_admin = actor.role == Role::Admin;

        if actor.id != id && !is_admin {
            return Err(ServiceError::Authorization(
                "you may only update your own profile".to_owned(),
            ));
        }
        if changes.role.is_some() && !is_admin {
            return Err(ServiceError::Authorization(
                "only admins may change roles".to_owned(),
            ));
        }

        let mut update = UserUpdate {
            role: changes.role,
            ..UserUpdate::default()
        };
        if let Some(name) = changes.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(ServiceError::Validation("name is required".to_owned()));
            }
            update.name = Some(name.to_owned());
        }
        if let Some(email) = changes.email {
            let email = Email::parse(&email)
                .map_err(|e| ServiceError::Validation(format!("invalid email: {e}")))?;
            update.email = Some(email);
        }
        if let Some(password) = changes.password {
            validate_password(&password).map_err(auth_to_service)?;
            update.password_hash = Some(hash_password(&password).map_err(auth_to_service)?);
        }

        let user = self
            .store
            .update_user(id, update)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    ServiceError::Conflict("email already registered".to_owned())
                }
                other => ServiceError::Repository(other),
            })?
            .ok_or_else(|| ServiceError::NotFound("user not found".to_owned()))?;

        info!(user_id = %user.id, by = %actor.id, "User updated");
        Ok(user)
    }

    /// Delete a user. Courses and enrollments that reference them are kept.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a malformed id and
    /// `ServiceError::NotFound` when the user does not exist.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let id = parse_user_id(id)?;
        if !self.store.delete_user(id).await? {
            return Err(ServiceError::NotFound("user not found".to_owned()));
        }

        info!(user_id = %id, "User deleted");
        Ok(())
    }
}

fn parse_user_id(raw: &str) -> ServiceResult<UserId> {
    UserId::parse(raw).ok_or_else(|| ServiceError::Validation("invalid id".to_owned()))
}

fn auth_to_service(err: AuthError) -> ServiceError {
    match err {
        AuthError::WeakPassword(msg) => ServiceError::Validation(msg),
        AuthError::Repository(e) => ServiceError::Repository(e),
        _ => ServiceError::PasswordHash,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::services::auth::{AuthService, Registration};
    use crate::testing::{actor, seed_user};

    #[tokio::test]
    async fn test_list_by_role() {
        let store = MemoryStore::new();
        seed_user(&store, "Ana", "ana@x.com", Role::Student).await;
        seed_user(&store, "Marta", "marta@x.com", Role::Teacher).await;
        let service = UserService::new(&store);

        assert_eq!(service.list(None).await.unwrap().len(), 2);
        let teachers = service.list(Some(Role::Teacher)).await.unwrap();
        assert_eq!(teachers.len(), 1);
        assert_eq!(teachers[0].name, "Marta");
    }

    #[tokio::test]
    async fn test_get_errors() {
        let store = MemoryStore::new();
        let service = UserService::new(&store);

        assert!(matches!(
            service.get("abc").await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.get(&UserId::generate().to_string()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_permissions() {
        let store = MemoryStore::new();
        let ana = seed_user(&store, "Ana", "ana@x.com", Role::Student).await;
        let luis = seed_user(&store, "Luis", "luis@x.com", Role::Student).await;
        let admin = seed_user(&store, "Root", "root@x.com", Role::Admin).await;
        let service = UserService::new(&store);

        let renamed = service
            .update(
                &actor(&ana),
                &ana.id.to_string(),
                UserChanges {
                    name: Some("Ana Maria".to_owned()),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Ana Maria");

        let other = service
            .update(&actor(&ana), &luis.id.to_string(), UserChanges::default())
            .await;
        assert!(matches!(other, Err(ServiceError::Authorization(_))));

        let promote_self = service
            .update(
                &actor(&ana),
                &ana.id.to_string(),
                UserChanges {
                    role: Some(Role::Admin),
                    ..UserChanges::default()
                },
            )
            .await;
        assert!(matches!(promote_self, Err(ServiceError::Authorization(_))));

        let promoted = service
            .update(
                &actor(&admin),
                &luis.id.to_string(),
                UserChanges {
                    role: Some(Role::Teacher),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(promoted.role, Role::Teacher);
    }

    #[tokio::test]
    async fn test_update_email_conflict_and_password_rehash() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        let ana = auth
            .register(
                Registration {
                    name: "Ana".to_owned(),
                    email: "ana@x.com".to_owned(),
                    password: "secret1".to_owned(),
                    role: None,
                },
                None,
            )
            .await
            .unwrap();
        seed_user(&store, "Luis", "luis@x.com", Role::Student).await;
        let service = UserService::new(&store);
        let id = ana.id.to_string();

        let taken = service
            .update(
                &actor(&ana),
                &id,
                UserChanges {
                    email: Some("luis@x.com".to_owned()),
                    ..UserChanges::default()
                },
            )
            .await;
        assert!(matches!(taken, Err(ServiceError::Conflict(_))));

        let short = service
            .update(
                &actor(&ana),
                &id,
                UserChanges {
                    password: Some("123".to_owned()),
                    ..UserChanges::default()
                },
            )
            .await;
        assert!(matches!(short, Err(ServiceError::Validation(_))));

        service
            .update(
                &actor(&ana),
                &id,
                UserChanges {
                    password: Some("new-secret".to_owned()),
                    ..UserChanges::default()
                },
            )
            .await
            .unwrap();
        assert!(auth.login("ana@x.com", "secret1").await.is_err());
        assert!(auth.login("ana@x.com", "new-secret").await.is_ok());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let ana = seed_user(&store, "Ana", "ana@x.com", Role::Student).await;
        let service = UserService::new(&store);

        service.delete(&ana.id.to_string()).await.unwrap();
        assert!(matches!(
            service.delete(&ana.id.to_string()).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
