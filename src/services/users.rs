//! User accounts and authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{Actor, CreateUser, LoginResponse, Role, UpdateUser, User, UserClaims, UserInfo},
    repository::Repository,
};

#[derive(Clone)]
pub struct UserService {
    repository: Repository,
    auth_config: AuthConfig,
}

impl UserService {
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            repository,
            auth_config,
        }
    }

    /// Register a new user. Usernames are unique; the role defaults to
    /// `operator` when omitted.
    pub async fn register(&self, request: CreateUser) -> AppResult<UserInfo> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if self
            .repository
            .users
            .get_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let role = request.role.unwrap_or(Role::Operator);

        let user = self
            .repository
            .users
            .insert(&request.username, &password_hash, role)
            .await?;

        tracing::info!(username = %user.username, role = %user.role, "user registered");
        Ok(user.into())
    }

    /// Verify credentials and issue a bearer token
    pub async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        verify_password(password, &user.password_hash)?;

        let now = Utc::now();
        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.auth_config.jwt_expiration_hours as i64)).timestamp(),
        };
        let token = claims
            .create_token(&self.auth_config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Token creation failed: {}", e)))?;

        tracing::info!(username = %user.username, "user logged in");
        Ok(LoginResponse {
            token,
            user: user.into(),
        })
    }

    /// Resolve the actor behind a bearer token
    pub fn authenticate(&self, token: &str) -> AppResult<Actor> {
        let claims = UserClaims::from_token(token, &self.auth_config.jwt_secret)
            .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))?;
        Ok(claims.actor())
    }

    pub async fn list(&self) -> AppResult<Vec<UserInfo>> {
        let users = self.repository.users.list().await?;
        Ok(users.into_iter().map(UserInfo::from).collect())
    }

    pub async fn get(&self, id: i64) -> AppResult<UserInfo> {
        let user = self.get_user(id).await?;
        Ok(user.into())
    }

    /// Change a user's role and/or password
    pub async fn update(&self, id: i64, request: UpdateUser) -> AppResult<UserInfo> {
        if request.role.is_none() && request.password.is_none() {
            return Err(AppError::NoChange("No fields to update".to_string()));
        }

        let mut user = self.get_user(id).await?;

        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(password) = request.password {
            if password.len() < 6 {
                return Err(AppError::Validation(
                    "Password must be at least 6 characters".to_string(),
                ));
            }
            user.password_hash = hash_password(&password)?;
        }

        if !self.repository.users.update(&user).await? {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(user.into())
    }

    /// Delete a user. Actors cannot delete themselves, and admin accounts
    /// can only be removed by another admin.
    pub async fn delete(&self, actor: &Actor, id: i64) -> AppResult<()> {
        if actor.id == id {
            return Err(AppError::Validation(
                "You cannot delete your own account".to_string(),
            ));
        }

        let user = self.get_user(id).await?;
        if user.role == Role::Admin && actor.role != Role::Admin {
            return Err(AppError::Forbidden(
                "Only an admin can delete an admin account".to_string(),
            ));
        }

        self.repository.users.delete(id).await?;
        tracing::info!(username = %user.username, "user deleted");
        Ok(())
    }

    async fn get_user(&self, id: i64) -> AppResult<User> {
        self.repository
            .users
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
    }
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> AppResult<()> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AppError::Authentication("Invalid username or password".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    fn service() -> UserService {
        UserService::new(Repository::in_memory(), AuthConfig::default())
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let service = service();
        let request = |role| CreateUser {
            username: "dian".to_string(),
            password: "secret123".to_string(),
            role,
        };
        service.register(request(Some(Role::Technician))).await.unwrap();

        let err = service.register(request(None)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_defaults_to_operator() {
        let service = service();
        let info = service
            .register(CreateUser {
                username: "budi".to_string(),
                password: "secret123".to_string(),
                role: None,
            })
            .await
            .unwrap();
        assert_eq!(info.role, Role::Operator);
    }

    #[tokio::test]
    async fn login_round_trip_issues_usable_token() {
        let service = service();
        service
            .register(CreateUser {
                username: "sari".to_string(),
                password: "secret123".to_string(),
                role: Some(Role::Supervisor),
            })
            .await
            .unwrap();

        let response = service.login("sari", "secret123").await.unwrap();
        let actor = service.authenticate(&response.token).unwrap();
        assert_eq!(actor.username, "sari");
        assert_eq!(actor.role, Role::Supervisor);

        let err = service.login("sari", "wrong-password").await.unwrap_err();
        assert!(matches!(err, AppError::Authentication(_)));
    }

    #[tokio::test]
    async fn delete_refuses_self_and_protects_admins() {
        let service = service();
        let admin = service
            .register(CreateUser {
                username: "root".to_string(),
                password: "secret123".to_string(),
                role: Some(Role::Admin),
            })
            .await
            .unwrap();
        let supervisor = service
            .register(CreateUser {
                username: "super".to_string(),
                password: "secret123".to_string(),
                role: Some(Role::Supervisor),
            })
            .await
            .unwrap();

        let admin_actor = Actor {
            id: admin.id,
            username: admin.username.clone(),
            role: Role::Admin,
        };
        let supervisor_actor = Actor {
            id: supervisor.id,
            username: supervisor.username.clone(),
            role: Role::Supervisor,
        };

        let err = service.delete(&admin_actor, admin.id).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .delete(&supervisor_actor, admin.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        service.delete(&admin_actor, supervisor.id).await.unwrap();
        assert_eq!(service.list().await.unwrap().len(), 1);
    }
}
