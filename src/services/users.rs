use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::auth::{user, AuthService};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::validation;

/// Registration payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterInput {
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,
    #[schema(example = "hunter22")]
    pub password: Option<String>,
    #[schema(example = "manager")]
    pub role: Option<String>,
}

/// Login payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginInput {
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,
    #[schema(example = "hunter22")]
    pub password: Option<String>,
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InternalError(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        ServiceError::InternalError(format!("Stored password hash is invalid: {}", e))
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Service for user accounts: registration and credential checks.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    auth_service: Arc<AuthService>,
}

impl UserService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        auth_service: Arc<AuthService>,
    ) -> Self {
        Self {
            db,
            event_sender,
            auth_service,
        }
    }

    /// Register a new account. Emails are unique across accounts.
    #[instrument(skip(self, input))]
    pub async fn register(&self, input: RegisterInput) -> Result<user::Model, ServiceError> {
        let (name, email, password, role) = validation::validate_registration(
            input.name.as_deref(),
            input.email.as_deref(),
            input.password.as_deref(),
            input.role.as_deref(),
        )?;

        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(&email))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(
                "Email already in use".to_string(),
            ));
        }

        let password_hash = hash_password(&password)?;

        let now = Utc::now();
        let account = user::ActiveModel {
            name: Set(name),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send(Event::UserRegistered(account.id))
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))?;

        info!(user_id = account.id, "User registered");
        Ok(account)
    }

    /// Check credentials and mint a token. An unknown email and a wrong
    /// password produce the same message.
    #[instrument(skip(self, input))]
    pub async fn authenticate(
        &self,
        input: LoginInput,
    ) -> Result<(user::Model, String), ServiceError> {
        let (email, password) =
            validation::validate_login(input.email.as_deref(), input.password.as_deref())?;

        let account = user::Entity::find()
            .filter(user::Column::Email.eq(&email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError("Invalid email or password".to_string())
            })?;

        if !verify_password(&password, &account.password_hash)? {
            return Err(ServiceError::ValidationError(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self.auth_service.generate_token(&account)?;

        info!(user_id = account.id, "User logged in");
        Ok((account, token))
    }
}
