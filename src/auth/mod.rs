use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::errors::ServiceError;

pub mod user;

pub use user::UserRole;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,    // Subject (user ID)
    pub name: String,   // User's name
    pub email: String,  // User's email
    pub role: UserRole, // User's role
    pub jti: String,    // JWT ID (unique identifier for this token)
    pub iat: i64,       // Issued at time
    pub exp: i64,       // Expiration time
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub token_id: String,
}

impl AuthUser {
    /// Check if the user holds one of the given roles
    pub fn has_any_role(&self, roles: &[UserRole]) -> bool {
        roles.contains(&self.role)
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: String, token_expiration: Duration) -> Self {
        Self {
            jwt_secret,
            token_expiration,
        }
    }
}

/// Authentication service that handles token issuance and validation
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user: &user::Model) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.token_expiration)
                .map_err(|_| ServiceError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Failed to create token: {}", e)))
    }

    /// Decode and validate a token, returning its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|_| ServiceError::AuthError("Unauthorized".to_string()))
    }
}

/// Set of roles allowed through a [`require_roles`] gate.
#[derive(Clone, Debug)]
pub struct RequiredRoles(pub &'static [UserRole]);

/// Authentication middleware: validates the bearer token and stores the
/// resulting [`AuthUser`] in the request extensions for downstream layers.
pub async fn auth_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .ok_or_else(|| ServiceError::AuthError("No token provided".to_string()))?;

    let claims = auth_service.validate_token(&token)?;

    let user_id: i32 = claims
        .sub
        .parse()
        .map_err(|_| ServiceError::AuthError("Unauthorized".to_string()))?;

    debug!(user_id, role = %claims.role, "Authenticated request");

    request.extensions_mut().insert(AuthUser {
        user_id,
        name: claims.name,
        email: claims.email,
        role: claims.role,
        token_id: claims.jti,
    });

    Ok(next.run(request).await)
}

/// Role gate middleware: rejects authenticated requests whose user does not
/// hold one of the required roles. Must run below [`auth_middleware`].
pub async fn require_roles(
    State(required): State<RequiredRoles>,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ServiceError::AuthError("No token provided".to_string()))?;

    if !user.has_any_role(required.0) {
        return Err(ServiceError::Forbidden("Forbidden".to_string()));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn service() -> AuthService {
        AuthService::new(AuthConfig::new(
            "test-secret-test-secret-test-secret-test-secret-test-secret-1234".into(),
            Duration::from_secs(3600),
        ))
    }

    fn sample_user() -> user::Model {
        user::Model {
            id: 7,
            name: "Test Owner".into(),
            email: "owner@example.com".into(),
            password_hash: "argon2-hash".into(),
            role: UserRole::Owner,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_roundtrip_preserves_identity() {
        let svc = service();
        let token = svc.generate_token(&sample_user()).unwrap();
        let claims = svc.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "owner@example.com");
        assert_eq!(claims.role, UserRole::Owner);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let svc = service();
        let other = AuthService::new(AuthConfig::new(
            "another-secret-another-secret-another-secret-another-secret-1234".into(),
            Duration::from_secs(3600),
        ));

        let token = other.generate_token(&sample_user()).unwrap();
        assert!(svc.validate_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = service();
        let now = Utc::now();
        let claims = Claims {
            sub: "7".into(),
            name: "Test Owner".into(),
            email: "owner@example.com".into(),
            role: UserRole::Owner,
            jti: Uuid::new_v4().to_string(),
            iat: (now - ChronoDuration::hours(2)).timestamp(),
            exp: (now - ChronoDuration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(svc.config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(svc.validate_token(&token).is_err());
    }

    #[test]
    fn role_membership_check() {
        let user = AuthUser {
            user_id: 1,
            name: "m".into(),
            email: "m@example.com".into(),
            role: UserRole::Manager,
            token_id: "t".into(),
        };

        assert!(user.has_any_role(&[UserRole::Owner, UserRole::Manager]));
        assert!(!user.has_any_role(&[UserRole::Owner]));
    }
}
