use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::db::models::Role;
use crate::db::queries;
use crate::error::AppError;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Caller identity resolved from a signed bearer token. Handlers receive
/// this instead of reading shared request state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "This action requires the admin role".to_string(),
            ))
        }
    }
}

/// Token format: `<user-id>.<hex hmac-sha256 of user-id>`.
pub fn sign_token(user_id: Uuid, secret: &str) -> String {
    let id = user_id.to_string();
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key size");
    mac.update(id.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("{}.{}", id, signature)
}

/// Verify a token signature (constant-time) and extract the user id.
pub fn verify_token(token: &str, secret: &str) -> Result<Uuid, AppError> {
    let (id_part, signature_part) = token
        .split_once('.')
        .ok_or_else(|| AppError::Unauthorized("Malformed token".to_string()))?;

    let expected = hex::decode(signature_part)
        .map_err(|_| AppError::Unauthorized("Malformed token signature".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("Invalid token secret".to_string()))?;
    mac.update(id_part.as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| AppError::Unauthorized("Token signature mismatch".to_string()))?;

    Uuid::parse_str(id_part).map_err(|_| AppError::Unauthorized("Malformed token id".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header.strip_prefix("Bearer ").unwrap_or(header);
        let user_id = verify_token(token, &state.config.auth_token_secret)?;

        let user = queries::get_user(&state.db, user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

        if user.status == "blocked" {
            return Err(AppError::Forbidden("This account is blocked".to_string()));
        }

        let role = Role::parse(&user.role)
            .ok_or_else(|| AppError::Internal(format!("Unknown role: {}", user.role)))?;

        Ok(AuthUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_round_trips() {
        let id = Uuid::new_v4();
        let token = sign_token(id, SECRET);
        assert_eq!(verify_token(&token, SECRET).unwrap(), id);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let id = Uuid::new_v4();
        let other = Uuid::new_v4();
        let token = sign_token(id, SECRET);
        let signature = token.split_once('.').unwrap().1;
        let forged = format!("{}.{}", other, signature);

        assert!(matches!(
            verify_token(&forged, SECRET),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let id = Uuid::new_v4();
        let token = sign_token(id, SECRET);
        assert!(verify_token(&token, "another-secret").is_err());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(verify_token("no-dot-here", SECRET).is_err());
        assert!(verify_token("abc.nothex!", SECRET).is_err());
        assert!(verify_token("not-a-uuid.00ff", SECRET).is_err());
    }

    #[test]
    fn require_admin_gates_on_role() {
        let admin = AuthUser {
            id: Uuid::new_v4(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            role: Role::Admin,
        };
        let customer = AuthUser {
            id: Uuid::new_v4(),
            name: "Badal".to_string(),
            email: "badal@example.com".to_string(),
            role: Role::User,
        };

        assert!(admin.require_admin().is_ok());
        assert!(matches!(
            customer.require_admin(),
            Err(AppError::Forbidden(_))
        ));
    }
}
