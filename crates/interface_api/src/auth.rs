//! Authentication
//!
//! Bearer tokens are HS256 JWTs. Each token names exactly one role; doctors
//! also carry a doctor scope, either explicitly or derived from the local
//! part of their e-mail address.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use domain_access::{AccessError, DoctorId, Principal, Role};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Wire name of the user's role, e.g. `frontdesk_staff`
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid principal: {0}")]
    InvalidPrincipal(#[from] AccessError),
}

impl Claims {
    /// Resolves the principal the token speaks for
    pub fn principal(&self) -> Result<Principal, AuthError> {
        let role: Role = self.role.parse()?;

        let doctor_id = match (&self.doctor_id, &self.email) {
            (Some(id), _) => Some(DoctorId::new(id.as_str())),
            (None, Some(email)) if role == Role::Doctor => Some(DoctorId::from_email(email)?),
            (None, _) => None,
        };

        let principal = Principal {
            id: self.sub.clone(),
            role,
            doctor_id,
            name: self.name.clone(),
        };
        principal.validate()?;
        Ok(principal)
    }
}

/// Creates a signed token for `principal`
pub fn create_token(
    principal: &Principal,
    email: Option<&str>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: principal.id.clone(),
        email: email.map(str::to_string),
        name: principal.name.clone(),
        role: principal.role.to_string(),
        doctor_id: principal.doctor_id.as_ref().map(|id| id.to_string()),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn claims(role: &str) -> Claims {
        Claims {
            sub: "user-1".to_string(),
            email: None,
            name: None,
            role: role.to_string(),
            doctor_id: None,
            exp: Utc::now().timestamp() + 60,
            iat: Utc::now().timestamp(),
        }
    }

    #[test]
    fn test_token_round_trip_keeps_doctor_scope() {
        let principal = Principal::doctor("user-7", "dr-rao").with_name("Dr. Rao");
        let token = create_token(&principal, None, SECRET, 60).unwrap();

        let decoded = validate_token(&token, SECRET).unwrap().principal().unwrap();
        assert_eq!(decoded, principal);
    }

    #[test]
    fn test_doctor_scope_derived_from_email() {
        let mut claims = claims("doctor");
        claims.email = Some("meera@dakshinrehab.com".to_string());

        let principal = claims.principal().unwrap();
        assert_eq!(principal.doctor_id, Some(DoctorId::new("meera")));
    }

    #[test]
    fn test_doctor_without_scope_is_rejected() {
        assert!(matches!(
            claims("doctor").principal(),
            Err(AuthError::InvalidPrincipal(AccessError::MissingDoctorId(_)))
        ));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        assert!(matches!(
            claims("receptionist").principal(),
            Err(AuthError::InvalidPrincipal(AccessError::UnknownRole(_)))
        ));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = create_token(&Principal::new("u", Role::Admin), None, SECRET, 60).unwrap();
        assert!(matches!(
            validate_token(&token, "other-secret"),
            Err(AuthError::InvalidToken)
        ));
    }
}
