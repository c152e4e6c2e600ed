use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::error::ApiError;
use crate::types::Gender;

use super::users_service::UsersService;

/// Credential check plus token mint.
pub struct AuthService {
    users: Arc<UsersService>,
}

impl AuthService {
    pub fn new(users: Arc<UsersService>) -> Self {
        Self { users }
    }

    /// Verify an email/password pair and return a signed token.
    ///
    /// Unknown email and wrong password produce the same rejection, so the
    /// response never confirms whether an account exists.
    pub async fn validate_user(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let record = self
            .users
            .find_credentials(email)
            .await?
            .ok_or_else(Self::rejection)?;

        let hash = record
            .get("password")
            .and_then(Value::as_str)
            .ok_or_else(Self::rejection)?;
        if !bcrypt::verify(password, hash).unwrap_or(false) {
            return Err(Self::rejection());
        }

        let claims = Self::claims_from_record(&record).ok_or_else(Self::rejection)?;
        generate_jwt(&claims).map_err(|e| ApiError::conflict("Error generating token", e))
    }

    fn claims_from_record(record: &Value) -> Option<Claims> {
        let id = Uuid::parse_str(record.get("id")?.as_str()?).ok()?;
        let email = record.get("email")?.as_str()?.to_string();
        let first_name = record.get("firstName")?.as_str()?.to_string();
        let last_name = record.get("lastName")?.as_str()?.to_string();
        let gender = Gender::parse(record.get("gender")?.as_str()?)?;
        let height = record.get("height")?.as_i64()?;
        Some(Claims::new(id, email, first_name, last_name, gender, height))
    }

    fn rejection() -> ApiError {
        ApiError::not_found("User not found")
    }
}
