use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{errors::AppError, utils::verify_password};

/// An account holder. The password hash is optional so accounts can exist
/// before credentials are assigned.
#[derive(Serialize, Debug, Clone, FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub dated: DateTime<Utc>,
    pub is_deleted: bool,
}

impl User {
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// `Ok(false)` when no hash has been set yet.
    pub fn check_password(&self, candidate: &str) -> Result<bool, AppError> {
        match &self.password_hash {
            Some(hash) => verify_password(candidate, hash),
            None => Ok(false),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User {}", self.username)
    }
}

/// Metadata about an externally stored folder of financial documents.
#[derive(Serialize, Debug, Clone, FromRow)]
pub struct Directory {
    pub directories_id: i64,
    pub financial_year: String,
    pub category: String,
    pub description: String,
    pub filepath: String,
    pub dated: DateTime<Utc>,
    pub is_deleted: bool,
    pub user_id: i64,
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Directory {}/{}", self.financial_year, self.category)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct NewDirectory {
    pub financial_year: String,
    pub category: String,
    pub description: String,
    pub filepath: String,
    pub user_id: i64,
}
