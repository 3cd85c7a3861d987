use std::fmt;

use crate::app::{HarvestError, Result};

pub const USERNAME_VAR: &str = "LINKEDIN_USERNAME";
pub const PASSWORD_VAR: &str = "LINKEDIN_PASSWORD";

/// Login for the authenticated source.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read credentials from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(USERNAME_VAR)
            .filter(|v| !v.is_empty())
            .ok_or(HarvestError::MissingCredentials(USERNAME_VAR))?;
        let password = lookup(PASSWORD_VAR)
            .filter(|v| !v.is_empty())
            .ok_or(HarvestError::MissingCredentials(PASSWORD_VAR))?;
        Ok(Self { username, password })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}
