//! User lookup.
//!
//! `UserDetailsService` is the seam to whatever stores credentials. The in-memory
//! implementation is fed from the `[[users]]` configuration table.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::UserConfig;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
    pub roles: Vec<String>,
}

/// A stored user record.
#[derive(Debug, Clone)]
pub struct UserDetails {
    pub username: String,
    /// Encoded password, opaque to the gateway.
    pub password: String,
    pub roles: Vec<String>,
}

impl UserDetails {
    pub fn principal(&self) -> Principal {
        Principal {
            username: self.username.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// Looks up users by name.
pub trait UserDetailsService: Send + Sync {
    fn load_user(&self, username: &str) -> Option<UserDetails>;
}

/// Users held in memory, keyed by username.
#[derive(Debug, Default)]
pub struct InMemoryUserDetailsService {
    users: HashMap<String, UserDetails>,
}

impl InMemoryUserDetailsService {
    pub fn new(users: impl IntoIterator<Item = UserDetails>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|u| (u.username.clone(), u))
                .collect(),
        }
    }

    pub fn from_config(users: &[UserConfig]) -> Self {
        Self::new(users.iter().map(|u| UserDetails {
            username: u.username.clone(),
            password: u.password.clone(),
            roles: u.roles.clone(),
        }))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDetailsService for InMemoryUserDetailsService {
    fn load_user(&self, username: &str) -> Option<UserDetails> {
        self.users.get(username).cloned()
    }
}
