//! Degraded user records served while the user API is unavailable.

use std::collections::HashMap;

use crate::users::model::User;

/// Static username → user table. Read-only once built.
#[derive(Debug, Clone)]
pub struct FallbackTable {
    users: HashMap<String, User>,
}

impl FallbackTable {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|u| (u.username.clone(), u))
                .collect(),
        }
    }

    pub fn get(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    /// The table entry for `username`, or a synthesized `Unknown User` record.
    /// The flag is true when the entry came from the table.
    pub fn resolve(&self, username: &str) -> (User, bool) {
        match self.users.get(username) {
            Some(user) => (user.clone(), true),
            None => (User::new(username, "Unknown", "User", "USER"), false),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for FallbackTable {
    fn default() -> Self {
        Self::new(default_users())
    }
}

/// Built-in fallback users.
pub fn default_users() -> Vec<User> {
    vec![
        User::new("admin", "Admin", "User", "ADMIN"),
        User::new("johnd", "John", "Doe", "USER"),
        User::new("janed", "Jane", "Doe", "USER"),
    ]
}
