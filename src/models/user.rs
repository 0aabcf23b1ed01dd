use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::UserRole;

/// The narrow identity view the workflow attaches to records it creates.
/// Always arrives already resolved — the engine never authenticates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
}

/// A registered account in the `users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub role: UserRole,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl UserAccount {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// Registration input.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
}
