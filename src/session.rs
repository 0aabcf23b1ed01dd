//! Identity/session collaborator — account bookkeeping, no authentication.
//!
//! The engine consumes identities that arrive already resolved; credential
//! checking is out of scope. What lives here is the narrow contract the
//! workflow needs: a user directory and a "current user" to attach to
//! created records.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use crate::db::{self, Collection, Storage};
use crate::models::{Identity, NewUser, UserAccount};
use crate::pipeline::error::WorkflowError;

/// Optional profile field updates; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub struct Session {
    store: Arc<dyn Storage>,
    current: Mutex<Option<Identity>>,
}

impl Session {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store, current: Mutex::new(None) }
    }

    /// Add an account to the user directory.
    pub fn register_user(&self, new_user: NewUser) -> Result<UserAccount, WorkflowError> {
        if new_user.name.trim().is_empty() || new_user.email.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "user name and email are required".to_string(),
            ));
        }

        let mut users: Vec<UserAccount> = db::load_all(self.store.as_ref(), Collection::Users)?;
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(WorkflowError::InvalidInput(format!(
                "email already registered: {}",
                new_user.email
            )));
        }

        let account = UserAccount {
            id: Uuid::new_v4(),
            role: new_user.role,
            name: new_user.name,
            email: new_user.email,
            phone: new_user.phone,
            registered_at: Utc::now(),
            last_login_at: None,
        };
        users.push(account.clone());
        db::store_all(self.store.as_ref(), Collection::Users, &users)?;

        tracing::info!(user_id = %account.id, role = %account.role, "user registered");
        Ok(account)
    }

    /// Resolve an account by email, stamp the login time and make it the
    /// current identity.
    pub fn sign_in(&self, email: &str) -> Result<Identity, WorkflowError> {
        let mut users: Vec<UserAccount> = db::load_all(self.store.as_ref(), Collection::Users)?;
        let account = users
            .iter_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "user",
                id: email.to_string(),
            })?;

        account.last_login_at = Some(Utc::now());
        let identity = account.identity();
        db::store_all(self.store.as_ref(), Collection::Users, &users)?;

        *self.current_guard() = Some(identity.clone());
        tracing::info!(user_id = %identity.id, "signed in");
        Ok(identity)
    }

    pub fn sign_out(&self) {
        *self.current_guard() = None;
    }

    pub fn current(&self) -> Option<Identity> {
        self.current_guard().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current_guard().is_some()
    }

    /// Update profile fields; keeps the current identity in sync when it is
    /// the updated account.
    pub fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<UserAccount, WorkflowError> {
        let mut users: Vec<UserAccount> = db::load_all(self.store.as_ref(), Collection::Users)?;

        if let Some(new_email) = &update.email {
            if users.iter().any(|u| u.id != user_id && &u.email == new_email) {
                return Err(WorkflowError::InvalidInput(format!(
                    "email already registered: {new_email}"
                )));
            }
        }

        let account = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "user",
                id: user_id.to_string(),
            })?;

        if let Some(name) = update.name {
            account.name = name;
        }
        if let Some(email) = update.email {
            account.email = email;
        }
        if let Some(phone) = update.phone {
            account.phone = Some(phone);
        }
        let updated = account.clone();

        db::store_all(self.store.as_ref(), Collection::Users, &users)?;

        let mut current = self.current_guard();
        if current.as_ref().is_some_and(|c| c.id == user_id) {
            *current = Some(updated.identity());
        }

        Ok(updated)
    }

    fn current_guard(&self) -> std::sync::MutexGuard<'_, Option<Identity>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::UserRole;

    fn session() -> Session {
        Session::new(Arc::new(MemoryStore::new()))
    }

    fn patient(email: &str) -> NewUser {
        NewUser {
            name: "Mei Wang".into(),
            email: email.into(),
            role: UserRole::Patient,
            phone: None,
        }
    }

    #[test]
    fn register_then_sign_in() {
        let session = session();
        let account = session.register_user(patient("mei@example.com")).unwrap();
        assert!(account.last_login_at.is_none());

        let identity = session.sign_in("mei@example.com").unwrap();
        assert_eq!(identity.id, account.id);
        assert!(session.is_signed_in());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let session = session();
        session.register_user(patient("mei@example.com")).unwrap();

        let err = session.register_user(patient("mei@example.com")).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let session = session();
        let err = session
            .register_user(NewUser {
                name: "  ".into(),
                email: "x@example.com".into(),
                role: UserRole::Patient,
                phone: None,
            })
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));
    }

    #[test]
    fn unknown_email_sign_in_is_not_found() {
        let session = session();
        let err = session.sign_in("nobody@example.com").unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound { entity: "user", .. }));
        assert!(!session.is_signed_in());
    }

    #[test]
    fn sign_out_clears_current() {
        let session = session();
        session.register_user(patient("mei@example.com")).unwrap();
        session.sign_in("mei@example.com").unwrap();

        session.sign_out();
        assert!(session.current().is_none());
    }

    #[test]
    fn update_profile_refreshes_current_identity() {
        let session = session();
        let account = session.register_user(patient("mei@example.com")).unwrap();
        session.sign_in("mei@example.com").unwrap();

        let updated = session
            .update_profile(
                account.id,
                ProfileUpdate { name: Some("Mei W. Chen".into()), ..ProfileUpdate::default() },
            )
            .unwrap();

        assert_eq!(updated.name, "Mei W. Chen");
        assert_eq!(session.current().unwrap().name, "Mei W. Chen");
    }

    #[test]
    fn update_cannot_steal_an_email() {
        let session = session();
        session.register_user(patient("mei@example.com")).unwrap();
        let other = session.register_user(patient("lin@example.com")).unwrap();

        let err = session
            .update_profile(
                other.id,
                ProfileUpdate { email: Some("mei@example.com".into()), ..ProfileUpdate::default() },
            )
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));
    }
}
