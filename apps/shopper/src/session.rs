//! The signed-in shopper.
//!
//! Phone OTP happens elsewhere; this only holds the opaque user id it
//! produces. Every cart operation takes the session explicitly and asks it
//! for the user before touching the store.

use expressscan_core::types::UserId;
use expressscan_core::validation::validate_user_id;
use tracing::info;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<UserId>,
}

impl Session {
    /// A session with nobody signed in.
    pub fn anonymous() -> Self {
        Session::default()
    }

    /// A session for an id handed over by the authentication collaborator.
    pub fn signed_in(user_id: &str) -> AppResult<Self> {
        let mut session = Session::default();
        session.sign_in(user_id)?;
        Ok(session)
    }

    /// Blank or oversized ids are rejected as unauthenticated.
    pub fn sign_in(&mut self, user_id: &str) -> AppResult<&UserId> {
        let user = validate_user_id(user_id).map_err(|_| AppError::Unauthenticated)?;
        info!(user = %user, "Shopper signed in");
        Ok(self.user.insert(user))
    }

    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            info!(user = %user, "Shopper signed out");
        }
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// The user, or `Unauthenticated`.
    pub fn require_user(&self) -> AppResult<&UserId> {
        self.user.as_ref().ok_or(AppError::Unauthenticated)
    }
}
