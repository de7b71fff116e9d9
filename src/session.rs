use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInUser {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The currently authenticated user, if any. Sign-in itself happens
/// elsewhere; this only carries the resulting identity.
#[derive(Clone, Debug, Default)]
pub struct Session {
    user: Arc<RwLock<Option<SignedInUser>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, user: SignedInUser) {
        tracing::info!(uid = %user.uid, "signed in");
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = Some(user);
    }

    pub fn sign_out(&self) -> Option<SignedInUser> {
        self.user.write().unwrap_or_else(|e| e.into_inner()).take()
    }

    pub fn current(&self) -> Option<SignedInUser> {
        self.user.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn require(&self) -> AppResult<SignedInUser> {
        self.current().ok_or(AppError::NotAuthenticated)
    }
}
