use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::types::UserId;

/// signed-in caller as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: UserId,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<UserId>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// current caller identity with change notifications
///
/// The identity provider's auth-state callback feeds `sign_in`/`sign_out`;
/// checkout reads a snapshot with `current()` at confirm time and passes
/// it on as a plain value.
#[derive(Debug)]
pub struct IdentityWatch {
    sender: watch::Sender<Option<Identity>>,
}

impl IdentityWatch {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    pub fn signed_in(identity: Identity) -> Self {
        let (sender, _) = watch::channel(Some(identity));
        Self { sender }
    }

    pub fn sign_in(&self, identity: Identity) {
        log::debug!("identity changed: signed in as {}", identity.uid);
        self.sender.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        log::debug!("identity changed: signed out");
        self.sender.send_replace(None);
    }

    pub fn current(&self) -> Option<Identity> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.sender.subscribe()
    }
}

impl Default for IdentityWatch {
    fn default() -> Self {
        Self::new()
    }
}
