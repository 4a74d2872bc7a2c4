//! The current identity and its change stream.
//!
//! [`Session`] owns an `Observable<Option<Identity>>`. Every login or logout
//! is pushed to subscribers synchronously, before the call returns.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::kv::{KeyValueStore, StoreError};
use crate::observe::Observable;

/// Storage key under which the logged-in identity is remembered.
pub const SESSION_KEY: &str = "session";

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user id; scopes everything stored for this user.
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            username: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Holder of the current identity.
#[derive(Debug)]
pub struct Session<K> {
    kv: K,
    current: Observable<Option<Identity>>,
}

impl<K: KeyValueStore> Session<K> {
    /// Start with nobody logged in, ignoring anything stored.
    pub fn anonymous(kv: K) -> Self {
        Self {
            kv,
            current: Observable::new(None),
        }
    }

    /// Restore the remembered identity, if any.
    ///
    /// An unreadable or malformed session entry counts as logged out.
    pub fn restore(kv: K) -> Self {
        let identity = match kv.get(SESSION_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Identity>(&raw)
                .map_err(|err| warn!(error = %err, "ignoring malformed session entry"))
                .ok(),
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "session storage unreadable; starting logged out");
                None
            }
        };
        Self {
            kv,
            current: Observable::new(identity),
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.current.get()
    }

    /// The identity change stream.
    #[must_use]
    pub const fn identities(&self) -> &Observable<Option<Identity>> {
        &self.current
    }

    /// Remember `identity` and announce it.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity cannot be encoded or stored; nothing
    /// is announced in that case.
    pub fn login(&self, identity: Identity) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&identity).map_err(|source| StoreError::Encode {
            key: SESSION_KEY.to_string(),
            source,
        })?;
        self.kv.set(SESSION_KEY, &raw)?;
        info!(uid = %identity.uid, "logged in");
        self.current.set(Some(identity));
        Ok(())
    }

    /// Announce logout, then forget the stored identity.
    ///
    /// Subscribers observe `None` before this returns, even when forgetting
    /// the stored entry fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored entry cannot be removed.
    pub fn logout(&self) -> Result<(), StoreError> {
        let previous = self.current.get();
        self.current.set(None);
        if let Some(identity) = previous {
            info!(uid = %identity.uid, "logged out");
        }
        self.kv.remove(SESSION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::{Identity, SESSION_KEY, Session};
    use crate::error::ErrorCode;
    use crate::kv::{KeyValueStore, MemoryStore, StoreError};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn login_is_remembered_across_restore() {
        let kv = Rc::new(MemoryStore::new());
        let session = Session::restore(Rc::clone(&kv));
        assert_eq!(session.current(), None);

        session
            .login(Identity::new("abc123").with_email("rick@citadel.test"))
            .expect("login");

        let restored = Session::restore(Rc::clone(&kv));
        let identity = restored.current().expect("identity restored");
        assert_eq!(identity.uid, "abc123");
        assert_eq!(identity.email.as_deref(), Some("rick@citadel.test"));
    }

    #[test]
    fn logout_emits_none_synchronously() {
        let kv = Rc::new(MemoryStore::new());
        let session = Session::anonymous(Rc::clone(&kv));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = session
            .identities()
            .subscribe(move |id| sink.borrow_mut().push(id.as_ref().map(|i| i.uid.clone())));

        session.login(Identity::new("a")).expect("login");
        session.logout().expect("logout");

        assert_eq!(
            *seen.borrow(),
            vec![None, Some("a".to_string()), None]
        );
        assert_eq!(kv.get(SESSION_KEY).expect("get"), None);
    }

    #[test]
    fn malformed_session_counts_as_logged_out() {
        let kv = MemoryStore::new();
        kv.set(SESSION_KEY, "{not json").expect("set");
        assert_eq!(Session::restore(kv).current(), None);
    }

    #[test]
    fn login_stores_encoded_identity_and_encode_errors_are_internal() {
        let kv = Rc::new(MemoryStore::new());
        let session = Session::anonymous(Rc::clone(&kv));
        session.login(Identity::new("abc123")).expect("login");
        let raw = kv.get(SESSION_KEY).expect("get").expect("stored");
        let stored: Identity = serde_json::from_str(&raw).expect("valid identity json");
        assert_eq!(stored.uid, "abc123");

        let err = StoreError::Encode {
            key: SESSION_KEY.to_string(),
            source: serde_json::from_str::<u32>("x").expect_err("not a number"),
        };
        assert_eq!(err.code(), ErrorCode::InternalUnexpected);
    }
}
