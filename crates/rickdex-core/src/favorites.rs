//! Per-identity favorites with notes.
//!
//! The in-memory collection always equals the persisted collection of the
//! current identity. On every identity change it is replaced wholesale, and
//! on logout it is emptied before any subscriber can read it.
//!
//! Every mutation recomputes the whole collection, persists it as one blob
//! under `favorites_{uid}`, and only then commits it to memory.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::ErrorCode;
use crate::kv::{KeyValueStore, StoreError};
use crate::model::{FavoriteEntry, Record, RecordId};
use crate::observe::{Observable, Subscription};
use crate::session::Identity;
use crate::view::FavoriteLookup;

pub const SCOPE_KEY_PREFIX: &str = "favorites_";

/// Storage key for an identity's favorites blob.
#[must_use]
pub fn scope_key(identity: &Identity) -> String {
    format!("{SCOPE_KEY_PREFIX}{}", identity.uid)
}

/// Result of a favorites mutation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    Skipped(SkipReason),
}

impl Mutation {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Nobody is logged in.
    NoIdentity,
    /// `add` for an id that is already a favorite.
    AlreadyFavorite,
    /// Notes update or removal for an id that is not a favorite.
    NotFound,
    /// Notes update with blank text.
    BlankNotes,
}

#[derive(Debug, Error)]
pub enum FavoritesError {
    #[error("failed to persist favorites under '{key}': {source}")]
    Persist {
        key: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to encode favorites for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FavoritesError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Persist { .. } => ErrorCode::StorageUnavailable,
            Self::Encode { .. } => ErrorCode::InternalUnexpected,
        }
    }
}

/// Favorites of whichever identity is current.
#[derive(Debug)]
pub struct FavoritesStore<K> {
    kv: K,
    identity: RefCell<Option<Identity>>,
    entries: Observable<Vec<FavoriteEntry>>,
}

impl<K: KeyValueStore> FavoritesStore<K> {
    /// An empty store with no identity; nothing can be added until
    /// [`FavoritesStore::switch_identity`] runs.
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            identity: RefCell::new(None),
            entries: Observable::new(Vec::new()),
        }
    }

    /// Track `identities`, swapping the working set on every emission.
    ///
    /// The current identity is applied immediately. The subscription holds
    /// only a weak reference to the store.
    #[must_use = "dropping the subscription stops identity tracking"]
    pub fn follow(self: &Rc<Self>, identities: &Observable<Option<Identity>>) -> Subscription
    where
        K: 'static,
    {
        let store = Rc::downgrade(self);
        identities.subscribe(move |identity| {
            if let Some(store) = store.upgrade() {
                store.switch_identity(identity.as_ref());
            }
        })
    }

    /// Replace the working set with `identity`'s persisted collection, or
    /// with nothing when `identity` is `None`.
    pub fn switch_identity(&self, identity: Option<&Identity>) {
        let loaded = identity.map_or_else(Vec::new, |identity| self.load(identity));
        *self.identity.borrow_mut() = identity.cloned();
        match identity {
            Some(identity) => info!(uid = %identity.uid, count = loaded.len(), "favorites loaded"),
            None => debug!("favorites cleared"),
        }
        self.entries.set(loaded);
    }

    fn load(&self, identity: &Identity) -> Vec<FavoriteEntry> {
        let key = scope_key(identity);
        let raw = match self.kv.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(key, error = %err, "favorites unreadable; starting empty");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(
                key,
                code = %ErrorCode::CorruptFavorites,
                error = %err,
                "favorites blob is corrupt; starting empty"
            );
            Vec::new()
        })
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    /// Snapshot of the current collection, in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<FavoriteEntry> {
        self.entries.get()
    }

    /// Stream of collection replacements.
    #[must_use]
    pub const fn observe(&self) -> &Observable<Vec<FavoriteEntry>> {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    #[must_use]
    pub fn is_favorite(&self, id: RecordId) -> bool {
        self.entries.borrow().iter().any(|entry| entry.id() == id)
    }

    #[must_use]
    pub fn get(&self, id: RecordId) -> Option<FavoriteEntry> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.id() == id)
            .cloned()
    }

    /// Snapshot `record` into the collection with `notes`.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::Persist`] if the updated collection cannot
    /// be stored; the in-memory collection is left unchanged.
    pub fn add(&self, record: &Record, notes: &str) -> Result<Mutation, FavoritesError> {
        self.mutate(|entries| {
            if entries.iter().any(|entry| entry.id() == record.id) {
                return Err(SkipReason::AlreadyFavorite);
            }
            entries.push(FavoriteEntry::new(record, notes, Utc::now()));
            Ok(())
        })
    }

    /// Drop `id` from the collection.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::Persist`] if the updated collection cannot
    /// be stored.
    pub fn remove(&self, id: RecordId) -> Result<Mutation, FavoritesError> {
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|entry| entry.id() != id);
            if entries.len() == before {
                Err(SkipReason::NotFound)
            } else {
                Ok(())
            }
        })
    }

    /// Replace the notes of an existing favorite.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::Persist`] if the updated collection cannot
    /// be stored.
    pub fn update_notes(&self, id: RecordId, notes: &str) -> Result<Mutation, FavoritesError> {
        if notes.trim().is_empty() {
            return Ok(Mutation::Skipped(SkipReason::BlankNotes));
        }
        self.mutate(|entries| {
            let entry = entries
                .iter_mut()
                .find(|entry| entry.id() == id)
                .ok_or(SkipReason::NotFound)?;
            entry.notes = notes.to_string();
            Ok(())
        })
    }

    /// Remove `record` if it is a favorite, add it with `notes` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`FavoritesError::Persist`] if the updated collection cannot
    /// be stored.
    pub fn toggle(&self, record: &Record, notes: &str) -> Result<Mutation, FavoritesError> {
        if self.is_favorite(record.id) {
            self.remove(record.id)
        } else {
            self.add(record, notes)
        }
    }

    fn mutate(
        &self,
        edit: impl FnOnce(&mut Vec<FavoriteEntry>) -> Result<(), SkipReason>,
    ) -> Result<Mutation, FavoritesError> {
        let Some(identity) = self.identity() else {
            debug!("favorites mutation ignored: no identity");
            return Ok(Mutation::Skipped(SkipReason::NoIdentity));
        };

        let mut next = self.entries.get();
        if let Err(reason) = edit(&mut next) {
            return Ok(Mutation::Skipped(reason));
        }

        let key = scope_key(&identity);
        let blob = serde_json::to_string(&next).map_err(|source| FavoritesError::Encode {
            key: key.clone(),
            source,
        })?;
        self.kv
            .set(&key, &blob)
            .map_err(|source| FavoritesError::Persist {
                key: key.clone(),
                source,
            })?;

        debug!(key, count = next.len(), "favorites persisted");
        self.entries.set(next);
        Ok(Mutation::Applied)
    }
}

impl<K: KeyValueStore> FavoriteLookup for FavoritesStore<K> {
    fn favorite_notes(&self, id: RecordId) -> Option<String> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.id() == id)
            .map(|entry| entry.notes.clone())
    }
}
