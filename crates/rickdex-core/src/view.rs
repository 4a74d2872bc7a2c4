//! Read-time projection of canonical records into display rows.
//!
//! Favorite status, notes, image-loaded flag and resolved location name are
//! derived here every time a row is read. Nothing computed here is written
//! back into a [`Record`].

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::{Record, RecordId};

/// Display name used when a record has no usable location.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// Per-record favorite annotations, as seen by the presentation layer.
pub trait FavoriteLookup {
    /// `Some(notes)` if `id` is a favorite of the current identity.
    fn favorite_notes(&self, id: RecordId) -> Option<String>;
}

/// Lookup for when nobody is logged in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFavorites;

impl FavoriteLookup for NoFavorites {
    fn favorite_notes(&self, _id: RecordId) -> Option<String> {
        None
    }
}

/// Presentation-only state keyed by record id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    image_loaded: HashSet<RecordId>,
    location_names: HashMap<RecordId, String>,
}

impl Overlay {
    pub fn mark_image_loaded(&mut self, id: RecordId) -> bool {
        self.image_loaded.insert(id)
    }

    #[must_use]
    pub fn is_image_loaded(&self, id: RecordId) -> bool {
        self.image_loaded.contains(&id)
    }

    pub fn set_location_name(&mut self, id: RecordId, name: impl Into<String>) {
        self.location_names.insert(id, name.into());
    }

    #[must_use]
    pub fn location_name(&self, id: RecordId) -> Option<&str> {
        self.location_names.get(&id).map(String::as_str)
    }
}

/// A record plus its presentation annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: Record,
    pub is_favorite: bool,
    pub notes: String,
    pub image_loaded: bool,
    pub location_name: String,
}

/// Display name for a record's location, before any overlay is applied.
#[must_use]
pub fn display_location(record: &Record) -> &str {
    let name = record.location_name().trim();
    if name.is_empty() || name.eq_ignore_ascii_case("unknown") {
        UNKNOWN_LOCATION
    } else {
        record.location_name()
    }
}

/// Project one canonical record into a display row.
#[must_use]
pub fn project(
    record: &Record,
    overlay: &Overlay,
    favorites: &impl FavoriteLookup,
) -> EnrichedRecord {
    let notes = favorites.favorite_notes(record.id);
    let location_name = overlay
        .location_name(record.id)
        .unwrap_or_else(|| display_location(record))
        .to_string();

    EnrichedRecord {
        record: record.clone(),
        is_favorite: notes.is_some(),
        notes: notes.unwrap_or_default(),
        image_loaded: overlay.is_image_loaded(record.id),
        location_name,
    }
}
