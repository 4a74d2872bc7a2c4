use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{Record, RecordId};

/// A favorited record: a snapshot of the record taken when it was added,
/// plus the user's notes.
///
/// The snapshot is a copy. Later reloads of the catalog never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    #[serde(flatten)]
    pub record: Record,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "addedDate")]
    pub added_at: DateTime<Utc>,
}

impl FavoriteEntry {
    #[must_use]
    pub fn new(record: &Record, notes: impl Into<String>, added_at: DateTime<Utc>) -> Self {
        Self {
            record: record.clone(),
            notes: notes.into(),
            added_at,
        }
    }

    #[must_use]
    pub const fn id(&self) -> RecordId {
        self.record.id
    }
}

#[cfg(test)]
mod tests {
    use super::FavoriteEntry;
    use crate::model::record::{Place, Record, RecordId, Status};
    use chrono::{TimeZone, Utc};

    fn morty() -> Record {
        Record {
            id: RecordId(2),
            name: "Morty Smith".into(),
            status: Status::Alive,
            species: "Human".into(),
            subtype: String::new(),
            gender: crate::model::record::Gender::Male,
            origin: Place::default(),
            last_known_location: Place {
                name: "Earth".into(),
                reference: String::new(),
            },
            image_ref: String::new(),
            episode_refs: vec![],
            url: String::new(),
            created_at: "2017-11-04T18:50:21.651Z".into(),
        }
    }

    #[test]
    fn stored_shape_is_flat_record_plus_annotations() {
        let added = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("valid date");
        let entry = FavoriteEntry::new(&morty(), "aw geez", added);
        let value = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(value["id"], 2);
        assert_eq!(value["name"], "Morty Smith");
        assert_eq!(value["notes"], "aw geez");
        assert!(value["addedDate"].is_string());

        let back: FavoriteEntry = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, entry);
    }

    #[test]
    fn notes_default_to_empty() {
        let mut value = serde_json::to_value(FavoriteEntry::new(&morty(), "", Utc::now()))
            .expect("serialize");
        value
            .as_object_mut()
            .expect("object")
            .remove("notes");
        let back: FavoriteEntry = serde_json::from_value(value).expect("deserialize");
        assert!(back.notes.is_empty());
    }
}
