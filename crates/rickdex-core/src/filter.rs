//! Compound predicate filtering over record sequences.
//!
//! Filtering is order-preserving and a conjunction of every active criterion.
//! `None` on a categorical field is the "all" sentinel.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{Record, Status};

/// The active combination of free-text and categorical filter values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Case-insensitive substring match against the record name.
    pub text: String,
    /// Exact match on status.
    pub status: Option<Status>,
    /// Exact match on species.
    pub species: Option<String>,
    /// Exact match on the last known location name.
    pub location: Option<String>,
}

impl Predicate {
    /// The no-op predicate: matches everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = Some(species.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Returns true if no filter criteria are active.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.text.trim().is_empty()
            && self.status.is_none()
            && self.species.is_none()
            && self.location.is_none()
    }

    /// Returns true if the record satisfies all active criteria.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(ref species) = self.species {
            if record.species != *species {
                return false;
            }
        }
        if let Some(ref location) = self.location {
            if record.location_name() != location.as_str() {
                return false;
            }
        }
        let needle = self.text.trim();
        if !needle.is_empty() {
            let needle = needle.to_lowercase();
            if !record.name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Apply `predicate` to `records`, keeping the original relative order.
#[must_use]
pub fn apply(records: &[Record], predicate: &Predicate) -> Vec<Record> {
    if predicate.is_noop() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| predicate.matches(record))
        .cloned()
        .collect()
}

/// Distinct values available for each categorical filter, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub statuses: Vec<Status>,
    pub species: Vec<String>,
    pub locations: Vec<String>,
}

impl FilterOptions {
    /// Collect filter choices from a record set. Empty values are skipped.
    #[must_use]
    pub fn from_records(records: &[Record]) -> Self {
        let mut statuses = BTreeSet::new();
        let mut species = BTreeSet::new();
        let mut locations = BTreeSet::new();

        for record in records {
            statuses.insert(record.status);
            if !record.species.is_empty() {
                species.insert(record.species.clone());
            }
            if !record.location_name().is_empty() {
                locations.insert(record.location_name().to_string());
            }
        }

        Self {
            statuses: statuses.into_iter().collect(),
            species: species.into_iter().collect(),
            locations: locations.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FilterOptions, Predicate, apply};
    use crate::model::Status;
    use crate::model::fixtures::record;

    fn cast() -> Vec<crate::model::Record> {
        vec![
            record(1, "Rick Sanchez", Status::Alive, "Human", "Citadel of Ricks"),
            record(2, "Morty Smith", Status::Alive, "Human", "Earth"),
            record(3, "Summer Smith", Status::Alive, "Human", "Earth"),
            record(4, "Birdperson", Status::Dead, "Bird-Person", "Bird World"),
            record(5, "Evil Morty", Status::Unknown, "Human", "Citadel of Ricks"),
        ]
    }

    fn ids(records: &[crate::model::Record]) -> Vec<u32> {
        records.iter().map(|r| r.id.0).collect()
    }

    #[test]
    fn noop_predicate_keeps_everything() {
        let records = cast();
        assert!(Predicate::all().is_noop());
        assert!(Predicate::all().with_text("   ").is_noop());
        assert_eq!(apply(&records, &Predicate::all()), records);
    }

    #[test]
    fn text_matches_name_case_insensitively() {
        let out = apply(&cast(), &Predicate::all().with_text("MORTY"));
        assert_eq!(ids(&out), vec![2, 5]);
    }

    #[test]
    fn text_is_trimmed() {
        let out = apply(&cast(), &Predicate::all().with_text("  smith "));
        assert_eq!(ids(&out), vec![2, 3]);
    }

    #[test]
    fn categorical_filters_are_exact() {
        let out = apply(&cast(), &Predicate::all().with_species("human"));
        assert!(out.is_empty(), "species match is case-sensitive");

        let out = apply(&cast(), &Predicate::all().with_location("Earth"));
        assert_eq!(ids(&out), vec![2, 3]);
    }

    #[test]
    fn criteria_combine_with_and() {
        let predicate = Predicate::all()
            .with_status(Status::Alive)
            .with_species("Human")
            .with_location("Citadel of Ricks");
        assert_eq!(ids(&apply(&cast(), &predicate)), vec![1]);

        let predicate = Predicate::all().with_text("morty").with_status(Status::Alive);
        assert_eq!(ids(&apply(&cast(), &predicate)), vec![2]);
    }

    #[test]
    fn options_are_unique_and_sorted() {
        let options = FilterOptions::from_records(&cast());
        assert_eq!(
            options.statuses,
            vec![Status::Alive, Status::Dead, Status::Unknown]
        );
        assert_eq!(options.species, vec!["Bird-Person", "Human"]);
        assert_eq!(
            options.locations,
            vec!["Bird World", "Citadel of Ricks", "Earth"]
        );
    }
}
