use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{ParseEnumError, Record};

/// Column a display view can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Id,
    Name,
    Status,
    Species,
    Gender,
    Origin,
    Location,
    Created,
}

impl SortField {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Status => "status",
            Self::Species => "species",
            Self::Gender => "gender",
            Self::Origin => "origin",
            Self::Location => "location",
            Self::Created => "created",
        }
    }

    /// String representation of the field used for comparison.
    ///
    /// Ids compare as strings too, so `"10"` orders before `"9"`.
    #[must_use]
    pub fn key(self, record: &Record) -> Cow<'_, str> {
        match self {
            Self::Id => Cow::Owned(record.id.to_string()),
            Self::Name => Cow::Borrowed(&record.name),
            Self::Status => Cow::Borrowed(record.status.as_str()),
            Self::Species => Cow::Borrowed(&record.species),
            Self::Gender => Cow::Owned(record.gender.to_string()),
            Self::Origin => Cow::Borrowed(&record.origin.name),
            Self::Location => Cow::Borrowed(record.location_name()),
            Self::Created => Cow::Borrowed(&record.created_at),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            "status" => Ok(Self::Status),
            "species" => Ok(Self::Species),
            "gender" => Ok(Self::Gender),
            "origin" => Ok(Self::Origin),
            "location" => Ok(Self::Location),
            "created" => Ok(Self::Created),
            _ => Err(ParseEnumError {
                expected: "sort field",
                got: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

/// A field plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Sort records by the string form of `key.field`, case-sensitive and
/// byte-lexicographic. Equal keys end up in unspecified relative order.
pub fn sort_records(records: &mut [Record], key: SortKey) {
    records.sort_unstable_by(|a, b| {
        let ord = key.field.key(a).cmp(&key.field.key(b));
        match key.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}
