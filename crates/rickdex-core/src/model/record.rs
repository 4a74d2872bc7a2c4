use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Stable identifier of a catalog record, shared by the bounded and full views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u32);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Self).map_err(|_| ParseEnumError {
            expected: "record id",
            got: s.to_string(),
        })
    }
}

/// Vital status of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    Alive,
    Dead,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Status {
    /// Wire spelling, as the remote catalog emits it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alive => "Alive",
            Self::Dead => "Dead",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Gender {
    Female,
    Male,
    Genderless,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl Gender {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Female => "Female",
            Self::Male => "Male",
            Self::Genderless => "Genderless",
            Self::Unknown => "unknown",
        }
    }
}

/// A named place with its resource reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(rename = "url", default)]
    pub reference: String,
}

/// One canonical catalog record as served by the remote dataset.
///
/// Records are immutable once loaded. Presentation state (favorite flag,
/// notes, image-loaded flag, resolved location name) is never stored here;
/// see [`crate::view::project`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub status: Status,
    pub species: String,
    /// Species subtype; often empty.
    #[serde(rename = "type", default)]
    pub subtype: String,
    #[serde(default)]
    pub gender: Gender,
    pub origin: Place,
    #[serde(rename = "location")]
    pub last_known_location: Place,
    #[serde(rename = "image")]
    pub image_ref: String,
    #[serde(rename = "episode", default)]
    pub episode_refs: Vec<String>,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "created")]
    pub created_at: String,
}

impl Record {
    /// Name of the last known location, as used by the location filter.
    #[must_use]
    pub fn location_name(&self) -> &str {
        &self.last_known_location.name
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "alive" => Ok(Self::Alive),
            "dead" => Ok(Self::Dead),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Gender {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "female" => Ok(Self::Female),
            "male" => Ok(Self::Male),
            "genderless" => Ok(Self::Genderless),
            "unknown" => Ok(Self::Unknown),
            _ => Err(ParseEnumError {
                expected: "gender",
                got: s.to_string(),
            }),
        }
    }
}
