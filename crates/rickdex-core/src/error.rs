use std::fmt;

/// Machine-readable error codes surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    FetchFailed,
    MetadataFetchFailed,
    DecodeFailed,
    RecordNotFound,
    StorageUnavailable,
    CorruptFavorites,
    NotAuthenticated,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::FetchFailed => "E2001",
            Self::MetadataFetchFailed => "E2002",
            Self::DecodeFailed => "E2003",
            Self::RecordNotFound => "E2004",
            Self::StorageUnavailable => "E3001",
            Self::CorruptFavorites => "E3002",
            Self::NotAuthenticated => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::FetchFailed => "Failed to load characters",
            Self::MetadataFetchFailed => "Failed to read catalog size",
            Self::DecodeFailed => "Unexpected response from catalog",
            Self::RecordNotFound => "Character not found",
            Self::StorageUnavailable => "Local storage unavailable",
            Self::CorruptFavorites => "Stored favorites were unreadable",
            Self::NotAuthenticated => "No user is logged in",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in rickdex/config.toml and retry."),
            Self::FetchFailed | Self::MetadataFetchFailed => {
                Some("Check your connection and try again.")
            }
            Self::DecodeFailed => Some("The catalog API may have changed; retry later."),
            Self::RecordNotFound => None,
            Self::StorageUnavailable => Some("Check that the data directory is writable."),
            Self::CorruptFavorites => Some("Favorites were reset to an empty list."),
            Self::NotAuthenticated => Some("Run `rdx login <uid>` first."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::error::Error for ErrorCode {}

/// User-visible failure recorded in the aggregator's error slot.
///
/// Carries a generic, retryable message; transport detail goes to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub code: ErrorCode,
    pub message: String,
}

impl LoadError {
    #[must_use]
    pub fn new(code: ErrorCode) -> Self {
        let message = match code.hint() {
            Some(hint) => format!("{}. {hint}", code.message()),
            None => code.message().to_string(),
        };
        Self { code, message }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for LoadError {}
