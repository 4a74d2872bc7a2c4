use crate::output::CliError;
use rickdex_core::model::{RecordId, Status};
use rickdex_core::sort::SortField;
use std::fmt;

pub const MAX_UID_LEN: usize = 128;
pub const MAX_NOTES_LEN: usize = 2000;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: &'static str,
    pub value: String,
    pub reason: String,
    pub suggestion: String,
    pub code: &'static str,
}

impl ValidationError {
    pub fn new(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
        suggestion: impl Into<String>,
        code: &'static str,
    ) -> Self {
        Self {
            field,
            value: value.into(),
            reason: reason.into(),
            suggestion: suggestion.into(),
            code,
        }
    }

    pub fn to_cli_error(&self) -> CliError {
        CliError::with_details(self.to_string(), self.suggestion.clone(), self.code)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} '{}': {}", self.field, self.value, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// A uid scopes stored favorites, so it is kept to a conservative charset.
pub fn validate_uid(s: &str) -> Result<(), ValidationError> {
    if s.is_empty() {
        return Err(ValidationError::new(
            "uid",
            s,
            "must not be empty",
            "pass a user id, e.g. `rdx login rick-c137`",
            "invalid_uid",
        ));
    }
    if s.chars().count() > MAX_UID_LEN {
        return Err(ValidationError::new(
            "uid",
            s,
            format!("must be <= {MAX_UID_LEN} characters"),
            "use a shorter user id",
            "invalid_uid",
        ));
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
    {
        return Err(ValidationError::new(
            "uid",
            s,
            "may only contain ASCII letters, digits, '-', '_', '.' and '@'",
            "remove spaces and punctuation from the user id",
            "invalid_uid",
        ));
    }
    Ok(())
}

pub fn validate_email(s: &str) -> Result<(), ValidationError> {
    let valid = s
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
        && !s.chars().any(char::is_whitespace);
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new(
            "email",
            s,
            "is not a valid email address",
            "use the form name@example.com",
            "invalid_email",
        ))
    }
}

pub fn validate_notes(s: &str) -> Result<(), ValidationError> {
    if s.chars().count() > MAX_NOTES_LEN {
        return Err(ValidationError::new(
            "notes",
            format!("{}...", s.chars().take(20).collect::<String>()),
            format!("must be <= {MAX_NOTES_LEN} characters"),
            "shorten the notes",
            "invalid_notes",
        ));
    }
    if s.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
        return Err(ValidationError::new(
            "notes",
            s,
            "must not contain control characters",
            "remove control characters from the notes",
            "invalid_notes",
        ));
    }
    Ok(())
}

pub fn parse_record_id(s: &str) -> Result<RecordId, ValidationError> {
    match s.parse::<RecordId>() {
        Ok(id) if id.0 > 0 => Ok(id),
        _ => Err(ValidationError::new(
            "id",
            s,
            "expected a positive integer",
            "use the numeric id shown by `rdx list`",
            "invalid_id",
        )),
    }
}

pub fn parse_status(s: &str) -> Result<Status, ValidationError> {
    s.parse().map_err(|_| {
        ValidationError::new(
            "status",
            s,
            "expected one of alive, dead, unknown",
            "use --status alive|dead|unknown",
            "invalid_status",
        )
    })
}

pub fn parse_sort_field(s: &str) -> Result<SortField, ValidationError> {
    s.parse().map_err(|_| {
        ValidationError::new(
            "sort field",
            s,
            "expected one of id, name, status, species, gender, origin, location, created",
            "use --sort name, --sort status, etc.",
            "invalid_sort",
        )
    })
}
