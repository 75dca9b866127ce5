//! Centralized validation and helper functions.

/// Maximum number of records allowed from a single input (DOS protection)
pub const MAX_RECORDS: usize = 1_000_000;

/// Security-related constants for input validation
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Prefix shared by every KEGG Orthology identifier
pub const IDENTIFIER_PREFIX: char = 'K';

/// Check whether a trimmed line is a KEGG Orthology identifier: `K` followed
/// by one or more ASCII digits and nothing else.
///
/// # Examples
///
/// ```
/// use ko_merge::utils::validation::is_identifier;
///
/// assert!(is_identifier("K00001"));
/// assert!(!is_identifier("K"));
/// assert!(!is_identifier("K0000A"));
/// assert!(!is_identifier("k00001"));
/// ```
#[must_use]
pub fn is_identifier(s: &str) -> bool {
    s.strip_prefix(IDENTIFIER_PREFIX)
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Check if adding another record would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new record.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_record_limit(count: usize) -> Option<String> {
    if count >= MAX_RECORDS {
        Some(format!(
            "Too many records: adding another would exceed maximum of {MAX_RECORDS}"
        ))
    } else {
        None
    }
}

/// Check whether a filename ends in `.{extension}`, ignoring case.
#[must_use]
pub fn has_extension(filename: &str, extension: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(extension))
}

/// Security validation error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Filename too long: exceeds {MAX_FILENAME_LENGTH} characters")]
    FilenameTooLong,
    #[error("Invalid filename: contains path traversal or invalid characters")]
    InvalidFilename,
    #[error("Empty filename provided")]
    EmptyFilename,
}

/// Secure filename validation to prevent directory traversal and other attacks
///
/// Used for output names derived from configuration (database names), which
/// must stay inside the output directory.
///
/// # Errors
///
/// Returns `ValidationError::EmptyFilename` if the filename is empty,
/// `ValidationError::FilenameTooLong` if it exceeds the limit, or
/// `ValidationError::InvalidFilename` if it contains invalid characters.
pub fn validate_filename(filename: &str) -> Result<String, ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::EmptyFilename);
    }

    if filename.len() > MAX_FILENAME_LENGTH {
        return Err(ValidationError::FilenameTooLong);
    }

    // Prevent directory traversal attacks
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(ValidationError::InvalidFilename);
    }

    // Check for null bytes and other dangerous characters
    if filename.contains('\0') || filename.chars().any(|c| ('\x01'..='\x1F').contains(&c)) {
        return Err(ValidationError::InvalidFilename);
    }

    let sanitized = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-' || *c == '_')
        .collect::<String>();

    if sanitized.trim().is_empty() || sanitized.starts_with('.') {
        return Err(ValidationError::InvalidFilename);
    }

    Ok(sanitized)
}
