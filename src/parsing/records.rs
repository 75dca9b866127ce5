use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::record::{Record, RecordTable};
use crate::parsing::encoding::decode_input;
use crate::utils::validation::{check_record_limit, has_extension, is_identifier, MAX_RECORDS};

/// File extension accepted for sample input
pub const INPUT_EXTENSION: &str = "txt";

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported input file '{0}': expected a .txt file")]
    Extension(String),

    #[error("Failed to decode base64 input: {0}")]
    Decode(String),

    #[error("invalid format: {message} (line {line})")]
    Format { line: usize, message: String },

    #[error(transparent)]
    Empty(#[from] EmptyInput),

    #[error("Too many records: {0} exceeds maximum allowed ({max})", max = MAX_RECORDS)]
    TooManyRecords(usize),
}

/// Why an input produced no records
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyInput {
    #[error("empty input: no content after decoding")]
    NoContent,

    #[error("empty input: content present but no valid sample/identifier pairs")]
    NoRecords,
}

/// Parse a sample file after checking its extension
///
/// # Errors
///
/// Returns `ParseError::Extension` if the file does not end in `.txt`,
/// `ParseError::Io` if it cannot be read, or any error from [`parse`].
pub fn parse_file(path: &Path) -> Result<RecordTable, ParseError> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    check_extension(&filename)?;

    let content = std::fs::read_to_string(path)?;
    Ok(parse(&content)?.with_source(path.display().to_string()))
}

/// Parse uploaded content whose original filename is known
///
/// # Errors
///
/// Returns `ParseError::Extension` before looking at the content if
/// `filename` does not end in `.txt`, or any error from [`parse`].
pub fn parse_named(filename: &str, raw: &str) -> Result<RecordTable, ParseError> {
    check_extension(filename)?;
    Ok(parse(raw)?.with_source(filename))
}

/// Reject filenames that do not carry the accepted input extension.
///
/// # Errors
///
/// Returns `ParseError::Extension` naming the offending file.
pub fn check_extension(filename: &str) -> Result<(), ParseError> {
    if has_extension(filename, INPUT_EXTENSION) {
        Ok(())
    } else {
        Err(ParseError::Extension(filename.to_string()))
    }
}

/// Parse sample text, literal or wrapped in a base64 data URI
///
/// ```text
/// >SampleA
/// K00001
/// K00002
/// >SampleB
/// K00006
/// ```
///
/// A `>` line opens a sample; each identifier line below it yields one
/// record. Blank lines are ignored. Unrecognized lines inside a sample are
/// skipped with a warning.
///
/// # Errors
///
/// Returns `ParseError::Decode` for an undecodable data URI,
/// `ParseError::Format` if content appears before the first header or a
/// header has no name, `ParseError::Empty` if there is no content or no
/// records, or `ParseError::TooManyRecords` if the limit is exceeded.
pub fn parse(raw: &str) -> Result<RecordTable, ParseError> {
    let text = decode_input(raw)?;
    if text.trim().is_empty() {
        return Err(EmptyInput::NoContent.into());
    }

    let mut samples: Vec<String> = Vec::new();
    let mut records = Vec::new();
    let mut skipped_lines = 0;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;

        if let Some(name) = line.strip_prefix('>') {
            let name = name.trim();
            if name.is_empty() {
                return Err(ParseError::Format {
                    line: line_num,
                    message: "sample header has no name".to_string(),
                });
            }
            samples.push(name.to_string());
            continue;
        }

        let Some(sample) = samples.last() else {
            return Err(ParseError::Format {
                line: line_num,
                message: "expected '>' to start a sample block".to_string(),
            });
        };

        if !is_identifier(line) {
            warn!(
                line = line_num,
                sample = %sample,
                content = %line,
                "Skipping line that is not an orthology identifier"
            );
            skipped_lines += 1;
            continue;
        }

        // Check record limit for DOS protection
        if check_record_limit(records.len()).is_some() {
            return Err(ParseError::TooManyRecords(records.len()));
        }

        records.push(Record::new(sample.clone(), line));
    }

    if records.is_empty() {
        return Err(EmptyInput::NoRecords.into());
    }

    debug!(
        samples = samples.len(),
        records = records.len(),
        skipped_lines,
        "Parsed sample input"
    );

    Ok(RecordTable::from_parts(samples, records, skipped_lines))
}
