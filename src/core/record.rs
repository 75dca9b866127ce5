use serde::Serialize;
use std::collections::HashSet;

use crate::core::table::{Column, Table};

/// Column holding the sample label in a record table
pub const SAMPLE_COLUMN: &str = "sample";

/// Column holding the KEGG Orthology identifier; the join key by default
pub const KEY_COLUMN: &str = "ko";

/// A single `(sample, identifier)` pair from the input text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    sample: String,
    identifier: String,
}

impl Record {
    pub fn new(sample: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            sample: sample.into(),
            identifier: identifier.into(),
        }
    }

    #[must_use]
    pub fn sample(&self) -> &str {
        &self.sample
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Summary counts for a parsed record table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordStats {
    pub samples: usize,
    pub records: usize,
    pub unique_identifiers: usize,
    /// Samples whose header was followed by no identifiers
    pub empty_samples: Vec<String>,
    /// Lines under a sample that were neither a header nor an identifier
    pub skipped_lines: usize,
}

/// Ordered records parsed from one input, plus the sample headers seen.
///
/// Duplicate `(sample, identifier)` pairs are kept as separate rows.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    /// Source file path (if known)
    pub source: Option<String>,

    records: Vec<Record>,

    /// Every sample header in order of appearance, including empty ones
    samples: Vec<String>,

    skipped_lines: usize,
}

impl RecordTable {
    /// Build a table from records alone; samples are derived from the records.
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut seen = HashSet::new();
        let samples = records
            .iter()
            .filter(|r| seen.insert(r.sample.as_str()))
            .map(|r| r.sample.clone())
            .collect();

        Self {
            source: None,
            records,
            samples,
            skipped_lines: 0,
        }
    }

    pub(crate) fn from_parts(
        samples: Vec<String>,
        records: Vec<Record>,
        skipped_lines: usize,
    ) -> Self {
        Self {
            source: None,
            records,
            samples,
            skipped_lines,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn identifiers(&self) -> HashSet<&str> {
        self.records.iter().map(Record::identifier).collect()
    }

    #[must_use]
    pub fn stats(&self) -> RecordStats {
        let with_records: HashSet<&str> = self.records.iter().map(Record::sample).collect();
        let mut empty_seen = HashSet::new();
        let empty_samples = self
            .samples
            .iter()
            .filter(|s| !with_records.contains(s.as_str()) && empty_seen.insert(s.as_str()))
            .cloned()
            .collect();

        RecordStats {
            samples: self.samples.iter().collect::<HashSet<_>>().len(),
            records: self.records.len(),
            unique_identifiers: self.identifiers().len(),
            empty_samples,
            skipped_lines: self.skipped_lines,
        }
    }

    /// Materialize as a two-column table (`sample`, `ko`).
    #[must_use]
    pub fn to_table(&self) -> Table {
        let samples = self.records.iter().map(|r| r.sample.clone()).collect();
        let identifiers = self.records.iter().map(|r| r.identifier.clone()).collect();

        let mut table = Table::new();
        table.push_column_unchecked(SAMPLE_COLUMN, Column::Text(samples));
        table.push_column_unchecked(KEY_COLUMN, Column::Text(identifiers));
        table
    }
}
