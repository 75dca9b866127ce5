use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::table::Table;

/// A functional annotation table keyed by orthology identifier.
///
/// The key column is checked by the loader and again by the joiner; this type
/// itself only carries the data and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTable {
    source: Option<PathBuf>,
    table: Table,
}

impl ReferenceTable {
    #[must_use]
    pub fn new(table: Table) -> Self {
        Self {
            source: None,
            table,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn into_table(self) -> Table {
        self.table
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.table.num_rows()
    }

    /// Number of distinct values in `key`, or `None` if the column is absent
    #[must_use]
    pub fn distinct_identifiers(&self, key: &str) -> Option<usize> {
        self.table.column(key).map(|c| c.distinct_count())
    }

    /// Largest number of rows sharing a single `key` value
    #[must_use]
    pub fn max_fanout(&self, key: &str) -> Option<usize> {
        let column = self.table.column(key)?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in column.iter() {
            *counts.entry(value).or_default() += 1;
        }
        Some(counts.into_values().max().unwrap_or(0))
    }
}
