use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

use crate::core::record::{RecordTable, KEY_COLUMN, SAMPLE_COLUMN};
use crate::core::reference::ReferenceTable;
use crate::core::table::Table;

/// Low-cardinality descriptive columns that are dictionary-encoded when
/// joining with `optimize` set. The join key is always encoded as well.
pub const CATEGORICAL_COLUMNS: &[&str] = &[
    SAMPLE_COLUMN,
    "genesymbol",
    "genename",
    "pathname",
    "Pathway",
    "compoundclass",
    "compound_pathway",
    "enzyme_activity",
    "referenceAG",
];

/// Which input of a join a problem was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSide {
    Records,
    Reference,
}

impl std::fmt::Display for TableSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Records => write!(f, "record"),
            Self::Reference => write!(f, "reference"),
        }
    }
}

#[derive(Error, Debug)]
pub enum JoinError {
    #[error("The {side} table has no '{column}' join column")]
    MissingJoinColumn { side: TableSide, column: String },
}

/// Join configuration
#[derive(Debug, Clone)]
pub struct JoinOptions {
    /// Column both tables are joined on
    pub key: String,
    /// Dictionary-encode the key and [`CATEGORICAL_COLUMNS`]
    pub optimize: bool,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            key: KEY_COLUMN.to_string(),
            optimize: true,
        }
    }
}

impl JoinOptions {
    #[must_use]
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    fn categorical_columns(&self) -> Vec<&str> {
        let mut columns = vec![self.key.as_str()];
        columns.extend(CATEGORICAL_COLUMNS.iter().copied());
        columns
    }
}

/// Result of joining records against one reference table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedTable {
    key: String,
    table: Table,
}

impl MergedTable {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.table
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.table.num_rows()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Distinct join-key values present in the result
    #[must_use]
    pub fn identifiers(&self) -> HashSet<&str> {
        self.table
            .column(&self.key)
            .map(|c| c.iter().collect())
            .unwrap_or_default()
    }
}

/// Inner-join parsed records with a reference table on `ko`.
///
/// # Errors
///
/// See [`join`].
pub fn join_records(
    records: &RecordTable,
    reference: ReferenceTable,
    optimize: bool,
) -> Result<MergedTable, JoinError> {
    join(
        &records.to_table(),
        reference,
        &JoinOptions::default().with_optimize(optimize),
    )
}

/// Inner equi-join of `records` and `reference` on `options.key`.
///
/// Output columns are the record columns in order, then every non-key
/// reference column. A record column that the reference also defines is
/// dropped in favour of the reference one. Rows follow record order, with
/// matches for one record in reference order. Disjoint keys give an empty
/// table with the full schema.
///
/// # Errors
///
/// Returns `JoinError::MissingJoinColumn` if either table lacks the key.
pub fn join(
    records: &Table,
    reference: ReferenceTable,
    options: &JoinOptions,
) -> Result<MergedTable, JoinError> {
    let key = options.key.as_str();
    let missing = |side| JoinError::MissingJoinColumn {
        side,
        column: key.to_string(),
    };

    let left_key = records
        .column(key)
        .ok_or_else(|| missing(TableSide::Records))?;

    let mut right = reference.into_table();
    let right_key_index = right
        .column_index(key)
        .ok_or_else(|| missing(TableSide::Reference))?;

    if options.optimize {
        right.categorize(&options.categorical_columns());
    }

    let Some(right_key) = right.column_at(right_key_index) else {
        return Err(missing(TableSide::Reference));
    };

    // Build: key value -> reference rows, in reference order
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (row, value) in right_key.iter().enumerate() {
        index.entry(value).or_default().push(row);
    }

    // Probe with the records
    let mut left_rows = Vec::new();
    let mut right_rows = Vec::new();
    for (row, value) in left_key.iter().enumerate() {
        if let Some(matches) = index.get(value) {
            for &m in matches {
                left_rows.push(row);
                right_rows.push(m);
            }
        }
    }

    let mut merged = Table::new();
    for (i, name) in records.names().iter().enumerate() {
        if name == key {
            merged.push_column_unchecked(name.as_str(), right_key.take(&right_rows));
        } else if !right.has_column(name) {
            if let Some(column) = records.column_at(i) {
                merged.push_column_unchecked(name.as_str(), column.take(&left_rows));
            }
        }
    }
    for (i, name) in right.names().iter().enumerate() {
        if i == right_key_index {
            continue;
        }
        if let Some(column) = right.column_at(i) {
            merged.push_column_unchecked(name.as_str(), column.take(&right_rows));
        }
    }

    if options.optimize {
        merged.categorize(&options.categorical_columns());
    }

    debug!(
        key,
        records = records.num_rows(),
        reference_rows = right.num_rows(),
        merged_rows = merged.num_rows(),
        optimize = options.optimize,
        "Joined records with reference table"
    );

    Ok(MergedTable {
        key: key.to_string(),
        table: merged,
    })
}
