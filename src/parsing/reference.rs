use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::core::record::KEY_COLUMN;
use crate::core::reference::ReferenceTable;
use crate::core::table::{Table, TableError};
use crate::utils::validation::has_extension;

/// Field delimiter of every reference table
pub const REFERENCE_DELIMITER: u8 = b';';

/// File extension accepted for reference tables
pub const REFERENCE_EXTENSION: &str = "csv";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Reference table not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Unsupported reference table format '{0}': expected a ';'-delimited .csv file")]
    UnsupportedFormat(String),

    #[error("Reference table {} has no '{column}' join column", .path.display())]
    MissingJoinColumn { column: String, path: PathBuf },

    #[error("Reference table {} has no required column '{column}'", .path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed reference table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid reference table: {0}")]
    Table(#[from] TableError),
}

/// Loads `;`-delimited UTF-8 reference tables and checks their schema.
#[derive(Debug, Clone)]
pub struct ReferenceTableLoader {
    key: String,
    required_columns: Vec<String>,
}

impl Default for ReferenceTableLoader {
    fn default() -> Self {
        Self {
            key: KEY_COLUMN.to_string(),
            required_columns: Vec::new(),
        }
    }
}

impl ReferenceTableLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn with_required_columns(mut self, columns: Vec<String>) -> Self {
        self.required_columns = columns;
        self
    }

    /// Load a reference table from disk
    ///
    /// # Errors
    ///
    /// Returns `LoadError::FileNotFound` if `path` does not exist,
    /// `LoadError::UnsupportedFormat` if it is not a `.csv` file,
    /// `LoadError::MissingJoinColumn` / `LoadError::MissingColumn` if the
    /// header lacks the key or a required column, or `LoadError::Csv` /
    /// `LoadError::Io` if the content cannot be read.
    pub fn load(&self, path: &Path) -> Result<ReferenceTable, LoadError> {
        if !path.exists() {
            return Err(LoadError::FileNotFound(path.to_path_buf()));
        }

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !has_extension(&filename, REFERENCE_EXTENSION) {
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(LoadError::UnsupportedFormat(extension));
        }

        // The handle is dropped once the table is in memory
        let table = {
            let file = std::fs::File::open(path)?;
            read_delimited(file)?
        };
        self.check_schema(&table, path)?;

        debug!(
            path = %path.display(),
            rows = table.num_rows(),
            columns = table.num_columns(),
            "Loaded reference table"
        );

        Ok(ReferenceTable::new(table).with_source(path))
    }

    fn check_schema(&self, table: &Table, path: &Path) -> Result<(), LoadError> {
        if !table.has_column(&self.key) {
            return Err(LoadError::MissingJoinColumn {
                column: self.key.clone(),
                path: path.to_path_buf(),
            });
        }

        if let Some(column) = self
            .required_columns
            .iter()
            .find(|c| !table.has_column(c))
        {
            return Err(LoadError::MissingColumn {
                column: column.clone(),
                path: path.to_path_buf(),
            });
        }

        Ok(())
    }
}

/// Read `;`-delimited text with a header row into a table of text columns.
///
/// Header names are trimmed; cell values are kept verbatim.
///
/// # Errors
///
/// Returns `LoadError::Csv` for invalid UTF-8 or rows whose field count
/// differs from the header, or `LoadError::Table` for duplicate header names.
pub fn read_delimited<R: Read>(reader: R) -> Result<Table, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(REFERENCE_DELIMITER)
        .has_headers(true)
        .from_reader(reader);

    let names: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut columns: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for result in reader.records() {
        let record = result?;
        for (column, value) in columns.iter_mut().zip(record.iter()) {
            column.push(value.to_string());
        }
    }

    Ok(Table::from_text_columns(names, columns)?)
}
