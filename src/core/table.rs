use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate column name: '{0}'")]
    DuplicateColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Dictionary-encoded text: each distinct value is stored once in `levels`
/// and rows refer to it by code.
#[derive(Debug, Clone, Default)]
pub struct Categorical {
    levels: Vec<String>,
    codes: Vec<u32>,
}

impl Categorical {
    /// Encode values, assigning codes in order of first appearance.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut lookup: HashMap<&'a str, u32> = HashMap::new();
        let mut levels = Vec::new();
        let mut codes = Vec::new();

        for value in values {
            let code = *lookup.entry(value).or_insert_with(|| {
                levels.push(value.to_string());
                #[allow(clippy::cast_possible_truncation)] // levels never exceed row count
                {
                    (levels.len() - 1) as u32
                }
            });
            codes.push(code);
        }

        Self { levels, codes }
    }

    #[must_use]
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    #[must_use]
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    #[must_use]
    pub fn get(&self, row: usize) -> Option<&str> {
        self.codes
            .get(row)
            .and_then(|&code| self.levels.get(code as usize))
            .map(String::as_str)
    }

    /// Gather rows by index. Levels are shared as-is, so unused levels may remain.
    fn take(&self, indices: &[usize]) -> Self {
        Self {
            levels: self.levels.clone(),
            codes: indices.iter().map(|&i| self.codes[i]).collect(),
        }
    }
}

/// A single table column, stored either as plain text or dictionary-encoded.
///
/// The representation never changes observable values: two columns with the
/// same cells compare equal regardless of encoding.
#[derive(Debug, Clone)]
pub enum Column {
    Text(Vec<String>),
    Categorical(Categorical),
}

impl Column {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(values) => values.len(),
            Self::Categorical(cat) => cat.codes.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_categorical(&self) -> bool {
        matches!(self, Self::Categorical(_))
    }

    #[must_use]
    pub fn get(&self, row: usize) -> Option<&str> {
        match self {
            Self::Text(values) => values.get(row).map(String::as_str),
            Self::Categorical(cat) => cat.get(row),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.len()).filter_map(move |row| self.get(row))
    }

    /// Number of distinct values in the column
    #[must_use]
    pub fn distinct_count(&self) -> usize {
        match self {
            Self::Text(values) => values
                .iter()
                .map(String::as_str)
                .collect::<HashSet<_>>()
                .len(),
            Self::Categorical(cat) => {
                let mut used = vec![false; cat.levels.len()];
                for &code in &cat.codes {
                    used[code as usize] = true;
                }
                used.into_iter().filter(|u| *u).count()
            }
        }
    }

    /// Gather rows by index, keeping the column's representation.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn take(&self, indices: &[usize]) -> Self {
        match self {
            Self::Text(values) => Self::Text(indices.iter().map(|&i| values[i].clone()).collect()),
            Self::Categorical(cat) => Self::Categorical(cat.take(indices)),
        }
    }

    #[must_use]
    pub fn to_categorical(&self) -> Self {
        match self {
            Self::Text(values) => {
                Self::Categorical(Categorical::from_values(values.iter().map(String::as_str)))
            }
            Self::Categorical(_) => self.clone(),
        }
    }

    #[must_use]
    pub fn to_text(&self) -> Self {
        match self {
            Self::Text(_) => self.clone(),
            Self::Categorical(_) => Self::Text(self.iter().map(str::to_string).collect()),
        }
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for Column {}

/// A named set of equal-length columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from plain text columns.
    ///
    /// # Errors
    ///
    /// Returns `TableError::LengthMismatch` if columns differ in length, or
    /// `TableError::DuplicateColumn` if a name repeats.
    pub fn from_text_columns(
        names: Vec<String>,
        columns: Vec<Vec<String>>,
    ) -> Result<Self, TableError> {
        let mut table = Self::new();
        for (name, values) in names.into_iter().zip(columns) {
            table.push_column(name, Column::Text(values))?;
        }
        Ok(table)
    }

    /// Append a column.
    ///
    /// # Errors
    ///
    /// Returns `TableError::LengthMismatch` if the column length differs from
    /// existing columns, or `TableError::DuplicateColumn` if the name is taken.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<(), TableError> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(TableError::LengthMismatch {
                    column: name,
                    expected: first.len(),
                    found: column.len(),
                });
            }
        }
        self.push_column_unchecked(name, column);
        Ok(())
    }

    /// Append a column whose name and length are already known to be valid.
    pub(crate) fn push_column_unchecked(&mut self, name: impl Into<String>, column: Column) {
        debug_assert!(self.columns.first().map_or(true, |c| c.len() == column.len()));
        self.names.push(name.into());
        self.columns.push(column);
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    #[must_use]
    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    #[must_use]
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        self.column(name).and_then(|c| c.get(row))
    }

    #[must_use]
    pub fn row(&self, row: usize) -> Option<Vec<&str>> {
        if row >= self.num_rows() {
            return None;
        }
        self.columns.iter().map(|c| c.get(row)).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&str>> + '_ {
        (0..self.num_rows()).filter_map(move |row| self.row(row))
    }

    /// Gather rows by index into a new table with the same schema.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn take(&self, indices: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
        }
    }

    /// Dictionary-encode the named columns; names not in the table are ignored.
    /// Returns the number of columns that were converted.
    pub fn categorize(&mut self, names: &[&str]) -> usize {
        let mut converted = 0;
        for (name, column) in self.names.iter().zip(self.columns.iter_mut()) {
            if !column.is_categorical() && names.contains(&name.as_str()) {
                *column = column.to_categorical();
                converted += 1;
            }
        }
        converted
    }

    /// Convert every categorical column back to plain text
    pub fn decategorize(&mut self) {
        for column in &mut self.columns {
            if column.is_categorical() {
                *column = column.to_text();
            }
        }
    }

    /// Write the table, header first, as delimited text.
    ///
    /// # Errors
    ///
    /// Returns `TableError::Csv` if writing fails.
    pub fn write_delimited<W: Write>(&self, writer: W, delimiter: u8) -> Result<(), TableError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);

        writer.write_record(&self.names)?;
        for row in self.rows() {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the table to `path` through a temporary file in the same
    /// directory, so readers never observe a partially written file.
    ///
    /// # Errors
    ///
    /// Returns `TableError::Io` if the temporary file cannot be created or
    /// persisted, or `TableError::Csv` if writing fails.
    pub fn write_to_path(&self, path: &Path, delimiter: u8) -> Result<(), TableError> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
        self.write_delimited(temp_file.as_file_mut(), delimiter)?;
        temp_file.persist(path).map_err(|e| TableError::Io(e.error))?;
        Ok(())
    }
}
