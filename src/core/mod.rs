//! Core data types for sample annotation.
//!
//! - [`Record`] / [`RecordTable`]: `(sample, identifier)` pairs parsed from input text
//! - [`ReferenceTable`]: a functional annotation database loaded from disk
//! - [`Table`] / [`Column`]: the columnar representation shared by all of the above
//!
//! ## Categorical columns
//!
//! Annotation databases repeat the same handful of gene symbols, pathway names
//! and compound classes across thousands of rows. A [`Column`] can hold such
//! values dictionary-encoded ([`Column::Categorical`]) instead of as one
//! `String` per row. Encoding never changes observable values: cells read back
//! identically and tables compare equal across representations.
//!
//! [`Record`]: record::Record
//! [`RecordTable`]: record::RecordTable
//! [`ReferenceTable`]: reference::ReferenceTable
//! [`Table`]: table::Table
//! [`Column`]: table::Column
//! [`Column::Categorical`]: table::Column::Categorical

pub mod record;
pub mod reference;
pub mod table;
