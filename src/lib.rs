//! # ko-merge
//!
//! A library for annotating KEGG Orthology sample lists with functional
//! databases.
//!
//! Metagenome annotation pipelines report, per sample, which KEGG Orthology
//! (KO) identifiers were found. On their own these identifiers say little
//! about what a community can degrade or which compounds it may touch.
//! `ko-merge` validates such sample lists and joins them against reference
//! databases (BioRemPP, KEGG degradation pathways, HADEG, ToxCSM) to attach
//! genes, pathways, compounds and toxicity annotations.
//!
//! ## Features
//!
//! - **Strict input grammar**: `>`-headed sample blocks of KO identifiers, as
//!   plain text or a base64 data URI
//! - **Schema checks**: reference tables must carry the join column
//! - **Failure isolation**: one missing or malformed database never stops the
//!   others from being merged
//! - **Compact tables**: repeated annotation values are dictionary-encoded
//!
//! ## Example
//!
//! ```rust,no_run
//! use ko_merge::{DatabaseRegistry, MergeOrchestrator};
//! use ko_merge::parsing::records::parse;
//! use std::path::Path;
//!
//! let records = parse(">SampleA\nK00001\nK00002\n>SampleB\nK00006\n").unwrap();
//!
//! let registry = DatabaseRegistry::load_embedded().unwrap();
//! let orchestrator = MergeOrchestrator::new(registry.resolve_all(Path::new("data")));
//!
//! let result = orchestrator.run_all(&records).unwrap();
//! let summary = result.summary();
//! println!("{} of {} databases merged", summary.success_count, summary.total);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Records, reference tables and the columnar table model
//! - [`parsing`]: Sample input and reference table parsers
//! - [`merge`]: Join and multi-database orchestration
//! - [`registry`]: Database registry storage
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod merge;
pub mod parsing;
pub mod registry;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::record::{Record, RecordTable};
pub use core::reference::ReferenceTable;
pub use core::table::{Column, Table};
pub use merge::join::{join, MergedTable};
pub use merge::orchestrator::{DatabaseConfig, MergeOrchestrator, RunResult};
pub use parsing::reference::ReferenceTableLoader;
pub use registry::store::DatabaseRegistry;
