//! Joining parsed records against functional annotation databases.
//!
//! - [`join`]: inner join of a record table and a single reference table
//! - [`orchestrator`]: runs the join for every configured database, isolating
//!   per-database failures
//!
//! ## Example
//!
//! ```rust,no_run
//! use ko_merge::merge::orchestrator::{DatabaseConfig, MergeOrchestrator};
//! use ko_merge::parsing::records::parse;
//!
//! let records = parse(">SampleA\nK00001\nK00002\n").unwrap();
//!
//! let orchestrator = MergeOrchestrator::new(vec![
//!     DatabaseConfig::new("kegg", "data/kegg_degradation_db.csv"),
//!     DatabaseConfig::new("hadeg", "data/hadeg_db.csv"),
//! ]);
//!
//! let result = orchestrator.run_all(&records).unwrap();
//! for (name, merged) in result.successes() {
//!     println!("{name}: {} rows", merged.num_rows());
//! }
//! for (name, error) in result.failures() {
//!     eprintln!("{name}: {error}");
//! }
//! ```

pub mod join;
pub mod orchestrator;
