//! Registry of functional annotation databases.
//!
//! The registry lists, in a fixed order, each database's name, table path and
//! join key. An embedded registry describing the bundled databases is compiled
//! into the binary; custom registries can be loaded from JSON files.
//!
//! ## Embedded Registry
//!
//! - **biorempp**: genes, compounds and enzyme activities for bioremediation
//! - **kegg**: KEGG xenobiotic degradation pathways
//! - **hadeg**: Hydrocarbon Aerobic Degradation Enzymes and Genes
//! - **toxcsm**: predicted compound toxicity profiles
//!
//! ## Example
//!
//! ```rust,no_run
//! use ko_merge::registry::store::DatabaseRegistry;
//! use std::path::Path;
//!
//! let registry = DatabaseRegistry::load_embedded().unwrap();
//! let databases = registry.resolve_all(Path::new("data"));
//! ```

pub mod store;
