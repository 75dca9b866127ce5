//! Parsers for sample input and reference tables.
//!
//! - **Sample input** ([`records`]): `>`-headed blocks of KEGG Orthology
//!   identifiers, as plain text or a base64 data URI ([`encoding`])
//! - **Reference tables** ([`reference`]): `;`-delimited UTF-8 `.csv` files
//!   with a `ko` column
//!
//! ## Example
//!
//! ```rust,no_run
//! use ko_merge::parsing::records::{parse, parse_file};
//! use ko_merge::parsing::reference::ReferenceTableLoader;
//! use std::path::Path;
//!
//! // Parse from a file
//! let records = parse_file(Path::new("samples.txt")).unwrap();
//!
//! // Or from raw text
//! let records = parse(">SampleA\nK00001\nK00002\n").unwrap();
//!
//! // Load a reference table
//! let kegg = ReferenceTableLoader::new()
//!     .load(Path::new("data/kegg_degradation_db.csv"))
//!     .unwrap();
//! ```
//!
//! ## Input Grammar
//!
//! | Line | Meaning |
//! |------|---------|
//! | `>name` | Starts sample `name` |
//! | `K` + digits | Identifier belonging to the current sample |
//! | blank | Ignored |
//! | anything else | Error before the first sample, skipped after it |

pub mod encoding;
pub mod records;
pub mod reference;
