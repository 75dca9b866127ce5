use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::record::{RecordTable, KEY_COLUMN};
use crate::core::table::Table;
use crate::merge::join::{join, JoinError, JoinOptions, MergedTable};
use crate::parsing::reference::{LoadError, ReferenceTableLoader};

/// How to reach and validate one reference database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub name: String,
    pub path: PathBuf,
    /// Join column, `ko` unless configured otherwise
    pub key: String,
    /// Columns that must exist besides the key
    pub required_columns: Vec<String>,
}

impl DatabaseConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            key: KEY_COLUMN.to_string(),
            required_columns: Vec::new(),
        }
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

    /// Loader that enforces this database's key and required columns
    #[must_use]
    pub fn loader(&self) -> ReferenceTableLoader {
        ReferenceTableLoader::new()
            .with_key(&self.key)
            .with_required_columns(self.required_columns.clone())
    }
}

/// Failure of a single database's load or join
#[derive(Error, Debug)]
pub enum MergeError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Join(#[from] JoinError),
}

/// Caller misuse that prevents a run from starting
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("No databases configured")]
    NoDatabases,

    #[error("No records to merge")]
    EmptyRecords,

    #[error("Database '{0}' is configured more than once")]
    DuplicateDatabase(String),
}

/// Outcome of one database within a run
#[derive(Debug)]
pub struct DatabaseOutcome {
    pub name: String,
    pub path: PathBuf,
    pub result: Result<MergedTable, MergeError>,
}

/// Per-database results of a run, in configured order
#[derive(Debug)]
pub struct RunResult {
    outcomes: Vec<DatabaseOutcome>,
}

impl RunResult {
    #[must_use]
    pub fn outcomes(&self) -> &[DatabaseOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Result<MergedTable, MergeError>> {
        self.outcomes
            .iter()
            .find(|o| o.name == name)
            .map(|o| &o.result)
    }

    pub fn successes(&self) -> impl Iterator<Item = (&str, &MergedTable)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|t| (o.name.as_str(), t)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &MergeError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.outcomes.len(),
            success_count: self.success_count(),
            failure_count: self.failure_count(),
            succeeded: self
                .successes()
                .map(|(name, table)| SucceededDatabase {
                    name: name.to_string(),
                    rows: table.num_rows(),
                    columns: table.table().num_columns(),
                })
                .collect(),
            failed: self
                .failures()
                .map(|(name, error)| FailedDatabase {
                    name: name.to_string(),
                    error: error.to_string(),
                })
                .collect(),
        }
    }
}

/// Serializable report of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub succeeded: Vec<SucceededDatabase>,
    pub failed: Vec<FailedDatabase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SucceededDatabase {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDatabase {
    pub name: String,
    pub error: String,
}

/// Merges one record table against every configured database, recording
/// each database's failure instead of aborting the run.
#[derive(Debug, Clone)]
pub struct MergeOrchestrator {
    databases: Vec<DatabaseConfig>,
    optimize: bool,
    parallel: bool,
}

impl MergeOrchestrator {
    #[must_use]
    pub fn new(databases: Vec<DatabaseConfig>) -> Self {
        Self {
            databases,
            optimize: true,
            parallel: false,
        }
    }

    #[must_use]
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Run databases on the rayon thread pool. Results keep configured order.
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub fn databases(&self) -> &[DatabaseConfig] {
        &self.databases
    }

    /// Merge `records` with every configured database.
    ///
    /// Per-database failures are recorded in the [`RunResult`], never returned.
    ///
    /// # Errors
    ///
    /// Returns `OrchestratorError::NoDatabases` if nothing is configured,
    /// `OrchestratorError::DuplicateDatabase` if a name repeats, or
    /// `OrchestratorError::EmptyRecords` if `records` is empty.
    pub fn run_all(&self, records: &RecordTable) -> Result<RunResult, OrchestratorError> {
        self.check_invocation(records)?;

        let table = records.to_table();
        let outcomes: Vec<DatabaseOutcome> = if self.parallel {
            self.databases
                .par_iter()
                .map(|db| self.attempt(&table, db))
                .collect()
        } else {
            self.databases
                .iter()
                .map(|db| self.attempt(&table, db))
                .collect()
        };

        let result = RunResult { outcomes };
        let failed: Vec<&str> = result.failures().map(|(name, _)| name).collect();
        info!(
            succeeded = result.success_count(),
            failed = result.failure_count(),
            failed_databases = ?failed,
            "Merge run complete"
        );

        Ok(result)
    }

    fn check_invocation(&self, records: &RecordTable) -> Result<(), OrchestratorError> {
        if self.databases.is_empty() {
            return Err(OrchestratorError::NoDatabases);
        }

        let mut seen = HashSet::new();
        if let Some(db) = self.databases.iter().find(|db| !seen.insert(db.name.as_str())) {
            return Err(OrchestratorError::DuplicateDatabase(db.name.clone()));
        }

        if records.is_empty() {
            return Err(OrchestratorError::EmptyRecords);
        }

        Ok(())
    }

    fn attempt(&self, records: &Table, db: &DatabaseConfig) -> DatabaseOutcome {
        let result = merge_table(records, db, self.optimize);

        match &result {
            Ok(merged) => info!(
                database = %db.name,
                rows = merged.num_rows(),
                "Merged database"
            ),
            Err(e) => warn!(
                database = %db.name,
                path = %db.path.display(),
                error = %e,
                "Database merge failed"
            ),
        }

        DatabaseOutcome {
            name: db.name.clone(),
            path: db.path.clone(),
            result,
        }
    }
}

/// Load one database and join it with `records`, surfacing any failure.
///
/// # Errors
///
/// Returns `MergeError::Load` if the reference table cannot be loaded, or
/// `MergeError::Join` if the join key is missing.
pub fn merge_database(
    records: &RecordTable,
    db: &DatabaseConfig,
    optimize: bool,
) -> Result<MergedTable, MergeError> {
    merge_table(&records.to_table(), db, optimize)
}

fn merge_table(
    records: &Table,
    db: &DatabaseConfig,
    optimize: bool,
) -> Result<MergedTable, MergeError> {
    let reference = db.loader().load(&db.path)?;
    let options = JoinOptions {
        key: db.key.clone(),
        optimize,
    };
    Ok(join(records, reference, &options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::records::parse;
    use std::path::Path;

    const KEGG: &str = "ko;pathname;genesymbol\nK00001;Toluene;adhA\nK00002;Benzoate;benA\n";
    const HADEG: &str = "Gene;ko;Pathway\nalkB;K00001;Alkanes\nalkM;K00001;Alkanes\n";
    const TOXCSM: &str = "cpd;ko;compoundname\nC00001;K00404;Water\n";

    fn write_databases(dir: &Path) -> Vec<DatabaseConfig> {
        std::fs::write(dir.join("kegg.csv"), KEGG).unwrap();
        std::fs::write(dir.join("hadeg.csv"), HADEG).unwrap();
        std::fs::write(dir.join("toxcsm.csv"), TOXCSM).unwrap();

        vec![
            DatabaseConfig::new("biorempp", dir.join("biorempp.csv")),
            DatabaseConfig::new("kegg", dir.join("kegg.csv")),
            DatabaseConfig::new("hadeg", dir.join("hadeg.csv")),
            DatabaseConfig::new("toxcsm", dir.join("toxcsm.csv")),
        ]
    }

    fn records() -> RecordTable {
        parse(">S1\nK00001\nK00002\n>S2\nK00001\n").unwrap()
    }

    #[test]
    fn test_missing_database_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = MergeOrchestrator::new(write_databases(dir.path()));

        let result = orchestrator.run_all(&records()).unwrap();
        assert_eq!(result.success_count(), 3);
        assert_eq!(result.failure_count(), 1);

        let failures: Vec<&str> = result.failures().map(|(name, _)| name).collect();
        assert_eq!(failures, vec!["biorempp"]);
        assert!(matches!(
            result.get("biorempp"),
            Some(Err(MergeError::Load(LoadError::FileNotFound(_))))
        ));

        let names: Vec<&str> = result.outcomes().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["biorempp", "kegg", "hadeg", "toxcsm"]);
    }

    #[test]
    fn test_empty_join_counts_as_success() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = MergeOrchestrator::new(write_databases(dir.path()));

        let result = orchestrator.run_all(&records()).unwrap();
        let toxcsm = result.get("toxcsm").unwrap().as_ref().unwrap();
        assert!(toxcsm.is_empty());
        assert_eq!(toxcsm.table().names(), &["sample", "ko", "cpd", "compoundname"]);

        let hadeg = result.get("hadeg").unwrap().as_ref().unwrap();
        // S1/K00001 and S2/K00001 each fan out to two genes
        assert_eq!(hadeg.num_rows(), 4);
    }

    #[test]
    fn test_schema_failures_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("nokey.csv"), "gene;pathname\nadhA;Toluene\n").unwrap();
        std::fs::write(dir.path().join("kegg.txt"), KEGG).unwrap();
        std::fs::write(dir.path().join("kegg.csv"), KEGG).unwrap();

        let databases = vec![
            DatabaseConfig::new("nokey", dir.path().join("nokey.csv")),
            DatabaseConfig::new("wrongext", dir.path().join("kegg.txt")),
            DatabaseConfig::new("strict", dir.path().join("kegg.csv"))
                .with_required_columns(vec!["compoundclass".into()]),
            DatabaseConfig::new("kegg", dir.path().join("kegg.csv")),
        ];
        let result = MergeOrchestrator::new(databases).run_all(&records()).unwrap();

        assert!(matches!(
            result.get("nokey"),
            Some(Err(MergeError::Load(LoadError::MissingJoinColumn { .. })))
        ));
        assert!(matches!(
            result.get("wrongext"),
            Some(Err(MergeError::Load(LoadError::UnsupportedFormat(_))))
        ));
        assert!(matches!(
            result.get("strict"),
            Some(Err(MergeError::Load(LoadError::MissingColumn { .. })))
        ));
        assert_eq!(result.success_count(), 1);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let databases = write_databases(dir.path());

        let sequential = MergeOrchestrator::new(databases.clone())
            .run_all(&records())
            .unwrap();
        let parallel = MergeOrchestrator::new(databases)
            .parallel(true)
            .run_all(&records())
            .unwrap();

        assert_eq!(sequential.summary(), parallel.summary());
        for (a, b) in sequential.successes().zip(parallel.successes()) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_summary() {
        let dir = tempfile::tempdir().unwrap();
        let result = MergeOrchestrator::new(write_databases(dir.path()))
            .with_optimize(false)
            .run_all(&records())
            .unwrap();

        let summary = result.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].name, "biorempp");
        assert!(summary.failed[0].error.contains("not found"));
        assert_eq!(
            summary.succeeded[0],
            SucceededDatabase {
                name: "kegg".to_string(),
                rows: 3,
                columns: 4,
            }
        );
    }

    #[test]
    fn test_invocation_errors() {
        assert_eq!(
            MergeOrchestrator::new(Vec::new())
                .run_all(&records())
                .unwrap_err(),
            OrchestratorError::NoDatabases
        );

        let databases = vec![
            DatabaseConfig::new("kegg", "a.csv"),
            DatabaseConfig::new("kegg", "b.csv"),
        ];
        assert_eq!(
            MergeOrchestrator::new(databases)
                .run_all(&records())
                .unwrap_err(),
            OrchestratorError::DuplicateDatabase("kegg".to_string())
        );

        let databases = vec![DatabaseConfig::new("kegg", "a.csv")];
        assert_eq!(
            MergeOrchestrator::new(databases)
                .run_all(&RecordTable::default())
                .unwrap_err(),
            OrchestratorError::EmptyRecords
        );
    }

    #[test]
    fn test_merge_database_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        let databases = write_databases(dir.path());

        let err = merge_database(&records(), &databases[0], true).unwrap_err();
        assert!(matches!(err, MergeError::Load(LoadError::FileNotFound(_))));

        let merged = merge_database(&records(), &databases[1], true).unwrap();
        assert_eq!(merged.num_rows(), 3);
    }
}
