use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

const REGISTRY_PATH: &str = "registry/databases.json";

fn main() {
    println!("cargo:rerun-if-changed={REGISTRY_PATH}");
    println!("cargo:rerun-if-changed=build.rs");

    let registry = load_registry(Path::new(REGISTRY_PATH));
    let problems = check_registry(&registry);

    assert!(
        problems.is_empty(),
        "\n\nREGISTRY BUILD ERROR: {REGISTRY_PATH} has {} problem(s)\n  - {}\n",
        problems.len(),
        problems.join("\n  - ")
    );

    let count = registry["databases"].as_array().map_or(0, Vec::len);
    println!("cargo:warning=Validated registry: {count} databases");
}

fn load_registry(path: &Path) -> Value {
    let contents = std::fs::read_to_string(path).unwrap_or_else(|e| {
        panic!(
            "\n\nREGISTRY BUILD ERROR: Cannot read {}\n\
             Error: {e}\n\
             The embedded database registry must exist before building.\n",
            path.display()
        )
    });

    serde_json::from_str(&contents).unwrap_or_else(|e| {
        panic!(
            "\n\nREGISTRY BUILD ERROR: Invalid JSON in {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            path.display()
        )
    })
}

/// Every problem found in the registry, so one build reports them all
fn check_registry(registry: &Value) -> Vec<String> {
    let mut problems = Vec::new();

    if !registry["version"].is_string() {
        problems.push("missing string field 'version'".to_string());
    }

    let Some(databases) = registry["databases"].as_array() else {
        problems.push("missing array field 'databases'".to_string());
        return problems;
    };
    if databases.is_empty() {
        problems.push("'databases' lists no databases".to_string());
    }

    // Output files are named after databases; lowercased so names that
    // differ only in case are caught too
    let mut output_names: HashMap<String, &str> = HashMap::new();

    for (index, database) in databases.iter().enumerate() {
        let Some(name) = database["name"].as_str().filter(|n| !n.is_empty()) else {
            problems.push(format!("database #{index} has no 'name'"));
            continue;
        };

        problems.extend(
            check_database(database)
                .into_iter()
                .map(|p| format!("database '{name}': {p}")),
        );

        if let Some(previous) = output_names.insert(name.to_lowercase(), name) {
            problems.push(format!(
                "database '{name}' clashes with '{previous}' (names must differ ignoring case)"
            ));
        }
    }

    problems
}

fn check_database(database: &Value) -> Vec<String> {
    let mut problems = Vec::new();

    let name = database["name"].as_str().unwrap_or_default();
    let safe = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
    if !name.chars().all(safe) {
        problems.push("name may only use ASCII letters, digits, '-' and '_'".to_string());
    }

    match database["path"].as_str() {
        None => problems.push("missing 'path'".to_string()),
        Some(path) if !path.to_lowercase().ends_with(".csv") => {
            problems.push(format!("path '{path}' must end in .csv"));
        }
        Some(_) => {}
    }

    if let Some(key) = database.get("key") {
        if key.as_str().map_or(true, str::is_empty) {
            problems.push("'key' must be a non-empty string".to_string());
        }
    }

    if let Some(columns) = database.get("required_columns") {
        let all_strings = columns
            .as_array()
            .is_some_and(|cols| cols.iter().all(Value::is_string));
        if !all_strings {
            problems.push("'required_columns' must be an array of strings".to_string());
        }
    }

    problems
}
