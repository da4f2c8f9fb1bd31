use super::{PersistenceResult, SelectionStore};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Reads the course spreadsheet export. Header names are lowercased and
/// trimmed so lookups do not depend on the export's capitalization; rows
/// shorter than the header are kept with the missing columns absent.
pub fn load_course_rows<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<HashMap<String, String>>> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect::<HashMap<_, _>>();
        rows.push(row);
    }
    Ok(rows)
}

/// Selection names kept as a pretty-printed JSON array of strings.
///
/// Non-ASCII names are written as UTF-8, two-space indented, so files
/// written by earlier releases of the planner round-trip unchanged.
#[derive(Debug, Clone)]
pub struct JsonSelectionStore {
    path: PathBuf,
}

impl JsonSelectionStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl SelectionStore for JsonSelectionStore {
    fn load_selection_names(&self) -> PersistenceResult<HashSet<String>> {
        if !self.path.exists() {
            return Ok(HashSet::new());
        }
        let file = File::open(&self.path)?;
        let names: Vec<String> = serde_json::from_reader(file)?;
        Ok(names.into_iter().collect())
    }

    fn save_selection_names(&self, names: &[String]) -> PersistenceResult<()> {
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(file, names)?;
        Ok(())
    }
}
