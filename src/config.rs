use crate::persistence::{JsonSelectionStore, PersistenceResult, SelectionStore};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE_PATH: &str = "disciplinas.csv";
pub const DEFAULT_SELECTIONS_PATH: &str = "selecoes.json";
pub const DEFAULT_SQLITE_SELECTIONS_PATH: &str = "selecoes.db";
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Json,
    Sqlite,
}

impl StoreKind {
    /// Selection file used when the config names none.
    pub fn default_selections_path(&self) -> &'static str {
        match self {
            StoreKind::Json => DEFAULT_SELECTIONS_PATH,
            StoreKind::Sqlite => DEFAULT_SQLITE_SELECTIONS_PATH,
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(StoreKind::Json),
            "sqlite" => Some(StoreKind::Sqlite),
            _ => None,
        }
    }
}

/// Paths and backend choices for a planner session. Every field is optional
/// in the JSON file and falls back to its default. Without a
/// `selections_path` each backend keeps its own file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub source_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selections_path: Option<PathBuf>,
    pub store: StoreKind,
    pub log_filter: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            selections_path: None,
            store: StoreKind::Json,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl PlannerConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let file = File::open(path)?;
        let config: PlannerConfig = serde_json::from_reader(file)?;
        Ok(config)
    }

    pub fn save_json_file<P: AsRef<Path>>(&self, path: P) -> PersistenceResult<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn selections_path(&self) -> PathBuf {
        self.selections_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(self.store.default_selections_path()))
    }

    /// Builds the configured selection backend. Nothing is read until the
    /// planner loads the selection.
    pub fn open_store(&self) -> PersistenceResult<Box<dyn SelectionStore>> {
        let path = self.selections_path();
        match self.store {
            StoreKind::Json => Ok(Box::new(JsonSelectionStore::new(path))),
            #[cfg(feature = "sqlite")]
            StoreKind::Sqlite => Ok(Box::new(
                crate::persistence::sqlite::SqliteSelectionStore::new(path),
            )),
            #[cfg(not(feature = "sqlite"))]
            StoreKind::Sqlite => Err(crate::persistence::PersistenceError::Store(
                "sqlite selection store requires the 'sqlite' feature".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::PersistenceError;
    use tempfile::tempdir;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planner.json");
        std::fs::write(&path, r#"{ "source_path": "cursos.csv", "store": "sqlite" }"#).unwrap();

        let config = PlannerConfig::from_json_file(&path).unwrap();
        assert_eq!(config.source_path, PathBuf::from("cursos.csv"));
        assert_eq!(config.selections_path, None);
        assert_eq!(config.selections_path(), PathBuf::from(DEFAULT_SQLITE_SELECTIONS_PATH));
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn config_round_trips_through_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planner.json");
        let config = PlannerConfig {
            log_filter: "debug".into(),
            ..PlannerConfig::default()
        };
        config.save_json_file(&path).unwrap();
        assert_eq!(PlannerConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn explicit_selections_path_wins_over_backend_default() {
        let mut config = PlannerConfig::default();
        assert_eq!(config.selections_path(), PathBuf::from(DEFAULT_SELECTIONS_PATH));

        config.selections_path = Some(PathBuf::from("minhas.json"));
        config.store = StoreKind::Sqlite;
        assert_eq!(config.selections_path(), PathBuf::from("minhas.json"));
    }

    #[test]
    fn unknown_store_kind_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("planner.json");
        std::fs::write(&path, r#"{ "store": "redis" }"#).unwrap();
        assert!(matches!(
            PlannerConfig::from_json_file(&path),
            Err(PersistenceError::Json(_))
        ));
        assert_eq!(StoreKind::from_str(" SQLite "), Some(StoreKind::Sqlite));
        assert_eq!(StoreKind::from_str("redis"), None);
    }
}
