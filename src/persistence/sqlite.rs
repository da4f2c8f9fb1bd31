use super::{PersistenceError, PersistenceResult, SelectionStore};
use rusqlite::{Connection, params};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Selection names kept in a SQLite table, one row per name in save order.
///
/// The database is opened on first use. A file that is not a SQLite
/// database fails that load or save only.
pub struct SqliteSelectionStore {
    path: PathBuf,
    connection: Mutex<Option<Connection>>,
}

impl SqliteSelectionStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            connection: Mutex::new(None),
        }
    }

    fn open(path: &Path) -> PersistenceResult<Connection> {
        let connection = Connection::open(path)?;
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS selections (
                position INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(connection)
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> PersistenceResult<T>,
    ) -> PersistenceResult<T> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| PersistenceError::Store("sqlite connection mutex poisoned".into()))?;
        if guard.is_none() {
            *guard = Some(Self::open(&self.path)?);
        }
        match guard.as_mut() {
            Some(conn) => f(conn),
            None => Err(PersistenceError::Store(format!(
                "selection database {} is not open",
                self.path.display()
            ))),
        }
    }
}

impl SelectionStore for SqliteSelectionStore {
    fn load_selection_names(&self) -> PersistenceResult<HashSet<String>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM selections ORDER BY position ASC")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut names = HashSet::new();
            for name in rows {
                names.insert(name?);
            }
            Ok(names)
        })
    }

    fn save_selection_names(&self, names: &[String]) -> PersistenceResult<()> {
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM selections", [])?;
            {
                let mut stmt =
                    tx.prepare("INSERT INTO selections (position, name) VALUES (?1, ?2)")?;
                for (position, name) in names.iter().enumerate() {
                    stmt.execute(params![position as i64, name])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }
}
