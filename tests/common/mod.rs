#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Creates a SQLite database under the workspace and applies `schema_sql`.
    pub fn create_db(&self, name: &str, schema_sql: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let conn = Connection::open(&path).expect("open database");
        conn.execute_batch(schema_sql).expect("apply schema");
        path
    }
}

/// Collects a whole table ordered by rowid, rendering NULL as `<null>`, for
/// state comparisons in merge tests.
pub fn dump_table(db: &Path, table: &str) -> Vec<Vec<String>> {
    let conn = Connection::open(db).expect("open database");
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM \"{table}\" ORDER BY rowid"))
        .expect("prepare dump");
    let column_count = stmt.column_count();
    let rows = stmt
        .query_map([], |row| {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                let value = match row.get_ref(idx)? {
                    rusqlite::types::ValueRef::Null => "<null>".to_string(),
                    rusqlite::types::ValueRef::Integer(i) => i.to_string(),
                    rusqlite::types::ValueRef::Real(f) => f.to_string(),
                    rusqlite::types::ValueRef::Text(t) => {
                        String::from_utf8_lossy(t).into_owned()
                    }
                    rusqlite::types::ValueRef::Blob(_) => "<blob>".to_string(),
                };
                values.push(value);
            }
            Ok(values)
        })
        .expect("query dump")
        .collect::<Result<Vec<_>, _>>()
        .expect("collect dump");
    rows
}
