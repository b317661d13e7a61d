#![allow(missing_docs)]

use std::{
    io::{self, Write},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::Value;

use crate::{AppState, build_router, db::Database};

/// A database file in the system temp directory that is deleted on drop.
pub(crate) struct TestDatabase {
    path: PathBuf,
}

impl TestDatabase {
    /// A database with the transaction table and no rows.
    pub(crate) fn empty() -> Self {
        Self::create(false)
    }

    /// A database with the four demo transactions.
    pub(crate) fn seeded() -> Self {
        Self::create(true)
    }

    fn create(seed: bool) -> Self {
        let path = std::env::temp_dir().join(format!("ops_api_test_{}.db", uuid::Uuid::new_v4()));
        let mut connection = Connection::open(&path).expect("Could not open test database");
        crate::db::initialize(&mut connection, seed).expect("Could not initialize test database");

        Self { path }
    }

    pub(crate) fn database(&self) -> Database {
        Database::new(&self.path)
    }

    pub(crate) fn connect(&self) -> Connection {
        self.database()
            .connect()
            .expect("Could not connect to test database")
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub(crate) fn get_test_server(db: &TestDatabase) -> TestServer {
    let state = AppState::new(db.database(), false).expect("Could not create app state");

    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

/// Captures log output in memory so tests can inspect the JSON lines.
#[derive(Clone, Default)]
pub(crate) struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub(crate) fn make_writer(&self) -> impl Fn() -> LogBuffer + Send + Sync + 'static {
        let buffer = self.clone();
        move || buffer.clone()
    }

    pub(crate) fn json_lines(&self) -> Vec<Value> {
        let bytes = self.0.lock().expect("log buffer poisoned").clone();

        String::from_utf8(bytes)
            .expect("log output is not UTF-8")
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("log line is not JSON"))
            .collect()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("log buffer poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_database_is_removed_on_drop() {
    let db = TestDatabase::empty();
    let path = db.path.clone();
    assert!(path.is_file());

    drop(db);

    assert!(!path.exists());
}
