//! Opening connections to the application database and creating its schema.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, TransactionBehavior};

use crate::{
    Error,
    transaction::{create_transaction_table, seed_transactions_if_empty},
};

/// A handle to the SQLite database file.
///
/// Connections are not shared between requests. Each operation opens its own
/// connection with [Database::connect], and the connection is closed when it
/// is dropped at the end of the operation.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Create a handle for the database at `path`.
    ///
    /// The file is not touched until the first call to [Database::connect].
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The location of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a new connection to the database.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the file cannot be opened.
    pub fn connect(&self) -> Result<Connection, Error> {
        Connection::open(&self.path).map_err(Error::from)
    }
}

/// Create the tables for the domain models and, if `seed` is set, add the demo
/// transactions to an empty database.
///
/// Returns the number of seeded rows.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &mut Connection, seed: bool) -> Result<usize, Error> {
    let transaction = connection.transaction_with_behavior(TransactionBehavior::Exclusive)?;

    create_transaction_table(&transaction)?;

    let seeded = if seed {
        seed_transactions_if_empty(&transaction)?
    } else {
        0
    };

    transaction.commit()?;

    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{test_utils::TestDatabase, transaction::count_transactions};

    use super::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();

        assert_eq!(initialize(&mut conn, true).unwrap(), 4);
        assert_eq!(initialize(&mut conn, true).unwrap(), 0);
        assert_eq!(count_transactions(&conn).unwrap(), 4);
    }

    #[test]
    fn initialize_without_seed_leaves_table_empty() {
        let mut conn = Connection::open_in_memory().unwrap();

        assert_eq!(initialize(&mut conn, false).unwrap(), 0);
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn connections_share_the_file() {
        let db = TestDatabase::seeded();

        let first = db.database().connect().unwrap();
        let second = db.database().connect().unwrap();

        assert_eq!(count_transactions(&first).unwrap(), 4);
        assert_eq!(count_transactions(&second).unwrap(), 4);
    }
}
