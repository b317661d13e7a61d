//! Implements a struct that holds the state of the REST server.

use axum::extract::FromRef;

use crate::{
    Error,
    db::{Database, initialize},
    logging::LOGGER_NAME,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database that request handlers open their connections to.
    pub database: Database,
}

impl AppState {
    /// Create a new [AppState] backed by `database`.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models, and seed the demo transactions into an empty table
    /// if `seed` is set.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(database: Database, seed: bool) -> Result<Self, Error> {
        let mut connection = database.connect()?;
        let seeded = initialize(&mut connection, seed)?;

        tracing::info!(
            target: LOGGER_NAME,
            "database ready at {} ({seeded} rows seeded)",
            database.path().display()
        );

        Ok(Self { database })
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.database.clone()
    }
}
