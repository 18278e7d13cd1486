//! Database bootstrap: opening a database file and creating the schema.

use std::path::Path;

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error, account::create_account_table, record::create_record_table,
};

/// Open the database at `path`, creating any missing tables.
///
/// The returned connection is meant to be wrapped in `Arc<Mutex<_>>` and
/// handed to the services at startup. There is no process-wide database
/// handle; whoever constructs the connection owns it.
///
/// # Errors
/// Returns [Error::SqlError] if the file cannot be opened or the schema
/// cannot be created.
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection, Error> {
    let connection = Connection::open(path)?;
    initialize(&connection)?;

    Ok(connection)
}

/// Create the application schema on `connection`.
///
/// Enables foreign key enforcement (SQLite leaves it off by default, and
/// the record table's cascade depends on it), then creates the account and
/// record tables and their indexes inside a single exclusive transaction.
///
/// # Errors
/// Returns [Error::SqlError] if a pragma or table creation fails.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_record_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
