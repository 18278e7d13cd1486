use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

/// The integer type used for account IDs.
pub type AccountId = i64;

/// A ledger that owns income/expense records and carries a running balance.
///
/// The balance is an independently mutable field: it is only ever changed
/// through ledger operations (an explicit set or a signed adjustment) and
/// is never recomputed from the account's records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// The ID for the account.
    pub id: AccountId,
    /// The display name of the account. Not unique at the storage level.
    pub name: String,
    /// The running balance.
    pub balance: f64,
}

/// Create the account table.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            balance REAL NOT NULL DEFAULT 0.0
        )",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [Account].
pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let balance = row.get(2)?;

    Ok(Account { id, name, balance })
}
