//! Defines the core data models and table schema for records.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// The integer type used for record IDs.
pub type RecordId = i64;

/// Whether a record adds money to its account or takes money out.
///
/// Stored as the strings `"income"` and `"expense"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
}

impl RecordType {
    /// The string stored in the record table's `type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Income => "income",
            RecordType::Expense => "expense",
        }
    }
}

impl ToSql for RecordType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for RecordType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(RecordType::Income),
            "expense" => Ok(RecordType::Expense),
            other => Err(FromSqlError::Other(
                format!("unknown record type {other:?}").into(),
            )),
        }
    }
}

/// A single income or expense transaction belonging to exactly one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The ID for the record.
    pub id: RecordId,
    /// What the transaction was for.
    pub title: String,
    /// The unsigned magnitude of the transaction. Always >= 0; the
    /// direction is carried by `kind`.
    pub amount: f64,
    /// Whether this is income or an expense.
    #[serde(rename = "type")]
    pub kind: RecordType,
    /// Free-text label for grouping, e.g. "Food", "Transport".
    pub category: String,
    /// When the transaction happened, as unix epoch milliseconds.
    pub date: i64,
    /// Optional free text. An empty string means "no note".
    pub note: String,
    /// The account this record belongs to.
    pub account_id: AccountId,
}

/// The fields needed to insert a record; the ID is assigned by storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    /// What the transaction was for.
    pub title: String,
    /// The unsigned magnitude of the transaction.
    pub amount: f64,
    /// Whether this is income or an expense.
    #[serde(rename = "type")]
    pub kind: RecordType,
    /// Free-text label for grouping.
    pub category: String,
    /// When the transaction happened, as unix epoch milliseconds.
    pub date: i64,
    /// Optional free text. An empty string means "no note".
    pub note: String,
    /// The account this record belongs to. Must reference a live account.
    pub account_id: AccountId,
}

/// Create the record table and its indexes.
///
/// The foreign key cascades deletes so that removing an account removes its
/// records; the composite index backs the account-scoped, date-ordered
/// queries and the plain date index backs range scans.
pub fn create_record_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS record (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            amount REAL NOT NULL,
            type TEXT NOT NULL,
            category TEXT NOT NULL,
            date INTEGER NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            account_id INTEGER NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_record_account_date ON record(account_id, date);
        CREATE INDEX IF NOT EXISTS idx_record_date ON record(date);",
    )?;

    Ok(())
}

/// Map a database row to a [Record].
pub fn map_row_to_record(row: &Row) -> Result<Record, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let amount = row.get(2)?;
    let kind = row.get(3)?;
    let category = row.get(4)?;
    let date = row.get(5)?;
    let note = row.get(6)?;
    let account_id = row.get(7)?;

    Ok(Record {
        id,
        title,
        amount,
        kind,
        category,
        date,
        note,
        account_id,
    })
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_record_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_record_table(&connection));
    }
}
