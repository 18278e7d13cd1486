//! Database operations for records.

use rusqlite::Connection;

use crate::{
    Error,
    account::AccountId,
    record::{NewRecord, Record, RecordId, RecordType, map_row_to_record},
};

const RECORD_COLUMNS: &str = "id, title, amount, type, category, date, note, account_id";

/// Create a record and return it with its generated ID.
///
/// The referenced account is not pre-checked; the foreign key constraint is
/// trusted to reject a dangling `account_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAccount] if `account_id` does not refer to a valid
///   account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_record(new_record: NewRecord, connection: &Connection) -> Result<Record, Error> {
    let record = connection
        .prepare(
            "INSERT INTO record (title, amount, type, category, date, note, account_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, title, amount, type, category, date, note, account_id",
        )?
        .query_row(
            (
                &new_record.title,
                new_record.amount,
                new_record.kind,
                &new_record.category,
                new_record.date,
                &new_record.note,
                new_record.account_id,
            ),
            map_row_to_record,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidAccount(new_record.account_id),
            error => error.into(),
        })?;

    Ok(record)
}

/// Retrieve a single record by ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid record,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_record(id: RecordId, connection: &Connection) -> Result<Record, Error> {
    connection
        .prepare(&format!("SELECT {RECORD_COLUMNS} FROM record WHERE id = :id"))?
        .query_row(&[(":id", &id)], map_row_to_record)
        .map_err(|error| error.into())
}

/// Replace the row matching `record.id` with `record`.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissingRecord] if `record.id` does not refer to a valid
///   record,
/// - [Error::InvalidAccount] if `record.account_id` does not refer to a
///   valid account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_record(record: &Record, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection
        .execute(
            "UPDATE record
             SET title = ?1, amount = ?2, type = ?3, category = ?4, date = ?5, note = ?6,
                 account_id = ?7
             WHERE id = ?8",
            (
                &record.title,
                record.amount,
                record.kind,
                &record.category,
                record.date,
                &record.note,
                record.account_id,
                record.id,
            ),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidAccount(record.account_id),
            error => Error::from(error),
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingRecord);
    }

    Ok(())
}

/// Delete a record by ID.
///
/// # Errors
/// Returns [Error::DeleteMissingRecord] if `id` does not refer to a valid
/// record.
pub fn delete_record(id: RecordId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM record WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRecord);
    }

    Ok(())
}

/// Retrieve every record belonging to `account_id`, newest first.
///
/// Sort by date, then ID, to keep the order of same-day records stable
/// after updates.
pub fn get_records_by_account(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Record>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM record
             WHERE account_id = :account_id
             ORDER BY date DESC, id DESC"
        ))?
        .query_map(&[(":account_id", &account_id)], map_row_to_record)?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the records of `account_id` whose date lies in
/// `[start, end]` (inclusive bounds, epoch milliseconds), newest first.
pub fn get_records_by_date_range(
    account_id: AccountId,
    start: i64,
    end: i64,
    connection: &Connection,
) -> Result<Vec<Record>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM record
             WHERE account_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date DESC, id DESC"
        ))?
        .query_map((account_id, start, end), map_row_to_record)?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the records of `account_id` with the given type, newest first.
pub fn get_records_by_type(
    account_id: AccountId,
    kind: RecordType,
    connection: &Connection,
) -> Result<Vec<Record>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM record
             WHERE account_id = ?1 AND type = ?2
             ORDER BY date DESC, id DESC"
        ))?
        .query_map((account_id, kind), map_row_to_record)?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the records of `account_id` with the given category, newest
/// first.
pub fn get_records_by_category(
    account_id: AccountId,
    category: &str,
    connection: &Connection,
) -> Result<Vec<Record>, Error> {
    connection
        .prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM record
             WHERE account_id = ?1 AND category = ?2
             ORDER BY date DESC, id DESC"
        ))?
        .query_map((account_id, category), map_row_to_record)?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}

/// Sum the amounts of all income records belonging to `account_id`.
///
/// Returns 0.0 when the account has no income records.
pub fn total_income(account_id: AccountId, connection: &Connection) -> Result<f64, Error> {
    sum_amount_by_type(account_id, RecordType::Income, connection)
}

/// Sum the amounts of all expense records belonging to `account_id`.
///
/// Returns 0.0 when the account has no expense records.
pub fn total_expense(account_id: AccountId, connection: &Connection) -> Result<f64, Error> {
    sum_amount_by_type(account_id, RecordType::Expense, connection)
}

fn sum_amount_by_type(
    account_id: AccountId,
    kind: RecordType,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .prepare(
            "SELECT COALESCE(SUM(amount), 0.0) FROM record
             WHERE account_id = ?1 AND type = ?2",
        )?
        .query_row((account_id, kind), |row| row.get(0))
        .map_err(|error| error.into())
}

/// Delete every record belonging to `account_id` and return how many rows
/// were removed.
///
/// Deleting an account already cascades; this exists for clearing a ledger
/// without removing the account itself.
pub fn delete_records_by_account(
    account_id: AccountId,
    connection: &Connection,
) -> Result<usize, Error> {
    let rows_affected =
        connection.execute("DELETE FROM record WHERE account_id = ?1", [account_id])?;

    Ok(rows_affected)
}
