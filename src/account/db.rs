//! Database operations for accounts.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    account::{Account, AccountId, map_row_to_account},
};

/// Create an account and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyAccountName] if `name` trims to an empty string,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_account(
    name: &str,
    balance: f64,
    connection: &Connection,
) -> Result<Account, Error> {
    if name.trim().is_empty() {
        return Err(Error::EmptyAccountName);
    }

    let account = connection
        .prepare(
            "INSERT INTO account (name, balance) VALUES (?1, ?2)
             RETURNING id, name, balance",
        )?
        .query_row((name, balance), map_row_to_account)?;

    Ok(account)
}

/// Retrieve a single account by ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid account,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .prepare("SELECT id, name, balance FROM account WHERE id = :id")?
        .query_row(&[(":id", &id)], map_row_to_account)
        .map_err(|error| error.into())
}

/// Retrieve the first account with the given name, if any.
///
/// Names are not unique at the storage level; when duplicates exist the
/// lowest ID wins. The account service uses this lookup for its
/// duplicate-name policy.
pub fn get_account_by_name(
    name: &str,
    connection: &Connection,
) -> Result<Option<Account>, Error> {
    let result = connection
        .prepare("SELECT id, name, balance FROM account WHERE name = :name ORDER BY id ASC")?
        .query_row(&[(":name", &name)], map_row_to_account);

    match result {
        Ok(account) => Ok(Some(account)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Retrieve all accounts, most recently created first.
pub fn get_all_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare("SELECT id, name, balance FROM account ORDER BY id DESC")?
        .query_map([], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(|error| error.into()))
        .collect()
}

/// Change an account's name.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyAccountName] if `new_name` trims to an empty string,
/// - or [Error::UpdateMissingAccount] if `id` does not refer to a valid
///   account.
pub fn rename_account(
    id: AccountId,
    new_name: &str,
    connection: &Connection,
) -> Result<(), Error> {
    if new_name.trim().is_empty() {
        return Err(Error::EmptyAccountName);
    }

    let rows_affected = connection.execute(
        "UPDATE account SET name = ?1 WHERE id = ?2",
        (new_name, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    Ok(())
}

/// Overwrite an account's balance with an absolute value.
///
/// # Errors
/// Returns [Error::UpdateMissingAccount] if `id` does not refer to a valid
/// account.
pub fn set_account_balance(
    id: AccountId,
    balance: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET balance = ?1 WHERE id = ?2",
        (balance, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    Ok(())
}

/// Apply a signed delta to an account's balance.
///
/// The update is a single set-based statement, so the read-modify-write
/// happens inside the engine and concurrent adjustments cannot lose each
/// other's increments.
///
/// # Errors
/// Returns [Error::UpdateMissingAccount] if `id` does not refer to a valid
/// account.
pub fn adjust_account_balance(
    id: AccountId,
    delta: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET balance = balance + ?1 WHERE id = ?2",
        (delta, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    Ok(())
}

/// Delete an account together with all of its records.
///
/// The record deletes and the account delete run in one transaction: either
/// the account and every record it owns are removed, or nothing is.
///
/// # Errors
/// Returns [Error::DeleteMissingAccount] if `id` does not refer to a valid
/// account. In that case any record deletes are rolled back.
pub fn delete_account(id: AccountId, connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction.execute("DELETE FROM record WHERE account_id = ?1", [id])?;
    let rows_affected = transaction.execute("DELETE FROM account WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        // Dropping the transaction rolls back the record deletes.
        return Err(Error::DeleteMissingAccount);
    }

    transaction.commit()?;

    Ok(())
}
