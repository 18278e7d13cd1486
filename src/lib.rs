//! Moneybook is the data layer for a personal income and expenditure
//! tracker.
//!
//! Accounts are ledgers that carry a running balance; records are the
//! individual income and expense transactions that belong to exactly one
//! account. This crate owns durable storage (SQLite), the command services
//! that validate and apply changes, and the live snapshot channels that a
//! presentation layer subscribes to. It has no rendering or network
//! surface: a UI calls the service commands and draws whatever the
//! channels deliver.

#![warn(missing_docs)]

pub mod account;
pub mod db;
pub mod live;
pub mod record;
pub mod status;

pub use account::{Account, AccountId, AccountService};
pub use db::{initialize, open};
pub use live::LiveQuery;
pub use record::{
    MonthlyStats, NewRecord, Record, RecordGroup, RecordId, RecordService, RecordType,
    group_records_by_date,
};
pub use status::{ServiceStatus, StatusCell};

/// The errors that may occur in the data layer.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty or whitespace-only string was used as an account name.
    #[error("account name cannot be empty")]
    EmptyAccountName,

    /// A record was given a negative amount.
    ///
    /// Amounts are unsigned magnitudes; whether a record adds to or
    /// subtracts from a balance is carried by its type, not its sign.
    #[error("{0} is a negative amount, which is not allowed")]
    NegativeAmount(f64),

    /// The specified account name already exists.
    ///
    /// Storage does not enforce name uniqueness; this is raised by the
    /// account service's duplicate-name policy.
    #[error("an account named \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// The account ID used to create or update a record did not match a
    /// valid account.
    #[error("the account ID {0} does not refer to a valid account")]
    InvalidAccount(AccountId),

    /// The requested row could not be found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update an account that does not exist.
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete an account that does not exist.
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to update a record that does not exist.
    #[error("tried to update a record that is not in the database")]
    UpdateMissingRecord,

    /// Tried to delete a record that does not exist.
    #[error("tried to delete a record that is not in the database")]
    DeleteMissingRecord,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// Convert the error into a message suitable for the error channel of a
    /// service.
    ///
    /// Services never raise errors across the service boundary; every
    /// failure is reported to subscribers as one of these strings instead.
    pub fn user_message(&self) -> String {
        match self {
            Error::EmptyAccountName => "The account name cannot be empty.".to_owned(),
            Error::NegativeAmount(amount) => {
                format!("{amount} is a negative amount. Use the record type to mark an expense.")
            }
            Error::DuplicateAccountName(name) => format!(
                "The account \"{name}\" already exists. \
                Choose a different name, or edit or delete the existing account."
            ),
            Error::InvalidAccount(account_id) => {
                format!("Could not find an account with the ID {account_id}.")
            }
            Error::NotFound => "The requested item could not be found.".to_owned(),
            Error::UpdateMissingAccount => {
                "Could not update the account: it could not be found.".to_owned()
            }
            Error::DeleteMissingAccount => {
                "Could not delete the account: it could not be found. \
                Try refreshing to see if it has already been deleted."
                    .to_owned()
            }
            Error::UpdateMissingRecord => {
                "Could not update the record: it could not be found.".to_owned()
            }
            Error::DeleteMissingRecord => {
                "Could not delete the record: it could not be found. \
                Try refreshing to see if it has already been deleted."
                    .to_owned()
            }
            // Storage failures are not intended to be shown in detail.
            Error::DatabaseLock | Error::SqlError(_) => {
                "Something went wrong. Check the logs for more details.".to_owned()
            }
        }
    }
}
