//! The account command surface.
//!
//! [AccountService] is what a presentation layer talks to. It validates
//! and applies account changes, and republishes the live accounts list
//! after every successful write. Commands never return errors; every
//! failure is reported through the error channel as a user-facing
//! message.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tokio::sync::watch;

use crate::{
    Error,
    account::{
        Account, AccountId, adjust_account_balance, create_account, delete_account, get_account,
        get_account_by_name, get_all_accounts, rename_account, set_account_balance,
    },
    live::LiveQuery,
    status::ServiceStatus,
};

/// Commands and live views over the set of accounts.
///
/// The storage handle is injected at construction (the single connection is
/// shared with other services through the `Arc<Mutex<_>>`); the service
/// itself is cheap to share behind an `Arc` and safe to call from
/// concurrent tasks.
#[derive(Debug)]
pub struct AccountService {
    connection: Arc<Mutex<Connection>>,
    accounts: LiveQuery<Vec<Account>>,
    status: ServiceStatus,
}

impl AccountService {
    /// Create a service over `connection` and load the initial accounts
    /// snapshot.
    ///
    /// A failure during the initial load is reported through the error
    /// channel like any other failure.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        let service = Self {
            connection,
            accounts: LiveQuery::new(Vec::new()),
            status: ServiceStatus::default(),
        };
        service.republish();

        service
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|_| Error::DatabaseLock)
    }

    /// Re-query the accounts list and publish the fresh snapshot.
    fn republish(&self) {
        match self.lock().and_then(|connection| get_all_accounts(&connection)) {
            Ok(accounts) => self.accounts.publish(accounts),
            Err(error) => self.status.fail(error.user_message()),
        }
    }

    /// Create an account with `initial_balance` as its starting balance.
    ///
    /// Rejects a name that is already taken. Storage itself allows
    /// duplicate names; the uniqueness policy lives here.
    pub async fn create_account(&self, name: &str, initial_balance: f64) {
        self.status.begin();

        let result = self.lock().and_then(|connection| {
            if let Some(existing) = get_account_by_name(name, &connection)? {
                return Err(Error::DuplicateAccountName(existing.name));
            }

            create_account(name, initial_balance, &connection)
        });

        match result {
            Ok(account) => {
                tracing::debug!("created account {} ({})", account.id, account.name);
                self.status
                    .succeed(format!("Account \"{}\" created", account.name));
                self.republish();
            }
            Err(error) => self.status.fail(error.user_message()),
        }
    }

    /// Change an account's name.
    pub async fn rename_account(&self, id: AccountId, new_name: &str) {
        self.status.begin();

        let result = self
            .lock()
            .and_then(|connection| rename_account(id, new_name, &connection));

        match result {
            Ok(()) => {
                self.status.succeed("Account updated");
                self.republish();
            }
            Err(error) => self.status.fail(error.user_message()),
        }
    }

    /// Overwrite an account's balance with an absolute value.
    pub async fn set_balance(&self, id: AccountId, value: f64) {
        self.status.begin();

        let result = self
            .lock()
            .and_then(|connection| set_account_balance(id, value, &connection));

        match result {
            Ok(()) => {
                self.status.succeed("Balance updated");
                self.republish();
            }
            Err(error) => self.status.fail(error.user_message()),
        }
    }

    /// Apply a signed delta to an account's balance.
    ///
    /// Concurrent adjustments to the same account are safe: the delta is
    /// applied by the storage engine in a single set-based update, so two
    /// near-simultaneous calls both land.
    pub async fn adjust_balance(&self, id: AccountId, delta: f64) {
        self.status.begin();

        let result = self
            .lock()
            .and_then(|connection| adjust_account_balance(id, delta, &connection));

        match result {
            Ok(()) => {
                self.status.succeed("Balance updated");
                self.republish();
            }
            Err(error) => self.status.fail(error.user_message()),
        }
    }

    /// Delete an account and, atomically with it, every record it owns.
    pub async fn delete_account(&self, id: AccountId) {
        self.status.begin();

        let result = self
            .lock()
            .and_then(|connection| delete_account(id, &connection));

        match result {
            Ok(()) => {
                tracing::debug!("deleted account {id} and its records");
                self.status.succeed("Account deleted");
                self.republish();
            }
            Err(error) => self.status.fail(error.user_message()),
        }
    }

    /// Re-query the accounts list outside of any write.
    pub async fn refresh(&self) {
        self.status.begin();
        self.republish();
        self.status.finish();
    }

    /// Retrieve a single account, or `None` if it does not exist.
    ///
    /// Storage failures (as opposed to a plain miss) are reported through
    /// the error channel.
    pub fn get_account(&self, id: AccountId) -> Option<Account> {
        match self.lock().and_then(|connection| get_account(id, &connection)) {
            Ok(account) => Some(account),
            Err(Error::NotFound) => None,
            Err(error) => {
                self.status.fail(error.user_message());
                None
            }
        }
    }

    /// Subscribe to the live accounts list (most recently created first).
    pub fn accounts(&self) -> watch::Receiver<Vec<Account>> {
        self.accounts.subscribe()
    }

    /// The current accounts snapshot.
    pub fn accounts_snapshot(&self) -> Vec<Account> {
        self.accounts.snapshot()
    }

    /// Sum of the balances of the currently loaded accounts.
    ///
    /// Derived from the snapshot, not stored and not re-queried.
    pub fn total_balance(&self) -> f64 {
        self.accounts
            .snapshot()
            .iter()
            .map(|account| account.balance)
            .sum()
    }

    /// How many accounts are currently loaded.
    pub fn account_count(&self) -> usize {
        self.accounts.snapshot().len()
    }

    /// The loading/error/success channels for this service.
    pub fn status(&self) -> &ServiceStatus {
        &self.status
    }
}
