//! Accounts: named ledgers that carry a running balance.
//!
//! This module contains everything related to accounts:
//! - The `Account` model and the account table schema
//! - Database functions for account CRUD and balance maintenance
//! - The [AccountService] command surface with its live accounts list

mod core;
mod db;
mod service;

pub use self::core::{Account, AccountId, create_account_table, map_row_to_account};
pub use db::{
    adjust_account_balance, create_account, delete_account, get_account, get_account_by_name,
    get_all_accounts, rename_account, set_account_balance,
};
pub use service::AccountService;
