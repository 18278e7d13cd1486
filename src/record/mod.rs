//! Records: the income and expense transactions owned by accounts.
//!
//! This module contains everything related to records:
//! - The `Record` model, record type enum and the record table schema
//! - Database functions for record CRUD, filtered queries and sums
//! - The day-grouping transform used by record list views
//! - The [RecordService] command surface with its live records list

mod core;
mod db;
mod grouping;
mod service;

pub use self::core::{
    NewRecord, Record, RecordId, RecordType, create_record_table, map_row_to_record,
};
pub use db::{
    create_record, delete_record, delete_records_by_account, get_record, get_records_by_account,
    get_records_by_category, get_records_by_date_range, get_records_by_type, total_expense,
    total_income, update_record,
};
pub use grouping::{RecordGroup, format_day_header, group_records_by_date};
pub use service::{MonthlyStats, RecordService};
