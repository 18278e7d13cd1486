//! The record command surface.
//!
//! [RecordService] tracks one selected account at a time and mirrors that
//! account's records as a live date-descending list, with a stats snapshot
//! kept current alongside it. Commands follow the same contract as the
//! account service: failures go to the error channel, never to the caller.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, Time, UtcOffset};
use tokio::sync::watch;

use crate::{
    Error,
    account::AccountId,
    live::LiveQuery,
    record::{
        NewRecord, Record, RecordGroup, RecordId, RecordType, create_record, delete_record,
        get_record, get_records_by_account, get_records_by_category, get_records_by_date_range,
        get_records_by_type, group_records_by_date, total_expense, total_income, update_record,
    },
    status::ServiceStatus,
};

/// Aggregate income, expense and their difference for the selected
/// account.
///
/// Recomputed after every successful record write. The totals cover the
/// account's whole history, matching the stored sums the stats delegate
/// to.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyStats {
    /// Sum of all income record amounts.
    pub income: f64,
    /// Sum of all expense record amounts.
    pub expense: f64,
    /// `income - expense`.
    pub balance: f64,
}

/// Commands and live views over the records of the selected account.
#[derive(Debug)]
pub struct RecordService {
    connection: Arc<Mutex<Connection>>,
    records: LiveQuery<Vec<Record>>,
    current_account: LiveQuery<Option<AccountId>>,
    monthly_stats: LiveQuery<MonthlyStats>,
    status: ServiceStatus,
    local_offset: UtcOffset,
}

impl RecordService {
    /// Create a service over `connection`.
    ///
    /// No account is selected initially; the records list stays empty until
    /// [RecordService::select_account] is called. Calendar-day helpers use
    /// the local UTC offset at construction time, falling back to UTC when
    /// it cannot be determined.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

        Self::with_local_offset(connection, local_offset)
    }

    /// Create a service with an explicit local offset for calendar-day
    /// computations.
    pub fn with_local_offset(connection: Arc<Mutex<Connection>>, local_offset: UtcOffset) -> Self {
        Self {
            connection,
            records: LiveQuery::new(Vec::new()),
            current_account: LiveQuery::new(None),
            monthly_stats: LiveQuery::new(MonthlyStats::default()),
            status: ServiceStatus::default(),
            local_offset,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|_| Error::DatabaseLock)
    }

    /// Load the records and stats for `current` and publish both snapshots.
    fn reload(&self, current: Option<AccountId>) -> Result<(), Error> {
        let Some(account_id) = current else {
            self.records.publish(Vec::new());
            self.monthly_stats.publish(MonthlyStats::default());
            return Ok(());
        };

        let connection = self.lock()?;
        let records = get_records_by_account(account_id, &connection)?;
        let income = total_income(account_id, &connection)?;
        let expense = total_expense(account_id, &connection)?;
        drop(connection);

        self.records.publish(records);
        self.monthly_stats.publish(MonthlyStats {
            income,
            expense,
            balance: income - expense,
        });

        Ok(())
    }

    fn republish(&self) {
        if let Err(error) = self.reload(self.current_account.snapshot()) {
            self.status.fail(error.user_message());
        }
    }

    /// Select the account whose records this service mirrors, and load
    /// them.
    pub async fn select_account(&self, account_id: AccountId) {
        self.current_account.publish(Some(account_id));
        self.status.begin();

        match self.reload(Some(account_id)) {
            Ok(()) => self.status.finish(),
            Err(error) => self.status.fail(error.user_message()),
        }
    }

    /// Create a record.
    ///
    /// The amount must be non-negative; the direction of the transaction is
    /// carried by the record type. The referenced account is not
    /// pre-checked here: the storage engine's foreign key rejects a
    /// dangling `account_id`.
    pub async fn create_record(&self, new_record: NewRecord) {
        self.status.begin();

        let result = if new_record.amount < 0.0 {
            Err(Error::NegativeAmount(new_record.amount))
        } else {
            self.lock()
                .and_then(|connection| create_record(new_record, &connection))
        };

        match result {
            Ok(record) => {
                tracing::debug!("created record {} for account {}", record.id, record.account_id);
                self.status.succeed("Record saved");
                self.republish();
            }
            Err(error) => self.status.fail(error.user_message()),
        }
    }

    /// Replace a record with an edited version.
    pub async fn update_record(&self, record: Record) {
        self.status.begin();

        let result = if record.amount < 0.0 {
            Err(Error::NegativeAmount(record.amount))
        } else {
            self.lock()
                .and_then(|connection| update_record(&record, &connection))
        };

        match result {
            Ok(()) => {
                self.status.succeed("Record updated");
                self.republish();
            }
            Err(error) => self.status.fail(error.user_message()),
        }
    }

    /// Delete a record by ID.
    pub async fn delete_record(&self, id: RecordId) {
        self.status.begin();

        let result = self
            .lock()
            .and_then(|connection| delete_record(id, &connection));

        match result {
            Ok(()) => {
                self.status.succeed("Record deleted");
                self.republish();
            }
            Err(error) => self.status.fail(error.user_message()),
        }
    }

    /// Retrieve a single record, or `None` if it does not exist.
    pub fn get_record(&self, id: RecordId) -> Option<Record> {
        match self.lock().and_then(|connection| get_record(id, &connection)) {
            Ok(record) => Some(record),
            Err(Error::NotFound) => None,
            Err(error) => {
                self.status.fail(error.user_message());
                None
            }
        }
    }

    /// Subscribe to the live records list of the selected account.
    pub fn records(&self) -> watch::Receiver<Vec<Record>> {
        self.records.subscribe()
    }

    /// The current records snapshot.
    pub fn records_snapshot(&self) -> Vec<Record> {
        self.records.snapshot()
    }

    /// The currently loaded records partitioned into day groups.
    pub fn grouped_records(&self) -> Vec<RecordGroup> {
        group_records_by_date(self.records.snapshot(), self.local_offset)
    }

    /// Subscribe to the selected account.
    pub fn current_account(&self) -> watch::Receiver<Option<AccountId>> {
        self.current_account.subscribe()
    }

    /// The ID of the selected account, if any.
    pub fn current_account_id(&self) -> Option<AccountId> {
        self.current_account.snapshot()
    }

    /// Subscribe to the stats of the selected account.
    pub fn monthly_stats(&self) -> watch::Receiver<MonthlyStats> {
        self.monthly_stats.subscribe()
    }

    /// The current stats snapshot.
    pub fn monthly_stats_snapshot(&self) -> MonthlyStats {
        self.monthly_stats.snapshot()
    }

    /// Sum of today's income among the currently loaded records.
    ///
    /// Computed by filtering the loaded snapshot against the service's
    /// local calendar-day boundaries; storage is not re-queried.
    pub fn today_income(&self) -> f64 {
        self.sum_today(RecordType::Income)
    }

    /// Sum of today's expenses among the currently loaded records.
    pub fn today_expense(&self) -> f64 {
        self.sum_today(RecordType::Expense)
    }

    fn sum_today(&self, kind: RecordType) -> f64 {
        let (day_start, day_end) = self.local_day_bounds();

        self.records
            .snapshot()
            .iter()
            .filter(|record| record.kind == kind && (day_start..=day_end).contains(&record.date))
            .map(|record| record.amount)
            .sum()
    }

    fn local_day_bounds(&self) -> (i64, i64) {
        let now = OffsetDateTime::now_utc().to_offset(self.local_offset);
        let day_start = now.replace_time(Time::MIDNIGHT);
        let day_end = day_start + Duration::days(1) - Duration::milliseconds(1);

        (unix_ms(day_start), unix_ms(day_end))
    }

    /// How many records are currently loaded.
    pub fn record_count(&self) -> usize {
        self.records.snapshot().len()
    }

    /// Records of `account_id` within `[start, end]` (inclusive epoch
    /// milliseconds), newest first.
    ///
    /// A snapshot query straight against storage; failures are reported
    /// through the error channel and yield an empty list.
    pub fn records_by_date_range(&self, account_id: AccountId, start: i64, end: i64) -> Vec<Record> {
        self.read(|connection| get_records_by_date_range(account_id, start, end, connection))
    }

    /// Records of `account_id` with the given type, newest first.
    pub fn records_by_type(&self, account_id: AccountId, kind: RecordType) -> Vec<Record> {
        self.read(|connection| get_records_by_type(account_id, kind, connection))
    }

    /// Records of `account_id` with the given category, newest first.
    pub fn records_by_category(&self, account_id: AccountId, category: &str) -> Vec<Record> {
        self.read(|connection| get_records_by_category(account_id, category, connection))
    }

    /// Lifetime income total for `account_id`. 0.0 when it has no income
    /// records.
    pub fn total_income(&self, account_id: AccountId) -> f64 {
        self.read(|connection| total_income(account_id, connection))
    }

    /// Lifetime expense total for `account_id`. 0.0 when it has no expense
    /// records.
    pub fn total_expense(&self, account_id: AccountId) -> f64 {
        self.read(|connection| total_expense(account_id, connection))
    }

    fn read<T: Default>(&self, query: impl FnOnce(&Connection) -> Result<T, Error>) -> T {
        match self.lock().and_then(|connection| query(&connection)) {
            Ok(value) => value,
            Err(error) => {
                self.status.fail(error.user_message());
                T::default()
            }
        }
    }

    /// The loading/error/success channels for this service.
    pub fn status(&self) -> &ServiceStatus {
        &self.status
    }
}

fn unix_ms(datetime: OffsetDateTime) -> i64 {
    (datetime.unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod record_service_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::{OffsetDateTime, UtcOffset};

    use crate::{
        account::AccountService,
        db::initialize,
        record::{NewRecord, RecordType},
    };

    use super::RecordService;

    fn get_test_services() -> (AccountService, RecordService) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        (
            AccountService::new(Arc::clone(&connection)),
            RecordService::with_local_offset(connection, UtcOffset::UTC),
        )
    }

    fn new_record(account_id: i64, amount: f64, kind: RecordType, date: i64) -> NewRecord {
        NewRecord {
            title: "test".to_owned(),
            amount,
            kind,
            category: "Other".to_owned(),
            date,
            note: String::new(),
            account_id,
        }
    }

    fn now_ms() -> i64 {
        (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }

    #[tokio::test]
    async fn select_account_loads_records_newest_first() {
        let (accounts, records) = get_test_services();
        accounts.create_account("Wallet", 0.0).await;
        let id = accounts.accounts_snapshot()[0].id;
        records
            .create_record(new_record(id, 1.0, RecordType::Income, 100))
            .await;
        records
            .create_record(new_record(id, 2.0, RecordType::Income, 200))
            .await;

        records.select_account(id).await;

        let snapshot = records.records_snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].date, 200);
        assert_eq!(snapshot[1].date, 100);
        assert!(!records.status().is_loading());
    }

    #[tokio::test]
    async fn create_record_refreshes_list_and_stats() {
        let (accounts, records) = get_test_services();
        accounts.create_account("Wallet", 0.0).await;
        let id = accounts.accounts_snapshot()[0].id;
        records.select_account(id).await;

        records
            .create_record(new_record(id, 100.0, RecordType::Income, 10))
            .await;
        records
            .create_record(new_record(id, 30.0, RecordType::Expense, 20))
            .await;

        assert_eq!(records.record_count(), 2);
        let stats = records.monthly_stats_snapshot();
        assert_eq!(stats.income, 100.0);
        assert_eq!(stats.expense, 30.0);
        assert_eq!(stats.balance, 70.0);
        assert_eq!(
            records.status().success_message(),
            Some("Record saved".to_owned())
        );
    }

    #[tokio::test]
    async fn create_record_with_negative_amount_reports_error() {
        let (accounts, records) = get_test_services();
        accounts.create_account("Wallet", 0.0).await;
        let id = accounts.accounts_snapshot()[0].id;
        records.select_account(id).await;

        records
            .create_record(new_record(id, -5.0, RecordType::Expense, 10))
            .await;

        assert!(records.status().error_message().is_some());
        assert_eq!(records.record_count(), 0);
        assert!(!records.status().is_loading());
    }

    #[tokio::test]
    async fn create_record_for_missing_account_reports_error() {
        let (_accounts, records) = get_test_services();

        records
            .create_record(new_record(42, 5.0, RecordType::Expense, 10))
            .await;

        let message = records.status().error_message().expect("no error message");
        assert!(message.contains("42"), "got {message:?}");
    }

    #[tokio::test]
    async fn expense_records_leave_account_balance_alone() {
        let (accounts, records) = get_test_services();
        accounts.create_account("Wallet", 100.0).await;
        let id = accounts.accounts_snapshot()[0].id;
        records.select_account(id).await;

        records
            .create_record(new_record(id, 5.0, RecordType::Expense, now_ms()))
            .await;

        assert_eq!(records.total_expense(id), 5.0);
        // The balance is independent of record totals.
        assert_eq!(accounts.get_account(id).unwrap().balance, 100.0);
    }

    #[tokio::test]
    async fn delete_record_refreshes_list() {
        let (accounts, records) = get_test_services();
        accounts.create_account("Wallet", 0.0).await;
        let id = accounts.accounts_snapshot()[0].id;
        records.select_account(id).await;
        records
            .create_record(new_record(id, 1.0, RecordType::Income, 10))
            .await;
        let record_id = records.records_snapshot()[0].id;

        records.delete_record(record_id).await;

        assert_eq!(records.record_count(), 0);
    }

    #[tokio::test]
    async fn delete_missing_record_reports_error() {
        let (_accounts, records) = get_test_services();

        records.delete_record(999).await;

        assert!(records.status().error_message().is_some());
    }

    #[tokio::test]
    async fn update_record_publishes_edited_version() {
        let (accounts, records) = get_test_services();
        accounts.create_account("Wallet", 0.0).await;
        let id = accounts.accounts_snapshot()[0].id;
        records.select_account(id).await;
        records
            .create_record(new_record(id, 1.0, RecordType::Income, 10))
            .await;
        let mut record = records.records_snapshot()[0].clone();

        record.title = "Edited".to_owned();
        records.update_record(record).await;

        assert_eq!(records.records_snapshot()[0].title, "Edited");
    }

    #[tokio::test]
    async fn totals_are_zero_for_account_with_no_records() {
        let (accounts, records) = get_test_services();
        accounts.create_account("Wallet", 0.0).await;
        let id = accounts.accounts_snapshot()[0].id;

        assert_eq!(records.total_income(id), 0.0);
        assert_eq!(records.total_expense(id), 0.0);
    }

    #[tokio::test]
    async fn stats_cover_the_whole_account_history() {
        let (accounts, records) = get_test_services();
        accounts.create_account("Wallet", 0.0).await;
        let id = accounts.accounts_snapshot()[0].id;
        // One record from years back, one from now: both land in the stats.
        records
            .create_record(new_record(id, 100.0, RecordType::Income, 1_000))
            .await;
        records
            .create_record(new_record(id, 40.0, RecordType::Expense, now_ms()))
            .await;

        records.select_account(id).await;

        let stats = records.monthly_stats_snapshot();
        assert_eq!(stats.income, 100.0);
        assert_eq!(stats.expense, 40.0);
    }

    #[tokio::test]
    async fn today_sums_only_count_todays_records() {
        let (accounts, records) = get_test_services();
        accounts.create_account("Wallet", 0.0).await;
        let id = accounts.accounts_snapshot()[0].id;
        let two_days_ago = now_ms() - 2 * 24 * 60 * 60 * 1000;
        records
            .create_record(new_record(id, 15.0, RecordType::Expense, now_ms()))
            .await;
        records
            .create_record(new_record(id, 99.0, RecordType::Expense, two_days_ago))
            .await;
        records
            .create_record(new_record(id, 7.0, RecordType::Income, now_ms()))
            .await;
        records.select_account(id).await;

        assert_eq!(records.today_expense(), 15.0);
        assert_eq!(records.today_income(), 7.0);
    }

    #[tokio::test]
    async fn live_subscribers_observe_record_writes() {
        let (accounts, records) = get_test_services();
        accounts.create_account("Wallet", 0.0).await;
        let id = accounts.accounts_snapshot()[0].id;
        records.select_account(id).await;
        let mut receiver = records.records();

        records
            .create_record(new_record(id, 1.0, RecordType::Income, 10))
            .await;

        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow_and_update().len(), 1);
    }
}
