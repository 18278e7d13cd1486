//! Day grouping for record lists.

use serde::Serialize;
use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

use super::Record;

/// The text of a day header, e.g. "2026-08-07 Friday".
const DAY_HEADER_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [weekday repr:long]");

/// A single item in a date-grouped record list.
///
/// A grouped list interleaves headers and records so a presentation layer
/// can render it with a plain sequential pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecordGroup {
    /// Marks the start of a new calendar day in the list.
    DateHeader(String),
    /// A record, preceded somewhere above by its day's header.
    Entry(Record),
}

/// Partition a date-descending record list into day groups.
///
/// A [RecordGroup::DateHeader] is inserted each time the formatted
/// calendar date changes from the previous record; the input order is
/// preserved and nothing is re-sorted. Records whose timestamps fall on
/// the same calendar day in `offset` share one header.
pub fn group_records_by_date(records: Vec<Record>, offset: UtcOffset) -> Vec<RecordGroup> {
    let mut groups = Vec::with_capacity(records.len());
    let mut last_day: Option<String> = None;

    for record in records {
        let day = format_day_header(record.date, offset);

        if last_day.as_deref() != Some(day.as_str()) {
            groups.push(RecordGroup::DateHeader(day.clone()));
            last_day = Some(day);
        }

        groups.push(RecordGroup::Entry(record));
    }

    groups
}

/// Format an epoch-millisecond timestamp as a day header in `offset`.
pub fn format_day_header(timestamp_ms: i64, offset: UtcOffset) -> String {
    let datetime =
        match OffsetDateTime::from_unix_timestamp_nanos(i128::from(timestamp_ms) * 1_000_000) {
            Ok(datetime) => datetime.to_offset(offset),
            // Out-of-range timestamps have no calendar date to show.
            Err(_) => return timestamp_ms.to_string(),
        };

    datetime
        .date()
        .format(DAY_HEADER_FORMAT)
        .unwrap_or_else(|_| datetime.date().to_string())
}

#[cfg(test)]
mod grouping_tests {
    use time::UtcOffset;

    use crate::record::{Record, RecordType};

    use super::{RecordGroup, format_day_header, group_records_by_date};

    // 2024-01-02 12:00:00 UTC
    const NOON_JAN_2: i64 = 1_704_196_800_000;
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn record(id: i64, date: i64) -> Record {
        Record {
            id,
            title: "test".to_owned(),
            amount: 1.0,
            kind: RecordType::Expense,
            category: "Other".to_owned(),
            date,
            note: String::new(),
            account_id: 1,
        }
    }

    #[test]
    fn empty_input_produces_no_groups() {
        let groups = group_records_by_date(Vec::new(), UtcOffset::UTC);

        assert_eq!(groups, Vec::new());
    }

    #[test]
    fn five_records_over_two_days_produce_two_headers() {
        // Date-descending: three records on Jan 2, two on Jan 1.
        let records = vec![
            record(5, NOON_JAN_2 + 7_200_000),
            record(4, NOON_JAN_2 + 3_600_000),
            record(3, NOON_JAN_2),
            record(2, NOON_JAN_2 - DAY_MS + 3_600_000),
            record(1, NOON_JAN_2 - DAY_MS),
        ];

        let groups = group_records_by_date(records.clone(), UtcOffset::UTC);

        let header_positions: Vec<usize> = groups
            .iter()
            .enumerate()
            .filter_map(|(i, group)| match group {
                RecordGroup::DateHeader(_) => Some(i),
                RecordGroup::Entry(_) => None,
            })
            .collect();
        assert_eq!(header_positions, vec![0, 4]);
        assert_eq!(groups.len(), 7);
        // Each header immediately precedes the first record of its day.
        assert_eq!(groups[1], RecordGroup::Entry(records[0].clone()));
        assert_eq!(groups[5], RecordGroup::Entry(records[3].clone()));
    }

    #[test]
    fn same_day_records_share_one_header() {
        let records = vec![record(2, NOON_JAN_2 + 60_000), record(1, NOON_JAN_2)];

        let groups = group_records_by_date(records, UtcOffset::UTC);

        assert_eq!(groups.len(), 3);
        assert!(matches!(groups[0], RecordGroup::DateHeader(_)));
    }

    #[test]
    fn header_shows_calendar_date_and_weekday() {
        // 2024-01-02 was a Tuesday.
        let header = format_day_header(NOON_JAN_2, UtcOffset::UTC);

        assert_eq!(header, "2024-01-02 Tuesday");
    }

    #[test]
    fn offset_moves_the_day_boundary() {
        // Midnight UTC on Jan 2 is still Jan 1 west of Greenwich.
        let midnight_jan_2 = NOON_JAN_2 - 12 * 60 * 60 * 1000;
        let behind = UtcOffset::from_hms(-1, 0, 0).unwrap();

        assert_eq!(
            format_day_header(midnight_jan_2, UtcOffset::UTC),
            "2024-01-02 Tuesday"
        );
        assert_eq!(
            format_day_header(midnight_jan_2, behind),
            "2024-01-01 Monday"
        );
    }
}
