//! Client-side payment status reconciliation.
//!
//! Every fetch of `/searchmain` is reduced to one row per student: the latest
//! payment record, classified as paid or pending against today's date and the
//! student's pending history.

use crate::error::PaymentError;
use crate::models::{PaymentRecord, PaymentStatus, PendingEntry};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use std::collections::HashMap;

const EPOCH_FALLBACK: &str = "1970-01-01";

const NATIVE_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y"];
const NATIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Paid,
    Pending,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 3] = [StatusFilter::All, StatusFilter::Paid, StatusFilter::Pending];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Paid => "Paid",
            StatusFilter::Pending => "Pending",
        }
    }

    pub fn from_label(raw: &str) -> StatusFilter {
        match PaymentStatus::parse(raw) {
            Some(PaymentStatus::Paid) => StatusFilter::Paid,
            Some(PaymentStatus::Pending) => StatusFilter::Pending,
            None => StatusFilter::All,
        }
    }

    fn accepts(&self, status: PaymentStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Paid => status == PaymentStatus::Paid,
            StatusFilter::Pending => status == PaymentStatus::Pending,
        }
    }
}

/// Parses a pay date the way the backend sends them: `dd/MM/yyyy` first,
/// then the usual ISO-ish shapes.
pub fn try_parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in NATIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NATIVE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Like [`try_parse_date`] but never fails: unreadable input resolves to `today`.
pub fn parse_pay_date(raw: Option<&str>, today: NaiveDate, context: &str) -> NaiveDate {
    match raw {
        None => {
            log::warn!("Missing pay date for {}, using current date", context);
            today
        }
        Some(value) => try_parse_date(value).unwrap_or_else(|| {
            log::warn!("Invalid pay date for {}: {}, using current date", context, value);
            today
        }),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn pending_duration_label(months: u32) -> String {
    if months == 1 {
        "1 Month".to_string()
    } else {
        format!("{} Months", months)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReconciledPayment {
    pub record: PaymentRecord,
    pub pay_date: NaiveDate,
    pub formatted_pay_date: String,
    pub status: PaymentStatus,
    /// Record amount, or the default monthly fee when the record has none.
    pub amount: i64,
    pub pending_amount: i64,
    pub pending_months: u32,
}

impl ReconciledPayment {
    pub fn display_amount(&self, filter: StatusFilter) -> i64 {
        if filter == StatusFilter::Pending {
            self.pending_amount
        } else {
            self.amount
        }
    }

    pub fn pending_label(&self) -> String {
        pending_duration_label(self.pending_months)
    }

    pub fn name(&self) -> &str {
        self.record.full_name.as_deref().unwrap_or("N/A")
    }
}

fn grouping_date(record: &PaymentRecord, today: NaiveDate) -> NaiveDate {
    let context = format!("payment {}", record.id.as_deref().unwrap_or("?"));
    parse_pay_date(Some(record.raw_pay_date().unwrap_or(EPOCH_FALLBACK)), today, &context)
}

/// Keeps one record per student: the one with the latest pay date. Ties keep
/// the record seen first. Output follows first-appearance order.
pub fn latest_per_student(records: &[PaymentRecord], today: NaiveDate) -> Vec<PaymentRecord> {
    let mut order: Vec<String> = Vec::new();
    let mut latest: HashMap<String, (NaiveDate, &PaymentRecord)> = HashMap::new();

    for record in records {
        let key = record.student_key();
        let date = grouping_date(record, today);
        match latest.get(&key) {
            Some((kept, _)) if date <= *kept => {}
            Some(_) => {
                latest.insert(key, (date, record));
            }
            None => {
                order.push(key.clone());
                latest.insert(key, (date, record));
            }
        }
    }

    order
        .iter()
        .filter_map(|key| latest.get(key).map(|(_, record)| (*record).clone()))
        .collect()
}

fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// Classifies one student's latest record.
pub fn classify(
    record: &PaymentRecord,
    history: Option<&[PendingEntry]>,
    today: NaiveDate,
    default_fee: i64,
) -> ReconciledPayment {
    let pay_date = grouping_date(record, today);
    let monthly_fee = record.amount.filter(|a| *a > 0).unwrap_or(default_fee);

    let (status, pending_amount, pending_months) = match history.filter(|h| !h.is_empty()) {
        Some(entries) => {
            let overdue: Vec<&PendingEntry> = entries
                .iter()
                .filter(|e| {
                    e.status.as_deref().and_then(PaymentStatus::parse) == Some(PaymentStatus::Pending)
                })
                .filter(|e| {
                    let context = format!("pending entry of student {}", record.student_key());
                    parse_pay_date(e.pay_date.as_deref(), today, &context) <= today
                })
                .collect();
            if overdue.is_empty() {
                (PaymentStatus::Paid, 0, 0)
            } else {
                let total: i64 = overdue
                    .iter()
                    .map(|e| e.amount.filter(|a| *a > 0).unwrap_or(default_fee))
                    .sum();
                (PaymentStatus::Pending, total, overdue.len() as u32)
            }
        }
        None => {
            let months_behind = month_index(today) - month_index(pay_date);
            if months_behind > 0 {
                (
                    PaymentStatus::Pending,
                    months_behind * monthly_fee,
                    months_behind as u32,
                )
            } else {
                let month_start = today.with_day(1).unwrap_or(today);
                if pay_date >= month_start && pay_date <= today {
                    (PaymentStatus::Paid, 0, 0)
                } else {
                    (PaymentStatus::Pending, monthly_fee, 1)
                }
            }
        }
    };

    ReconciledPayment {
        record: record.clone(),
        pay_date,
        formatted_pay_date: format_date(pay_date),
        status,
        amount: monthly_fee,
        pending_amount,
        pending_months,
    }
}

pub fn reconcile(
    records: &[PaymentRecord],
    histories: &HashMap<String, Vec<PendingEntry>>,
    today: NaiveDate,
    default_fee: i64,
) -> Vec<ReconciledPayment> {
    latest_per_student(records, today)
        .iter()
        .map(|record| {
            let history = record
                .student_details_id
                .as_ref()
                .and_then(|id| histories.get(id))
                .map(|h| h.as_slice());
            classify(record, history, today, default_fee)
        })
        .collect()
}

pub fn matches_search(row: &ReconciledPayment, query: &str, filter: StatusFilter) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    row.name().to_lowercase().contains(&query)
        || row.formatted_pay_date.to_lowercase().contains(&query)
        || row.display_amount(filter).to_string().contains(&query)
}

/// Applies the search box and status filter, newest pay date first.
pub fn filter_and_sort(
    rows: Vec<ReconciledPayment>,
    query: &str,
    filter: StatusFilter,
) -> Vec<ReconciledPayment> {
    let mut visible: Vec<ReconciledPayment> = rows
        .into_iter()
        .filter(|row| matches_search(row, query, filter) && filter.accepts(row.status))
        .collect();
    visible.sort_by(|a, b| b.pay_date.cmp(&a.pay_date));
    visible
}

/// Two pay dates name the same day. Listed records come back as `dd/MM/yyyy`
/// while locally registered ones are ISO, so both sides are parsed first.
fn same_pay_date(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.and_then(try_parse_date), b.and_then(try_parse_date)) {
        (Some(x), Some(y)) => x == y,
        _ => a.map(str::trim) == b.map(str::trim),
    }
}

pub fn is_duplicate(existing: &[PaymentRecord], candidate: &PaymentRecord) -> bool {
    existing.iter().any(|p| {
        let same_id = matches!((&p.id, &candidate.id), (Some(a), Some(b)) if a == b);
        same_id
            || (p.student_no == candidate.student_no
                && p.full_name == candidate.full_name
                && same_pay_date(p.raw_pay_date(), candidate.raw_pay_date()))
    })
}

/// Adds a just-submitted payment to the local list unless it looks like one
/// already listed.
pub fn register_payment(
    payments: &mut Vec<PaymentRecord>,
    candidate: PaymentRecord,
) -> Result<(), PaymentError> {
    if is_duplicate(payments, &candidate) {
        log::warn!(
            "Duplicate payment detected, skipping addition: {:?}",
            candidate.full_name
        );
        return Err(PaymentError::Duplicate {
            full_name: candidate.full_name.unwrap_or_else(|| "N/A".to_string()),
            pay_date: candidate.pay_date.unwrap_or_default(),
        });
    }
    payments.push(candidate);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(id: &str, student: &str, name: &str, date: &str, amount: Option<i64>) -> PaymentRecord {
        PaymentRecord {
            id: Some(id.to_string()),
            student_details_id: Some(student.to_string()),
            student_no: Some(format!("STU-{}", student)),
            full_name: Some(name.to_string()),
            pay_date: Some(date.to_string()),
            amount,
            status: Some("Paid".to_string()),
            ..Default::default()
        }
    }

    fn pending(date: &str, amount: Option<i64>) -> PendingEntry {
        PendingEntry {
            pay_date: Some(date.to_string()),
            amount,
            status: Some("Pending".to_string()),
            branch: None,
        }
    }

    #[test]
    fn day_first_format_wins() {
        assert_eq!(try_parse_date("12/06/2024"), Some(day(2024, 6, 12)));
    }

    #[test]
    fn native_formats_are_accepted() {
        assert_eq!(try_parse_date("2024-06-12"), Some(day(2024, 6, 12)));
        assert_eq!(try_parse_date("2024-06-12T08:30:00.000Z"), Some(day(2024, 6, 12)));
        assert_eq!(try_parse_date("2024-06-12T08:30:00"), Some(day(2024, 6, 12)));
        assert_eq!(try_parse_date("06/13/2024"), Some(day(2024, 6, 13)));
    }

    #[test]
    fn unparseable_date_falls_back_to_today() {
        let today = day(2024, 7, 15);
        assert_eq!(try_parse_date("not a date"), None);
        assert_eq!(parse_pay_date(Some("not a date"), today, "test"), today);
        assert_eq!(parse_pay_date(None, today, "test"), today);
    }

    #[test]
    fn earlier_month_is_pending_for_each_month_elapsed() {
        let today = day(2024, 7, 15);
        let row = classify(&record("1", "10", "Amal", "20/04/2024", None), None, today, 4000);
        assert_eq!(row.status, PaymentStatus::Pending);
        assert_eq!(row.pending_months, 3);
        assert_eq!(row.pending_amount, 3 * 4000);
        assert_eq!(row.pending_label(), "3 Months");
    }

    #[test]
    fn month_delta_crosses_year_boundary() {
        let today = day(2025, 1, 3);
        let row = classify(&record("1", "10", "Amal", "2024-11-30", None), None, today, 4000);
        assert_eq!(row.pending_months, 2);
        assert_eq!(row.pending_amount, 8000);
    }

    #[test]
    fn record_amount_is_the_monthly_fee_when_present() {
        let today = day(2024, 7, 15);
        let row = classify(&record("1", "10", "Amal", "2024-06-01", Some(5500)), None, today, 4000);
        assert_eq!(row.pending_amount, 5500);
        assert_eq!(row.pending_label(), "1 Month");
    }

    #[test]
    fn payment_today_is_paid() {
        let today = day(2024, 7, 15);
        let row = classify(&record("1", "10", "Amal", "15/07/2024", None), None, today, 4000);
        assert_eq!(row.status, PaymentStatus::Paid);
        assert_eq!(row.pending_amount, 0);
    }

    #[test]
    fn later_date_in_current_month_is_pending_one_month() {
        let today = day(2024, 7, 15);
        let row = classify(&record("1", "10", "Amal", "2024-07-20", None), None, today, 4000);
        assert_eq!(row.status, PaymentStatus::Pending);
        assert_eq!(row.pending_amount, 4000);
        assert_eq!(row.pending_months, 1);
    }

    #[test]
    fn pending_history_sums_overdue_entries_only() {
        let today = day(2024, 7, 15);
        let history = vec![
            pending("2024-05-01", Some(3000)),
            pending("2024-06-01", None),
            pending("2024-08-01", Some(9999)),
            PendingEntry {
                status: Some("Paid".to_string()),
                ..pending("2024-04-01", Some(7000))
            },
        ];
        let row = classify(
            &record("1", "10", "Amal", "2024-07-01", None),
            Some(&history),
            today,
            4000,
        );
        assert_eq!(row.status, PaymentStatus::Pending);
        assert_eq!(row.pending_amount, 3000 + 4000);
        assert_eq!(row.pending_months, 2);
    }

    #[test]
    fn history_without_overdue_entries_is_paid_even_for_old_records() {
        let today = day(2024, 7, 15);
        let history = vec![pending("2024-09-01", Some(4000))];
        let row = classify(
            &record("1", "10", "Amal", "2023-01-01", None),
            Some(&history),
            today,
            4000,
        );
        assert_eq!(row.status, PaymentStatus::Paid);
        assert_eq!(row.pending_amount, 0);
    }

    #[test]
    fn latest_record_per_student_is_kept() {
        let today = day(2024, 7, 15);
        let records = vec![
            record("1", "10", "Amal", "01/05/2024", None),
            record("2", "11", "Kamal", "2024-06-01", None),
            record("3", "10", "Amal", "01/07/2024", None),
            record("4", "10", "Amal", "01/06/2024", None),
        ];
        let latest = latest_per_student(&records, today);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].id.as_deref(), Some("3"));
        assert_eq!(latest[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn records_without_student_are_grouped_by_id() {
        let today = day(2024, 7, 15);
        let mut a = record("1", "x", "A", "2024-07-01", None);
        a.student_details_id = None;
        let mut b = record("2", "x", "B", "2024-07-02", None);
        b.student_details_id = None;
        assert_eq!(latest_per_student(&[a, b], today).len(), 2);
    }

    fn sample_rows(today: NaiveDate) -> Vec<ReconciledPayment> {
        let records = vec![
            record("1", "10", "Amal Perera", "2024-07-10", None),
            record("2", "11", "Kamal Silva", "2024-05-02", None),
            record("3", "12", "Nimali Fernando", "2024-07-01", Some(4500)),
        ];
        reconcile(&records, &HashMap::new(), today, 4000)
    }

    #[test]
    fn all_filter_keeps_every_row_sorted_newest_first() {
        let today = day(2024, 7, 15);
        let rows = filter_and_sort(sample_rows(today), "", StatusFilter::All);
        assert_eq!(rows.len(), 3);
        let dates: Vec<&str> = rows.iter().map(|r| r.formatted_pay_date.as_str()).collect();
        assert_eq!(dates, vec!["2024-07-10", "2024-07-01", "2024-05-02"]);
    }

    #[test]
    fn status_filter_keeps_matching_rows() {
        let today = day(2024, 7, 15);
        let pending_rows = filter_and_sort(sample_rows(today), "", StatusFilter::Pending);
        assert_eq!(pending_rows.len(), 1);
        assert_eq!(pending_rows[0].name(), "Kamal Silva");
        assert_eq!(pending_rows[0].display_amount(StatusFilter::Pending), 8000);

        let paid_rows = filter_and_sort(sample_rows(today), "", StatusFilter::Paid);
        assert_eq!(paid_rows.len(), 2);
    }

    #[test]
    fn search_is_case_insensitive_over_name_date_and_amount() {
        let today = day(2024, 7, 15);
        let by_name = filter_and_sort(sample_rows(today), "  pErErA ", StatusFilter::All);
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name(), "Amal Perera");

        let by_date = filter_and_sort(sample_rows(today), "2024-05", StatusFilter::All);
        assert_eq!(by_date.len(), 1);
        assert_eq!(by_date[0].name(), "Kamal Silva");

        let by_amount = filter_and_sort(sample_rows(today), "4500", StatusFilter::All);
        assert_eq!(by_amount.len(), 1);
        assert_eq!(by_amount[0].name(), "Nimali Fernando");
    }

    #[test]
    fn duplicate_submission_is_rejected() {
        let mut payments = vec![record("1", "10", "Amal", "2024-07-15", Some(4000))];
        let mut again = record("", "10", "Amal", "2024-07-15", Some(4000));
        again.id = None;
        let err = register_payment(&mut payments, again).unwrap_err();
        assert!(matches!(err, PaymentError::Duplicate { .. }));
        assert_eq!(payments.len(), 1);

        let mut next_day = record("", "10", "Amal", "2024-07-16", Some(4000));
        next_day.id = None;
        assert!(register_payment(&mut payments, next_day).is_ok());
        assert_eq!(payments.len(), 2);
    }

    #[test]
    fn duplicate_check_reads_both_date_formats() {
        let mut listed = record("1", "10", "Amal", "18/10/2026", Some(4000));
        listed.student_no = Some("ST-10".to_string());
        let mut resubmitted = record("", "10", "Amal", "2026-10-18", Some(4000));
        resubmitted.id = None;
        resubmitted.student_no = Some("ST-10".to_string());
        assert!(is_duplicate(&[listed.clone()], &resubmitted));

        resubmitted.pay_date = Some("2026-10-19".to_string());
        assert!(!is_duplicate(&[listed.clone()], &resubmitted));

        let mut garbled = listed.clone();
        garbled.id = Some("2".to_string());
        garbled.pay_date = Some("someday".to_string());
        let mut same_garble = garbled.clone();
        same_garble.id = None;
        assert!(is_duplicate(&[garbled], &same_garble));
    }

    #[test]
    fn same_id_is_a_duplicate() {
        let payments = vec![record("9", "10", "Amal", "2024-07-15", None)];
        let candidate = record("9", "11", "Someone Else", "2024-01-01", None);
        assert!(is_duplicate(&payments, &candidate));
    }

    #[test]
    fn status_filter_labels() {
        assert_eq!(StatusFilter::from_label("Pending"), StatusFilter::Pending);
        assert_eq!(StatusFilter::from_label("All"), StatusFilter::All);
        assert_eq!(StatusFilter::Paid.as_str(), "Paid");
    }
}
