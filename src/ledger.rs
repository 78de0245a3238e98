//! State of the payments page as a reducer store.
//!
//! Every filter change bumps `generation`; a listing that arrives for an older
//! generation is dropped so a slow request cannot overwrite newer results.

use crate::api::payments::PaymentListing;
use crate::models::{PaymentRecord, PendingEntry, Receipt};
use crate::reconcile::{self, format_date, try_parse_date, StatusFilter};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::rc::Rc;
use yew::Reducible;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateFilter {
    Any,
    Active,
    Inactive,
}

impl StateFilter {
    pub const ALL: [StateFilter; 3] = [StateFilter::Any, StateFilter::Active, StateFilter::Inactive];

    pub fn label(&self) -> &'static str {
        match self {
            StateFilter::Any => "State",
            StateFilter::Active => "Active",
            StateFilter::Inactive => "Inactive",
        }
    }

    pub fn from_label(raw: &str) -> StateFilter {
        match raw {
            "Active" => StateFilter::Active,
            "Inactive" => StateFilter::Inactive,
            _ => StateFilter::Any,
        }
    }

    /// Value of the `state` query parameter, if any.
    pub fn param(&self) -> Option<&'static str> {
        match self {
            StateFilter::Any => None,
            other => Some(other.label()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaymentsStore {
    pub generation: u64,
    pub state: StateFilter,
    pub status: StatusFilter,
    pub query: String,
    pub records: Vec<PaymentRecord>,
    pub histories: HashMap<String, Vec<PendingEntry>>,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl Default for PaymentsStore {
    fn default() -> Self {
        PaymentsStore {
            generation: 0,
            state: StateFilter::Any,
            status: StatusFilter::All,
            query: String::new(),
            records: Vec::new(),
            histories: HashMap::new(),
            loading: true,
            error: None,
            notice: None,
        }
    }
}

pub enum PaymentsAction {
    SetState(StateFilter),
    SetStatus(StatusFilter),
    SetQuery(String),
    Refresh,
    Loaded { generation: u64, listing: PaymentListing },
    Failed { generation: u64, message: String },
    /// A payment the stepper just submitted.
    Register(PaymentRecord),
    DismissNotice,
}

/// What the listing effect should fetch. Copy, so it can sit in effect deps
/// without holding on to the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListingRequest {
    pub generation: u64,
    pub state: Option<&'static str>,
    pub status: Option<&'static str>,
}

impl PaymentsStore {
    pub fn listing_request(&self) -> ListingRequest {
        ListingRequest {
            generation: self.generation,
            state: self.state.param(),
            status: self.status_param(),
        }
    }

    /// `status` query parameter for the current filter.
    pub fn status_param(&self) -> Option<&'static str> {
        match self.status {
            StatusFilter::All => None,
            other => Some(other.as_str()),
        }
    }

    /// Reconciled rows after search and status filtering, newest first.
    pub fn rows(&self, today: NaiveDate, default_fee: i64) -> Vec<reconcile::ReconciledPayment> {
        let rows = reconcile::reconcile(&self.records, &self.histories, today, default_fee);
        reconcile::filter_and_sort(rows, &self.query, self.status)
    }

    fn bump(&mut self) {
        self.generation += 1;
        self.loading = true;
        self.error = None;
    }
}

impl Reducible for PaymentsStore {
    type Action = PaymentsAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            PaymentsAction::SetState(state) => {
                if state == next.state {
                    return self;
                }
                next.state = state;
                next.bump();
            }
            PaymentsAction::SetStatus(status) => {
                if status == next.status {
                    return self;
                }
                next.status = status;
                next.bump();
            }
            PaymentsAction::SetQuery(query) => next.query = query,
            PaymentsAction::Refresh => next.bump(),
            PaymentsAction::Loaded { generation, listing } => {
                if generation != next.generation {
                    log::debug!(
                        "Dropping stale payment listing (generation {}, current {})",
                        generation,
                        next.generation
                    );
                    return self;
                }
                next.records = listing.records;
                next.histories = listing.histories;
                next.loading = false;
            }
            PaymentsAction::Failed { generation, message } => {
                if generation != next.generation {
                    return self;
                }
                next.loading = false;
                next.error = Some(message);
            }
            PaymentsAction::Register(record) => {
                let entry = PendingEntry {
                    pay_date: record.pay_date.clone(),
                    amount: record.amount,
                    status: record.status.clone(),
                    branch: record.branch_name.clone(),
                };
                let key = record.student_details_id.clone();
                match reconcile::register_payment(&mut next.records, record) {
                    Ok(()) => {
                        if let Some(key) = key {
                            next.histories.entry(key).or_default().push(entry);
                        }
                        next.notice = None;
                    }
                    Err(e) => next.notice = Some(e.to_string()),
                }
            }
            PaymentsAction::DismissNotice => next.notice = None,
        }
        Rc::new(next)
    }
}

/// Listing row for a payment the stepper just recorded.
pub fn record_from_receipt(receipt: &Receipt, id: Option<String>, today: NaiveDate, default_fee: i64) -> PaymentRecord {
    let pay_date = try_parse_date(&receipt.date).unwrap_or(today);
    PaymentRecord {
        id,
        student_details_id: receipt.student_details_id.clone(),
        student_no: Some(receipt.student_no.clone()),
        full_name: Some(receipt.full_name.clone()),
        branch_name: Some(receipt.branch_name.clone()),
        course: None,
        pay_date: Some(format_date(pay_date)),
        payment_date: None,
        amount: Some(if receipt.total_fees > 0 {
            receipt.total_fees
        } else {
            default_fee
        }),
        status: Some(receipt.status.as_str().to_string()),
        course_fees: receipt.course_fees.clone(),
        selected_months: receipt.selected_months.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;

    fn record(id: &str, student: &str, date: &str) -> PaymentRecord {
        PaymentRecord {
            id: Some(id.to_string()),
            student_details_id: Some(student.to_string()),
            student_no: Some(format!("ST-{}", student)),
            full_name: Some(format!("Student {}", student)),
            pay_date: Some(date.to_string()),
            amount: Some(4000),
            status: Some("Paid".to_string()),
            ..Default::default()
        }
    }

    fn listing(records: Vec<PaymentRecord>) -> PaymentListing {
        PaymentListing {
            records,
            histories: HashMap::new(),
        }
    }

    #[test]
    fn filter_changes_bump_the_generation() {
        let store = Rc::new(PaymentsStore::default());
        let store = store.reduce(PaymentsAction::SetStatus(StatusFilter::Pending));
        assert_eq!(store.generation, 1);
        assert_eq!(store.status_param(), Some("Pending"));
        let store = store.reduce(PaymentsAction::SetStatus(StatusFilter::Pending));
        assert_eq!(store.generation, 1);
        let store = store.reduce(PaymentsAction::SetState(StateFilter::Active));
        assert_eq!(store.generation, 2);
        assert_eq!(store.state.param(), Some("Active"));
        let store = store.reduce(PaymentsAction::SetQuery("ama".to_string()));
        assert_eq!(store.generation, 2);
    }

    #[test]
    fn listing_request_tracks_filters_and_generation() {
        let store = Rc::new(PaymentsStore::default());
        let first = store.listing_request();
        assert_eq!(first.generation, 0);
        assert_eq!(first.state, None);
        assert_eq!(first.status, None);

        let store = store.reduce(PaymentsAction::SetState(StateFilter::Inactive));
        let store = store.reduce(PaymentsAction::SetStatus(StatusFilter::Paid));
        let request = store.listing_request();
        assert_eq!(
            request,
            ListingRequest {
                generation: 2,
                state: Some("Inactive"),
                status: Some("Paid"),
            }
        );

        let store = store.reduce(PaymentsAction::SetQuery("x".to_string()));
        assert_eq!(store.listing_request(), request);
    }

    #[test]
    fn stale_listings_are_dropped() {
        let store = Rc::new(PaymentsStore::default());
        let store = store.reduce(PaymentsAction::Refresh);
        let store = store.reduce(PaymentsAction::Loaded {
            generation: 0,
            listing: listing(vec![record("1", "1", "01/01/2024")]),
        });
        assert!(store.records.is_empty());
        assert!(store.loading);

        let store = store.reduce(PaymentsAction::Failed {
            generation: 0,
            message: "old".to_string(),
        });
        assert_eq!(store.error, None);

        let store = store.reduce(PaymentsAction::Loaded {
            generation: 1,
            listing: listing(vec![record("2", "2", "01/02/2024")]),
        });
        assert_eq!(store.records.len(), 1);
        assert!(!store.loading);
    }

    #[test]
    fn registering_twice_reports_a_duplicate() {
        let store = Rc::new(PaymentsStore::default());
        let paid = record("9", "4", "2024-06-12");
        let store = store.reduce(PaymentsAction::Register(paid.clone()));
        assert_eq!(store.records.len(), 1);
        assert_eq!(store.histories["4"].len(), 1);
        assert_eq!(store.notice, None);

        let store = store.reduce(PaymentsAction::Register(paid));
        assert_eq!(store.records.len(), 1);
        assert_eq!(store.histories["4"].len(), 1);
        assert!(store.notice.is_some());
    }

    #[test]
    fn refresh_after_registering_takes_the_server_row() {
        let store = Rc::new(PaymentsStore::default());
        let store = store.reduce(PaymentsAction::Loaded {
            generation: 0,
            listing: listing(Vec::new()),
        });
        let mut local = record("", "4", "2024-06-12");
        local.id = None;
        let store = store.reduce(PaymentsAction::Register(local));
        assert_eq!(store.records[0].id, None);

        let store = store.reduce(PaymentsAction::Refresh);
        assert!(store.loading);
        let generation = store.generation;
        let store = store.reduce(PaymentsAction::Loaded {
            generation,
            listing: listing(vec![record("55", "4", "12/06/2024")]),
        });
        assert_eq!(store.records.len(), 1);
        assert_eq!(store.records[0].id.as_deref(), Some("55"));
        assert!(!store.loading);
    }

    #[test]
    fn receipt_becomes_a_listing_row() {
        let receipt = Receipt {
            full_name: "Amal".to_string(),
            student_no: "ST-4".to_string(),
            student_details_id: Some("4".to_string()),
            branch_name: "Colombo".to_string(),
            paid_for: "Jan".to_string(),
            selected_months: vec!["Jan".to_string()],
            subjects: Vec::new(),
            course_fees: serde_json::Value::Null,
            total_course_fees: 0,
            admission_fee: 0,
            total_fees: 0,
            date: "12/06/2024".to_string(),
            transaction_id: "X".to_string(),
            status: PaymentStatus::Paid,
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        let row = record_from_receipt(&receipt, None, today, 4000);
        assert_eq!(row.pay_date.as_deref(), Some("2024-06-12"));
        assert_eq!(row.amount, Some(4000));
        assert_eq!(row.status.as_deref(), Some("Paid"));
    }

    #[test]
    fn rows_follow_the_status_filter() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
        let mut store = PaymentsStore::default();
        store.records = vec![record("1", "1", "2024-06-10"), record("2", "2", "2024-03-10")];
        assert_eq!(store.rows(today, 4000).len(), 2);
        store.status = StatusFilter::Pending;
        let rows = store.rows(today, 4000);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pending_amount, 3 * 4000);
    }
}
