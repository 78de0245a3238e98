//! Fee aggregation for the payment stepper and receipts.

use crate::models::{FeeDetails, PaymentConfirmation, PaymentStatus, Receipt, StudentSummary, Subject};
use serde_json::{Map, Value};

pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonthStatus {
    Paid,
    Due,
    Upcoming,
}

impl MonthStatus {
    pub fn css_class(&self) -> &'static str {
        match self {
            MonthStatus::Paid => "paid",
            MonthStatus::Due => "due",
            MonthStatus::Upcoming => "upcoming",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeeRow {
    pub month: String,
    pub course_name: String,
    pub grade: String,
    pub fee: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeeSummary {
    pub course_fees: Value,
    pub total_course_fees: i64,
    pub admission_fee: i64,
    pub total_fees: i64,
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn grade_label(raw: &str) -> String {
    raw.replacen("Grade ", "", 1)
}

fn fee_value(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
}

/// Months already paid, from labels like `"Jan 2025"`.
pub fn paid_months(payments: &[String]) -> Vec<String> {
    payments
        .iter()
        .filter_map(|p| p.split_whitespace().next())
        .map(|m| m.to_string())
        .collect()
}

pub fn month_status(month: &str, paid: &[String], current_month0: u32) -> MonthStatus {
    if paid.iter().any(|p| p == month) {
        return MonthStatus::Paid;
    }
    match MONTHS.iter().position(|m| *m == month) {
        Some(index) if index as u32 <= current_month0 => MonthStatus::Due,
        _ => MonthStatus::Upcoming,
    }
}

pub fn is_month_selectable(month: &str, paid: &[String]) -> bool {
    !paid.iter().any(|p| p == month)
}

/// Adds `month` to the selection, or removes it when already selected.
/// Paid months are left untouched.
pub fn toggle_month(selected: &[String], month: &str, paid: &[String]) -> Vec<String> {
    if !is_month_selectable(month, paid) {
        return selected.to_vec();
    }
    if selected.iter().any(|m| m == month) {
        selected.iter().filter(|m| *m != month).cloned().collect()
    } else {
        let mut next = selected.to_vec();
        next.push(month.to_string());
        next
    }
}

/// Flattens `month -> grade -> course -> fee` for the selected months.
pub fn fee_rows(course_fees: &Value, months: &[String]) -> Vec<FeeRow> {
    let mut rows = Vec::new();
    for month in months {
        let Some(grades) = course_fees.get(month).and_then(Value::as_object) else {
            continue;
        };
        for (grade, courses) in grades {
            let Some(courses) = courses.as_object() else {
                continue;
            };
            for (course, fee) in courses {
                rows.push(FeeRow {
                    month: month.clone(),
                    course_name: capitalize(course),
                    grade: grade_label(grade),
                    fee: fee_value(fee).unwrap_or(0),
                });
            }
        }
    }
    rows
}

pub fn rows_total(rows: &[FeeRow]) -> i64 {
    rows.iter().map(|r| r.fee).sum()
}

/// Restricts the fee breakdown to the selected months and totals it. The
/// admission fee only applies to a student's first payment.
pub fn summarize(details: &FeeDetails, months: &[String]) -> FeeSummary {
    let mut filtered = Map::new();
    for month in months {
        if let Some(entry) = details.course_fees.get(month).filter(|v| v.is_object()) {
            filtered.insert(month.clone(), entry.clone());
        }
    }
    let course_fees = Value::Object(filtered);
    let total_course_fees = rows_total(&fee_rows(&course_fees, months));
    let admission_fee = if details.payments.is_empty() {
        details.admission_fee.unwrap_or(0)
    } else {
        0
    };
    FeeSummary {
        course_fees,
        total_course_fees,
        admission_fee,
        total_fees: total_course_fees + admission_fee,
    }
}

/// Course/grade pairs across every month of a fee breakdown.
pub fn subjects(course_fees: &Value) -> Vec<Subject> {
    let Some(months) = course_fees.as_object() else {
        return Vec::new();
    };
    months
        .values()
        .filter_map(Value::as_object)
        .flat_map(|grades| {
            grades.iter().filter_map(|(grade, courses)| {
                courses.as_object().map(|courses| {
                    courses
                        .keys()
                        .map(|name| Subject {
                            name: name.clone(),
                            grade: grade_label(grade),
                        })
                        .collect::<Vec<_>>()
                })
            })
        })
        .flatten()
        .collect()
}

/// Upper-case base36 of a millisecond timestamp, used when the backend does
/// not return a payment id.
pub fn local_transaction_id(millis: i64) -> String {
    const DIGITS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut n = millis.unsigned_abs();
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    out.into_iter().rev().collect()
}

/// Merges the server confirmation with what the stepper already knows.
pub fn build_receipt(
    student: &StudentSummary,
    summary: &FeeSummary,
    months: &[String],
    confirmation: &PaymentConfirmation,
    fallback_date: &str,
    fallback_transaction: String,
) -> Receipt {
    let course_fees = confirmation
        .course_fees
        .clone()
        .filter(|v| v.is_object())
        .unwrap_or_else(|| summary.course_fees.clone());
    let selected_months = confirmation
        .selected_months
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| months.to_vec());
    let paid_for = if selected_months.is_empty() {
        "N/A".to_string()
    } else {
        selected_months.join(", ")
    };

    Receipt {
        full_name: confirmation
            .full_name
            .clone()
            .or_else(|| student.full_name.clone())
            .unwrap_or_else(|| "N/A".to_string()),
        student_no: confirmation
            .student_no
            .clone()
            .or_else(|| student.student_no.clone())
            .unwrap_or_else(|| "N/A".to_string()),
        student_details_id: student.student_details_id.clone(),
        branch_name: confirmation
            .branch_name
            .clone()
            .or_else(|| student.branch_name.clone())
            .unwrap_or_else(|| "N/A".to_string()),
        paid_for,
        subjects: subjects(&course_fees),
        selected_months,
        course_fees,
        total_course_fees: confirmation
            .total_course_fees
            .unwrap_or(summary.total_course_fees),
        admission_fee: confirmation.admission_fee.unwrap_or(summary.admission_fee),
        total_fees: confirmation.total_fees.unwrap_or(summary.total_fees),
        date: confirmation
            .date
            .clone()
            .or_else(|| confirmation.payment_date.clone())
            .unwrap_or_else(|| fallback_date.to_string()),
        transaction_id: confirmation
            .payment_id
            .clone()
            .or_else(|| confirmation.id.clone())
            .unwrap_or(fallback_transaction),
        status: confirmation
            .status
            .as_deref()
            .and_then(PaymentStatus::parse)
            .unwrap_or(PaymentStatus::Paid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn months(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sample_fees() -> Value {
        json!({
            "Jan": { "Grade 1": { "violin": 2000, "piano": 2500 } },
            "Feb": { "Grade 1": { "violin": 2000 } },
            "Mar": { "Grade 2": { "guitar": "n/a" } }
        })
    }

    #[test]
    fn rows_follow_selected_months() {
        let rows = fee_rows(&sample_fees(), &months(&["Feb", "Jan", "Dec"]));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].month, "Feb");
        assert_eq!(rows[0].course_name, "Violin");
        assert_eq!(rows[0].grade, "1");
        assert_eq!(rows_total(&rows), 6500);
    }

    #[test]
    fn non_numeric_fee_counts_as_zero() {
        let rows = fee_rows(&sample_fees(), &months(&["Mar"]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fee, 0);
    }

    #[test]
    fn admission_fee_only_on_first_payment() {
        let mut details = FeeDetails {
            course_fees: sample_fees(),
            admission_fee: Some(1500),
            ..Default::default()
        };
        let first = summarize(&details, &months(&["Jan"]));
        assert_eq!(first.total_course_fees, 4500);
        assert_eq!(first.admission_fee, 1500);
        assert_eq!(first.total_fees, 6000);
        assert!(first.course_fees.get("Feb").is_none());

        details.payments = vec!["Dec 2024".to_string()];
        let later = summarize(&details, &months(&["Jan", "Feb"]));
        assert_eq!(later.admission_fee, 0);
        assert_eq!(later.total_fees, 6500);
    }

    #[test]
    fn month_statuses() {
        let paid = paid_months(&["Jan 2025".to_string(), "Feb 2025".to_string()]);
        assert_eq!(paid, months(&["Jan", "Feb"]));
        assert_eq!(month_status("Jan", &paid, 4), MonthStatus::Paid);
        assert_eq!(month_status("May", &paid, 4), MonthStatus::Due);
        assert_eq!(month_status("Jun", &paid, 4), MonthStatus::Upcoming);
    }

    #[test]
    fn paid_months_cannot_be_toggled() {
        let paid = months(&["Jan"]);
        let selected = toggle_month(&[], "Jan", &paid);
        assert!(selected.is_empty());
        let selected = toggle_month(&selected, "Mar", &paid);
        assert_eq!(selected, months(&["Mar"]));
        let selected = toggle_month(&selected, "Mar", &paid);
        assert!(selected.is_empty());
    }

    #[test]
    fn subjects_list_every_course() {
        let list = subjects(&json!({"Jan": {"Grade 3": {"violin": 2000}}}));
        assert_eq!(
            list,
            vec![Subject {
                name: "violin".to_string(),
                grade: "3".to_string()
            }]
        );
    }

    #[test]
    fn receipt_prefers_confirmation_values() {
        let student = StudentSummary {
            student_details_id: Some("12".to_string()),
            student_no: Some("ST-12".to_string()),
            full_name: Some("Amal".to_string()),
            branch_name: Some("Colombo".to_string()),
        };
        let summary = summarize(
            &FeeDetails {
                course_fees: sample_fees(),
                ..Default::default()
            },
            &months(&["Jan"]),
        );
        let confirmation = PaymentConfirmation {
            payment_id: Some("PAY-1".to_string()),
            total_fees: Some(4600),
            ..Default::default()
        };
        let receipt = build_receipt(
            &student,
            &summary,
            &months(&["Jan"]),
            &confirmation,
            "2024-07-15",
            "LOCAL".to_string(),
        );
        assert_eq!(receipt.transaction_id, "PAY-1");
        assert_eq!(receipt.total_fees, 4600);
        assert_eq!(receipt.total_course_fees, 4500);
        assert_eq!(receipt.paid_for, "Jan");
        assert_eq!(receipt.date, "2024-07-15");
        assert_eq!(receipt.branch_name, "Colombo");
        assert_eq!(receipt.status, PaymentStatus::Paid);
        assert_eq!(receipt.subjects.len(), 2);
    }

    #[test]
    fn transaction_id_is_base36() {
        assert_eq!(local_transaction_id(35), "Z");
        assert_eq!(local_transaction_id(36), "10");
        assert_eq!(local_transaction_id(0), "0");
    }
}
