use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Accepts ids sent either as JSON numbers or strings.
fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn de_vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Amounts arrive as numbers, numeric strings or null.
fn de_opt_amount<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Pending => "Pending",
        }
    }

    pub fn parse(raw: &str) -> Option<PaymentStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "paid" => Some(PaymentStatus::Paid),
            "pending" => Some(PaymentStatus::Pending),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub student_details_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub student_no: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default, rename = "payDate")]
    pub pay_date: Option<String>,
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub amount: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub course_fees: serde_json::Value,
    #[serde(default, rename = "selectedMonths", deserialize_with = "de_vec_or_null")]
    pub selected_months: Vec<String>,
}

impl PaymentRecord {
    pub fn raw_pay_date(&self) -> Option<&str> {
        self.pay_date
            .as_deref()
            .or(self.payment_date.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    pub fn student_key(&self) -> String {
        match &self.student_details_id {
            Some(id) => id.clone(),
            None => format!("unknown_{}", self.id.as_deref().unwrap_or("")),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingEntry {
    #[serde(default, rename = "payDate", alias = "date")]
    pub pay_date: Option<String>,
    #[serde(default, alias = "payment", deserialize_with = "de_opt_amount")]
    pub amount: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PaymentHistory {
    #[serde(default, rename = "pendingHistory", deserialize_with = "de_vec_or_null")]
    pub pending_history: Vec<PendingEntry>,
}

/// Fee breakdown returned by `GET /payment/:id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeDetails {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub student_no: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
    /// month -> grade -> course -> fee
    #[serde(default)]
    pub course_fees: serde_json::Value,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub total_course_fees: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub admission_fee: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub total_fees: Option<i64>,
    #[serde(default, deserialize_with = "de_vec_or_null")]
    pub payments: Vec<String>,
    #[serde(default, rename = "selectedMonths", deserialize_with = "de_vec_or_null")]
    pub selected_months: Vec<String>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Student as listed in the payment stepper search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub student_details_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub student_no: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PaymentSubmission {
    pub full_name: String,
    pub student_no: String,
    pub course: String,
    pub total_fees: i64,
    pub date: String,
    pub status: String,
    pub branch_name: String,
    pub course_fees: serde_json::Value,
    pub admission_fee: i64,
    #[serde(rename = "selectedMonths")]
    pub selected_months: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PaymentConfirmation {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default, rename = "paymentId", deserialize_with = "de_opt_id")]
    pub payment_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub student_no: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub payment_date: Option<String>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub total_fees: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub total_course_fees: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_amount")]
    pub admission_fee: Option<i64>,
    #[serde(default)]
    pub course_fees: Option<serde_json::Value>,
    #[serde(default, rename = "selectedMonths")]
    pub selected_months: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Subject {
    pub name: String,
    pub grade: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Receipt {
    pub full_name: String,
    pub student_no: String,
    pub student_details_id: Option<String>,
    pub branch_name: String,
    pub paid_for: String,
    pub selected_months: Vec<String>,
    pub subjects: Vec<Subject>,
    pub course_fees: serde_json::Value,
    pub total_course_fees: i64,
    pub admission_fee: i64,
    pub total_fees: i64,
    pub date: String,
    pub transaction_id: String,
    pub status: PaymentStatus,
}

// ---- students ----

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawUser {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub phn_num: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub ice_contact: Option<String>,
}

impl RawUser {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!(
                "{} {}",
                self.first_name.as_deref().unwrap_or(""),
                self.last_name.as_deref().unwrap_or("")
            )
            .trim()
            .to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct StudentDetail {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub student_no: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub salutation: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub phn_num: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub ice_contact: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct StudentProfile {
    #[serde(default, rename = "StudentDetail")]
    pub student_detail: Option<StudentDetail>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CourseRef {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GradeRef {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub grade_name: Option<String>,
    #[serde(default, rename = "Course")]
    pub course: Option<CourseRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct StudentGrade {
    #[serde(default, rename = "Grade")]
    pub grade: Option<GradeRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub grade_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub branch_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Lecturer {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Lecturer {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(n) if !n.trim().is_empty() => n.clone(),
            _ => format!(
                "{} {}",
                self.first_name.as_deref().unwrap_or(""),
                self.last_name.as_deref().unwrap_or("")
            )
            .trim()
            .to_string(),
        }
    }
}

/// Slot row as the backend sends it.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawSlot {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub st_time: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub branch_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub course_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub grade_id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub user_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScheduleSlot {
    pub id: Option<String>,
    pub day: String,
    pub time: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub branch_id: Option<String>,
    pub course_id: Option<String>,
    pub grade_id: Option<String>,
    pub lecturer_id: Option<String>,
}

impl From<RawSlot> for ScheduleSlot {
    fn from(raw: RawSlot) -> Self {
        let start = raw
            .start_time
            .clone()
            .or(raw.st_time.clone())
            .filter(|s| !s.is_empty());
        let end = raw.end_time.clone().filter(|s| !s.is_empty());
        let time = match (&start, &end) {
            (Some(s), Some(e)) => format!("{}-{}", s, e),
            _ => "N/A".to_string(),
        };
        ScheduleSlot {
            id: raw.id,
            day: raw.day.unwrap_or_else(|| "N/A".to_string()),
            time,
            start_time: start,
            end_time: end,
            branch_id: raw.branch_id,
            course_id: raw.course_id,
            grade_id: raw.grade_id,
            lecturer_id: raw.user_id,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssignedCourse {
    pub course: String,
    pub grade: String,
    pub course_id: Option<String>,
    pub grade_id: Option<String>,
}

/// Composite student view assembled from several endpoints.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub student_no: String,
    pub salutation: String,
    pub phone: String,
    pub ice_contact: String,
    pub status: String,
    pub photo_url: String,
    pub course: String,
    pub assigned_courses: Vec<AssignedCourse>,
    pub schedules: Vec<ScheduleSlot>,
    pub branch: String,
}

/// Fields of the add/edit student form.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StudentForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phn_num: String,
    pub status: String,
    pub student_no: String,
    pub salutation: String,
    pub ice_contact: String,
    pub grade_ids: Vec<String>,
    pub slot_ids: Vec<String>,
}

// ---- schedule / dashboard ----

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimetableStudent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub photo_url: String,
}

/// time range -> weekday -> students
pub type DayCells = BTreeMap<String, BTreeMap<String, Vec<TimetableStudent>>>;

/// branch -> time range -> weekday -> students
pub type Timetable = BTreeMap<String, DayCells>;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DashboardResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Timetable,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SlotPayload {
    pub user_id: String,
    pub course_id: String,
    pub grade_id: String,
    pub branch_id: String,
    pub days: Vec<String>,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_record_accepts_loose_shapes() {
        let raw = r#"{"id": 7, "student_details_id": 12, "full_name": "Nimal", "payDate": "12/06/2024", "amount": "4500", "status": "Paid"}"#;
        let record: PaymentRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.id.as_deref(), Some("7"));
        assert_eq!(record.student_key(), "12");
        assert_eq!(record.amount, Some(4500));
        assert_eq!(record.raw_pay_date(), Some("12/06/2024"));
    }

    #[test]
    fn record_without_student_gets_unknown_key() {
        let record: PaymentRecord = serde_json::from_str(r#"{"id": 3, "payment_date": "2024-01-02"}"#).unwrap();
        assert_eq!(record.student_key(), "unknown_3");
        assert_eq!(record.raw_pay_date(), Some("2024-01-02"));
    }

    #[test]
    fn pending_entry_reads_local_field_names() {
        let entry: PendingEntry =
            serde_json::from_str(r#"{"date": "2024-05-01", "payment": 4000, "status": "Pending"}"#).unwrap();
        assert_eq!(entry.pay_date.as_deref(), Some("2024-05-01"));
        assert_eq!(entry.amount, Some(4000));
    }

    #[test]
    fn slot_time_range_is_joined() {
        let raw: RawSlot = serde_json::from_str(r#"{"id": 1, "day": "Monday", "st_time": "09:00", "end_time": "10:00"}"#).unwrap();
        let slot = ScheduleSlot::from(raw);
        assert_eq!(slot.time, "09:00-10:00");

        let partial = ScheduleSlot::from(RawSlot::default());
        assert_eq!(partial.time, "N/A");
        assert_eq!(partial.day, "N/A");
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(PaymentStatus::parse(" pending "), Some(PaymentStatus::Pending));
        assert_eq!(PaymentStatus::parse("PAID"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::parse("unknown"), None);
    }
}
