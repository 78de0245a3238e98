//! Three-step payment entry: pick a student, pick months, confirm.

use crate::error::PaymentError;
use crate::fees;
use crate::fees::FeeSummary;
use crate::models::{FeeDetails, PaymentStatus, PaymentSubmission, StudentSummary};
use std::rc::Rc;
use yew::Reducible;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Student,
    Months,
    Summary,
}

impl Step {
    pub fn number(&self) -> u8 {
        match self {
            Step::Student => 1,
            Step::Months => 2,
            Step::Summary => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Step::Student => "Student Details",
            Step::Months => "Courses & Months",
            Step::Summary => "Payment Summary",
        }
    }

    fn previous(&self) -> Step {
        match self {
            Step::Student | Step::Months => Step::Student,
            Step::Summary => Step::Months,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StepperState {
    pub step: Step,
    pub student: Option<StudentSummary>,
    pub fees: Option<FeeDetails>,
    pub months: Vec<String>,
    pub status: PaymentStatus,
    pub busy: bool,
    pub error: Option<String>,
}

impl Default for StepperState {
    fn default() -> Self {
        StepperState {
            step: Step::Student,
            student: None,
            fees: None,
            months: Vec::new(),
            status: PaymentStatus::Paid,
            busy: false,
            error: None,
        }
    }
}

pub enum StepperAction {
    Reset,
    SelectStudent(StudentSummary),
    ToggleMonth(String),
    SetStatus(PaymentStatus),
    /// A fee request started.
    Busy,
    /// Fees arrived for the current step; moves forward one step.
    FeesLoaded(FeeDetails),
    Back,
    Failed(String),
    Submitted,
}

impl StepperState {
    fn student_id(&self) -> Option<&str> {
        self.student
            .as_ref()
            .and_then(|s| s.student_details_id.as_deref())
    }

    pub fn paid_months(&self) -> Vec<String> {
        self.fees
            .as_ref()
            .map(|f| fees::paid_months(&f.payments))
            .unwrap_or_default()
    }

    pub fn can_advance(&self) -> bool {
        !self.busy
            && match self.step {
                Step::Student => self.student_id().is_some(),
                Step::Months => self.student_id().is_some() && !self.months.is_empty(),
                Step::Summary => false,
            }
    }

    pub fn can_submit(&self) -> bool {
        self.step == Step::Summary
            && !self.busy
            && self.student_id().is_some()
            && self.fees.is_some()
            && !self.months.is_empty()
    }

    /// The fee request needed to leave the current step: student id plus the
    /// months to price (empty on step 1).
    pub fn next_request(&self) -> Result<(String, Vec<String>), PaymentError> {
        if !self.can_advance() {
            return Err(PaymentError::IncompleteSelection);
        }
        let id = self
            .student_id()
            .ok_or(PaymentError::IncompleteSelection)?
            .to_string();
        let months = match self.step {
            Step::Student => Vec::new(),
            _ => self.months.clone(),
        };
        Ok((id, months))
    }

    /// The request body for the final step, with the totals it was built from.
    pub fn submission(&self, date: &str) -> Result<(String, PaymentSubmission, FeeSummary), PaymentError> {
        if !self.can_submit() {
            return Err(PaymentError::MissingData);
        }
        let (Some(student), Some(details)) = (self.student.as_ref(), self.fees.as_ref()) else {
            return Err(PaymentError::MissingData);
        };
        let id = self.student_id().ok_or(PaymentError::MissingData)?.to_string();
        let summary = fees::summarize(details, &self.months);
        let mut courses: Vec<String> = fees::subjects(&summary.course_fees)
            .into_iter()
            .map(|s| s.name)
            .collect();
        courses.sort();
        courses.dedup();
        let submission = PaymentSubmission {
            full_name: student
                .full_name
                .clone()
                .or_else(|| details.full_name.clone())
                .unwrap_or_default(),
            student_no: student
                .student_no
                .clone()
                .or_else(|| details.student_no.clone())
                .unwrap_or_default(),
            course: if courses.is_empty() {
                "N/A".to_string()
            } else {
                courses.join(", ")
            },
            total_fees: summary.total_fees,
            date: date.to_string(),
            status: self.status.as_str().to_string(),
            branch_name: student
                .branch_name
                .clone()
                .or_else(|| details.branch_name.clone())
                .unwrap_or_else(|| "N/A".to_string()),
            course_fees: summary.course_fees.clone(),
            admission_fee: summary.admission_fee,
            selected_months: self.months.clone(),
        };
        Ok((id, submission, summary))
    }
}

impl Reducible for StepperState {
    type Action = StepperAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        match action {
            StepperAction::Reset => next = StepperState::default(),
            StepperAction::SelectStudent(student) => {
                if next.step == Step::Student {
                    next.student = Some(student);
                    next.fees = None;
                    next.months.clear();
                    next.error = None;
                }
            }
            StepperAction::ToggleMonth(month) => {
                if next.step == Step::Months {
                    let paid = next.paid_months();
                    next.months = fees::toggle_month(&next.months, &month, &paid);
                    next.error = None;
                }
            }
            StepperAction::SetStatus(status) => next.status = status,
            StepperAction::Busy => {
                next.busy = true;
                next.error = None;
            }
            StepperAction::FeesLoaded(details) => {
                next.busy = false;
                next.fees = Some(details);
                next.step = match next.step {
                    Step::Student => Step::Months,
                    Step::Months | Step::Summary => Step::Summary,
                };
            }
            StepperAction::Back => {
                if !next.busy {
                    next.step = next.step.previous();
                    next.error = None;
                }
            }
            StepperAction::Failed(message) => {
                next.busy = false;
                next.error = Some(message);
            }
            StepperAction::Submitted => next = StepperState::default(),
        }
        Rc::new(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> StudentSummary {
        StudentSummary {
            student_details_id: Some("12".to_string()),
            student_no: Some("ST-12".to_string()),
            full_name: Some("Amal".to_string()),
            branch_name: None,
        }
    }

    fn apply(state: Rc<StepperState>, action: StepperAction) -> Rc<StepperState> {
        state.reduce(action)
    }

    #[test]
    fn cannot_leave_first_step_without_student() {
        let state = Rc::new(StepperState::default());
        assert!(!state.can_advance());
        assert_eq!(state.next_request(), Err(PaymentError::IncompleteSelection));

        let state = apply(state, StepperAction::SelectStudent(student()));
        assert_eq!(state.next_request(), Ok(("12".to_string(), Vec::new())));
    }

    #[test]
    fn walks_through_all_three_steps() {
        let state = Rc::new(StepperState::default());
        let state = apply(state, StepperAction::SelectStudent(student()));
        let state = apply(state, StepperAction::Busy);
        assert!(!state.can_advance());
        let state = apply(
            state,
            StepperAction::FeesLoaded(FeeDetails {
                payments: vec!["Jan 2025".to_string()],
                ..Default::default()
            }),
        );
        assert_eq!(state.step, Step::Months);
        assert!(!state.can_advance());

        let state = apply(state, StepperAction::ToggleMonth("Jan".to_string()));
        assert!(state.months.is_empty(), "paid month must not be selectable");
        let state = apply(state, StepperAction::ToggleMonth("Feb".to_string()));
        assert_eq!(
            state.next_request(),
            Ok(("12".to_string(), vec!["Feb".to_string()]))
        );

        let state = apply(state, StepperAction::FeesLoaded(FeeDetails::default()));
        assert_eq!(state.step, Step::Summary);
        assert!(state.can_submit());

        let state = apply(state, StepperAction::Back);
        assert_eq!(state.step, Step::Months);
        assert_eq!(state.months, vec!["Feb".to_string()]);
    }

    #[test]
    fn failure_keeps_step_and_reports_error() {
        let state = Rc::new(StepperState::default());
        let state = apply(state, StepperAction::SelectStudent(student()));
        let state = apply(state, StepperAction::Busy);
        let state = apply(state, StepperAction::Failed("Failed to fetch fees".to_string()));
        assert_eq!(state.step, Step::Student);
        assert!(!state.busy);
        assert_eq!(state.error.as_deref(), Some("Failed to fetch fees"));
    }

    #[test]
    fn back_clears_error_and_stops_at_first_step() {
        let state = Rc::new(StepperState {
            error: Some("x".to_string()),
            ..Default::default()
        });
        let state = apply(state, StepperAction::Back);
        assert_eq!(state.step, Step::Student);
        assert!(state.error.is_none());
    }

    #[test]
    fn submitted_resets() {
        let state = Rc::new(StepperState {
            step: Step::Summary,
            student: Some(student()),
            months: vec!["Mar".to_string()],
            fees: Some(FeeDetails::default()),
            ..Default::default()
        });
        let state = apply(state, StepperAction::Submitted);
        assert_eq!(*state, StepperState::default());
    }

    #[test]
    fn submission_totals_selected_months_only() {
        let details = FeeDetails {
            course_fees: serde_json::json!({
                "Jan": { "Grade 1": { "violin": 2000 } },
                "Feb": { "Grade 1": { "violin": 2000, "piano": 3000 } }
            }),
            admission_fee: Some(1500),
            ..Default::default()
        };
        let state = StepperState {
            step: Step::Summary,
            student: Some(student()),
            months: vec!["Feb".to_string()],
            fees: Some(details),
            status: PaymentStatus::Pending,
            ..Default::default()
        };
        let (id, body, summary) = state.submission("20/06/2024").unwrap();
        assert_eq!(id, "12");
        assert_eq!(summary.total_course_fees, 5000);
        assert_eq!(body.total_fees, 6500);
        assert_eq!(body.admission_fee, 1500);
        assert_eq!(body.course, "piano, violin");
        assert_eq!(body.status, "Pending");
        assert_eq!(body.branch_name, "N/A");
        assert_eq!(body.selected_months, vec!["Feb".to_string()]);
    }

    #[test]
    fn submission_needs_the_summary_step() {
        let state = StepperState {
            student: Some(student()),
            ..Default::default()
        };
        assert_eq!(state.submission("x").unwrap_err(), PaymentError::MissingData);
    }
}
