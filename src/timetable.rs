use crate::error::ScheduleFormError;
use crate::models::{DayCells, ScheduleSlot, SlotPayload, Timetable, TimetableStudent};
use std::collections::BTreeSet;

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const ALL_LOCATIONS: &str = "All";
pub const VISIBLE_PER_CELL: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Period {
    Am,
    Pm,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Am => "AM",
            Period::Pm => "PM",
        }
    }

    pub fn parse(raw: &str) -> Period {
        if raw.trim().eq_ignore_ascii_case("pm") {
            Period::Pm
        } else {
            Period::Am
        }
    }
}

/// `"9"` -> `"09:00"`, `"9.30"` -> `"09:30"`. Other shapes pass through trimmed.
pub fn normalize_time_input(input: &str) -> String {
    let value = input.trim().replacen('.', ":", 1);
    if value.is_empty() {
        return value;
    }
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if all_digits(&value) && value.len() <= 2 {
        return format!("{:0>2}:00", value);
    }
    if let Some((hour, minute)) = value.split_once(':') {
        if all_digits(hour) && hour.len() <= 2 && all_digits(minute) && minute.len() == 2 {
            return format!("{:0>2}:{}", hour, minute);
        }
    }
    value
}

pub fn to_24_hour(time: &str, period: Period) -> Result<String, ScheduleFormError> {
    let (hour, minute) = time
        .split_once(':')
        .ok_or_else(|| ScheduleFormError::InvalidTime(time.to_string()))?;
    let hour: u32 = hour
        .parse()
        .map_err(|_| ScheduleFormError::InvalidTime(time.to_string()))?;
    let minute_ok = minute.len() == 2 && minute.parse::<u32>().map(|m| m < 60).unwrap_or(false);
    if hour > 12 || !minute_ok {
        return Err(ScheduleFormError::InvalidTime(time.to_string()));
    }
    let hour = match (period, hour) {
        (Period::Pm, h) if h != 12 => h + 12,
        (Period::Am, 12) => 0,
        (_, h) => h,
    };
    Ok(format!("{:02}:{}", hour, minute))
}

/// `"13:15"` -> (`"01:15"`, PM). Empty or unreadable input gives an empty AM time.
pub fn to_12_hour(time: &str) -> (String, Period) {
    let Some((hour, minute)) = time.trim().split_once(':') else {
        return (String::new(), Period::Am);
    };
    let Ok(hour) = hour.parse::<u32>() else {
        return (String::new(), Period::Am);
    };
    let minute: String = minute.chars().take(2).collect();
    let (hour, period) = match hour {
        0 => (12, Period::Am),
        h if h < 12 => (h, Period::Am),
        12 => (12, Period::Pm),
        h => (h - 12, Period::Pm),
    };
    (format!("{:02}:{}", hour, minute), period)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScheduleForm {
    pub slot_id: Option<String>,
    pub lecturer_id: String,
    pub course_id: String,
    pub grade_id: String,
    pub branch_id: String,
    pub days: Vec<String>,
    pub start_time: String,
    pub start_period: String,
    pub end_time: String,
    pub end_period: String,
}

impl ScheduleForm {
    /// Pre-fills the form for editing an existing slot.
    pub fn from_slot(slot: &ScheduleSlot) -> Self {
        let (start_time, start_period) = to_12_hour(slot.start_time.as_deref().unwrap_or(""));
        let (end_time, end_period) = to_12_hour(slot.end_time.as_deref().unwrap_or(""));
        ScheduleForm {
            slot_id: slot.id.clone(),
            lecturer_id: slot.lecturer_id.clone().unwrap_or_default(),
            course_id: slot.course_id.clone().unwrap_or_default(),
            grade_id: slot.grade_id.clone().unwrap_or_default(),
            branch_id: slot.branch_id.clone().unwrap_or_default(),
            days: vec![slot.day.clone()],
            start_time,
            start_period: start_period.as_str().to_string(),
            end_time,
            end_period: end_period.as_str().to_string(),
        }
    }

    pub fn toggle_day(&mut self, day: &str) {
        if self.days.iter().any(|d| d == day) {
            self.days.retain(|d| d != day);
        } else {
            self.days.push(day.to_string());
        }
    }

    /// Validates the form and converts the times to 24-hour strings.
    pub fn to_payload(&self) -> Result<SlotPayload, ScheduleFormError> {
        let start = normalize_time_input(&self.start_time);
        let end = normalize_time_input(&self.end_time);
        let required = [
            &self.lecturer_id,
            &self.course_id,
            &self.grade_id,
            &self.branch_id,
            &start,
            &end,
        ];
        if required.iter().any(|v| v.trim().is_empty()) || self.days.is_empty() {
            return Err(ScheduleFormError::MissingFields);
        }
        Ok(SlotPayload {
            user_id: self.lecturer_id.clone(),
            course_id: self.course_id.clone(),
            grade_id: self.grade_id.clone(),
            branch_id: self.branch_id.clone(),
            days: self.days.clone(),
            start_time: to_24_hour(&start, Period::parse(&self.start_period))?,
            end_time: to_24_hour(&end, Period::parse(&self.end_period))?,
        })
    }
}

pub fn locations(timetable: &Timetable) -> Vec<String> {
    std::iter::once(ALL_LOCATIONS.to_string())
        .chain(timetable.keys().cloned())
        .collect()
}

/// Cells for one branch, or every branch merged for [`ALL_LOCATIONS`].
pub fn cells_for(timetable: &Timetable, location: &str) -> DayCells {
    if location != ALL_LOCATIONS {
        return timetable.get(location).cloned().unwrap_or_default();
    }
    let mut merged = DayCells::new();
    for branch in timetable.values() {
        for (time, days) in branch {
            let row = merged.entry(time.clone()).or_default();
            for (day, students) in days {
                row.entry(day.clone())
                    .or_default()
                    .extend(students.iter().cloned());
            }
        }
    }
    merged
}

pub fn distinct_students(cells: &DayCells) -> usize {
    cells
        .values()
        .flat_map(|days| days.values())
        .flatten()
        .map(|s| s.name.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Minutes past midnight of the start of a range like `"9:30 AM - 10:30 AM"`.
pub fn start_minutes(range: &str) -> u32 {
    let start = range.split('-').next().unwrap_or("").trim();
    let mut parts = start.split_whitespace();
    let clock = parts.next().unwrap_or("");
    let modifier = parts.next().unwrap_or("");
    let mut fields = clock.split(':');
    let mut hours: u32 = fields.next().and_then(|h| h.parse().ok()).unwrap_or(0);
    let minutes: u32 = fields.next().and_then(|m| m.parse().ok()).unwrap_or(0);
    if modifier.eq_ignore_ascii_case("PM") && hours != 12 {
        hours += 12;
    }
    if modifier.eq_ignore_ascii_case("AM") && hours == 12 {
        hours = 0;
    }
    hours * 60 + minutes
}

pub fn sorted_time_rows(cells: &DayCells) -> Vec<String> {
    let mut rows: Vec<String> = cells.keys().cloned().collect();
    rows.sort_by_key(|r| start_minutes(r));
    rows
}

/// First students of a cell plus how many were left out.
pub fn visible_students(students: &[TimetableStudent]) -> (&[TimetableStudent], usize) {
    let shown = students.len().min(VISIBLE_PER_CELL);
    (&students[..shown], students.len() - shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn time_inputs_are_normalized() {
        assert_eq!(normalize_time_input("9"), "09:00");
        assert_eq!(normalize_time_input(" 9.30 "), "09:30");
        assert_eq!(normalize_time_input("11:05"), "11:05");
        assert_eq!(normalize_time_input(""), "");
        assert_eq!(normalize_time_input("noon"), "noon");
    }

    #[test]
    fn twelve_hour_to_twenty_four() {
        assert_eq!(to_24_hour("12:00", Period::Am).unwrap(), "00:00");
        assert_eq!(to_24_hour("12:30", Period::Pm).unwrap(), "12:30");
        assert_eq!(to_24_hour("03:15", Period::Pm).unwrap(), "15:15");
        assert_eq!(to_24_hour("09:00", Period::Am).unwrap(), "09:00");
        assert!(to_24_hour("noon", Period::Am).is_err());
        assert!(to_24_hour("13:00", Period::Pm).is_err());
    }

    #[test]
    fn twenty_four_hour_to_twelve() {
        assert_eq!(to_12_hour("00:10"), ("12:10".to_string(), Period::Am));
        assert_eq!(to_12_hour("13:00:00"), ("01:00".to_string(), Period::Pm));
        assert_eq!(to_12_hour("12:45"), ("12:45".to_string(), Period::Pm));
        assert_eq!(to_12_hour(""), (String::new(), Period::Am));
    }

    fn filled_form() -> ScheduleForm {
        ScheduleForm {
            slot_id: None,
            lecturer_id: "4".to_string(),
            course_id: "1".to_string(),
            grade_id: "2".to_string(),
            branch_id: "3".to_string(),
            days: vec!["Monday".to_string()],
            start_time: "4".to_string(),
            start_period: "PM".to_string(),
            end_time: "5.30".to_string(),
            end_period: "PM".to_string(),
        }
    }

    #[test]
    fn form_payload_uses_24_hour_times() {
        let payload = filled_form().to_payload().unwrap();
        assert_eq!(payload.start_time, "16:00");
        assert_eq!(payload.end_time, "17:30");
        assert_eq!(payload.days, vec!["Monday".to_string()]);
    }

    #[test]
    fn form_requires_every_field() {
        let mut form = filled_form();
        form.toggle_day("Monday");
        assert_eq!(form.to_payload(), Err(ScheduleFormError::MissingFields));

        let mut form = filled_form();
        form.branch_id.clear();
        assert_eq!(form.to_payload(), Err(ScheduleFormError::MissingFields));
    }

    fn student(name: &str) -> TimetableStudent {
        TimetableStudent {
            name: name.to_string(),
            photo_url: String::new(),
        }
    }

    fn sample() -> Timetable {
        let mut timetable = Timetable::new();
        let mut colombo = DayCells::new();
        colombo.insert(
            "4:00 PM - 5:00 PM".to_string(),
            BTreeMap::from([("Monday".to_string(), vec![student("Amal"), student("Kamal")])]),
        );
        colombo.insert(
            "9:00 AM - 10:00 AM".to_string(),
            BTreeMap::from([("Tuesday".to_string(), vec![student("Nimal")])]),
        );
        let mut kandy = DayCells::new();
        kandy.insert(
            "4:00 PM - 5:00 PM".to_string(),
            BTreeMap::from([("Monday".to_string(), vec![student("Amal"), student("Sunil")])]),
        );
        timetable.insert("Colombo".to_string(), colombo);
        timetable.insert("Kandy".to_string(), kandy);
        timetable
    }

    #[test]
    fn all_locations_merges_branches() {
        let timetable = sample();
        assert_eq!(locations(&timetable), vec!["All", "Colombo", "Kandy"]);
        let merged = cells_for(&timetable, ALL_LOCATIONS);
        assert_eq!(merged["4:00 PM - 5:00 PM"]["Monday"].len(), 4);
        assert_eq!(distinct_students(&merged), 4);
        assert_eq!(distinct_students(&cells_for(&timetable, "Kandy")), 2);
        assert!(cells_for(&timetable, "Galle").is_empty());
    }

    #[test]
    fn time_rows_sort_by_start() {
        let merged = cells_for(&sample(), ALL_LOCATIONS);
        assert_eq!(
            sorted_time_rows(&merged),
            vec!["9:00 AM - 10:00 AM", "4:00 PM - 5:00 PM"]
        );
        assert_eq!(start_minutes("12:15 AM - 1:00 AM"), 15);
        assert_eq!(start_minutes("12:15 PM - 1:00 PM"), 12 * 60 + 15);
    }

    #[test]
    fn cells_show_five_and_count_the_rest() {
        let students: Vec<TimetableStudent> = (0..7).map(|i| student(&format!("S{}", i))).collect();
        let (shown, more) = visible_students(&students);
        assert_eq!(shown.len(), 5);
        assert_eq!(more, 2);
    }

    #[test]
    fn editing_a_slot_round_trips_its_times() {
        let slot = ScheduleSlot {
            id: Some("4".to_string()),
            day: "Friday".to_string(),
            start_time: Some("13:30:00".to_string()),
            end_time: Some("00:15".to_string()),
            lecturer_id: Some("2".to_string()),
            course_id: Some("1".to_string()),
            grade_id: Some("3".to_string()),
            branch_id: Some("7".to_string()),
            ..Default::default()
        };
        let form = ScheduleForm::from_slot(&slot);
        assert_eq!(form.start_time, "01:30");
        assert_eq!(form.start_period, "PM");
        assert_eq!(form.end_time, "12:15");
        assert_eq!(form.end_period, "AM");
        let payload = form.to_payload().unwrap();
        assert_eq!(payload.start_time, "13:30");
        assert_eq!(payload.end_time, "00:15");
        assert_eq!(payload.days, vec!["Friday"]);
    }
}
