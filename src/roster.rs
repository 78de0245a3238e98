use crate::config::DEFAULT_AVATAR;
use crate::models::{AssignedCourse, Course, RawUser, ScheduleSlot, Student, StudentGrade, StudentProfile};
use std::collections::HashMap;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RosterFilter {
    pub query: String,
    pub status: String,
    pub course: String,
}

impl RosterFilter {
    pub fn matches(&self, student: &Student) -> bool {
        self.matches_query(student) && self.matches_status(student) && self.matches_course(student)
    }

    fn matches_query(&self, student: &Student) -> bool {
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        [
            &student.name,
            &student.course,
            &student.student_no,
            &student.email,
        ]
        .iter()
        .any(|field| field.trim().to_lowercase().contains(&query))
    }

    fn matches_status(&self, student: &Student) -> bool {
        let wanted = self.status.trim().to_lowercase();
        wanted.is_empty() || normalize_status(&student.status) == wanted
    }

    fn matches_course(&self, student: &Student) -> bool {
        let wanted = self.course.trim().to_lowercase();
        if wanted.is_empty() {
            return true;
        }
        let in_assigned = student
            .assigned_courses
            .iter()
            .any(|c| c.course.trim().to_lowercase() == wanted);
        let course_list = student.course.trim().to_lowercase();
        in_assigned || course_list.split(',').any(|c| c.trim() == wanted)
    }

    pub fn apply(&self, students: &[Student]) -> Vec<Student> {
        students.iter().filter(|s| self.matches(s)).cloned().collect()
    }
}

pub fn normalize_status(raw: &str) -> String {
    let status = raw.trim().to_lowercase();
    if status.is_empty() {
        "active".to_string()
    } else {
        status
    }
}

/// Resolves a stored photo path against the image host. Anything that does
/// not end up as an http(s) or data URL falls back to the default avatar.
pub fn resolve_photo_url(raw: Option<&str>, image_base_url: &str) -> String {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return DEFAULT_AVATAR.to_string();
    };
    let suspicious = ["undefined", "null", "https/:"];
    if suspicious.iter().any(|s| raw.contains(s)) {
        log::warn!("Invalid image URL: {}", raw);
        return DEFAULT_AVATAR.to_string();
    }
    if raw.starts_with("http://") || raw.starts_with("https://") || raw.starts_with("data:image/") {
        return raw.to_string();
    }
    let path = raw.trim_start_matches('/');
    format!("{}/{}", image_base_url.trim_end_matches('/'), path)
}

pub fn course_names(courses: &[Course]) -> HashMap<String, String> {
    courses
        .iter()
        .filter_map(|c| c.id.clone().map(|id| (id, c.name.trim().to_string())))
        .collect()
}

pub fn assigned_courses(grades: &[StudentGrade], course_names: &HashMap<String, String>) -> Vec<AssignedCourse> {
    grades
        .iter()
        .map(|g| {
            let grade = g.grade.as_ref();
            let course_id = grade
                .and_then(|g| g.course.as_ref())
                .and_then(|c| c.id.clone());
            AssignedCourse {
                course: course_id
                    .as_ref()
                    .and_then(|id| course_names.get(id))
                    .filter(|n| !n.is_empty())
                    .cloned()
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                grade: grade
                    .and_then(|g| g.grade_name.clone())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                course_id,
                grade_id: grade.and_then(|g| g.id.clone()),
            }
        })
        .collect()
}

fn or_na(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub struct StudentParts {
    pub profile: StudentProfile,
    pub grades: Vec<StudentGrade>,
    pub slots: Vec<ScheduleSlot>,
    pub branch_names: Vec<String>,
}

/// Builds the listing row for one user. `parts` is `None` when any of the
/// per-student requests failed; the row then carries `N/A` placeholders.
pub fn assemble_student(
    user: &RawUser,
    parts: Option<StudentParts>,
    course_names: &HashMap<String, String>,
    image_base_url: &str,
) -> Student {
    let is_student = user.role.as_deref().map(|r| r == "student").unwrap_or(true);
    let base = Student {
        id: user.id.clone().unwrap_or_default(),
        name: user.display_name(),
        email: user.email.clone().unwrap_or_default(),
        role: user.role.clone().unwrap_or_else(|| "student".to_string()),
        student_no: NOT_AVAILABLE.to_string(),
        salutation: String::new(),
        phone: or_na(user.phn_num.clone()),
        ice_contact: or_na(user.ice_contact.clone()),
        status: normalize_status(user.status.as_deref().unwrap_or("")),
        photo_url: DEFAULT_AVATAR.to_string(),
        course: NOT_AVAILABLE.to_string(),
        assigned_courses: Vec::new(),
        schedules: Vec::new(),
        branch: NOT_AVAILABLE.to_string(),
    };

    let Some(parts) = parts else {
        return base;
    };
    let detail = parts.profile.student_detail.unwrap_or_default();
    let photo_url = resolve_photo_url(detail.photo_url.as_deref(), image_base_url);
    if !is_student {
        return Student { photo_url, ..base };
    }

    let assigned = assigned_courses(&parts.grades, course_names);
    let names: Vec<&str> = assigned
        .iter()
        .map(|c| c.course.as_str())
        .filter(|c| *c != NOT_AVAILABLE)
        .collect();
    Student {
        student_no: or_na(detail.student_no),
        salutation: detail.salutation.unwrap_or_default(),
        phone: or_na(user.phn_num.clone().or(detail.phn_num)),
        ice_contact: or_na(detail.ice_contact.or(user.ice_contact.clone())),
        photo_url,
        course: if names.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            names.join(", ")
        },
        assigned_courses: assigned,
        schedules: parts.slots,
        branch: parts
            .branch_names
            .into_iter()
            .next()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ..base
    }
}

/// Replaces the student with the same id, or appends it.
pub fn upsert(students: &mut Vec<Student>, student: Student) {
    match students.iter_mut().find(|s| s.id == student.id) {
        Some(existing) => *existing = student,
        None => students.push(student),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseRef, GradeRef, StudentDetail};

    fn student(name: &str, course: &str, status: &str) -> Student {
        Student {
            id: name.to_lowercase(),
            name: name.to_string(),
            email: format!("{}@academy.lk", name.to_lowercase()),
            student_no: format!("ST-{}", name.len()),
            status: status.to_string(),
            course: course.to_string(),
            assigned_courses: course
                .split(", ")
                .map(|c| AssignedCourse {
                    course: c.to_string(),
                    grade: "1".to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn roster() -> Vec<Student> {
        vec![
            student("Amal", "violin, piano", "active"),
            student("Kamal", "guitar", " Inactive "),
            student("Nimali", "piano", ""),
        ]
    }

    #[test]
    fn search_matches_name_course_number_and_email() {
        let filter = RosterFilter {
            query: " PIANO ".to_string(),
            ..Default::default()
        };
        assert_eq!(filter.apply(&roster()).len(), 2);

        let filter = RosterFilter {
            query: "kamal@".to_string(),
            ..Default::default()
        };
        let found = filter.apply(&roster());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Kamal");
    }

    #[test]
    fn status_filter_defaults_missing_status_to_active() {
        let filter = RosterFilter {
            status: "Active".to_string(),
            ..Default::default()
        };
        let names: Vec<String> = filter.apply(&roster()).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Amal", "Nimali"]);
    }

    #[test]
    fn course_filter_is_exact_per_course() {
        let filter = RosterFilter {
            course: "Violin".to_string(),
            ..Default::default()
        };
        assert_eq!(filter.apply(&roster()).len(), 1);

        let filter = RosterFilter {
            course: "vio".to_string(),
            ..Default::default()
        };
        assert!(filter.apply(&roster()).is_empty());
    }

    #[test]
    fn photo_urls_resolve_against_image_host() {
        let base = "https://img.academy.lk/";
        assert_eq!(
            resolve_photo_url(Some("/uploads/a.png"), base),
            "https://img.academy.lk/uploads/a.png"
        );
        assert_eq!(
            resolve_photo_url(Some("https://cdn/x.png"), base),
            "https://cdn/x.png"
        );
        assert_eq!(resolve_photo_url(None, base), DEFAULT_AVATAR);
        assert_eq!(resolve_photo_url(Some("undefined"), base), DEFAULT_AVATAR);
    }

    fn user() -> RawUser {
        RawUser {
            id: Some("5".to_string()),
            first_name: Some("Amal".to_string()),
            last_name: Some("Perera".to_string()),
            role: Some("student".to_string()),
            status: Some(" Active".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn failed_parts_degrade_to_placeholders() {
        let row = assemble_student(&user(), None, &HashMap::new(), "https://img");
        assert_eq!(row.name, "Amal Perera");
        assert_eq!(row.status, "active");
        assert_eq!(row.student_no, "N/A");
        assert_eq!(row.course, "N/A");
        assert_eq!(row.branch, "N/A");
        assert_eq!(row.photo_url, DEFAULT_AVATAR);
        assert!(row.assigned_courses.is_empty());
    }

    #[test]
    fn parts_fill_in_the_composite_row() {
        let names = course_names(&[Course {
            id: Some("1".to_string()),
            name: " Violin ".to_string(),
        }]);
        let parts = StudentParts {
            profile: StudentProfile {
                student_detail: Some(StudentDetail {
                    student_no: Some("ST-5".to_string()),
                    photo_url: Some("/uploads/5.png".to_string()),
                    ..Default::default()
                }),
            },
            grades: vec![
                StudentGrade {
                    grade: Some(GradeRef {
                        id: Some("9".to_string()),
                        grade_name: Some("Grade 3".to_string()),
                        course: Some(CourseRef {
                            id: Some("1".to_string()),
                        }),
                    }),
                },
                StudentGrade::default(),
            ],
            slots: Vec::new(),
            branch_names: vec!["Colombo".to_string(), "Kandy".to_string()],
        };
        let row = assemble_student(&user(), Some(parts), &names, "https://img");
        assert_eq!(row.student_no, "ST-5");
        assert_eq!(row.photo_url, "https://img/uploads/5.png");
        assert_eq!(row.course, "Violin");
        assert_eq!(row.assigned_courses.len(), 2);
        assert_eq!(row.assigned_courses[1].course, "N/A");
        assert_eq!(row.branch, "Colombo");
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut list = roster();
        let mut changed = list[0].clone();
        changed.status = "inactive".to_string();
        upsert(&mut list, changed);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].status, "inactive");

        upsert(&mut list, student("Sunil", "piano", "active"));
        assert_eq!(list.len(), 4);
    }
}
