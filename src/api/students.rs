use super::ApiClient;
use crate::error::ApiError;
use crate::models::{
    Branch, Course, Grade, RawSlot, RawUser, ScheduleSlot, Student, StudentForm, StudentGrade,
    StudentProfile, StudentSummary,
};
use crate::roster::{self, StudentParts};
use futures_util::future::join_all;
use std::collections::HashMap;

impl ApiClient {
    /// Slots assigned to a student. Failures degrade to an empty list.
    pub async fn student_slots(&self, student_id: &str) -> Vec<ScheduleSlot> {
        let path = format!("students/{}/slots", student_id);
        match self.get::<Vec<RawSlot>>(&path, "Failed to fetch slots").await {
            Ok(slots) => slots.into_iter().map(ScheduleSlot::from).collect(),
            Err(e) => {
                log::error!("Error fetching student slots for {}: {}", student_id, e);
                Vec::new()
            }
        }
    }

    /// Branch names of a student. Failures degrade to an empty list.
    pub async fn student_branches(&self, student_id: &str) -> Vec<String> {
        let path = format!("students/{}/branches", student_id);
        match self.get::<Vec<Branch>>(&path, "Failed to fetch branches").await {
            Ok(branches) => branches
                .into_iter()
                .map(|b| {
                    if b.branch_name.trim().is_empty() {
                        "N/A".to_string()
                    } else {
                        b.branch_name
                    }
                })
                .collect(),
            Err(e) => {
                log::error!("Error fetching student branches for {}: {}", student_id, e);
                Vec::new()
            }
        }
    }

    async fn student_parts(&self, student_id: &str) -> Result<StudentParts, ApiError> {
        let profile_path = format!("students/{}/profile", student_id);
        let grades_path = format!("courses/student/{}/grades", student_id);
        let (profile, grades, slots, branch_names) = futures_util::join!(
            self.get::<StudentProfile>(&profile_path, "Failed to fetch profile"),
            self.get::<Vec<StudentGrade>>(&grades_path, "Failed to fetch grades"),
            self.student_slots(student_id),
            self.student_branches(student_id),
        );
        Ok(StudentParts {
            profile: profile?,
            grades: grades?,
            slots,
            branch_names,
        })
    }

    async fn course_names(&self) -> Result<HashMap<String, String>, ApiError> {
        let courses = self.courses().await?;
        Ok(roster::course_names(&courses))
    }

    async fn assemble(&self, user: &RawUser, course_names: &HashMap<String, String>) -> Student {
        let parts = match user.id.as_deref() {
            Some(id) => match self.student_parts(id).await {
                Ok(parts) => Some(parts),
                Err(e) => {
                    log::error!("Failed to fetch profile or grades for user {}: {}", id, e);
                    None
                }
            },
            None => None,
        };
        roster::assemble_student(user, parts, course_names, self.image_base_url())
    }

    /// Users of a role with their profile, grades, slots and branch. A user
    /// whose detail requests fail is still listed, with `N/A` fields.
    pub async fn users(&self, role: Option<&str>) -> Result<Vec<Student>, ApiError> {
        let users: Vec<RawUser> = match role {
            Some(role) => {
                self.get_query("users", &[("role", role.to_string())], "Failed to fetch users")
                    .await?
            }
            None => self.get("users", "Failed to fetch users").await?,
        };
        let course_names = self.course_names().await?;
        let students = join_all(users.iter().map(|u| self.assemble(u, &course_names))).await;
        log::debug!("Fetched {} users", students.len());
        Ok(students)
    }

    pub async fn students(&self) -> Result<Vec<Student>, ApiError> {
        self.users(Some("student")).await
    }

    async fn refetch_student(&self, student_id: &str, fallback: RawUser) -> Result<Student, ApiError> {
        let course_names = self.course_names().await?;
        let user = RawUser {
            id: Some(student_id.to_string()),
            ..fallback
        };
        Ok(self.assemble(&user, &course_names).await)
    }

    pub async fn create_student(
        &self,
        form: &StudentForm,
        photo: Option<web_sys::File>,
    ) -> Result<Student, ApiError> {
        if form.student_no.trim().is_empty() {
            return Err(ApiError::InvalidRequest(
                "student_no is required in student_details for students".to_string(),
            ));
        }
        let data = student_form_data(form, photo.as_ref())?;
        let created: serde_json::Value = self
            .send_form(self.post("students/finalize"), data, "Failed to create student")
            .await?;
        let student_id = ["user_id", "id", "student_id"]
            .iter()
            .find_map(|k| id_field(&created, k))
            .or_else(|| created.get("student").and_then(|s| id_field(s, "id")))
            .ok_or_else(|| ApiError::Decode("Student ID not found in response".to_string()))?;
        log::info!("Created student {}", student_id);
        self.refetch_student(&student_id, user_from_form(form)).await
    }

    pub async fn update_student(
        &self,
        student_id: &str,
        form: &StudentForm,
        photo: Option<web_sys::File>,
    ) -> Result<Student, ApiError> {
        let data = student_form_data(form, photo.as_ref())?;
        append(&data, "grade_ids", &serde_json::to_string(&form.grade_ids)?)?;
        append(&data, "slot_ids", &serde_json::to_string(&form.slot_ids)?)?;
        if !form.status.trim().is_empty() {
            append(&data, "status", &form.status.trim().to_lowercase())?;
        }
        let path = format!("students/{}", student_id);
        let _: serde_json::Value = self
            .send_form(self.patch(&path), data, "Failed to update student")
            .await?;
        self.refetch_student(student_id, user_from_form(form)).await
    }

    pub async fn upload_student_photo(
        &self,
        student_id: &str,
        photo: web_sys::File,
    ) -> Result<String, ApiError> {
        if student_id.is_empty() {
            return Err(ApiError::InvalidRequest("userId is undefined".to_string()));
        }
        let data = new_form_data()?;
        data.append_with_blob("photo", &photo)
            .map_err(|e| ApiError::InvalidRequest(format!("{:?}", e)))?;
        let path = format!("students/{}/photo", student_id);
        let resp: serde_json::Value = self
            .send_form(self.post(&path), data, "Failed to upload photo")
            .await?;
        let raw = resp.get("photo_url").and_then(|v| v.as_str());
        Ok(roster::resolve_photo_url(raw, self.image_base_url()))
    }

    pub async fn delete_student(&self, student_id: &str) -> Result<(), ApiError> {
        let path = format!("students/{}", student_id);
        self.delete(&path, "Failed to delete student").await?;
        log::info!("Deleted student {}", student_id);
        Ok(())
    }

    /// Student lookup used by the payment stepper.
    pub async fn search_students(&self, student_no: &str) -> Result<Vec<StudentSummary>, ApiError> {
        self.get_query(
            "student/search",
            &[
                ("student_no", student_no.trim().to_string()),
                ("_t", super::cache_buster()),
            ],
            "Failed to search students",
        )
        .await
    }

    pub async fn courses(&self) -> Result<Vec<Course>, ApiError> {
        self.get("courses", "Failed to fetch courses").await
    }

    pub async fn course_grades(&self, course_id: &str) -> Result<Vec<Grade>, ApiError> {
        if course_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest("Course ID is required".to_string()));
        }
        let path = format!("courses/course/{}/grades", course_id);
        self.get(&path, "Failed to fetch grades").await
    }

    pub async fn branches(&self) -> Result<Vec<Branch>, ApiError> {
        self.get("branches", "Failed to fetch branches").await
    }

    pub async fn available_slots(
        &self,
        branch_id: &str,
        course_id: &str,
        grade_id: &str,
    ) -> Result<Vec<ScheduleSlot>, ApiError> {
        if [branch_id, course_id, grade_id].iter().any(|v| v.trim().is_empty()) {
            return Err(ApiError::InvalidRequest(
                "branchId, courseId, and gradeId are all required for slot fetching".to_string(),
            ));
        }
        let slots: Vec<RawSlot> = self
            .get_query(
                "slots/available",
                &[
                    ("branchId", branch_id.to_string()),
                    ("courseId", course_id.to_string()),
                    ("gradeId", grade_id.to_string()),
                ],
                "Failed to fetch slots",
            )
            .await?;
        Ok(slots.into_iter().map(ScheduleSlot::from).collect())
    }
}

fn id_field(value: &serde_json::Value, key: &str) -> Option<String> {
    match value.get(key)? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn user_from_form(form: &StudentForm) -> RawUser {
    RawUser {
        first_name: Some(form.first_name.clone()),
        last_name: Some(form.last_name.clone()),
        email: Some(form.email.clone()),
        role: Some("student".to_string()),
        status: Some(form.status.clone()),
        phn_num: Some(form.phn_num.clone()),
        ice_contact: Some(form.ice_contact.clone()),
        ..Default::default()
    }
}

fn new_form_data() -> Result<web_sys::FormData, ApiError> {
    web_sys::FormData::new().map_err(|e| ApiError::InvalidRequest(format!("{:?}", e)))
}

fn append(data: &web_sys::FormData, key: &str, value: &str) -> Result<(), ApiError> {
    data.append_with_str(key, value)
        .map_err(|e| ApiError::InvalidRequest(format!("{:?}", e)))
}

/// Multipart body with the `user` and `student_details` JSON parts.
fn student_form_data(form: &StudentForm, photo: Option<&web_sys::File>) -> Result<web_sys::FormData, ApiError> {
    let user = serde_json::json!({
        "first_name": form.first_name.trim(),
        "last_name": form.last_name.trim(),
        "email": form.email.trim(),
        "phn_num": form.phn_num.trim(),
        "status": form.status.trim().to_lowercase(),
        "role": "student",
    });
    let details = serde_json::json!({
        "student_no": form.student_no.trim(),
        "salutation": form.salutation.trim(),
        "ice_contact": form.ice_contact.trim(),
    });
    let data = new_form_data()?;
    append(&data, "user", &user.to_string())?;
    append(&data, "student_details", &details.to_string())?;
    if let Some(photo) = photo {
        data.append_with_blob("photo", photo)
            .map_err(|e| ApiError::InvalidRequest(format!("{:?}", e)))?;
    }
    Ok(data)
}

