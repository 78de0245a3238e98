use super::ApiClient;
use crate::error::ApiError;
use crate::models::{Grade, Lecturer, RawSlot, ScheduleSlot, SlotPayload};

impl ApiClient {
    pub async fn slots(&self) -> Result<Vec<ScheduleSlot>, ApiError> {
        let slots: Vec<RawSlot> = self.get("slots", "Failed to fetch schedules").await?;
        Ok(slots.into_iter().map(ScheduleSlot::from).collect())
    }

    pub async fn create_slots(&self, payload: &SlotPayload) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .post_json("slots", payload, "Failed to save schedule")
            .await?;
        log::info!("Created slots for {} day(s)", payload.days.len());
        Ok(())
    }

    pub async fn update_slot(&self, slot_id: &str, payload: &SlotPayload) -> Result<(), ApiError> {
        let path = format!("slots/{}", slot_id);
        let _: serde_json::Value = self
            .patch_json(&path, payload, "Failed to save schedule")
            .await?;
        Ok(())
    }

    pub async fn delete_slot(&self, slot_id: &str) -> Result<(), ApiError> {
        let path = format!("slots/{}", slot_id);
        self.delete(&path, "Failed to delete schedule").await?;
        log::info!("Deleted slot {}", slot_id);
        Ok(())
    }

    pub async fn lecturers(&self) -> Result<Vec<Lecturer>, ApiError> {
        self.get_query("users", &[("role", "lecturer".to_string())], "Failed to fetch lecturers")
            .await
    }

    pub async fn grades(&self) -> Result<Vec<Grade>, ApiError> {
        self.get("grades", "Failed to fetch grades").await
    }
}
