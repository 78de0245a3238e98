use super::ApiClient;
use crate::error::ApiError;
use crate::models::{DashboardResponse, Timetable};

impl ApiClient {
    pub async fn timetable(&self) -> Result<Timetable, ApiError> {
        let resp: DashboardResponse = self.get("dashboard", "Failed to fetch dashboard data").await?;
        if !resp.success {
            return Err(ApiError::Backend {
                status: 200,
                message: "Failed to fetch dashboard data".to_string(),
            });
        }
        Ok(resp.data)
    }
}
