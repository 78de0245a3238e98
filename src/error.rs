use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("Could not read the server response: {0}")]
    Decode(String),

    #[error("{0}")]
    InvalidRequest(String),
}

impl From<gloo_net::Error> for ApiError {
    fn from(err: gloo_net::Error) -> Self {
        match err {
            gloo_net::Error::SerdeError(e) => ApiError::Decode(e.to_string()),
            other => ApiError::Network(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl ApiError {
    /// Builds the error for a non-2xx response. The backend reports failures
    /// as `{"error": ...}` or `{"message": ...}`; anything else gets `fallback`.
    pub fn from_body(status: u16, body: &str, fallback: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                json.get("error")
                    .or_else(|| json.get("message"))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            })
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        ApiError::Backend { status, message }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    #[error("Duplicate payment for {full_name} on {pay_date}")]
    Duplicate { full_name: String, pay_date: String },

    #[error("Please select a student and at least one month before proceeding.")]
    IncompleteSelection,

    #[error("Missing required data for payment.")]
    MissingData,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleFormError {
    #[error("Please fill all required fields")]
    MissingFields,

    #[error("Invalid time: {0}")]
    InvalidTime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_field_is_preferred() {
        let err = ApiError::from_body(400, r#"{"error":"Student exists","message":"x"}"#, "Failed");
        assert_eq!(
            err,
            ApiError::Backend {
                status: 400,
                message: "Student exists".to_string()
            }
        );
    }

    #[test]
    fn message_field_is_used_when_error_missing() {
        let err = ApiError::from_body(404, r#"{"message":"No fees"}"#, "Failed");
        assert_eq!(err.to_string(), "No fees");
    }

    #[test]
    fn non_json_body_uses_fallback() {
        let err = ApiError::from_body(500, "<html>oops</html>", "Failed to fetch students");
        assert_eq!(err.to_string(), "Failed to fetch students");
    }
}
