use super::{cache_buster, ApiClient};
use crate::error::ApiError;
use crate::models::{
    FeeDetails, PaymentConfirmation, PaymentHistory, PaymentRecord, PaymentSubmission, PendingEntry,
};
use futures_util::future::join_all;
use std::collections::HashMap;

/// Payment listing plus the pending history of each student in it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaymentListing {
    pub records: Vec<PaymentRecord>,
    pub histories: HashMap<String, Vec<PendingEntry>>,
}

impl ApiClient {
    /// `state` and `status` are only sent when set.
    pub async fn search_payments(
        &self,
        state: Option<&str>,
        status: Option<&str>,
    ) -> Result<Vec<PaymentRecord>, ApiError> {
        let mut query = Vec::new();
        if let Some(state) = state {
            query.push(("state", state.to_string()));
        }
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        query.push(("_t", cache_buster()));
        self.get_query("searchmain", &query, "Failed to load payments").await
    }

    /// Pending history of one student. Failures degrade to an empty history.
    pub async fn payment_history(&self, student_details_id: &str) -> Vec<PendingEntry> {
        let path = format!("payment-history/{}", student_details_id);
        match self.get::<PaymentHistory>(&path, "Failed to fetch payment history").await {
            Ok(history) => history.pending_history,
            Err(e) => {
                log::error!("Error fetching payment history for {}: {}", student_details_id, e);
                Vec::new()
            }
        }
    }

    pub async fn payment_listing(
        &self,
        state: Option<&str>,
        status: Option<&str>,
    ) -> Result<PaymentListing, ApiError> {
        let records = self.search_payments(state, status).await?;
        let mut ids: Vec<String> = records
            .iter()
            .filter_map(|r| r.student_details_id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        let histories = join_all(ids.iter().map(|id| self.payment_history(id))).await;
        Ok(PaymentListing {
            records,
            histories: ids.into_iter().zip(histories).collect(),
        })
    }

    /// Fee breakdown for a student, priced for `months` when any are given.
    pub async fn fee_details(&self, student_id: &str, months: &[String]) -> Result<FeeDetails, ApiError> {
        let path = format!("payment/{}", student_id);
        if months.is_empty() {
            self.get(&path, "Failed to fetch fee details").await
        } else {
            self.get_query(&path, &[("months", months.join(","))], "Failed to fetch fee details")
                .await
        }
    }

    pub async fn submit_payment(
        &self,
        student_id: &str,
        payment: &PaymentSubmission,
    ) -> Result<PaymentConfirmation, ApiError> {
        let path = format!("payment/{}", student_id);
        let confirmation: PaymentConfirmation = self
            .post_json(&path, payment, "Failed to submit payment")
            .await?;
        log::info!(
            "Payment recorded for {} ({} months)",
            payment.student_no,
            payment.selected_months.len()
        );
        Ok(confirmation)
    }
}
