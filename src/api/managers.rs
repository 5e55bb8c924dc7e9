use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{segment, ApiClient, OnUnauthorized};
use crate::earnings::{EarningsRecord, ManagerType, Period};
use crate::error::{AppError, AppResult};

/// Admin form for awarding a recruitment bonus, as typed in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecruitmentBonusForm {
    pub manager_id: String,
    pub period: String,
    pub manager_type: Option<ManagerType>,
    pub description: String,
}

/// Body of `POST /managers/recruitment-bonus`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruitmentBonusRequest {
    pub manager_id: String,
    pub period: Period,
    pub manager_type: ManagerType,
    pub description: String,
}

impl RecruitmentBonusForm {
    /// Check required fields and build the request body. An empty description gets the default text.
    pub fn validate(&self) -> AppResult<RecruitmentBonusRequest> {
        let manager_id = self.manager_id.trim();
        let period = self.period.trim();
        let (Some(manager_type), false, false) = (self.manager_type, manager_id.is_empty(), period.is_empty()) else {
            return Err(AppError::validation("missing_field", "Please fill in all required fields"));
        };
        let period = Period::parse(period)?;
        let description = match self.description.trim() {
            "" => format!("Recruitment bonus for {} manager", manager_type.as_str()),
            d => d.to_string(),
        };
        Ok(RecruitmentBonusRequest { manager_id: manager_id.to_string(), period, manager_type, description })
    }

    pub fn bonus_amount(&self) -> Option<f64> {
        self.manager_type.map(|t| t.recruitment_bonus_amount())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Approved,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRequest {
    pub id: String,
    pub manager_id: String,
    pub period: Period,
    pub amount: f64,
    pub status: PayoutStatus,
    #[serde(default)]
    pub requested_at: String,
}

/// Body of `POST /payouts`. Only built from a record with something to pay out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutDraft {
    pub manager_id: String,
    pub period: Period,
    pub amount: f64,
}

impl PayoutDraft {
    pub fn from_earnings(record: &EarningsRecord) -> AppResult<Self> {
        if record.total_earnings <= 0.0 {
            return Err(AppError::validation("nothing_to_pay", "No earnings available for payout"));
        }
        Ok(Self { manager_id: record.manager_id.clone(), period: record.period.clone(), amount: record.total_earnings })
    }
}

pub struct ManagersApi<'a> {
    api: &'a ApiClient,
}

impl<'a> ManagersApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self { Self { api } }

    pub async fn earnings(&self, manager_id: &str, period: &Period) -> AppResult<EarningsRecord> {
        let path = format!("/managers/{}/earnings", segment(manager_id));
        self.api.get_json(&path, &[("month", period.as_str())], "Failed to load earnings data").await
    }

    pub async fn all_earnings(&self, period: &Period) -> AppResult<Vec<EarningsRecord>> {
        self.api.get_json("/managers/earnings", &[("month", period.as_str())], "Failed to load earnings data").await
    }

    pub async fn award_recruitment_bonus(&self, form: &RecruitmentBonusForm) -> AppResult<serde_json::Value> {
        let body = form.validate()?;
        self.api
            .send_json(Method::POST, "/managers/recruitment-bonus", &body, OnUnauthorized::ExpireSession, "Failed to award recruitment bonus")
            .await
    }

    /// Rate table as the backend publishes it; the shape is not interpreted client-side.
    pub async fn commission_rates(&self) -> AppResult<serde_json::Value> {
        self.api.get_json("/managers/commission-rates", &[], "Failed to load commission rates").await
    }

    pub async fn request_payout(&self, draft: &PayoutDraft) -> AppResult<PayoutRequest> {
        self.api.send_json(Method::POST, "/payouts", draft, OnUnauthorized::ExpireSession, "Failed to request payout").await
    }
}
