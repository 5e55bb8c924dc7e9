use super::{Completion, Loadable, ViewScope};
use crate::api::{ApiClient, PayoutDraft, PayoutRequest};
use crate::earnings::{EarningsRecord, Period};
use crate::error::AppError;
use crate::identity::Identity;

/// A manager's own month: earnings breakdown and the payout request.
#[derive(Debug, Clone)]
pub struct DashboardView {
    manager_id: Option<String>,
    period: Period,
    earnings: Loadable<EarningsRecord>,
    payout: Loadable<PayoutRequest>,
}

impl DashboardView {
    pub fn new(identity: &Identity, period: Period) -> Self {
        let scope = ViewScope::new();
        Self {
            manager_id: identity.manager_id().map(str::to_string),
            period,
            earnings: Loadable::new(scope.clone()),
            payout: Loadable::new(scope),
        }
    }

    pub fn manager_id(&self) -> Option<&str> { self.manager_id.as_deref() }
    pub fn period(&self) -> &Period { &self.period }
    pub fn earnings(&self) -> &Loadable<EarningsRecord> { &self.earnings }
    pub fn payout(&self) -> &Loadable<PayoutRequest> { &self.payout }
    pub fn unmount(&self) { self.earnings.scope().unmount(); }

    pub fn select_period(&mut self, period: Period) -> bool {
        if period == self.period {
            return false;
        }
        self.period = period;
        true
    }

    /// Payout is offered only for loaded earnings above zero.
    pub fn can_request_payout(&self) -> bool {
        self.earnings.data().is_some_and(|r| r.total_earnings > 0.0)
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> Completion {
        let ticket = self.earnings.begin();
        let Some(manager_id) = self.manager_id.clone() else {
            let err = AppError::validation("no_manager", "No manager account is linked to this user");
            return self.earnings.complete(ticket, Err(err));
        };
        let period = self.period.clone();
        let result = api.managers().earnings(&manager_id, &period).await;
        self.earnings.complete(ticket, result)
    }

    pub async fn request_payout(&mut self, api: &ApiClient) -> Completion {
        let ticket = self.payout.begin();
        let draft = match self.earnings.data() {
            Some(record) => PayoutDraft::from_earnings(record),
            None => Err(AppError::validation("nothing_to_pay", "No earnings available for payout")),
        };
        let result = match draft {
            Ok(d) => api.managers().request_payout(&d).await,
            Err(e) => Err(e),
        };
        self.payout.complete(ticket, result)
    }
}
