use std::path::{Path, PathBuf};

use super::{Completion, Loadable, ViewScope};
use crate::api::ApiClient;
use crate::earnings::{
    aggregate, export_csv, export_filename, write_export, EarningsRecord, EarningsSummary, Period, SortField, SortState,
};
use crate::error::AppResult;

/// Records for one period, replaced wholesale when another period loads.
#[derive(Debug, Clone, PartialEq)]
pub struct EarningsSet {
    pub period: Period,
    pub records: Vec<EarningsRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub filename: String,
    pub contents: String,
}

impl Export {
    /// Write into `dir` under the standard file name.
    pub fn write_to(&self, dir: &Path) -> AppResult<PathBuf> {
        let path = dir.join(&self.filename);
        write_export(&path, &self.contents)?;
        Ok(path)
    }
}

/// Admin report over every manager's earnings for one month.
#[derive(Debug, Clone)]
pub struct ReportsView {
    period: Period,
    sort: SortState,
    earnings: Loadable<EarningsSet>,
}

impl ReportsView {
    pub fn new(period: Period) -> Self {
        Self::with_scope(period, ViewScope::new())
    }

    pub fn with_scope(period: Period, scope: ViewScope) -> Self {
        Self { period, sort: SortState::default(), earnings: Loadable::new(scope) }
    }

    pub fn for_current_month() -> Self { Self::new(Period::current()) }

    pub fn period(&self) -> &Period { &self.period }
    pub fn sort_state(&self) -> SortState { self.sort }
    pub fn earnings(&self) -> &Loadable<EarningsSet> { &self.earnings }
    pub fn dismiss_error(&mut self) { self.earnings.dismiss_error(); }
    pub fn unmount(&self) { self.earnings.scope().unmount(); }

    /// Returns whether the selection changed; the caller reloads.
    pub fn select_period(&mut self, period: Period) -> bool {
        if period == self.period {
            return false;
        }
        self.period = period;
        true
    }

    pub fn sort_by(&mut self, field: SortField) { self.sort.select(field); }
    pub fn set_sort(&mut self, sort: SortState) { self.sort = sort; }

    pub fn records(&self) -> &[EarningsRecord] {
        self.earnings.data().map(|s| s.records.as_slice()).unwrap_or(&[])
    }

    /// Records in display order.
    pub fn rows(&self) -> Vec<&EarningsRecord> { self.sort.apply(self.records()) }

    pub fn summary(&self) -> EarningsSummary { aggregate(self.records()) }

    /// CSV of exactly what `rows()` shows. None until a period has loaded.
    pub fn export(&self) -> Option<Export> {
        let set = self.earnings.data()?;
        Some(Export { filename: export_filename(&set.period), contents: export_csv(self.sort.apply(&set.records)) })
    }

    pub async fn refresh(&mut self, api: &ApiClient) -> Completion {
        let ticket = self.earnings.begin();
        let period = self.period.clone();
        let result = api.managers().all_earnings(&period).await.map(|records| EarningsSet { period, records });
        self.earnings.complete(ticket, result)
    }
}
