use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use super::collate::locale_cmp;
use super::record::EarningsRecord;

/// Columns a report can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    ManagerName,
    ManagerType,
    TotalEarnings,
    BaseCommission,
    CreatorCount,
    TotalRevenue,
}

impl SortField {
    pub const ALL: [SortField; 6] = [
        SortField::ManagerName,
        SortField::ManagerType,
        SortField::TotalEarnings,
        SortField::BaseCommission,
        SortField::CreatorCount,
        SortField::TotalRevenue,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SortField::ManagerName => "managerName",
            SortField::ManagerType => "managerType",
            SortField::TotalEarnings => "totalEarnings",
            SortField::BaseCommission => "baseCommission",
            SortField::CreatorCount => "creatorCount",
            SortField::TotalRevenue => "totalRevenue",
        }
    }

    /// Accepts the camelCase key, kebab/snake case, or a short alias (`name`, `type`, `total`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        let norm: String = s.chars().filter(|c| *c != '-' && *c != '_').collect::<String>().to_ascii_lowercase();
        match norm.as_str() {
            "managername" | "name" | "manager" => Some(SortField::ManagerName),
            "managertype" | "type" => Some(SortField::ManagerType),
            "totalearnings" | "total" | "earnings" => Some(SortField::TotalEarnings),
            "basecommission" | "base" | "commission" => Some(SortField::BaseCommission),
            "creatorcount" | "creators" => Some(SortField::CreatorCount),
            "totalrevenue" | "revenue" => Some(SortField::TotalRevenue),
            _ => None,
        }
    }

    /// Ascending comparison on this field. Strings collate, numbers compare numerically.
    pub fn compare(&self, a: &EarningsRecord, b: &EarningsRecord) -> Ordering {
        match self {
            SortField::ManagerName => locale_cmp(&a.manager_name, &b.manager_name),
            SortField::ManagerType => locale_cmp(a.manager_type.as_str(), b.manager_type.as_str()),
            SortField::TotalEarnings => num_cmp(a.total_earnings, b.total_earnings),
            SortField::BaseCommission => num_cmp(a.base_commission, b.base_commission),
            SortField::CreatorCount => a.creator_count.cmp(&b.creator_count),
            SortField::TotalRevenue => num_cmp(a.total_revenue, b.total_revenue),
        }
    }
}

// NaN never comes from the backend; treat it as equal so the sort stays total and stable.
fn num_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

impl Display for SortField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.key()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Current report ordering. Starts at total earnings, descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self { field: SortField::TotalEarnings, direction: SortDirection::Descending }
    }
}

impl SortState {
    pub fn new(field: SortField, direction: SortDirection) -> Self { Self { field, direction } }

    /// Column-header click: same field flips direction, a new field starts descending.
    pub fn select(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.toggled();
        } else {
            self.field = field;
            self.direction = SortDirection::Descending;
        }
    }

    pub fn compare(&self, a: &EarningsRecord, b: &EarningsRecord) -> Ordering {
        let ord = self.field.compare(a, b);
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }

    /// Stable ordering of `records`; equal keys keep their input order in both directions.
    pub fn apply<'a>(&self, records: &'a [EarningsRecord]) -> Vec<&'a EarningsRecord> {
        let mut view: Vec<&EarningsRecord> = records.iter().collect();
        view.sort_by(|a, b| self.compare(a, b));
        view
    }
}
