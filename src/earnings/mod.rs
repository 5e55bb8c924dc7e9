//! Earnings records for a period: validation of the period key, summary totals,
//! deterministic ordering and flat export. Numbers are the backend's; nothing here recomputes
//! commission.

mod aggregate;
mod collate;
mod export;
mod money;
mod period;
mod record;
mod sort;

pub use aggregate::{aggregate, EarningsSummary};
pub use collate::locale_cmp;
pub use export::{export_csv, export_filename, export_row, write_export, EXPORT_HEADER};
pub use money::{fixed2, format_eur};
pub use period::{recent_periods, Period};
pub use record::{EarningsRecord, ManagerType, MilestoneBreakdown};
pub use sort::{SortDirection, SortField, SortState};

#[cfg(test)]
pub(crate) use record::fixtures;
