//! Flat CSV export of a report view. Rows follow the order they are given in, which callers
//! take from the current sort state so the file matches what is on screen.

use std::path::Path;

use tracing::info;

use super::money::fixed2;
use super::period::Period;
use super::record::EarningsRecord;
use crate::error::AppResult;

pub const EXPORT_HEADER: [&str; 11] = [
    "Manager Name",
    "Type",
    "Total Earnings",
    "Base Commission",
    "Milestone Total",
    "Graduation Bonus",
    "Diamond Bonus",
    "Recruitment Bonus",
    "Downline Earnings",
    "Creator Count",
    "Total Revenue",
];

pub fn export_filename(period: &Period) -> String {
    format!("manager-earnings-{}.csv", period)
}

// RFC 4180 quoting, only when the field would otherwise break the row.
fn csv_field(s: &str) -> String {
    if s.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn export_row(r: &EarningsRecord) -> String {
    [
        csv_field(&r.manager_name),
        r.manager_type.as_str().to_uppercase(),
        fixed2(r.total_earnings),
        fixed2(r.base_commission),
        fixed2(r.milestones.total),
        fixed2(r.graduation_bonus),
        fixed2(r.diamond_bonus),
        fixed2(r.recruitment_bonus),
        fixed2(r.effective_downline()),
        r.creator_count.to_string(),
        fixed2(r.total_revenue),
    ]
    .join(",")
}

/// Header line followed by one line per record, newline separated, no trailing newline.
pub fn export_csv<'a, I>(rows: I) -> String
where
    I: IntoIterator<Item = &'a EarningsRecord>,
{
    let mut lines = vec![EXPORT_HEADER.join(",")];
    lines.extend(rows.into_iter().map(export_row));
    lines.join("\n")
}

pub fn write_export(path: &Path, csv: &str) -> AppResult<()> {
    std::fs::write(path, csv)?;
    info!(target: "commission_desk::earnings", "export written: path={} bytes={}", path.display(), csv.len());
    Ok(())
}
