use serde::Serialize;
use tracing::debug;

use super::record::EarningsRecord;

/// Report summary cards. Sums are taken over server totals, in input order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSummary {
    pub total_earnings: f64,
    pub total_revenue: f64,
    pub total_creators: u64,
    pub manager_count: usize,
}

pub fn aggregate(records: &[EarningsRecord]) -> EarningsSummary {
    let mut out = EarningsSummary::default();
    for r in records {
        if !r.is_consistent() {
            debug!(target: "commission_desk::earnings", "server total differs from components: manager={} total={} expected={}", r.manager_id, r.total_earnings, r.expected_total());
        }
        out.total_earnings += r.total_earnings;
        out.total_revenue += r.total_revenue;
        out.total_creators += r.creator_count;
        out.manager_count += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earnings::record::fixtures::record;
    use crate::earnings::ManagerType::{Live, Team};

    #[test]
    fn empty_is_all_zero() {
        let s = aggregate(&[]);
        assert_eq!(s, EarningsSummary { total_earnings: 0.0, total_revenue: 0.0, total_creators: 0, manager_count: 0 });
    }

    #[test]
    fn sums_match_plain_sum_exactly() {
        let mut records = vec![
            record("1", "A", Live, 0.1),
            record("2", "B", Team, 0.2),
            record("3", "C", Live, 1234.57),
            record("4", "D", Team, 80.5),
        ];
        records[0].creator_count = 3;
        records[2].creator_count = 4;
        records[1].total_revenue = 999.99;
        let s = aggregate(&records);
        let plain: f64 = records.iter().map(|r| r.total_earnings).sum();
        assert_eq!(s.total_earnings, plain);
        assert_eq!(s.total_revenue, 999.99);
        assert_eq!(s.total_creators, 7);
        assert_eq!(s.manager_count, 4);
    }
}
