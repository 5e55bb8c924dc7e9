use serde::{Deserialize, Serialize};

use super::period::Period;

/// Tolerance used when checking server totals against their components.
const CENT: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerType {
    Live,
    Team,
}

impl ManagerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagerType::Live => "live",
            ManagerType::Team => "team",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Some(ManagerType::Live),
            "team" => Some(ManagerType::Team),
            _ => None,
        }
    }

    /// Fixed recruitment bonus shown on the award form, in EUR.
    pub fn recruitment_bonus_amount(&self) -> f64 {
        match self {
            ManagerType::Live => 50.0,
            ManagerType::Team => 60.0,
        }
    }
}

/// Tiered milestone bonuses. `total` is server-computed and displayed as given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneBreakdown {
    #[serde(default)]
    pub half_milestone: f64,
    #[serde(default)]
    pub milestone1: f64,
    #[serde(default)]
    pub milestone2: f64,
    #[serde(default)]
    pub retention: f64,
    #[serde(default)]
    pub total: f64,
}

impl MilestoneBreakdown {
    pub fn components_sum(&self) -> f64 {
        self.half_milestone + self.milestone1 + self.milestone2 + self.retention
    }
}

/// One manager's earnings for one period, as computed by the backend. Never mutated client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsRecord {
    pub manager_id: String,
    pub manager_name: String,
    pub manager_type: ManagerType,
    pub period: Period,
    #[serde(default)]
    pub base_commission: f64,
    #[serde(rename = "milestoneEarnings", alias = "milestoneBreakdown", default)]
    pub milestones: MilestoneBreakdown,
    #[serde(default)]
    pub graduation_bonus: f64,
    #[serde(default)]
    pub diamond_bonus: f64,
    #[serde(default)]
    pub recruitment_bonus: f64,
    #[serde(default)]
    pub downline_earnings: f64,
    pub total_earnings: f64,
    #[serde(default)]
    pub creator_count: u64,
    #[serde(default)]
    pub total_revenue: f64,
}

impl EarningsRecord {
    pub fn is_team(&self) -> bool { self.manager_type == ManagerType::Team }

    /// Downline earnings that count toward the total: zero for live managers whatever the server sent.
    pub fn effective_downline(&self) -> f64 {
        if self.is_team() { self.downline_earnings } else { 0.0 }
    }

    /// Total rebuilt from components. Informational only; `total_earnings` stays authoritative.
    pub fn expected_total(&self) -> f64 {
        self.base_commission
            + self.milestones.total
            + self.graduation_bonus
            + self.diamond_bonus
            + self.recruitment_bonus
            + self.effective_downline()
    }

    pub fn is_consistent(&self) -> bool {
        (self.expected_total() - self.total_earnings).abs() < CENT
            && (self.milestones.components_sum() - self.milestones.total).abs() < CENT
    }

    /// Milestone total plus graduation, diamond and recruitment bonuses (summary card).
    pub fn bonus_total(&self) -> f64 {
        self.milestones.total + self.graduation_bonus + self.diamond_bonus + self.recruitment_bonus
    }

    /// Graduation, diamond, recruitment and (team only) downline (report "other bonuses" cell).
    pub fn other_bonus_total(&self) -> f64 {
        self.graduation_bonus + self.diamond_bonus + self.recruitment_bonus + self.effective_downline()
    }

    /// Non-zero earnings components in display order. Downline appears for team managers only.
    pub fn breakdown(&self) -> Vec<(&'static str, f64)> {
        let mut parts = vec![
            ("Grundprovision", self.base_commission),
            ("Half-Milestone", self.milestones.half_milestone),
            ("Milestone 1", self.milestones.milestone1),
            ("Milestone 2", self.milestones.milestone2),
            ("Retention", self.milestones.retention),
            ("Graduation", self.graduation_bonus),
            ("Diamond", self.diamond_bonus),
            ("Recruitment", self.recruitment_bonus),
        ];
        if self.is_team() {
            parts.push(("Downline", self.downline_earnings));
        }
        parts.retain(|(_, v)| *v > 0.0);
        parts
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn record(id: &str, name: &str, kind: ManagerType, total: f64) -> EarningsRecord {
        EarningsRecord {
            manager_id: id.to_string(),
            manager_name: name.to_string(),
            manager_type: kind,
            period: Period::parse("202609").unwrap(),
            base_commission: total,
            milestones: MilestoneBreakdown::default(),
            graduation_bonus: 0.0,
            diamond_bonus: 0.0,
            recruitment_bonus: 0.0,
            downline_earnings: 0.0,
            total_earnings: total,
            creator_count: 0,
            total_revenue: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> serde_json::Value {
        serde_json::json!({
            "managerId": "m1",
            "managerName": "Lena Vogt",
            "managerType": "team",
            "period": "202609",
            "baseCommission": 100.0,
            "milestoneEarnings": {"halfMilestone": 10.0, "milestone1": 20.0, "milestone2": 0.0, "retention": 5.0, "total": 35.0},
            "graduationBonus": 0.0,
            "diamondBonus": 15.0,
            "recruitmentBonus": 60.0,
            "downlineEarnings": 40.0,
            "totalEarnings": 250.0,
            "creatorCount": 12,
            "totalRevenue": 4200.0
        })
    }

    #[test]
    fn decodes_server_shape() {
        let r: EarningsRecord = serde_json::from_value(sample()).unwrap();
        assert_eq!(r.manager_type, ManagerType::Team);
        assert_eq!(r.milestones.total, 35.0);
        assert_eq!(r.creator_count, 12);
        assert!(r.is_consistent());
    }

    #[test]
    fn live_downline_is_ignored() {
        let mut v = sample();
        v["managerType"] = "live".into();
        v["totalEarnings"] = serde_json::json!(210.0);
        let r: EarningsRecord = serde_json::from_value(v).unwrap();
        assert_eq!(r.effective_downline(), 0.0);
        assert_eq!(r.expected_total(), 210.0);
        assert!(r.is_consistent());
        assert!(r.breakdown().iter().all(|(name, _)| *name != "Downline"));
        assert_eq!(r.other_bonus_total(), 75.0);
    }

    #[test]
    fn breakdown_skips_zero_components() {
        let r: EarningsRecord = serde_json::from_value(sample()).unwrap();
        let names: Vec<&str> = r.breakdown().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Grundprovision", "Half-Milestone", "Milestone 1", "Retention", "Diamond", "Recruitment", "Downline"]);
        assert_eq!(r.bonus_total(), 110.0);
    }

    #[test]
    fn inconsistent_total_is_detected_not_fixed() {
        let mut v = sample();
        v["totalEarnings"] = serde_json::json!(999.0);
        let r: EarningsRecord = serde_json::from_value(v).unwrap();
        assert!(!r.is_consistent());
        assert_eq!(r.total_earnings, 999.0);
    }
}
