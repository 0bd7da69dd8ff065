//! Retention action table.
//!
//! Maps a churn probability (percentage scale) plus tenure and contract to a
//! risk level and a recommended action. The thresholds are business policy;
//! change them here and nowhere else.

use serde::Serialize;

use crate::models::Contract;

/// At or above this probability the customer needs immediate outreach.
pub const CRITICAL_RISK_THRESHOLD: f64 = 70.0;

/// At or above this probability the customer is flagged as high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 50.0;

/// Customers below this tenure (months) count as new for discount offers.
pub const SHORT_TENURE_MONTHS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Critical,
    High,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetentionAction {
    ImmediateOutreach,
    ContractUpgradeDiscount,
    FeatureAwarenessCampaign,
    Monitor,
}

impl RetentionAction {
    pub fn text(self) -> &'static str {
        match self {
            RetentionAction::ImmediateOutreach => {
                "**CRITICAL RISK:** Immediate proactive call from Sales/Retention Team. \
                 Focus on service usage and pricing dissatisfaction."
            }
            RetentionAction::ContractUpgradeDiscount => {
                "**HIGH RISK:** Offer a 3-month discount to move to a 1-year contract \
                 to improve retention."
            }
            RetentionAction::FeatureAwarenessCampaign => {
                "**HIGH RISK:** Send a targeted email campaign highlighting two key \
                 features the customer is not using."
            }
            RetentionAction::Monitor => "Monitor usage. Customer is stable.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Always,
    /// New customer still on a month-to-month contract.
    ShortTenureMonthToMonth,
}

impl Condition {
    fn holds(self, tenure: u32, contract: Contract) -> bool {
        match self {
            Condition::Always => true,
            Condition::ShortTenureMonthToMonth => {
                tenure < SHORT_TENURE_MONTHS && contract == Contract::MonthToMonth
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionRule {
    /// Inclusive lower bound on the probability percentage.
    pub min_probability: f64,
    pub condition: Condition,
    pub level: RiskLevel,
    pub action: RetentionAction,
}

/// Evaluated top to bottom; the first matching rule wins.
pub static ACTION_RULES: [ActionRule; 4] = [
    ActionRule {
        min_probability: CRITICAL_RISK_THRESHOLD,
        condition: Condition::Always,
        level: RiskLevel::Critical,
        action: RetentionAction::ImmediateOutreach,
    },
    ActionRule {
        min_probability: HIGH_RISK_THRESHOLD,
        condition: Condition::ShortTenureMonthToMonth,
        level: RiskLevel::High,
        action: RetentionAction::ContractUpgradeDiscount,
    },
    ActionRule {
        min_probability: HIGH_RISK_THRESHOLD,
        condition: Condition::Always,
        level: RiskLevel::High,
        action: RetentionAction::FeatureAwarenessCampaign,
    },
    ActionRule {
        min_probability: f64::NEG_INFINITY,
        condition: Condition::Always,
        level: RiskLevel::Stable,
        action: RetentionAction::Monitor,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionDecision {
    pub level: RiskLevel,
    pub action: RetentionAction,
}

impl ActionDecision {
    pub const STABLE: ActionDecision = ActionDecision {
        level: RiskLevel::Stable,
        action: RetentionAction::Monitor,
    };

    pub fn is_high_risk(&self) -> bool {
        self.level != RiskLevel::Stable
    }

    pub fn action_text(&self) -> &'static str {
        self.action.text()
    }
}

/// Picks the retention action for a probability on the 0-100 scale.
///
/// Never fails: a probability that matches no rule (NaN) is treated as stable.
pub fn decide(probability_pct: f64, tenure: u32, contract: Contract) -> ActionDecision {
    ACTION_RULES
        .iter()
        .find(|rule| {
            probability_pct >= rule.min_probability && rule.condition.holds(tenure, contract)
        })
        .map(|rule| ActionDecision {
            level: rule.level,
            action: rule.action,
        })
        .unwrap_or(ActionDecision::STABLE)
}
