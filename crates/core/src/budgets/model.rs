use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::sync::SyncRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPeriod {
    Weekly,
    Monthly,
    Yearly,
}

impl BudgetPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetPeriod::Weekly => "weekly",
            BudgetPeriod::Monthly => "monthly",
            BudgetPeriod::Yearly => "yearly",
        }
    }
}

/// A spending limit for one category over a recurring period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: String,
    pub category: String,
    pub limit_amount: Decimal,
    pub period: BudgetPeriod,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    pub category: String,
    pub limit_amount: Decimal,
    pub period: BudgetPeriod,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<BudgetPeriod>,
}

#[derive(Debug, Clone, Default)]
pub struct BudgetFilter {
    pub period: Option<BudgetPeriod>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub count: usize,
    pub total_limit: Decimal,
    pub limit_by_period: HashMap<String, Decimal>,
}

pub fn summarize_budgets(records: &[Budget]) -> BudgetSummary {
    let mut total_limit = Decimal::ZERO;
    let mut limit_by_period: HashMap<String, Decimal> = HashMap::new();
    for record in records {
        total_limit += record.limit_amount;
        *limit_by_period
            .entry(record.period.as_str().to_string())
            .or_insert(Decimal::ZERO) += record.limit_amount;
    }
    BudgetSummary {
        count: records.len(),
        total_limit,
        limit_by_period,
    }
}

impl SyncRecord for Budget {
    type Draft = NewBudget;
    type Patch = BudgetUpdate;
    type Filter = BudgetFilter;

    fn collection() -> &'static str {
        "budgets"
    }

    fn entity_name() -> &'static str {
        "budget"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_draft(draft: NewBudget, id: String) -> Self {
        Budget {
            id,
            category: draft.category,
            limit_amount: draft.limit_amount,
            period: draft.period,
            created_at: Utc::now(),
        }
    }

    fn matches(&self, filter: &BudgetFilter) -> bool {
        if let Some(period) = filter.period {
            if self.period != period {
                return false;
            }
        }
        if let Some(category) = &filter.category {
            if &self.category != category {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn summary_groups_limits_by_period() {
        let records = vec![
            Budget {
                id: "rec-1".to_string(),
                category: "groceries".to_string(),
                limit_amount: dec!(400),
                period: BudgetPeriod::Monthly,
                created_at: Utc::now(),
            },
            Budget {
                id: "rec-2".to_string(),
                category: "eating out".to_string(),
                limit_amount: dec!(120),
                period: BudgetPeriod::Monthly,
                created_at: Utc::now(),
            },
            Budget {
                id: "rec-3".to_string(),
                category: "travel".to_string(),
                limit_amount: dec!(2000),
                period: BudgetPeriod::Yearly,
                created_at: Utc::now(),
            },
        ];
        let summary = summarize_budgets(&records);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.total_limit, dec!(2520));
        assert_eq!(summary.limit_by_period["monthly"], dec!(520));
        assert_eq!(summary.limit_by_period["yearly"], dec!(2000));
    }
}
