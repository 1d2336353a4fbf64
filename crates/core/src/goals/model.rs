use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::sync::SyncRecord;

/// A savings goal the user is working toward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target_amount: Decimal,
    pub saved_amount: Decimal,
    pub is_achieved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub target_amount: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_achieved: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalFilter {
    pub is_achieved: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSummary {
    pub count: usize,
    pub achieved_count: usize,
    pub total_target: Decimal,
    pub total_saved: Decimal,
}

pub fn summarize_goals(records: &[Goal]) -> GoalSummary {
    let mut summary = GoalSummary {
        count: records.len(),
        achieved_count: 0,
        total_target: Decimal::ZERO,
        total_saved: Decimal::ZERO,
    };
    for record in records {
        if record.is_achieved {
            summary.achieved_count += 1;
        }
        summary.total_target += record.target_amount;
        summary.total_saved += record.saved_amount;
    }
    summary
}

impl SyncRecord for Goal {
    type Draft = NewGoal;
    type Patch = GoalUpdate;
    type Filter = GoalFilter;

    fn collection() -> &'static str {
        "goals"
    }

    fn entity_name() -> &'static str {
        "goal"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_draft(draft: NewGoal, id: String) -> Self {
        Goal {
            id,
            title: draft.title,
            description: draft.description,
            target_amount: draft.target_amount,
            saved_amount: Decimal::ZERO,
            is_achieved: false,
            created_at: Utc::now(),
        }
    }

    fn matches(&self, filter: &GoalFilter) -> bool {
        match filter.is_achieved {
            Some(flag) => self.is_achieved == flag,
            None => true,
        }
    }
}
