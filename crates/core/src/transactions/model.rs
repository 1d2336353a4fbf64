//! Transaction domain models.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::sync::SyncRecord;

/// Direction of a transaction. Amounts are stored positive; the kind carries
/// the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// A single money movement on one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub description: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Fields of a transaction that does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub description: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub date: NaiveDate,
}

/// Partial update; unset fields keep their current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// In-memory narrowing of a transaction collection read.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub account_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Aggregations over whatever transaction collection is materialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
    pub count: usize,
    pub expenses_by_category: HashMap<String, Decimal>,
}

/// Compute totals over a set of transactions.
pub fn summarize_transactions(records: &[Transaction]) -> TransactionSummary {
    let mut income = Decimal::ZERO;
    let mut expenses = Decimal::ZERO;
    let mut expenses_by_category: HashMap<String, Decimal> = HashMap::new();

    for record in records {
        match record.kind {
            TransactionKind::Income => income += record.amount,
            TransactionKind::Expense => {
                expenses += record.amount;
                let category = record
                    .category
                    .clone()
                    .unwrap_or_else(|| "uncategorized".to_string());
                *expenses_by_category.entry(category).or_insert(Decimal::ZERO) += record.amount;
            }
        }
    }

    TransactionSummary {
        income,
        expenses,
        net: income - expenses,
        count: records.len(),
        expenses_by_category,
    }
}

impl SyncRecord for Transaction {
    type Draft = NewTransaction;
    type Patch = TransactionUpdate;
    type Filter = TransactionFilter;

    fn collection() -> &'static str {
        "transactions"
    }

    fn entity_name() -> &'static str {
        "transaction"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_draft(draft: NewTransaction, id: String) -> Self {
        Transaction {
            id,
            description: draft.description,
            amount: draft.amount,
            kind: draft.kind,
            category: draft.category,
            account_id: draft.account_id,
            date: draft.date,
            created_at: Utc::now(),
        }
    }

    fn matches(&self, filter: &TransactionFilter) -> bool {
        if let Some(kind) = filter.kind {
            if self.kind != kind {
                return false;
            }
        }
        if let Some(category) = &filter.category {
            if self.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(account_id) = &filter.account_id {
            if self.account_id.as_deref() != Some(account_id.as_str()) {
                return false;
            }
        }
        if let Some(from) = filter.from {
            if self.date < from {
                return false;
            }
        }
        if let Some(to) = filter.to {
            if self.date > to {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn txn(kind: TransactionKind, amount: Decimal, category: Option<&str>) -> Transaction {
        Transaction {
            id: "rec-1".to_string(),
            description: "test".to_string(),
            amount,
            kind,
            category: category.map(str::to_string),
            account_id: None,
            date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn summary_separates_income_from_expenses() {
        let records = vec![
            txn(TransactionKind::Income, dec!(1200), None),
            txn(TransactionKind::Expense, dec!(5), Some("coffee")),
            txn(TransactionKind::Expense, dec!(45.50), Some("groceries")),
            txn(TransactionKind::Expense, dec!(12), Some("coffee")),
        ];
        let summary = summarize_transactions(&records);
        assert_eq!(summary.income, dec!(1200));
        assert_eq!(summary.expenses, dec!(62.50));
        assert_eq!(summary.net, dec!(1137.50));
        assert_eq!(summary.count, 4);
        assert_eq!(summary.expenses_by_category["coffee"], dec!(17));
    }

    #[test]
    fn uncategorized_expenses_get_their_own_bucket() {
        let summary = summarize_transactions(&[txn(TransactionKind::Expense, dec!(9), None)]);
        assert_eq!(summary.expenses_by_category["uncategorized"], dec!(9));
    }

    #[test]
    fn filter_combines_all_constraints() {
        let record = txn(TransactionKind::Expense, dec!(5), Some("coffee"));

        let mut filter = TransactionFilter {
            kind: Some(TransactionKind::Expense),
            category: Some("coffee".to_string()),
            ..Default::default()
        };
        assert!(record.matches(&filter));

        filter.from = Some(NaiveDate::from_ymd_opt(2026, 8, 15).unwrap());
        assert!(!record.matches(&filter));
    }

    #[test]
    fn wire_shape_is_camel_case() {
        let record = txn(TransactionKind::Expense, dec!(5), None);
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("created_at").is_none());
        assert_eq!(value["kind"], "expense");
    }
}
