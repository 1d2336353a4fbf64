//! Account domain models.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::sync::SyncRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
    Credit,
    Cash,
    Investment,
}

/// A user account holding a balance in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub kind: AccountKind,
    pub currency: String,
    pub balance: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub currency: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<AccountKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub kind: Option<AccountKind>,
    pub currency: Option<String>,
    pub is_active: Option<bool>,
}

/// Balance totals over the materialized account collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub count: usize,
    pub active_count: usize,
    pub total_balance_by_currency: HashMap<String, Decimal>,
}

pub fn summarize_accounts(records: &[Account]) -> AccountSummary {
    let mut total_balance_by_currency: HashMap<String, Decimal> = HashMap::new();
    let mut active_count = 0;
    for record in records {
        if record.is_active {
            active_count += 1;
        }
        *total_balance_by_currency
            .entry(record.currency.clone())
            .or_insert(Decimal::ZERO) += record.balance;
    }
    AccountSummary {
        count: records.len(),
        active_count,
        total_balance_by_currency,
    }
}

impl SyncRecord for Account {
    type Draft = NewAccount;
    type Patch = AccountUpdate;
    type Filter = AccountFilter;

    fn collection() -> &'static str {
        "accounts"
    }

    fn entity_name() -> &'static str {
        "account"
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn from_draft(draft: NewAccount, id: String) -> Self {
        Account {
            id,
            name: draft.name,
            kind: draft.kind,
            currency: draft.currency,
            balance: draft.balance,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn matches(&self, filter: &AccountFilter) -> bool {
        if let Some(kind) = filter.kind {
            if self.kind != kind {
                return false;
            }
        }
        if let Some(currency) = &filter.currency {
            if &self.currency != currency {
                return false;
            }
        }
        if let Some(is_active) = filter.is_active {
            if self.is_active != is_active {
                return false;
            }
        }
        true
    }
}
