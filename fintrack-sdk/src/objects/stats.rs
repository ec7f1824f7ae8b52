use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;

/// Aggregate statistics for one owner's ledger.
///
/// Everything except `generated_at` is a pure function of the owner's
/// transaction list. Category maps only contain categories with at least
/// one contributing transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceStats {
    pub user_id: String,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub average_income: Decimal,
    pub average_expense: Decimal,
    #[serde(default)]
    pub income_by_category: HashMap<String, Decimal>,
    #[serde(default)]
    pub expense_by_category: HashMap<String, Decimal>,
    pub transactions_count: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_maps_default_to_empty_when_missing() {
        let json = r#"{
            "user_id": "u1",
            "total_income": "0",
            "total_expense": "0",
            "balance": "0",
            "average_income": "0",
            "average_expense": "0",
            "transactions_count": 0,
            "generated_at": "2024-05-01T12:00:00Z"
        }"#;
        let stats: FinanceStats = serde_json::from_str(json).unwrap();
        assert!(stats.income_by_category.is_empty());
        assert!(stats.expense_by_category.is_empty());
    }
}
