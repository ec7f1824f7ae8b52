//! Pure aggregate computation over a transaction list.

use fintrack_sdk::objects::{FinanceStats, Transaction, TransactionKind};
use rust_decimal::Decimal;
use std::collections::HashMap;
use time::OffsetDateTime;

/// Compute aggregate statistics for one owner's complete transaction list.
///
/// Deterministic in everything but `generated_at`: the same input multiset
/// always yields the same sums, averages and category maps. The owner id
/// is taken from the first element and is empty for an empty input. No
/// validation happens here; upstream data is trusted.
pub fn calculate_stats(transactions: &[Transaction]) -> FinanceStats {
    let mut stats = FinanceStats {
        user_id: transactions
            .first()
            .map(|tx| tx.user_id.clone())
            .unwrap_or_default(),
        total_income: Decimal::ZERO,
        total_expense: Decimal::ZERO,
        balance: Decimal::ZERO,
        average_income: Decimal::ZERO,
        average_expense: Decimal::ZERO,
        income_by_category: HashMap::new(),
        expense_by_category: HashMap::new(),
        transactions_count: transactions.len(),
        generated_at: OffsetDateTime::now_utc(),
    };

    let mut income_samples: u64 = 0;
    let mut expense_samples: u64 = 0;

    for tx in transactions {
        match tx.kind {
            TransactionKind::Income => {
                stats.total_income += tx.amount;
                income_samples += 1;
                *stats
                    .income_by_category
                    .entry(tx.category.clone())
                    .or_insert(Decimal::ZERO) += tx.amount;
            }
            TransactionKind::Expense => {
                stats.total_expense += tx.amount;
                expense_samples += 1;
                *stats
                    .expense_by_category
                    .entry(tx.category.clone())
                    .or_insert(Decimal::ZERO) += tx.amount;
            }
        }
    }

    stats.balance = stats.total_income - stats.total_expense;
    stats.average_income = average(stats.total_income, income_samples);
    stats.average_expense = average(stats.total_expense, expense_samples);

    stats
}

fn average(sum: Decimal, samples: u64) -> Decimal {
    if samples == 0 {
        Decimal::ZERO
    } else {
        sum / Decimal::from(samples)
    }
}
