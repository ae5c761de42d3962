//! How much of each budget has been spent over a period.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    budget::core::{Budget, map_budget_row},
    date_range::DateRange,
    money::Money,
    user::UserID,
};

/// The spending in a budget's category over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetProgress {
    pub budget: Budget,
    pub category_name: String,
    /// The sum of the expenses in the category.
    pub spent: Money,
    /// `spent` as a percentage of the limit, never more than 100.
    pub percent: f64,
    /// Whether more than the limit has been spent.
    pub over_limit: bool,
}

/// The progress of each of the user's budgets over `range`, ordered by category name.
pub fn get_budget_progress(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<BudgetProgress>, Error> {
    connection
        .prepare(
            "SELECT b.id, b.user_id, b.category_id, b.amount_limit, c.name, \
                COALESCE(SUM(t.amount), 0) \
             FROM budget b \
             INNER JOIN category c ON c.id = b.category_id \
             LEFT JOIN \"transaction\" t \
                ON t.category_id = b.category_id \
                AND t.user_id = b.user_id \
                AND t.kind = 'expense' \
                AND t.date BETWEEN ?2 AND ?3 \
             WHERE b.user_id = ?1 \
             GROUP BY b.id \
             ORDER BY c.name ASC",
        )?
        .query_map((user_id, range.start, range.end), |row| {
            let budget = map_budget_row(row)?;
            let category_name = row.get(4)?;
            let spent = row.get(5)?;

            Ok(build_progress(budget, category_name, spent))
        })?
        .map(|maybe_progress| maybe_progress.map_err(Error::from))
        .collect()
}

fn build_progress(budget: Budget, category_name: String, spent: Money) -> BudgetProgress {
    let percent = spent_percent(spent, budget.limit);
    let over_limit = spent > budget.limit;

    BudgetProgress {
        budget,
        category_name,
        spent,
        percent,
        over_limit,
    }
}

/// `spent` as a percentage of `limit`, between 0 and 100.
///
/// A zero limit is fully used as soon as anything is spent.
pub fn spent_percent(spent: Money, limit: Money) -> f64 {
    match spent.percentage_of(limit) {
        Some(percent) => percent.clamp(0.0, 100.0),
        None if spent.is_positive() => 100.0,
        None => 0.0,
    }
}

#[cfg(test)]
mod percent_tests {
    use crate::money::Money;

    use super::spent_percent;

    #[test]
    fn partial_spending() {
        assert_eq!(
            spent_percent(Money::from_cents(2_500), Money::from_cents(10_000)),
            25.0
        );
    }

    #[test]
    fn capped_at_one_hundred() {
        assert_eq!(
            spent_percent(Money::from_cents(15_000), Money::from_cents(10_000)),
            100.0
        );
    }

    #[test]
    fn zero_limit() {
        assert_eq!(spent_percent(Money::ZERO, Money::ZERO), 0.0);
        assert_eq!(spent_percent(Money::from_cents(1), Money::ZERO), 100.0);
    }
}
