//! # Report Tallies
//!
//! Pure client-side aggregation for the reporting screens. Repositories
//! fetch the raw rows for a date range; everything here just folds them.
//! Keeping the folds out of SQL means the figures are unit-testable
//! against hand-computed fixtures, and every screen that re-tallies the
//! same rows gets the same numbers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CashMovement, Consumption, DebtPayment, MovementKind, PaymentMethod, Session};

// =============================================================================
// Per-Method Totals
// =============================================================================

/// Money totals broken down by payment method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MethodTotals {
    pub cash: Money,
    pub yape: Money,
    pub plin: Money,
}

impl MethodTotals {
    fn add(&mut self, method: PaymentMethod, amount: Money) {
        match method {
            PaymentMethod::Cash => self.cash += amount,
            PaymentMethod::Yape => self.yape += amount,
            PaymentMethod::Plin => self.plin += amount,
        }
    }

    #[inline]
    pub fn total(&self) -> Money {
        self.cash + self.yape + self.plin
    }
}

// =============================================================================
// Cash Report (drawer reconciliation)
// =============================================================================

/// The drawer report for a business-day range.
///
/// Session figures come from the tender columns frozen at close; debt
/// recoveries come from the abono ledger; manual movements from the
/// drawer ledger. Open sessions contribute their accrued-but-uncollected
/// consumption as `outstanding`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashReport {
    /// Session tender, per method, over the range.
    pub sessions: MethodTotals,
    /// Debt carried out of session closes in the range.
    pub session_debt: Money,
    /// Accrued consumption on still-active sessions (not yet collected).
    pub outstanding: Money,
    /// Debt recoveries (abonos), per method.
    pub recovered: MethodTotals,
    /// Manual drawer income.
    pub income: Money,
    /// Manual drawer expense.
    pub expense: Money,
}

impl CashReport {
    /// Folds the fetched rows into a report.
    ///
    /// `open_lines` are the consumption rows belonging to sessions that
    /// are still active within the range.
    pub fn tally(
        sessions: &[Session],
        open_lines: &[Consumption],
        movements: &[CashMovement],
        payments: &[DebtPayment],
    ) -> Self {
        let mut report = CashReport::default();

        for session in sessions {
            report.sessions.cash += Money::from_cents(session.cash_cents);
            report.sessions.yape += Money::from_cents(session.yape_cents);
            report.sessions.plin += Money::from_cents(session.plin_cents);
            report.session_debt += session.debt();
        }

        report.outstanding = open_lines.iter().map(Consumption::amount).sum();

        for movement in movements {
            match movement.kind {
                MovementKind::Ingreso => report.income += movement.amount(),
                MovementKind::Egreso => report.expense += movement.amount(),
            }
        }

        for payment in payments {
            report.recovered.add(payment.method, payment.amount());
        }

        report
    }

    /// Yape received, sessions plus debt recoveries.
    #[inline]
    pub fn yape_with_recovered(&self) -> Money {
        self.sessions.yape + self.recovered.yape
    }

    /// Plin received, sessions plus debt recoveries.
    #[inline]
    pub fn plin_with_recovered(&self) -> Money {
        self.sessions.plin + self.recovered.plin
    }

    /// Physical cash in the drawer: session cash, cash abonos, and manual
    /// income.
    #[inline]
    pub fn cash_in_drawer(&self) -> Money {
        self.sessions.cash + self.recovered.cash + self.income
    }

    /// Sales figure for the range: everything sessions produced, whether
    /// collected or carried as debt.
    #[inline]
    pub fn total_sale(&self) -> Money {
        self.sessions.total() + self.session_debt
    }

    /// Grand total across sales, recoveries and manual movements.
    #[inline]
    pub fn grand_total(&self) -> Money {
        self.total_sale() + self.recovered.total() + self.income - self.expense
    }
}

// =============================================================================
// Monthly Session Totals
// =============================================================================

/// One business day's session figures inside a monthly report.
///
/// Produced by the store-side monthly aggregate; the day column follows
/// the 06:00 América/Lima boundary (see [`crate::days`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailySessionTotals {
    #[ts(as = "String")]
    pub day: NaiveDate,
    pub sessions: i64,
    pub total_cents: i64,
    pub yape_cents: i64,
    pub plin_cents: i64,
    pub cash_cents: i64,
    pub debt_cents: i64,
}

impl DailySessionTotals {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Month-level sums over the per-day rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyTotals {
    pub sessions: i64,
    pub total: Money,
    pub yape: Money,
    pub plin: Money,
    pub cash: Money,
    pub debt: Money,
}

impl MonthlyTotals {
    pub fn from_days(days: &[DailySessionTotals]) -> Self {
        let mut totals = MonthlyTotals::default();
        for day in days {
            totals.sessions += day.sessions;
            totals.total += Money::from_cents(day.total_cents);
            totals.yape += Money::from_cents(day.yape_cents);
            totals.plin += Money::from_cents(day.plin_cents);
            totals.cash += Money::from_cents(day.cash_cents);
            totals.debt += Money::from_cents(day.debt_cents);
        }
        totals
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
