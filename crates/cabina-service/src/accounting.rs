//! # Accounting & Reports Service
//!
//! The manual drawer ledger and the two reporting entry points: the
//! drawer (Caja) report for a day range, and the per-day monthly
//! breakdown. Rows are fetched by the repositories; the folding is done
//! by the pure tallies in `cabina_core::reports`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use cabina_core::reports::{CashReport, DailySessionTotals, MonthlyTotals};
use cabina_core::validation::{validate_amount, validate_detail};
use cabina_core::{days, CashMovement, Money, MovementKind, ValidationError};
use cabina_db::Database;

use crate::error::ServiceResult;

/// The monthly report: per-business-day rows plus month sums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DailySessionTotals>,
    pub totals: MonthlyTotals,
}

/// Drawer ledger and report operations.
#[derive(Debug, Clone)]
pub struct AccountingService {
    db: Database,
}

impl AccountingService {
    /// Creates a new AccountingService over a database handle.
    pub fn new(db: Database) -> Self {
        AccountingService { db }
    }

    /// Records a manual drawer movement (ingreso/egreso).
    pub async fn record_movement(
        &self,
        kind: MovementKind,
        amount: Money,
        detail: &str,
    ) -> ServiceResult<CashMovement> {
        validate_amount("amount", amount)?;
        validate_detail(detail)?;

        let movement = self
            .db
            .movements()
            .insert(kind, amount.cents(), detail.trim())
            .await?;

        info!(?kind, %amount, "Cash movement recorded");
        Ok(movement)
    }

    /// Drawer movements over a business-day range.
    pub async fn movements(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ServiceResult<Vec<CashMovement>> {
        let (start, end) = days::business_day_range(from, to);
        Ok(self.db.movements().list_between(start, end).await?)
    }

    /// The drawer report for a business-day range: session tender per
    /// method, debt carried, still-open consumption, debt recoveries,
    /// and manual movements.
    pub async fn cash_report(&self, from: NaiveDate, to: NaiveDate) -> ServiceResult<CashReport> {
        let (start, end) = days::business_day_range(from, to);

        let sessions = self.db.sessions().list_started_between(start, end).await?;
        let open_lines = self
            .db
            .consumptions()
            .list_open_lines_between(start, end)
            .await?;
        let movements = self.db.movements().list_between(start, end).await?;
        let payments = self.db.debts().payments_between(start, end).await?;

        Ok(CashReport::tally(
            &sessions,
            &open_lines,
            &movements,
            &payments,
        ))
    }

    /// Per-business-day session totals for a month.
    pub async fn monthly_sessions(&self, year: i32, month: u32) -> ServiceResult<MonthlyReport> {
        let (start, end) =
            days::month_range(year, month).ok_or(ValidationError::OutOfRange {
                field: "month".to_string(),
                min: 1,
                max: 12,
            })?;

        let day_rows = self.db.reports().daily_session_totals(start, end).await?;
        let totals = MonthlyTotals::from_days(&day_rows);

        Ok(MonthlyReport {
            year,
            month,
            days: day_rows,
            totals,
        })
    }
}
