//! # Report Repository
//!
//! The one store-side aggregate: sessions grouped per business day for
//! the monthly report. Everything else the reporting screens show is
//! tallied client-side from plain range queries (see
//! `cabina_core::reports`).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StoreResult;
use cabina_core::reports::DailySessionTotals;

/// Repository for aggregate report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Per-business-day session totals for a UTC range.
    ///
    /// The day column shifts timestamps by −11 hours before taking the
    /// date: −5 for América/Lima plus the 06:00 opening hour, the same
    /// boundary `cabina_core::days` applies to range filters. A session
    /// opened at 01:30 local lands on the previous day's row, matching
    /// what the drawer count says.
    pub async fn daily_session_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<DailySessionTotals>> {
        debug!(%start, %end, "Aggregating daily session totals");

        let rows = sqlx::query_as::<_, DailySessionTotals>(
            r#"
            SELECT
                date(datetime(start_time, '-11 hours')) AS day,
                COUNT(*) AS sessions,
                COALESCE(SUM(total_cents), 0) AS total_cents,
                COALESCE(SUM(yape_cents), 0) AS yape_cents,
                COALESCE(SUM(plin_cents), 0) AS plin_cents,
                COALESCE(SUM(cash_cents), 0) AS cash_cents,
                COALESCE(SUM(debt_cents), 0) AS debt_cents
            FROM sessions
            WHERE start_time >= ?1 AND start_time < ?2
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Database;
    use crate::repository::session::{CloseOutcome, CloseRecord, OpenOutcome};
    use cabina_core::days;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_daily_totals_group_by_business_day() {
        let db = Database::in_memory().await.unwrap();
        let seat = db.seats().insert("PC01", 1).await.unwrap();
        let client = db.clients().insert("María", None).await.unwrap();

        // Two closed sessions today (in business-day terms).
        for (cash, debt) in [(1500i64, 0i64), (500, 300)] {
            let OpenOutcome::Opened(session) =
                db.sessions().open(&client.id, &seat.id).await.unwrap()
            else {
                panic!("open failed");
            };
            let record = CloseRecord {
                total_cents: cash + debt,
                cash_cents: cash,
                debt_cents: debt,
                ..CloseRecord::default()
            };
            let CloseOutcome::Closed { .. } =
                db.sessions().close(&session.id, &record).await.unwrap()
            else {
                panic!("close failed");
            };
        }

        let today = days::business_day_of(Utc::now());
        let (start, end) = days::business_day_range(today, today);
        let rows = db.reports().daily_session_totals(start, end).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sessions, 2);
        assert_eq!(rows[0].total_cents, 2300);
        assert_eq!(rows[0].cash_cents, 2000);
        assert_eq!(rows[0].debt_cents, 300);
        assert_eq!(rows[0].day, today);
    }

    #[tokio::test]
    async fn test_empty_range_yields_no_rows() {
        let db = Database::in_memory().await.unwrap();
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let (start, end) = days::business_day_range(day, day);
        let rows = db.reports().daily_session_totals(start, end).await.unwrap();
        assert!(rows.is_empty());
    }
}
