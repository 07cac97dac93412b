//! # Consumption Repository
//!
//! Database operations for the per-session consumption ledger.
//!
//! The session row caches the paid-line sum in `advance_payment_cents`
//! so the tender screen reads it without re-aggregating. The cache is
//! refreshed inside the same transaction as every ledger mutation - paid
//! toggles, quantity edits and removals alike - so it can never drift
//! from the rows it summarizes.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::new_id;
use cabina_core::Consumption;

const CONSUMPTION_COLUMNS: &str =
    "id, session_id, product_name, quantity, price_cents, amount_cents, paid, created_at";

/// Fresh ledger sums for one session.
#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct LedgerTotals {
    /// Sum of all line amounts.
    pub total_cents: i64,
    /// Sum of the paid lines only.
    pub advance_cents: i64,
}

/// Repository for consumption database operations.
#[derive(Debug, Clone)]
pub struct ConsumptionRepository {
    pool: SqlitePool,
}

impl ConsumptionRepository {
    /// Creates a new ConsumptionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ConsumptionRepository { pool }
    }

    /// Inserts a line for a product: quantity 1, price snapshotted.
    pub async fn insert(
        &self,
        session_id: &str,
        product_name: &str,
        price_cents: i64,
    ) -> StoreResult<Consumption> {
        let line = Consumption {
            id: new_id(),
            session_id: session_id.to_string(),
            product_name: product_name.to_string(),
            quantity: 1,
            price_cents,
            amount_cents: price_cents,
            paid: false,
            created_at: Utc::now(),
        };

        debug!(session_id = %session_id, product = %product_name, "Adding consumption");

        sqlx::query(
            r#"
            INSERT INTO consumptions (id, session_id, product_name, quantity,
                                      price_cents, amount_cents, paid, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&line.id)
        .bind(&line.session_id)
        .bind(&line.product_name)
        .bind(line.quantity)
        .bind(line.price_cents)
        .bind(line.amount_cents)
        .bind(line.paid)
        .bind(line.created_at)
        .execute(&self.pool)
        .await?;

        Ok(line)
    }

    /// Gets a line by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Consumption>> {
        let line = sqlx::query_as::<_, Consumption>(&format!(
            "SELECT {CONSUMPTION_COLUMNS} FROM consumptions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// Lists a session's lines, oldest first.
    pub async fn list_for_session(&self, session_id: &str) -> StoreResult<Vec<Consumption>> {
        let lines = sqlx::query_as::<_, Consumption>(&format!(
            r#"
            SELECT {CONSUMPTION_COLUMNS} FROM consumptions
            WHERE session_id = ?1
            ORDER BY created_at
            "#
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Changes a line's quantity, keeping `amount = quantity × price`,
    /// and refreshes the session's advance cache in the same transaction.
    pub async fn set_quantity(&self, id: &str, quantity: i64) -> StoreResult<Consumption> {
        debug!(id = %id, quantity, "Updating consumption quantity");

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE consumptions
            SET quantity = ?2, amount_cents = ?2 * price_cents
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::not_found("Consumption", id));
        }

        let line = sqlx::query_as::<_, Consumption>(&format!(
            "SELECT {CONSUMPTION_COLUMNS} FROM consumptions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        refresh_advance(&mut tx, &line.session_id).await?;

        tx.commit().await?;

        Ok(line)
    }

    /// Sets a line's paid flag and refreshes the session's advance cache
    /// in the same transaction. Returns the new cache value.
    ///
    /// Idempotent: setting an already-paid line to paid recomputes the
    /// same sum.
    pub async fn set_paid(&self, id: &str, paid: bool) -> StoreResult<i64> {
        debug!(id = %id, paid, "Toggling consumption paid flag");

        let mut tx = self.pool.begin().await?;

        let session_id: Option<String> =
            sqlx::query_scalar("SELECT session_id FROM consumptions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(session_id) = session_id else {
            return Err(StoreError::not_found("Consumption", id));
        };

        sqlx::query("UPDATE consumptions SET paid = ?2 WHERE id = ?1")
            .bind(id)
            .bind(paid)
            .execute(&mut *tx)
            .await?;

        let advance = refresh_advance(&mut tx, &session_id).await?;

        tx.commit().await?;

        Ok(advance)
    }

    /// Removes a line and refreshes the session's advance cache in the
    /// same transaction.
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        debug!(id = %id, "Removing consumption");

        let mut tx = self.pool.begin().await?;

        let session_id: Option<String> =
            sqlx::query_scalar("SELECT session_id FROM consumptions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(session_id) = session_id else {
            return Err(StoreError::not_found("Consumption", id));
        };

        sqlx::query("DELETE FROM consumptions WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        refresh_advance(&mut tx, &session_id).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Fresh ledger sums for a session, straight from the rows.
    ///
    /// The close path uses this rather than trusting any cached figure.
    pub async fn totals_for_session(&self, session_id: &str) -> StoreResult<LedgerTotals> {
        let totals = sqlx::query_as::<_, LedgerTotals>(
            r#"
            SELECT
                COALESCE(SUM(amount_cents), 0) AS total_cents,
                COALESCE(SUM(CASE WHEN paid THEN amount_cents ELSE 0 END), 0) AS advance_cents
            FROM consumptions
            WHERE session_id = ?1
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(totals)
    }

    /// Lines belonging to sessions still active in a UTC range (the
    /// "accrued but uncollected" figure on the drawer report).
    pub async fn list_open_lines_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Consumption>> {
        let lines = sqlx::query_as::<_, Consumption>(
            r#"
            SELECT c.id, c.session_id, c.product_name, c.quantity,
                   c.price_cents, c.amount_cents, c.paid, c.created_at
            FROM consumptions c
            JOIN sessions s ON s.id = c.session_id
            WHERE s.status = 'active' AND s.start_time >= ?1 AND s.start_time < ?2
            ORDER BY c.created_at
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }
}

/// Recomputes and stores `sessions.advance_payment_cents` from the paid
/// lines. Runs inside the caller's transaction.
async fn refresh_advance(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    session_id: &str,
) -> StoreResult<i64> {
    let conn: &mut SqliteConnection = &mut *tx;

    sqlx::query(
        r#"
        UPDATE sessions SET advance_payment_cents = (
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM consumptions
            WHERE session_id = ?1 AND paid = 1
        )
        WHERE id = ?1
        "#,
    )
    .bind(session_id)
    .execute(&mut *conn)
    .await?;

    let advance: i64 =
        sqlx::query_scalar("SELECT advance_payment_cents FROM sessions WHERE id = ?1")
            .bind(session_id)
            .fetch_one(&mut *conn)
            .await?;

    Ok(advance)
}

// =============================================================================
// Unit Tests
// =============================================================================
