//! # Debt Repository
//!
//! Database operations for the debt ledger.
//!
//! ## Debt State Machine
//! ```text
//! outstanding ──[payment brings remaining to 0]──► settled (terminal)
//! ```
//!
//! A payment and its balance decrement are one transaction, and the
//! decrement is conditional (`settled = 0 AND remaining >= amount`), so
//! two terminals posting against the same debt cannot drive the balance
//! negative - the loser's statement affects zero rows and the whole
//! posting rolls back.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::new_id;
use cabina_core::{Debt, DebtPayment, PaymentMethod};

const DEBT_COLUMNS: &str = "id, client_id, session_id, seat_number, \
     original_cents, remaining_cents, settled, created_at";

const PAYMENT_COLUMNS: &str = "id, debt_id, amount_cents, method, detail, created_at";

/// Result of posting a payment against a debt.
#[derive(Debug)]
pub enum PostPaymentOutcome {
    /// Payment recorded; the updated debt is returned.
    Posted { debt: Debt, payment: DebtPayment },
    /// The debt was already settled, or the amount exceeded the balance
    /// that was actually left when the statement ran.
    Rejected,
}

/// Repository for debt database operations.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    pool: SqlitePool,
}

impl DebtRepository {
    /// Creates a new DebtRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DebtRepository { pool }
    }

    /// Gets a debt by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Debt>> {
        let debt = sqlx::query_as::<_, Debt>(&format!(
            "SELECT {DEBT_COLUMNS} FROM debts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(debt)
    }

    /// Posts a payment ("abono") against a debt.
    ///
    /// One transaction: the conditional balance decrement, the derived
    /// settled flag, and the payment row. The decrement only succeeds
    /// while the debt is outstanding and the amount fits the remaining
    /// balance.
    pub async fn post_payment(
        &self,
        debt_id: &str,
        amount_cents: i64,
        method: PaymentMethod,
        detail: Option<&str>,
    ) -> StoreResult<PostPaymentOutcome> {
        debug!(debt_id = %debt_id, amount = amount_cents, ?method, "Posting debt payment");

        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM debts WHERE id = ?1")
            .bind(debt_id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            return Err(StoreError::not_found("Debt", debt_id));
        }

        let decremented = sqlx::query(
            r#"
            UPDATE debts SET
                remaining_cents = remaining_cents - ?2,
                settled = CASE WHEN remaining_cents - ?2 <= 0 THEN 1 ELSE 0 END
            WHERE id = ?1 AND settled = 0 AND remaining_cents >= ?2
            "#,
        )
        .bind(debt_id)
        .bind(amount_cents)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            return Ok(PostPaymentOutcome::Rejected);
        }

        let payment = DebtPayment {
            id: new_id(),
            debt_id: debt_id.to_string(),
            amount_cents,
            method,
            detail: detail.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO debt_payments (id, debt_id, amount_cents, method, detail, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.debt_id)
        .bind(payment.amount_cents)
        .bind(payment.method)
        .bind(&payment.detail)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?;

        let debt = sqlx::query_as::<_, Debt>(&format!(
            "SELECT {DEBT_COLUMNS} FROM debts WHERE id = ?1"
        ))
        .bind(debt_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PostPaymentOutcome::Posted { debt, payment })
    }

    /// Sum of payments posted against a debt (reconciliation read).
    pub async fn paid_sum(&self, debt_id: &str) -> StoreResult<i64> {
        let sum: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM debt_payments WHERE debt_id = ?1",
        )
        .bind(debt_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(sum)
    }

    /// Payments posted against a debt, oldest first.
    pub async fn payments_for_debt(&self, debt_id: &str) -> StoreResult<Vec<DebtPayment>> {
        let payments = sqlx::query_as::<_, DebtPayment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM debt_payments
            WHERE debt_id = ?1
            ORDER BY created_at
            "#
        ))
        .bind(debt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// All payments within a UTC range (drawer report).
    pub async fn payments_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<DebtPayment>> {
        let payments = sqlx::query_as::<_, DebtPayment>(&format!(
            r#"
            SELECT {PAYMENT_COLUMNS} FROM debt_payments
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at
            "#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// A client's debts within a UTC range, optionally filtered by
    /// settled state (the debt screen's toggle).
    pub async fn list_for_client(
        &self,
        client_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        settled: Option<bool>,
    ) -> StoreResult<Vec<Debt>> {
        let debts = match settled {
            Some(settled) => {
                sqlx::query_as::<_, Debt>(&format!(
                    r#"
                    SELECT {DEBT_COLUMNS} FROM debts
                    WHERE client_id = ?1 AND created_at >= ?2 AND created_at < ?3
                          AND settled = ?4
                    ORDER BY created_at DESC
                    "#
                ))
                .bind(client_id)
                .bind(start)
                .bind(end)
                .bind(settled)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Debt>(&format!(
                    r#"
                    SELECT {DEBT_COLUMNS} FROM debts
                    WHERE client_id = ?1 AND created_at >= ?2 AND created_at < ?3
                    ORDER BY created_at DESC
                    "#
                ))
                .bind(client_id)
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(debts)
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

    /// Opens and closes a session with the given shortfall, returning the
    /// created debt.
    async fn debt_fixture(db: &Database, debt_cents: i64) -> Debt {
        let seat = db.seats().insert("PC01", 1).await.unwrap();
        let client = db.clients().insert("María", None).await.unwrap();
        let OpenOutcome::Opened(session) = db.sessions().open(&client.id, &seat.id).await.unwrap()
        else {
            panic!("open failed");
        };

        let record = CloseRecord {
            total_cents: debt_cents,
            debt_cents,
            ..CloseRecord::default()
        };
        match db.sessions().close(&session.id, &record).await.unwrap() {
            CloseOutcome::Closed { debt, .. } => debt,
            other => panic!("expected close, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_partial_then_full_payment_settles() {
        let db = Database::in_memory().await.unwrap();
        let debt = debt_fixture(&db, 500).await;
        let repo = db.debts();

        let outcome = repo
            .post_payment(&debt.id, 200, PaymentMethod::Yape, Some("primer abono"))
            .await
            .unwrap();
        let PostPaymentOutcome::Posted { debt: updated, .. } = outcome else {
            panic!("expected posted");
        };
        assert_eq!(updated.remaining_cents, 300);
        assert!(!updated.settled);

        let outcome = repo
            .post_payment(&debt.id, 300, PaymentMethod::Cash, None)
            .await
            .unwrap();
        let PostPaymentOutcome::Posted { debt: updated, .. } = outcome else {
            panic!("expected posted");
        };
        assert_eq!(updated.remaining_cents, 0);
        assert!(updated.settled);

        // Settled is terminal: further postings are rejected.
        let outcome = repo
            .post_payment(&debt.id, 100, PaymentMethod::Cash, None)
            .await
            .unwrap();
        assert!(matches!(outcome, PostPaymentOutcome::Rejected));
    }

    #[tokio::test]
    async fn test_overpayment_is_rejected_at_the_store() {
        let db = Database::in_memory().await.unwrap();
        let debt = debt_fixture(&db, 500).await;
        let repo = db.debts();

        let outcome = repo
            .post_payment(&debt.id, 600, PaymentMethod::Cash, None)
            .await
            .unwrap();
        assert!(matches!(outcome, PostPaymentOutcome::Rejected));

        // Balance untouched, no orphaned payment row.
        let debt = repo.get_by_id(&debt.id).await.unwrap().unwrap();
        assert_eq!(debt.remaining_cents, 500);
        assert_eq!(repo.paid_sum(&debt.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_balance_reconciles_against_payment_ledger() {
        let db = Database::in_memory().await.unwrap();
        let debt = debt_fixture(&db, 1000).await;
        let repo = db.debts();

        repo.post_payment(&debt.id, 400, PaymentMethod::Plin, None)
            .await
            .unwrap();
        repo.post_payment(&debt.id, 100, PaymentMethod::Cash, None)
            .await
            .unwrap();

        let stored = repo.get_by_id(&debt.id).await.unwrap().unwrap();
        let paid = repo.paid_sum(&debt.id).await.unwrap();
        assert_eq!(stored.original_cents - paid, stored.remaining_cents);
    }

    #[tokio::test]
    async fn test_unknown_debt_is_not_found() {
        let db = Database::in_memory().await.unwrap();
        let err = db
            .debts()
            .post_payment("no-such-debt", 100, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
