//! # Cash Movement Repository
//!
//! Database operations for the manual drawer ledger (ingresos/egresos).
//! Append-only; a wrong movement is corrected by a counter-movement.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::StoreResult;
use crate::repository::new_id;
use cabina_core::{CashMovement, MovementKind};

/// Repository for cash-movement database operations.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Records a manual drawer movement.
    pub async fn insert(
        &self,
        kind: MovementKind,
        amount_cents: i64,
        detail: &str,
    ) -> StoreResult<CashMovement> {
        let movement = CashMovement {
            id: new_id(),
            kind,
            amount_cents,
            detail: detail.to_string(),
            created_at: Utc::now(),
        };

        debug!(?kind, amount = amount_cents, "Recording cash movement");

        sqlx::query(
            r#"
            INSERT INTO cash_movements (id, kind, amount_cents, detail, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&movement.id)
        .bind(movement.kind)
        .bind(movement.amount_cents)
        .bind(&movement.detail)
        .bind(movement.created_at)
        .execute(&self.pool)
        .await?;

        Ok(movement)
    }

    /// Movements within a UTC range, oldest first.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<CashMovement>> {
        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, kind, amount_cents, detail, created_at
            FROM cash_movements
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
