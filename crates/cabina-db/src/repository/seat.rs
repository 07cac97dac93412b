//! # Seat Repository
//!
//! Database operations for the seat registry.
//!
//! Seat status is the most contended column in the system: two cashier
//! terminals can act on the same seat inside one round-trip window. Every
//! status change here is a conditional UPDATE (`WHERE status = <expected>`)
//! whose `rows_affected` tells the caller whether it won.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::new_id;
use cabina_core::{Seat, SeatGroup, SeatStatus};

/// Repository for seat database operations.
#[derive(Debug, Clone)]
pub struct SeatRepository {
    pool: SqlitePool,
}

impl SeatRepository {
    /// Creates a new SeatRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SeatRepository { pool }
    }

    /// Inserts a new seat (provisioning / seed path).
    pub async fn insert(&self, number: &str, group_id: i64) -> StoreResult<Seat> {
        let seat = Seat {
            id: new_id(),
            number: number.to_string(),
            status: SeatStatus::Available,
            group_id,
            pos_x: 0.0,
            pos_y: 0.0,
            created_at: Utc::now(),
        };

        debug!(id = %seat.id, number = %seat.number, "Inserting seat");

        sqlx::query(
            r#"
            INSERT INTO seats (id, number, status, group_id, pos_x, pos_y, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&seat.id)
        .bind(&seat.number)
        .bind(seat.status)
        .bind(seat.group_id)
        .bind(seat.pos_x)
        .bind(seat.pos_y)
        .bind(seat.created_at)
        .execute(&self.pool)
        .await?;

        Ok(seat)
    }

    /// Gets a seat by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Seat>> {
        let seat = sqlx::query_as::<_, Seat>(
            r#"
            SELECT id, number, status, group_id, pos_x, pos_y, created_at
            FROM seats
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(seat)
    }

    /// Lists all seats, ordered by display number.
    pub async fn list(&self) -> StoreResult<Vec<Seat>> {
        let seats = sqlx::query_as::<_, Seat>(
            r#"
            SELECT id, number, status, group_id, pos_x, pos_y, created_at
            FROM seats
            ORDER BY number
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(seats)
    }

    /// Lists seats currently available (the move-session picker).
    pub async fn list_available(&self) -> StoreResult<Vec<Seat>> {
        let seats = sqlx::query_as::<_, Seat>(
            r#"
            SELECT id, number, status, group_id, pos_x, pos_y, created_at
            FROM seats
            WHERE status = 'available'
            ORDER BY number
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(seats)
    }

    /// Conditionally transitions a seat's status.
    ///
    /// Returns `true` if this call won the transition, `false` if the
    /// seat was no longer in `from` (another terminal got there first).
    ///
    /// ## Example
    /// ```rust,ignore
    /// // Flag a seat for maintenance only if it is currently free:
    /// let ok = repo
    ///     .try_transition(&seat_id, SeatStatus::Available, SeatStatus::Maintenance)
    ///     .await?;
    /// ```
    pub async fn try_transition(
        &self,
        id: &str,
        from: SeatStatus,
        to: SeatStatus,
    ) -> StoreResult<bool> {
        debug!(id = %id, ?from, ?to, "Seat status transition");

        let result = sqlx::query(
            r#"
            UPDATE seats SET status = ?3
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Unconditionally sets a seat's status (administrative path; the
    /// lifecycle code never calls this).
    pub async fn set_status(&self, id: &str, status: SeatStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE seats SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Seat", id));
        }

        Ok(())
    }

    /// Updates a seat's dashboard position. Pure view-state.
    pub async fn update_position(&self, id: &str, x: f64, y: f64) -> StoreResult<()> {
        let result = sqlx::query("UPDATE seats SET pos_x = ?2, pos_y = ?3 WHERE id = ?1")
            .bind(id)
            .bind(x)
            .bind(y)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Seat", id));
        }

        Ok(())
    }

    /// Inserts a pricing tier.
    pub async fn insert_group(&self, id: i64, name: &str) -> StoreResult<SeatGroup> {
        let group = SeatGroup {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO seat_groups (id, name, created_at)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(group.created_at)
        .execute(&self.pool)
        .await?;

        Ok(group)
    }

    /// Counts seats (seed guard).
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seats")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
