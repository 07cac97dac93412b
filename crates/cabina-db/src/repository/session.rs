//! # Session Repository
//!
//! Database operations for billing sessions.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Lifecycle                                 │
//! │                                                                         │
//! │  1. OPEN                                                                │
//! │     └── open() → seat available→occupied + active session row,          │
//! │         one transaction, conditional update decides the winner          │
//! │                                                                         │
//! │  2. ACCRUE                                                              │
//! │     └── consumption rows come and go (ConsumptionRepository)            │
//! │                                                                         │
//! │  3. (OPTIONAL) MOVE                                                     │
//! │     └── move_to() → target seat reserved first, origin freed last       │
//! │                                                                         │
//! │  4. CLOSE (exactly once)                                                │
//! │     └── close() → totals frozen, seat freed, debt row written,          │
//! │         one transaction                                                 │
//! │                                                                         │
//! │  (escape hatch) DELETE                                                  │
//! │     └── delete() → undo an erroneous open; no debt row                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each lifecycle method owns its transaction, so a crash mid-operation
//! leaves either everything or nothing; no partially-moved seats.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::new_id;
use cabina_core::{Debt, Session, SessionStatus};

const SESSION_COLUMNS: &str = r#"
    id, client_id, seat_id, seat_number, start_time, end_time, status,
    total_cents, advance_payment_cents, yape_cents, plin_cents, cash_cents,
    money_advance_cents, debt_cents, change_cents, observation, walkin_alias
"#;

// =============================================================================
// Lifecycle Outcomes
// =============================================================================

/// Result of an open attempt.
#[derive(Debug)]
pub enum OpenOutcome {
    /// The seat was reserved and the session inserted.
    Opened(Session),
    /// The seat was not available anymore (lost the race, or maintenance).
    SeatUnavailable,
}

/// Result of a move attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The target seat was taken between listing and clicking.
    TargetUnavailable,
    /// The session was closed or deleted under us.
    SessionNotActive,
}

/// Result of a close attempt.
#[derive(Debug)]
pub enum CloseOutcome {
    /// The session froze; the accompanying debt row is returned too.
    Closed { session: Session, debt: Debt },
    /// Someone else closed (or deleted) the session first.
    SessionNotActive,
}

/// The frozen figures written into the session row at close.
///
/// Computed by the service layer (fresh ledger sums through the
/// settlement function); this struct is just the wire between that
/// computation and the UPDATE.
#[derive(Debug, Clone, Default)]
pub struct CloseRecord {
    pub total_cents: i64,
    pub advance_payment_cents: i64,
    pub yape_cents: i64,
    pub plin_cents: i64,
    pub cash_cents: i64,
    pub money_advance_cents: i64,
    pub debt_cents: i64,
    pub change_cents: i64,
    pub observation: Option<String>,
    pub walkin_alias: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for session database operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Opens a session: reserves the seat and inserts the active row.
    ///
    /// The seat reservation is a conditional UPDATE; if another terminal
    /// occupied the seat since the caller looked at the floor map, this
    /// returns [`OpenOutcome::SeatUnavailable`] and writes nothing. The
    /// partial unique index on active sessions backstops the insert.
    pub async fn open(&self, client_id: &str, seat_id: &str) -> StoreResult<OpenOutcome> {
        debug!(client_id = %client_id, seat_id = %seat_id, "Opening session");

        let mut tx = self.pool.begin().await?;

        let seat_number: Option<String> =
            sqlx::query_scalar("SELECT number FROM seats WHERE id = ?1")
                .bind(seat_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(seat_number) = seat_number else {
            return Err(StoreError::not_found("Seat", seat_id));
        };

        let reserved = sqlx::query(
            r#"
            UPDATE seats SET status = 'occupied'
            WHERE id = ?1 AND status = 'available'
            "#,
        )
        .bind(seat_id)
        .execute(&mut *tx)
        .await?;

        if reserved.rows_affected() == 0 {
            // Dropping the transaction rolls back; nothing was written.
            return Ok(OpenOutcome::SeatUnavailable);
        }

        let session = Session {
            id: new_id(),
            client_id: client_id.to_string(),
            seat_id: seat_id.to_string(),
            seat_number,
            start_time: Utc::now(),
            end_time: None,
            status: SessionStatus::Active,
            total_cents: 0,
            advance_payment_cents: 0,
            yape_cents: 0,
            plin_cents: 0,
            cash_cents: 0,
            money_advance_cents: 0,
            debt_cents: 0,
            change_cents: 0,
            observation: None,
            walkin_alias: None,
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (id, client_id, seat_id, seat_number, start_time, status)
            VALUES (?1, ?2, ?3, ?4, ?5, 'active')
            "#,
        )
        .bind(&session.id)
        .bind(&session.client_id)
        .bind(&session.seat_id)
        .bind(&session.seat_number)
        .bind(session.start_time)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(OpenOutcome::Opened(session))
    }

    /// Moves an active session to another seat.
    ///
    /// Ordering inside the transaction: reserve the target, repoint the
    /// session, free the origin. The transaction makes the sequence
    /// atomic; the ordering keeps the target reserved rather than
    /// double-bookable even if the store ever replays the statements.
    pub async fn move_to(&self, session_id: &str, target_seat_id: &str) -> StoreResult<MoveOutcome> {
        debug!(session_id = %session_id, target_seat_id = %target_seat_id, "Moving session");

        let mut tx = self.pool.begin().await?;

        let origin_seat_id: Option<String> = sqlx::query_scalar(
            "SELECT seat_id FROM sessions WHERE id = ?1 AND status = 'active'",
        )
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(origin_seat_id) = origin_seat_id else {
            return Ok(MoveOutcome::SessionNotActive);
        };

        let target_number: Option<String> =
            sqlx::query_scalar("SELECT number FROM seats WHERE id = ?1")
                .bind(target_seat_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(target_number) = target_number else {
            return Err(StoreError::not_found("Seat", target_seat_id));
        };

        let reserved = sqlx::query(
            r#"
            UPDATE seats SET status = 'occupied'
            WHERE id = ?1 AND status = 'available'
            "#,
        )
        .bind(target_seat_id)
        .execute(&mut *tx)
        .await?;

        if reserved.rows_affected() == 0 {
            return Ok(MoveOutcome::TargetUnavailable);
        }

        let repointed = sqlx::query(
            r#"
            UPDATE sessions SET seat_id = ?2, seat_number = ?3
            WHERE id = ?1 AND status = 'active'
            "#,
        )
        .bind(session_id)
        .bind(target_seat_id)
        .bind(&target_number)
        .execute(&mut *tx)
        .await?;

        if repointed.rows_affected() == 0 {
            return Ok(MoveOutcome::SessionNotActive);
        }

        sqlx::query(
            r#"
            UPDATE seats SET status = 'available'
            WHERE id = ?1 AND status = 'occupied'
            "#,
        )
        .bind(&origin_seat_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(MoveOutcome::Moved)
    }

    /// Closes a session: freezes the figures, frees the seat and writes
    /// the debt row, all in one transaction.
    ///
    /// The freeze is conditional on the session still being active, so a
    /// close can never run twice - a replayed or double-clicked close
    /// returns [`CloseOutcome::SessionNotActive`] and writes no second
    /// debt row.
    pub async fn close(&self, session_id: &str, record: &CloseRecord) -> StoreResult<CloseOutcome> {
        debug!(session_id = %session_id, debt = record.debt_cents, "Closing session");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let frozen = sqlx::query(
            r#"
            UPDATE sessions SET
                end_time = ?2,
                status = 'inactive',
                total_cents = ?3,
                advance_payment_cents = ?4,
                yape_cents = ?5,
                plin_cents = ?6,
                cash_cents = ?7,
                money_advance_cents = ?8,
                debt_cents = ?9,
                change_cents = ?10,
                observation = ?11,
                walkin_alias = ?12
            WHERE id = ?1 AND status = 'active'
            "#,
        )
        .bind(session_id)
        .bind(now)
        .bind(record.total_cents)
        .bind(record.advance_payment_cents)
        .bind(record.yape_cents)
        .bind(record.plin_cents)
        .bind(record.cash_cents)
        .bind(record.money_advance_cents)
        .bind(record.debt_cents)
        .bind(record.change_cents)
        .bind(&record.observation)
        .bind(&record.walkin_alias)
        .execute(&mut *tx)
        .await?;

        if frozen.rows_affected() == 0 {
            return Ok(CloseOutcome::SessionNotActive);
        }

        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
        ))
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE seats SET status = 'available'
            WHERE id = ?1 AND status = 'occupied'
            "#,
        )
        .bind(&session.seat_id)
        .execute(&mut *tx)
        .await?;

        // Every close leaves a debt row, settled immediately when nothing
        // is owed, so the debt screens can join against a uniform trail.
        let debt = Debt {
            id: new_id(),
            client_id: session.client_id.clone(),
            session_id: session.id.clone(),
            seat_number: session.seat_number.clone(),
            original_cents: record.debt_cents,
            remaining_cents: record.debt_cents,
            settled: record.debt_cents <= 0,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO debts (id, client_id, session_id, seat_number,
                               original_cents, remaining_cents, settled, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&debt.id)
        .bind(&debt.client_id)
        .bind(&debt.session_id)
        .bind(&debt.seat_number)
        .bind(debt.original_cents)
        .bind(debt.remaining_cents)
        .bind(debt.settled)
        .bind(debt.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CloseOutcome::Closed { session, debt })
    }

    /// Deletes a session and its consumptions, freeing the seat.
    ///
    /// Administrative undo of an erroneous open; not a close. No debt row
    /// is written and nothing is kept. Returns `false` if the session did
    /// not exist.
    pub async fn delete(&self, session_id: &str) -> StoreResult<bool> {
        debug!(session_id = %session_id, "Deleting session");

        let mut tx = self.pool.begin().await?;

        let seat_id: Option<String> =
            sqlx::query_scalar("SELECT seat_id FROM sessions WHERE id = ?1")
                .bind(session_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(seat_id) = seat_id else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM consumptions WHERE session_id = ?1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE seats SET status = 'available'
            WHERE id = ?1 AND status = 'occupied'
            "#,
        )
        .bind(&seat_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(true)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// The active session on a seat, if any.
    pub async fn active_for_seat(&self, seat_id: &str) -> StoreResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE seat_id = ?1 AND status = 'active'"
        ))
        .bind(seat_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Sessions for a seat number within a UTC range (the per-seat
    /// history panel). Matches on the frozen number snapshot, so history
    /// follows the display number the cashier knows.
    pub async fn list_for_seat_number(
        &self,
        seat_number: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Session>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            r#"
            SELECT {SESSION_COLUMNS} FROM sessions
            WHERE seat_number = ?1 AND start_time >= ?2 AND start_time < ?3
            ORDER BY start_time DESC
            "#
        ))
        .bind(seat_number)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// All sessions started within a UTC range (report queries).
    pub async fn list_started_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Session>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            r#"
            SELECT {SESSION_COLUMNS} FROM sessions
            WHERE start_time >= ?1 AND start_time < ?2
            ORDER BY start_time
            "#
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Updates the free-text observation. The one field that stays
    /// editable after close.
    pub async fn update_observation(&self, id: &str, observation: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE sessions SET observation = ?2 WHERE id = ?1")
            .bind(id)
            .bind(observation)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Session", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
