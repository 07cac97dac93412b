//! # Session Lifecycle Service
//!
//! Open, move, close and delete billing sessions.
//!
//! ## Close Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  close_session(id, CloseRequest)                                        │
//! │                                                                         │
//! │  1. Fetch the session; refuse unless it is still active                 │
//! │  2. Re-sum the ledger fresh from the rows (never trust a cached         │
//! │     total across the round-trip window)                                 │
//! │  3. settle(): split into debt / change                                  │
//! │  4. Apply the manual override, if any, recording its reason             │
//! │  5. One transaction: freeze session, free seat, write debt row          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use cabina_core::billing::{settle, TenderSplit};
use cabina_core::validation::{validate_detail, validate_tender_component};
use cabina_core::{days, Consumption, Debt, Money, Session};
use cabina_db::repository::session::{CloseOutcome, CloseRecord, MoveOutcome, OpenOutcome};
use cabina_db::Database;

use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Request / Response Types
// =============================================================================

/// A manual correction of the computed debt at close.
///
/// The amount replaces the computed figure verbatim; the reason is
/// appended to the session observation so the correction is auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtOverride {
    pub amount: Money,
    pub reason: String,
}

/// Everything the tender dialog hands over at close.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloseRequest {
    pub tender: TenderSplit,
    pub observation: Option<String>,
    pub walkin_alias: Option<String>,
    pub debt_override: Option<DebtOverride>,
}

/// A close's outcome: the frozen session and its debt row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedSession {
    pub session: Session,
    pub debt: Debt,
}

/// A session together with its consumption lines (history panel).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWithLedger {
    pub session: Session,
    pub consumptions: Vec<Consumption>,
}

// =============================================================================
// Service
// =============================================================================

/// Session lifecycle operations.
#[derive(Debug, Clone)]
pub struct SessionService {
    db: Database,
}

impl SessionService {
    /// Creates a new SessionService over a database handle.
    pub fn new(db: Database) -> Self {
        SessionService { db }
    }

    /// Opens a session for a client on an available seat.
    ///
    /// The seat check runs at the store, not against whatever the floor
    /// map last rendered: the reservation is a conditional update, so of
    /// two terminals racing the same seat exactly one wins and the other
    /// gets [`ServiceError::SeatUnavailable`].
    pub async fn open_session(&self, seat_id: &str, client_id: &str) -> ServiceResult<Session> {
        let client = self
            .db
            .clients()
            .get_by_id(client_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Client", client_id))?;

        match self.db.sessions().open(&client.id, seat_id).await? {
            OpenOutcome::Opened(session) => {
                info!(
                    session_id = %session.id,
                    seat = %session.seat_number,
                    client = %client.name,
                    "Session opened"
                );
                Ok(session)
            }
            OpenOutcome::SeatUnavailable => Err(ServiceError::SeatUnavailable {
                seat: seat_id.to_string(),
            }),
        }
    }

    /// Moves an active session to an available target seat.
    pub async fn move_session(
        &self,
        session_id: &str,
        target_seat_id: &str,
    ) -> ServiceResult<Session> {
        match self.db.sessions().move_to(session_id, target_seat_id).await? {
            MoveOutcome::Moved => {
                let session = self.require_session(session_id).await?;
                info!(
                    session_id = %session_id,
                    seat = %session.seat_number,
                    "Session moved"
                );
                Ok(session)
            }
            MoveOutcome::TargetUnavailable => Err(ServiceError::SeatUnavailable {
                seat: target_seat_id.to_string(),
            }),
            MoveOutcome::SessionNotActive => Err(ServiceError::SessionNotActive {
                id: session_id.to_string(),
            }),
        }
    }

    /// Closes a session: settles the bill and freezes everything.
    pub async fn close_session(
        &self,
        session_id: &str,
        request: CloseRequest,
    ) -> ServiceResult<ClosedSession> {
        let session = self.require_session(session_id).await?;
        if !session.is_active() {
            return Err(ServiceError::SessionNotActive {
                id: session_id.to_string(),
            });
        }

        let tender = request.tender;
        validate_tender_component("cash", tender.cash)?;
        validate_tender_component("yape", tender.yape)?;
        validate_tender_component("plin", tender.plin)?;
        validate_tender_component("money advance", tender.money_advance)?;

        // Fresh sums from the rows; the cached session figures are for
        // rendering, not for settling.
        let totals = self
            .db
            .consumptions()
            .totals_for_session(session_id)
            .await?;
        let total = Money::from_cents(totals.total_cents);
        let advance_paid = Money::from_cents(totals.advance_cents);

        let mut settlement = settle(total, advance_paid, tender);
        let mut observation = request.observation.clone();

        if let Some(ref correction) = request.debt_override {
            validate_detail(&correction.reason)?;
            settlement = settlement.with_debt_override(correction.amount);
            let note = format!("Ajuste manual de deuda: {}", correction.reason.trim());
            observation = Some(match observation {
                Some(text) if !text.trim().is_empty() => format!("{text}\n{note}"),
                _ => note,
            });
        }

        let record = CloseRecord {
            total_cents: settlement.total.cents(),
            advance_payment_cents: settlement.advance_paid.cents(),
            yape_cents: tender.yape.cents(),
            plin_cents: tender.plin.cents(),
            cash_cents: tender.cash.cents(),
            money_advance_cents: tender.money_advance.cents(),
            debt_cents: settlement.debt.cents(),
            change_cents: settlement.change.cents(),
            observation,
            walkin_alias: request.walkin_alias,
        };

        match self.db.sessions().close(session_id, &record).await? {
            CloseOutcome::Closed { session, debt } => {
                info!(
                    session_id = %session.id,
                    seat = %session.seat_number,
                    total = %settlement.total,
                    debt = %settlement.debt,
                    change = %settlement.change,
                    "Session closed"
                );
                Ok(ClosedSession { session, debt })
            }
            CloseOutcome::SessionNotActive => Err(ServiceError::SessionNotActive {
                id: session_id.to_string(),
            }),
        }
    }

    /// Deletes a session outright (administrative undo of an erroneous
    /// open). No debt row, no trace.
    pub async fn delete_session(&self, session_id: &str) -> ServiceResult<()> {
        if !self.db.sessions().delete(session_id).await? {
            return Err(ServiceError::not_found("Session", session_id));
        }

        info!(session_id = %session_id, "Session deleted");
        Ok(())
    }

    /// Updates the observation text; works on closed sessions too.
    pub async fn update_observation(&self, session_id: &str, text: &str) -> ServiceResult<()> {
        self.db.sessions().update_observation(session_id, text).await?;
        Ok(())
    }

    /// The active session on a seat, if any (floor-map detail panel).
    pub async fn active_session(&self, seat_id: &str) -> ServiceResult<Option<Session>> {
        Ok(self.db.sessions().active_for_seat(seat_id).await?)
    }

    /// A seat's session history over a business-day range, each with its
    /// consumption lines.
    pub async fn seat_history(
        &self,
        seat_number: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ServiceResult<Vec<SessionWithLedger>> {
        let (start, end) = days::business_day_range(from, to);
        let sessions = self
            .db
            .sessions()
            .list_for_seat_number(seat_number, start, end)
            .await?;

        let mut history = Vec::with_capacity(sessions.len());
        for session in sessions {
            let consumptions = self.db.consumptions().list_for_session(&session.id).await?;
            history.push(SessionWithLedger { session, consumptions });
        }

        Ok(history)
    }

    async fn require_session(&self, session_id: &str) -> ServiceResult<Session> {
        self.db
            .sessions()
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Session", session_id))
    }
}
