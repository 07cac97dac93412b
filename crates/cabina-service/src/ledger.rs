//! # Consumption Ledger Service
//!
//! Product lines on an active session: add, requantify, mark paid,
//! remove. Every mutation keeps the session's advance-payment cache in
//! step (the store does the refresh inside the mutation's transaction).

use serde::{Deserialize, Serialize};
use tracing::info;

use cabina_core::validation::validate_quantity;
use cabina_core::{Consumption, Money, Product, Session};
use cabina_db::Database;

use crate::error::{ServiceError, ServiceResult};

/// Fresh display totals for a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionTotals {
    /// Sum of all lines.
    pub total: Money,
    /// Sum of the paid lines (already collected).
    pub advance_paid: Money,
    /// What would be owed if the session closed now.
    pub to_collect: Money,
}

/// Consumption ledger operations.
#[derive(Debug, Clone)]
pub struct LedgerService {
    db: Database,
}

impl LedgerService {
    /// Creates a new LedgerService over a database handle.
    pub fn new(db: Database) -> Self {
        LedgerService { db }
    }

    /// Adds one unit of a product to an active session, snapshotting the
    /// product name and price.
    pub async fn add_product(
        &self,
        session_id: &str,
        product_id: &str,
    ) -> ServiceResult<Consumption> {
        self.require_active_session(session_id).await?;

        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        let line = self
            .db
            .consumptions()
            .insert(session_id, &product.name, product.price_cents)
            .await?;

        info!(
            session_id = %session_id,
            product = %product.name,
            price = %product.price(),
            "Product added to session"
        );

        Ok(line)
    }

    /// Changes a line's quantity. Rejects non-positive quantities and
    /// edits to lines already collected.
    pub async fn set_quantity(
        &self,
        consumption_id: &str,
        quantity: i64,
    ) -> ServiceResult<Consumption> {
        validate_quantity(quantity)?;

        let line = self.require_line(consumption_id).await?;
        if line.paid {
            return Err(ServiceError::LinePaid {
                id: consumption_id.to_string(),
            });
        }
        self.require_active_session(&line.session_id).await?;

        Ok(self.db.consumptions().set_quantity(consumption_id, quantity).await?)
    }

    /// Marks a line paid (or unpaid) and returns the session's refreshed
    /// advance-payment total. Idempotent.
    pub async fn toggle_paid(&self, consumption_id: &str, paid: bool) -> ServiceResult<Money> {
        let line = self.require_line(consumption_id).await?;
        self.require_active_session(&line.session_id).await?;

        let advance_cents = self.db.consumptions().set_paid(consumption_id, paid).await?;

        info!(
            consumption_id = %consumption_id,
            paid,
            advance = %Money::from_cents(advance_cents),
            "Consumption paid flag updated"
        );

        Ok(Money::from_cents(advance_cents))
    }

    /// Removes a line from an active session.
    pub async fn remove(&self, consumption_id: &str) -> ServiceResult<()> {
        let line = self.require_line(consumption_id).await?;
        self.require_active_session(&line.session_id).await?;

        self.db.consumptions().delete(consumption_id).await?;

        info!(consumption_id = %consumption_id, "Consumption removed");
        Ok(())
    }

    /// A session's lines, oldest first.
    pub async fn list(&self, session_id: &str) -> ServiceResult<Vec<Consumption>> {
        Ok(self.db.consumptions().list_for_session(session_id).await?)
    }

    /// Fresh totals straight from the rows, for the tender panel.
    pub async fn totals(&self, session_id: &str) -> ServiceResult<SessionTotals> {
        let totals = self.db.consumptions().totals_for_session(session_id).await?;
        let total = Money::from_cents(totals.total_cents);
        let advance_paid = Money::from_cents(totals.advance_cents);

        Ok(SessionTotals {
            total,
            advance_paid,
            to_collect: total.shortfall_after(advance_paid),
        })
    }

    /// The catalog offered on a seat: its tier's products plus the
    /// general tier.
    pub async fn products_for_seat(&self, seat_id: &str) -> ServiceResult<Vec<Product>> {
        let seat = self
            .db
            .seats()
            .get_by_id(seat_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Seat", seat_id))?;

        Ok(self.db.products().list_for_tier(seat.group_id).await?)
    }

    async fn require_line(&self, consumption_id: &str) -> ServiceResult<Consumption> {
        self.db
            .consumptions()
            .get_by_id(consumption_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Consumption", consumption_id))
    }

    async fn require_active_session(&self, session_id: &str) -> ServiceResult<Session> {
        let session = self
            .db
            .sessions()
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Session", session_id))?;

        if !session.is_active() {
            return Err(ServiceError::SessionNotActive {
                id: session_id.to_string(),
            });
        }

        Ok(session)
    }
}
