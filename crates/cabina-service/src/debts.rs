//! # Debt Ledger Service
//!
//! Abonos against client debts, and the defensive balance read.
//!
//! State machine: `outstanding → settled`, one direction. The store's
//! conditional decrement enforces it even when two terminals post at
//! once; this layer adds the user-facing validation and the
//! reconciliation read that recomputes a balance from the payment
//! ledger instead of trusting the stored figure.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cabina_core::validation::validate_debt_payment;
use cabina_core::{days, Debt, DebtPayment, Money, PaymentMethod, ValidationError};
use cabina_db::{Database, PostPaymentOutcome};

use crate::error::{ServiceError, ServiceResult};

/// A posted abono: the payment row and the debt as it now stands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostedPayment {
    pub debt: Debt,
    pub payment: DebtPayment,
}

/// The defensive balance read: stored vs recomputed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReconciledBalance {
    /// What the debt row says is left.
    pub stored: Money,
    /// original − Σ payments, recomputed from the ledger.
    pub from_ledger: Money,
    /// Whether the two agree.
    pub consistent: bool,
}

/// Debt ledger operations.
#[derive(Debug, Clone)]
pub struct DebtService {
    db: Database,
}

impl DebtService {
    /// Creates a new DebtService over a database handle.
    pub fn new(db: Database) -> Self {
        DebtService { db }
    }

    /// Posts an abono against an outstanding debt.
    ///
    /// Bounds are enforced here (`0 < amount ≤ remaining`) and again by
    /// the store's conditional decrement, so a concurrent abono that
    /// shrinks the balance under us is rejected rather than driving the
    /// remaining amount negative.
    pub async fn post_abono(
        &self,
        debt_id: &str,
        amount: Money,
        method: PaymentMethod,
        detail: Option<&str>,
    ) -> ServiceResult<PostedPayment> {
        let debt = self.require_debt(debt_id).await?;
        if debt.settled {
            return Err(ServiceError::DebtSettled {
                id: debt_id.to_string(),
            });
        }

        validate_debt_payment(amount, debt.remaining())?;

        let outcome = self
            .db
            .debts()
            .post_payment(debt_id, amount.cents(), method, detail)
            .await?;

        match outcome {
            PostPaymentOutcome::Posted { debt, payment } => {
                info!(
                    debt_id = %debt.id,
                    amount = %amount,
                    remaining = %debt.remaining(),
                    settled = debt.settled,
                    "Abono posted"
                );
                Ok(PostedPayment { debt, payment })
            }
            PostPaymentOutcome::Rejected => {
                // Lost a race: someone else's abono landed first. Report
                // against the balance as it stands now.
                let fresh = self.require_debt(debt_id).await?;
                if fresh.settled {
                    Err(ServiceError::DebtSettled {
                        id: debt_id.to_string(),
                    })
                } else {
                    Err(ServiceError::Validation(ValidationError::ExceedsBalance {
                        requested: amount,
                        remaining: fresh.remaining(),
                    }))
                }
            }
        }
    }

    /// Recomputes a debt's balance from its payment ledger and compares
    /// with the stored figure.
    pub async fn reconciled_balance(&self, debt_id: &str) -> ServiceResult<ReconciledBalance> {
        let debt = self.require_debt(debt_id).await?;
        let paid = Money::from_cents(self.db.debts().paid_sum(debt_id).await?);
        let from_ledger = debt.original() - paid;
        let stored = debt.remaining();

        let consistent = stored == from_ledger;
        if !consistent {
            warn!(
                debt_id = %debt_id,
                %stored,
                %from_ledger,
                "Debt balance disagrees with payment ledger"
            );
        }

        Ok(ReconciledBalance {
            stored,
            from_ledger,
            consistent,
        })
    }

    /// A client's debts over a business-day range, optionally filtered
    /// by settled state.
    pub async fn debts_for_client(
        &self,
        client_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        settled: Option<bool>,
    ) -> ServiceResult<Vec<Debt>> {
        let (start, end) = days::business_day_range(from, to);
        Ok(self
            .db
            .debts()
            .list_for_client(client_id, start, end, settled)
            .await?)
    }

    /// The abonos posted against a debt, oldest first.
    pub async fn payments(&self, debt_id: &str) -> ServiceResult<Vec<DebtPayment>> {
        Ok(self.db.debts().payments_for_debt(debt_id).await?)
    }

    async fn require_debt(&self, debt_id: &str) -> ServiceResult<Debt> {
        self.db
            .debts()
            .get_by_id(debt_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Debt", debt_id))
    }
}
