//! # Billing Settlement
//!
//! The close-time reconciliation arithmetic: given what a session accrued
//! and what the client hands over, decide what is debt and what is change.
//!
//! ## The Settlement Equation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  owed      = total − advance_paid          (paid lines are collected)   │
//! │  tendered  = cash + yape + plin + money_advance                         │
//! │                                                                         │
//! │  debt      = max(owed − tendered, 0)       (shortfall)                  │
//! │  change    = max(tendered − owed, 0)       (surplus)                    │
//! │                                                                         │
//! │  At most one of debt/change is non-zero, and always:                    │
//! │    tendered + advance_paid + debt − change == total                     │
//! │                                                                         │
//! │  The drawer balances to the céntimo on every close.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A cashier may override the computed debt (a manual correction path).
//! The override replaces the debt amount verbatim; no formula is enforced
//! against it, which is exactly the point of an escape hatch. Overrides
//! must carry a reason so the correction is auditable.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tender Split
// =============================================================================

/// What the client hands over at close, split by method.
///
/// `money_advance` is money given earlier in the rental and held at the
/// counter; it counts toward the amount owed like any other tender. It is
/// distinct from the paid-consumption sum, which was already collected
/// line by line and enters the settlement as `advance_paid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TenderSplit {
    pub cash: Money,
    pub yape: Money,
    pub plin: Money,
    pub money_advance: Money,
}

impl TenderSplit {
    /// A cash-only tender.
    pub fn cash_only(amount: Money) -> Self {
        TenderSplit {
            cash: amount,
            ..TenderSplit::default()
        }
    }

    /// Total handed over at close.
    #[inline]
    pub fn total(&self) -> Money {
        self.cash + self.yape + self.plin + self.money_advance
    }
}

// =============================================================================
// Settlement
// =============================================================================

/// The outcome of settling a session: what was accrued, what was covered,
/// and how the difference splits into debt or change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Settlement {
    /// Sum of all consumption lines at close time.
    pub total: Money,
    /// Sum of lines already marked paid (collected before close).
    pub advance_paid: Money,
    /// The tender split as handed over.
    pub tender: TenderSplit,
    /// Shortfall carried forward as a debt record.
    pub debt: Money,
    /// Surplus returned to the client.
    pub change: Money,
}

impl Settlement {
    /// Verifies the drawer equation:
    /// `tendered + advance_paid + debt − change == total`.
    ///
    /// Holds by construction for [`settle`]; an override breaks it on
    /// purpose, so callers that applied one should not assert it.
    pub fn balances(&self) -> bool {
        self.tender.total() + self.advance_paid + self.debt - self.change == self.total
    }

    /// Replaces the computed debt with a manual amount.
    ///
    /// Last writer wins; change is left as computed. The caller is
    /// responsible for recording who corrected the figure and why.
    pub fn with_debt_override(mut self, amount: Money) -> Self {
        self.debt = amount;
        self
    }
}

/// Settles a session close.
///
/// ## Example
/// ```rust
/// use cabina_core::billing::{settle, TenderSplit};
/// use cabina_core::money::Money;
///
/// // Accrued S/ 20.00, nothing prepaid, client pays S/ 15.00 cash:
/// let s = settle(
///     Money::from_cents(2000),
///     Money::zero(),
///     TenderSplit::cash_only(Money::from_cents(1500)),
/// );
/// assert_eq!(s.debt, Money::from_cents(500));
/// assert_eq!(s.change, Money::zero());
/// assert!(s.balances());
/// ```
pub fn settle(total: Money, advance_paid: Money, tender: TenderSplit) -> Settlement {
    let owed = total.shortfall_after(advance_paid);
    let tendered = tender.total();

    Settlement {
        total,
        advance_paid,
        tender,
        debt: owed.shortfall_after(tendered),
        change: tendered.shortfall_after(owed),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
