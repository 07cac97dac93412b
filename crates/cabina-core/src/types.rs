//! # Domain Types
//!
//! Core domain types for the Cabina billing system.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Seat ──(occupied by)── Session ──(accrues)── Consumption               │
//! │    │                       │                                            │
//! │    │                       └──(on close, may create)── Debt             │
//! │    │                                                     │              │
//! │  SeatGroup (pricing tier)              DebtPayment ──(reduces)          │
//! │                                                                         │
//! │  Client, Product           CashMovement (independent drawer ledger)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - Every entity has a UUID v4 `id` plus, where the business needs one, a
//!   human-readable identifier (seat number, product name snapshot)
//! - Monetary columns are raw `*_cents` i64 fields with [`Money`] accessors
//! - Snapshot fields (seat number, product name, unit price) freeze what
//!   was true when the row was written, so history survives later edits

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Seats
// =============================================================================

/// The rental state of a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    /// Free for a new session.
    Available,
    /// An active session references this seat.
    Occupied,
    /// Out of service; cannot host sessions.
    Maintenance,
}

impl Default for SeatStatus {
    fn default() -> Self {
        SeatStatus::Available
    }
}

/// A rentable seat ("PC") on the floor.
///
/// `pos_x`/`pos_y` are dashboard view-state: where the seat tile is drawn.
/// They carry no billing meaning.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Seat {
    pub id: String,
    /// Display number shown on the floor map, e.g. "PC07".
    pub number: String,
    pub status: SeatStatus,
    /// Pricing tier (FK to [`SeatGroup`]).
    pub group_id: i64,
    pub pos_x: f64,
    pub pos_y: f64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Seat {
    /// Whether a new session may open on this seat.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }
}

/// A pricing tier grouping seats and the products offered on them.
/// Tier 1 is the general tier: its products are offered everywhere.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SeatGroup {
    pub id: i64,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Clients & Catalog
// =============================================================================

/// A registered client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub nickname: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A catalog product sellable into a session.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    /// Tier the product is offered on (tier 1 = everywhere).
    pub group_id: i64,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// The lifecycle state of a billing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// In progress: end_time is null, totals are provisional.
    Active,
    /// Closed: totals and tender split are frozen. Terminal.
    Inactive,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Active
    }
}

/// One seat rental from open to close.
///
/// While active, `total_cents` and the tender fields are provisional (the
/// ledger is the source of truth). `advance_payment_cents` is the one field
/// kept current before close: it caches the sum of paid consumption lines
/// so the tender screen never re-aggregates on render. At close everything
/// is frozen and the row becomes immutable except `observation`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Session {
    pub id: String,
    pub client_id: String,
    pub seat_id: String,
    /// Seat number at open time (frozen; the seat may be renamed later).
    pub seat_number: String,
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub total_cents: i64,
    /// Cache of the paid-consumption sum. Maintained eagerly by the ledger.
    pub advance_payment_cents: i64,
    pub yape_cents: i64,
    pub plin_cents: i64,
    pub cash_cents: i64,
    /// Prior advance handed over at close time (distinct from the
    /// paid-consumption cache above).
    pub money_advance_cents: i64,
    pub debt_cents: i64,
    pub change_cents: i64,
    pub observation: Option<String>,
    /// Walk-in nickname override shown instead of the client name.
    pub walkin_alias: Option<String>,
}

impl Session {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn advance_payment(&self) -> Money {
        Money::from_cents(self.advance_payment_cents)
    }

    #[inline]
    pub fn debt(&self) -> Money {
        Money::from_cents(self.debt_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

// =============================================================================
// Consumptions
// =============================================================================

/// A product line item consumed during a session.
///
/// `product_name` and `price_cents` are snapshots, not foreign keys: the
/// catalog can be repriced without rewriting history. `amount_cents` is
/// always `quantity × price_cents`; quantity edits rewrite both.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Consumption {
    pub id: String,
    pub session_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price_cents: i64,
    pub amount_cents: i64,
    /// Paid lines feed the session's advance-payment cache.
    pub paid: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Consumption {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Debts
// =============================================================================

/// A client debt created at session close.
///
/// `remaining_cents` counts down as payments post; `settled` is derived
/// (remaining ≤ 0) and terminal. `original_cents` never changes, so the
/// balance can always be recomputed from the payment ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Debt {
    pub id: String,
    pub client_id: String,
    pub session_id: String,
    /// Seat number snapshot from the session that created the debt.
    pub seat_number: String,
    pub original_cents: i64,
    pub remaining_cents: i64,
    pub settled: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Debt {
    #[inline]
    pub fn original(&self) -> Money {
        Money::from_cents(self.original_cents)
    }

    #[inline]
    pub fn remaining(&self) -> Money {
        Money::from_cents(self.remaining_cents)
    }
}

/// How money was tendered (a payment or an abono).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Yape,
    Plin,
}

/// A partial payment ("abono") posted against a debt. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DebtPayment {
    pub id: String,
    pub debt_id: String,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub detail: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl DebtPayment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Cash Movements
// =============================================================================

/// Direction of a manual drawer movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Money into the drawer.
    Ingreso,
    /// Money out of the drawer.
    Egreso,
}

/// A manual cash movement unrelated to any session. Purely additive.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashMovement {
    pub id: String,
    pub kind: MovementKind,
    pub amount_cents: i64,
    pub detail: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
