//! # cabina-core: Pure Business Logic for Cabina
//!
//! The billing heart of the system: every sol that moves through a
//! session, a debt or the drawer is computed here, as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cabina Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Dashboard UI (floor map, tender, reports)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  cabina-service (operations)                    │   │
//! │  │   open/move/close session, ledger edits, abonos, reports        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cabina-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌────────┐ ┌──────────┐  │   │
//! │  │   │  types  │ │  money  │ │ billing │ │  days  │ │ reports  │  │   │
//! │  │   │  Seat   │ │  Money  │ │ settle  │ │  Lima  │ │  tallies │  │   │
//! │  │   │ Session │ │ S/ x.xx │ │ tender  │ │ 06:00  │ │          │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └────────┘ └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cabina-db (row store)                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Seat, Session, Consumption, Debt, ...)
//! - [`money`] - Integer-céntimos money type (no floating point!)
//! - [`billing`] - The close-time settlement function
//! - [`days`] - América/Lima business-day boundaries
//! - [`reports`] - Pure tallies for the reporting screens
//! - [`error`] - Validation error types
//! - [`validation`] - Business-rule validation

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod days;
pub mod error;
pub mod money;
pub mod reports;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use billing::{settle, Settlement, TenderSplit};
pub use error::ValidationError;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single consumption line.
///
/// Prevents a fat-fingered quantity edit (1000 instead of 10) from
/// inflating a session total past anything a real rental produces.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// The general pricing tier. Products assigned to it are offered on every
/// seat, whatever the seat's own tier.
pub const GENERAL_TIER: i64 = 1;
