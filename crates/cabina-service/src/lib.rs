//! # cabina-service: Business Operations for Cabina
//!
//! The layer a UI shell calls. Each service holds a [`Database`] handle
//! passed in explicitly at construction (no globals), validates with
//! `cabina-core`, computes with the pure billing/report functions, and
//! persists through `cabina-db`'s transactional repositories.
//!
//! ## Services
//!
//! - [`SessionService`] - open / move / close / delete sessions
//! - [`LedgerService`] - consumption lines on an active session
//! - [`DebtService`] - abonos and the defensive balance read
//! - [`AccountingService`] - drawer movements and the report screens
//! - [`RegistryService`] - seats, maintenance flags, clients
//!
//! ## Failure Semantics
//!
//! Every failure is scoped to the single user action that triggered it
//! and surfaces as a typed [`ServiceError`]; the UI shows it as a
//! dismissible notification and stays interactive. Multi-row effects are
//! transactions in the store layer, so there is no partially-applied
//! state to compensate for.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cabina_db::{Database, DbConfig};
//! use cabina_service::{SessionService, LedgerService};
//!
//! let db = Database::new(DbConfig::new("./cabina.db")).await?;
//! let sessions = SessionService::new(db.clone());
//! let ledger = LedgerService::new(db.clone());
//!
//! let session = sessions.open_session(&seat_id, &client_id).await?;
//! ledger.add_product(&session.id, &product_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod accounting;
pub mod debts;
pub mod error;
pub mod ledger;
pub mod registry;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use accounting::{AccountingService, MonthlyReport};
pub use debts::{DebtService, PostedPayment, ReconciledBalance};
pub use error::{ServiceError, ServiceResult};
pub use ledger::{LedgerService, SessionTotals};
pub use registry::RegistryService;
pub use session::{
    CloseRequest, ClosedSession, DebtOverride, SessionService, SessionWithLedger,
};
