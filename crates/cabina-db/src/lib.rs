//! # cabina-db: Row Store for Cabina
//!
//! Database access for the Cabina billing system: SQLite via sqlx, a
//! connection pool, embedded migrations, and one repository per
//! aggregate.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store error types
//! - [`repository`] - Repository implementations (seats, sessions, ...)
//!
//! ## The Two Safety Rails
//!
//! The seat registry and the session table are the only shared mutable
//! state in the system, and several terminals mutate them concurrently.
//! Two mechanisms keep them consistent:
//!
//! 1. **Conditional updates** - every status transition is an
//!    `UPDATE ... WHERE status = <expected>` whose `rows_affected`
//!    decides the winner. Losers write nothing.
//! 2. **Transactions** - every effect spanning rows (open, move, close,
//!    delete, payment posting, paid-toggle plus cache refresh) commits
//!    atomically or not at all.
//!
//! A partial unique index (`idx_sessions_one_active_per_seat`) backstops
//! the one-active-session-per-seat invariant at the store itself.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cabina_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./cabina.db")).await?;
//! let seats = db.seats().list().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::consumption::{ConsumptionRepository, LedgerTotals};
pub use repository::debt::{DebtRepository, PostPaymentOutcome};
pub use repository::movement::MovementRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::seat::SeatRepository;
pub use repository::session::{
    CloseOutcome, CloseRecord, MoveOutcome, OpenOutcome, SessionRepository,
};
